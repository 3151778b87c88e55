use std::fmt;

use rust_decimal::Decimal;

use crate::utils::parse_optional_decimal;

/// Placeholder rendered for a null or empty value.
pub const EMPTY_DISPLAY: &str = "—";

/// A single column value as it comes back from the data source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `true` for null and for whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Integer(0) => Some(false),
            Self::Integer(1) => Some(true),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Integer view of the value. Text is parsed after trimming.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Decimal(d) if d.fract().is_zero() => i64::try_from(*d).ok(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Decimal view of the value. Text is parsed the same way form input is.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            Self::Text(s) => parse_optional_decimal(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Null => f.write_str(EMPTY_DISPLAY),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) if s.is_empty() => f.write_str(EMPTY_DISPLAY),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn null_and_empty_text_display_as_placeholder() {
        assert_eq!(FieldValue::Null.to_string(), EMPTY_DISPLAY);
        assert_eq!(FieldValue::from("").to_string(), EMPTY_DISPLAY);
        assert_eq!(FieldValue::from("Ana").to_string(), "Ana");
    }

    #[test]
    fn text_is_parsed_for_numeric_views() {
        assert_eq!(FieldValue::from(" 42 ").as_i64(), Some(42));
        assert_eq!(FieldValue::from("1,250.50").as_decimal(), Some(dec!(1250.50)));
        assert_eq!(FieldValue::from("abc").as_i64(), None);
        assert_eq!(FieldValue::from("1,5").as_i64(), None);
    }

    #[test]
    fn whole_decimal_converts_to_integer() {
        assert_eq!(FieldValue::Decimal(dec!(3)).as_i64(), Some(3));
        assert_eq!(FieldValue::Decimal(dec!(3.5)).as_i64(), None);
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(7_i64)), FieldValue::Integer(7));
    }

    #[test]
    fn bool_view_accepts_common_spellings() {
        assert_eq!(FieldValue::from("yes").as_bool(), Some(true));
        assert_eq!(FieldValue::Integer(0).as_bool(), Some(false));
        assert_eq!(FieldValue::from("maybe").as_bool(), None);
    }
}
