use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::FieldValue;

/// Identifier of a stored record (the integer `id` column).
pub type RecordId = i64;

/// Field key → new value, in the order the edits were made.
pub type FieldChanges = IndexMap<String, FieldValue>;

/// Column that carries the record identifier.
pub const ID_KEY: &str = "id";

/// The collections exposed by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Profiles,
    Children,
    Preferences,
    Workplaces,
    Properties,
    Schools,
}

impl RecordKind {
    pub fn all() -> &'static [RecordKind] {
        &[
            RecordKind::Profiles,
            RecordKind::Children,
            RecordKind::Preferences,
            RecordKind::Workplaces,
            RecordKind::Properties,
            RecordKind::Schools,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Children => "children",
            Self::Preferences => "preferences",
            Self::Workplaces => "workplaces",
            Self::Properties => "properties",
            Self::Schools => "schools",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a collection: an ordered map of column name to value.
///
/// Column order is preserved so cards list fields in the order the
/// data source returned them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Text view of a column; `None` when missing or not text.
    pub fn text(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.get(ID_KEY).and_then(FieldValue::as_i64)
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrites columns with committed changes. Unknown keys are appended.
    pub fn apply_changes(
        &mut self,
        changes: &FieldChanges,
    ) {
        for (key, value) in changes {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Copy of the record without the given keys.
    pub fn without_keys<'a>(
        &self,
        excluded: impl IntoIterator<Item = &'a str>,
    ) -> Record {
        let excluded: Vec<&str> = excluded.into_iter().collect();
        self.iter()
            .filter(|(key, _)| !excluded.contains(key))
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn record_kind_round_trips_through_str() {
        for kind in RecordKind::all() {
            assert_eq!(RecordKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(RecordKind::parse("Schools"), Some(RecordKind::Schools));
        assert_eq!(RecordKind::parse("users"), None);
    }

    #[test]
    fn id_reads_integer_column() {
        let record = Record::new().with("id", 12_i64).with("full_name", "Noah");
        assert_eq!(record.id(), Some(12));
        assert_eq!(Record::new().with("full_name", "Noah").id(), None);
    }

    #[test]
    fn keys_keep_insertion_order() {
        let record = Record::new()
            .with("full_name", "Noah")
            .with("age", 6_i64)
            .with("current_grade", "Grade 1");
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["full_name", "age", "current_grade"]
        );
    }

    #[test]
    fn apply_changes_overwrites_only_changed_columns() {
        let mut record = Record::new().with("full_name", "Ana").with("age", 9_i64);
        let mut changes = FieldChanges::new();
        changes.insert("full_name".to_string(), FieldValue::from("Ana Lee"));

        record.apply_changes(&changes);

        assert_eq!(record.text("full_name"), Some("Ana Lee"));
        assert_eq!(record.get("age"), Some(&FieldValue::Integer(9)));
    }

    #[test]
    fn without_keys_filters_columns() {
        let record = Record::new()
            .with("id", 1_i64)
            .with("user_id", 3_i64)
            .with("full_name", "Noah");
        let filtered = record.without_keys(["id", "user_id"]);
        assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["full_name"]);
    }
}
