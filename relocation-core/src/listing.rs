//! Property and school listings.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;

use crate::models::{FieldValue, Record};

pub const NO_PROPERTIES: &str = "No properties available.";
pub const NO_MATCHING_PROPERTIES: &str = "No properties match the selected filter.";

/// Property filter by `listing_type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingFilter {
    #[default]
    All,
    Sell,
    Buy,
}

impl ListingFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "sell" => Some(Self::Sell),
            "buy" => Some(Self::Buy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sell => "sell",
            Self::Buy => "buy",
        }
    }

    pub fn matches(
        &self,
        property: &Record,
    ) -> bool {
        match self {
            Self::All => true,
            _ => property.text("listing_type") == Some(self.as_str()),
        }
    }

    /// Applies the filter, telling "nothing listed" apart from "nothing matched".
    pub fn apply<'a>(
        &self,
        properties: &'a [Record],
    ) -> ListingOutcome<'a> {
        if properties.is_empty() {
            return ListingOutcome::Empty;
        }
        let matching: Vec<&Record> = properties.iter().filter(|p| self.matches(p)).collect();
        if matching.is_empty() {
            ListingOutcome::NoMatch
        } else {
            ListingOutcome::Items(matching)
        }
    }
}

impl fmt::Display for ListingFilter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ListingOutcome<'a> {
    Empty,
    NoMatch,
    Items(Vec<&'a Record>),
}

impl ListingOutcome<'_> {
    /// Message for the empty states.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Empty => Some(NO_PROPERTIES),
            Self::NoMatch => Some(NO_MATCHING_PROPERTIES),
            Self::Items(_) => None,
        }
    }
}

/// School search: optional curriculum substring, minimum rating and cap,
/// best rated first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolQuery {
    pub curriculum: Option<String>,
    pub min_rating: Option<Decimal>,
    pub limit: Option<usize>,
}

impl SchoolQuery {
    pub fn top_rated(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn matches(
        &self,
        school: &Record,
    ) -> bool {
        if let Some(wanted) = &self.curriculum {
            let wanted = wanted.to_lowercase();
            let curriculum = school.text("curriculum").unwrap_or_default().to_lowercase();
            if !curriculum.contains(&wanted) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            // Unrated schools never pass a rating threshold.
            if rating(school).is_none_or(|r| r < min) {
                return false;
            }
        }
        true
    }

    pub fn run<'a>(
        &self,
        schools: &'a [Record],
    ) -> Vec<&'a Record> {
        let mut found: Vec<&Record> = schools.iter().filter(|s| self.matches(s)).collect();
        // Stable sort: equal ratings keep source order, unrated last.
        found.sort_by(|a, b| match (rating(a), rating(b)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        if let Some(limit) = self.limit {
            found.truncate(limit);
        }
        found
    }
}

fn rating(school: &Record) -> Option<Decimal> {
    school.get("rating").and_then(FieldValue::as_decimal)
}

fn show(
    record: &Record,
    key: &str,
) -> String {
    record
        .get(key)
        .map_or_else(|| FieldValue::Null.to_string(), ToString::to_string)
}

/// "Marina Loft — Dubai, apartment [sell]".
pub fn property_summary(property: &Record) -> String {
    format!(
        "{} — {}, {} [{}]",
        show(property, "name"),
        show(property, "city"),
        show(property, "type"),
        show(property, "listing_type")
    )
}

/// "Raha International — Abu Dhabi (IB, 4.5)".
pub fn school_summary(school: &Record) -> String {
    let rating = match school.get("rating") {
        Some(value) if !value.is_blank() => value.to_string(),
        _ => "N/A".to_string(),
    };
    format!(
        "{} — {} ({}, {})",
        show(school, "name"),
        show(school, "location"),
        show(school, "curriculum"),
        rating
    )
}
