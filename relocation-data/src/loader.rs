use std::collections::HashSet;
use std::io::Read;

use relocation_core::{DataSource, FieldChanges, FieldValue, RecordKind, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading listing data.
#[derive(Debug, Error)]
pub enum ListingLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("line {line}: listing_type must be 'sell' or 'buy', got '{value}'")]
    InvalidListingType { line: usize, value: String },

    #[error("line {line}: rating must be between 0 and 5, got {value}")]
    InvalidRating { line: usize, value: Decimal },

    #[error("line {line}: name is required")]
    MissingName { line: usize },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for ListingLoaderError {
    fn from(err: csv::Error) -> Self {
        ListingLoaderError::CsvParse(err.to_string())
    }
}

/// Which listing table a CSV file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Properties,
    Schools,
}

impl ListingKind {
    pub fn record_kind(&self) -> RecordKind {
        match self {
            Self::Properties => RecordKind::Properties,
            Self::Schools => RecordKind::Schools,
        }
    }
}

/// A CSV row that can be stored as a listing.
pub trait ListingRecord: DeserializeOwned {
    const KIND: ListingKind;

    /// Checks that serde cannot express. `line` is the 1-based CSV line.
    fn validate(
        &self,
        line: usize,
    ) -> Result<(), ListingLoaderError>;

    fn to_fields(&self) -> FieldChanges;

    /// Identity used to skip rows that are already stored.
    fn identity(&self) -> (String, String);
}

/// One row of a properties CSV.
///
/// Columns: `name,city,type,listing_type,price,bedrooms,latitude,longitude`.
/// Every column but `name` may be empty.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PropertyRecord {
    pub name: String,
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub listing_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub price: Option<Decimal>,
    pub bedrooms: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub latitude: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub longitude: Option<Decimal>,
}

/// One row of a schools CSV.
///
/// Columns: `name,location,type,curriculum,grades,fees_range,rating,
/// transport,contact,website,latitude,longitude`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SchoolRecord {
    pub name: String,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub school_type: Option<String>,
    pub curriculum: Option<String>,
    pub grades: Option<String>,
    pub fees_range: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub rating: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub transport: bool,
    pub contact: Option<String>,
    pub website: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub latitude: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub longitude: Option<Decimal>,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .replace(',', "")
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    let Some(s) = s else {
        return Ok(false);
    };
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "0" => Ok(false),
        "true" | "yes" | "1" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "expected yes/no, got '{other}'"
        ))),
    }
}

fn require_name(
    name: &str,
    line: usize,
) -> Result<(), ListingLoaderError> {
    if name.trim().is_empty() {
        return Err(ListingLoaderError::MissingName { line });
    }
    Ok(())
}

fn identity_key(
    name: &str,
    place: Option<&str>,
) -> (String, String) {
    (
        name.trim().to_lowercase(),
        place.unwrap_or_default().trim().to_lowercase(),
    )
}

impl ListingRecord for PropertyRecord {
    const KIND: ListingKind = ListingKind::Properties;

    fn validate(
        &self,
        line: usize,
    ) -> Result<(), ListingLoaderError> {
        require_name(&self.name, line)?;
        match self.listing_type.as_deref() {
            None | Some("sell") | Some("buy") => Ok(()),
            Some(other) => Err(ListingLoaderError::InvalidListingType {
                line,
                value: other.to_string(),
            }),
        }
    }

    fn to_fields(&self) -> FieldChanges {
        let mut fields = FieldChanges::new();
        fields.insert("name".into(), self.name.trim().into());
        fields.insert("city".into(), self.city.clone().into());
        fields.insert("type".into(), self.property_type.clone().into());
        fields.insert("listing_type".into(), self.listing_type.clone().into());
        fields.insert("price".into(), self.price.into());
        fields.insert("bedrooms".into(), self.bedrooms.into());
        fields.insert("latitude".into(), self.latitude.into());
        fields.insert("longitude".into(), self.longitude.into());
        fields
    }

    fn identity(&self) -> (String, String) {
        identity_key(&self.name, self.city.as_deref())
    }
}

impl ListingRecord for SchoolRecord {
    const KIND: ListingKind = ListingKind::Schools;

    fn validate(
        &self,
        line: usize,
    ) -> Result<(), ListingLoaderError> {
        require_name(&self.name, line)?;
        match self.rating {
            Some(value) if value < Decimal::ZERO || value > Decimal::from(5) => {
                Err(ListingLoaderError::InvalidRating { line, value })
            }
            _ => Ok(()),
        }
    }

    fn to_fields(&self) -> FieldChanges {
        let mut fields = FieldChanges::new();
        fields.insert("name".into(), self.name.trim().into());
        fields.insert("location".into(), self.location.clone().into());
        fields.insert("type".into(), self.school_type.clone().into());
        fields.insert("curriculum".into(), self.curriculum.clone().into());
        fields.insert("grades".into(), self.grades.clone().into());
        fields.insert("fees_range".into(), self.fees_range.clone().into());
        fields.insert("rating".into(), self.rating.into());
        fields.insert("transport".into(), self.transport.into());
        fields.insert("contact".into(), self.contact.clone().into());
        fields.insert("website".into(), self.website.clone().into());
        fields.insert("latitude".into(), self.latitude.into());
        fields.insert("longitude".into(), self.longitude.into());
        fields
    }

    fn identity(&self) -> (String, String) {
        identity_key(&self.name, self.location.as_deref())
    }
}

/// Loader for property and school listings from CSV files.
///
/// Rows are inserted through the [`DataSource`] trait, so any backend
/// works. Rows whose name and place are already stored are skipped, which
/// makes reloading the same file a no-op.
pub struct ListingLoader;

impl ListingLoader {
    /// Parse and validate records from a CSV reader. Headers are matched by
    /// name, so column order does not matter.
    pub fn parse<T: ListingRecord, R: Read>(reader: R) -> Result<Vec<T>, ListingLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: T = result?;
            // Line 1 is the header.
            record.validate(index + 2)?;
            records.push(record);
        }

        Ok(records)
    }

    pub fn parse_properties<R: Read>(reader: R) -> Result<Vec<PropertyRecord>, ListingLoaderError> {
        Self::parse(reader)
    }

    pub fn parse_schools<R: Read>(reader: R) -> Result<Vec<SchoolRecord>, ListingLoaderError> {
        Self::parse(reader)
    }

    /// Insert the records that are not stored yet. Returns how many were
    /// inserted.
    pub async fn load<T: ListingRecord>(
        source: &dyn DataSource,
        records: &[T],
    ) -> Result<usize, ListingLoaderError> {
        let kind = T::KIND.record_kind();
        let place_key = match T::KIND {
            ListingKind::Properties => "city",
            ListingKind::Schools => "location",
        };

        let mut known: HashSet<(String, String)> = source
            .list(kind)
            .await?
            .iter()
            .map(|r| {
                identity_key(
                    r.text("name").unwrap_or_default(),
                    r.get(place_key).and_then(FieldValue::as_text),
                )
            })
            .collect();

        let mut inserted = 0;
        for record in records {
            if !known.insert(record.identity()) {
                debug!(%kind, name = %record.identity().0, "listing already stored, skipped");
                continue;
            }
            source.insert(kind, &record.to_fields()).await?;
            inserted += 1;
        }

        info!(%kind, inserted, skipped = records.len() - inserted, "listings loaded");
        Ok(inserted)
    }
}
