use async_trait::async_trait;
use thiserror::Error;

use crate::models::{FieldChanges, FieldValue, Record, RecordId, RecordKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid field '{field}' for {kind}: {reason}")]
    InvalidField {
        kind: RecordKind,
        field: String,
        reason: String,
    },
}

/// Narrow contract over the hosted data store.
///
/// Every call is an opaque request/response; callers must handle the
/// failure path of each one.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<Record>, RepositoryError>;

    /// Rows of `kind` whose `column` equals `value` (e.g. children by `user_id`).
    async fn list_where(
        &self,
        kind: RecordKind,
        column: &str,
        value: &FieldValue,
    ) -> Result<Vec<Record>, RepositoryError>;

    async fn get_by_id(
        &self,
        kind: RecordKind,
        id: RecordId,
    ) -> Result<Record, RepositoryError>;

    async fn update(
        &self,
        kind: RecordKind,
        id: RecordId,
        fields: &FieldChanges,
    ) -> Result<(), RepositoryError>;

    async fn insert(
        &self,
        kind: RecordKind,
        fields: &FieldChanges,
    ) -> Result<RecordId, RepositoryError>;
}
