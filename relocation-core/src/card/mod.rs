//! Editable profile cards.
//!
//! A card shows one record or a list of records, each shape carrying its
//! own edit buffer ([`CardData`]). While the caller's edit flag is on,
//! edits are buffered there and only reach the store through a
//! [`CardSaver`] on commit.

mod changes;
mod manager;
mod saver;

use thiserror::Error;

use crate::models::RecordId;

pub use changes::PendingChanges;
pub use manager::{
    CardData, CardSaver, CommitReport, EditOutcome, EditableCard, FieldView, SaveFailure,
};
pub use saver::DataSourceSaver;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("field '{0}' is not shown on this card")]
    ExcludedKey(String),

    #[error("field '{0}' is read-only")]
    ReadOnlyKey(String),

    #[error("no record with id {0} on this card")]
    UnknownRecord(RecordId),

    #[error("a record id is required to edit a multi-item card")]
    MissingRecordId,

    #[error("a single-item card does not take a record id")]
    UnexpectedRecordId,

    #[error("record at position {0} has no id")]
    RecordWithoutId(usize),
}
