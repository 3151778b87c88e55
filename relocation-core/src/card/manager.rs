use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::CardError;
use super::changes::{PendingChanges, buffered};
use crate::db::RepositoryError;
use crate::models::{FieldChanges, FieldValue, Record, RecordId};
use crate::utils::format_label;

/// Persists the committed edits of one record.
///
/// `original` is the record as the card holds it before the edit; multi-item
/// cards use it to address the row being saved.
#[async_trait]
pub trait CardSaver: Send + Sync {
    async fn save(
        &self,
        changes: &FieldChanges,
        original: &Record,
    ) -> Result<(), RepositoryError>;
}

/// What the card displays, each shape with its own edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardData {
    Single {
        record: Record,
        changes: FieldChanges,
    },
    Multi {
        records: Vec<Record>,
        changes: BTreeMap<RecordId, FieldChanges>,
    },
}

impl CardData {
    fn clear_changes(&mut self) {
        match self {
            Self::Single { changes, .. } => changes.clear(),
            Self::Multi { changes, .. } => changes.clear(),
        }
    }
}

/// One row of a card as it should be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub value: String,
    /// `true` when an input is shown instead of plain text.
    pub input: bool,
}

#[derive(Debug)]
pub struct SaveFailure {
    pub record_id: Option<RecordId>,
    pub error: RepositoryError,
}

/// Outcome of the save calls issued by one commit.
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Records whose save succeeded (`None` for a single-item card).
    pub saved: Vec<Option<RecordId>>,
    pub failed: Vec<SaveFailure>,
}

impl CommitReport {
    /// Number of save calls issued.
    pub fn calls(&self) -> usize {
        self.saved.len() + self.failed.len()
    }

    pub fn all_saved(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Returned by every call that ends an edit session. Either variant means
/// the caller must leave edit mode; pending changes are already gone.
#[must_use = "the caller owns the edit flag and must leave edit mode"]
#[derive(Debug)]
pub enum EditOutcome {
    Committed(CommitReport),
    Cancelled,
}

/// View/edit controller for one profile card.
///
/// The edit flag belongs to the caller and is passed in on reads; the card
/// only owns the buffered changes. Source data is not touched until a save
/// for it succeeds.
#[derive(Debug, Clone)]
pub struct EditableCard {
    title: String,
    data: CardData,
    excluded_keys: BTreeSet<String>,
    read_only_keys: BTreeSet<String>,
}

impl EditableCard {
    pub fn single(
        title: impl Into<String>,
        record: Record,
    ) -> Self {
        Self {
            title: title.into(),
            data: CardData::Single {
                record,
                changes: FieldChanges::new(),
            },
            excluded_keys: BTreeSet::new(),
            read_only_keys: BTreeSet::new(),
        }
    }

    /// Card over a list of records. Every record must carry an `id`.
    pub fn multi(
        title: impl Into<String>,
        records: Vec<Record>,
    ) -> Result<Self, CardError> {
        if let Some(position) = records.iter().position(|r| r.id().is_none()) {
            return Err(CardError::RecordWithoutId(position));
        }
        Ok(Self {
            title: title.into(),
            data: CardData::Multi {
                records,
                changes: BTreeMap::new(),
            },
            excluded_keys: BTreeSet::new(),
            read_only_keys: BTreeSet::new(),
        })
    }

    /// Keys that are neither shown nor editable.
    pub fn with_excluded_keys<'a>(
        mut self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.excluded_keys
            .extend(keys.into_iter().map(str::to_string));
        self
    }

    /// Keys that are shown as text even in edit mode.
    pub fn with_read_only_keys<'a>(
        mut self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.read_only_keys
            .extend(keys.into_iter().map(str::to_string));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn data(&self) -> &CardData {
        &self.data
    }

    pub fn is_multi_item(&self) -> bool {
        matches!(self.data, CardData::Multi { .. })
    }

    /// The card's records; a single-item card yields one.
    pub fn records(&self) -> &[Record] {
        match &self.data {
            CardData::Single { record, .. } => std::slice::from_ref(record),
            CardData::Multi { records, .. } => records,
        }
    }

    /// Stored records, for derived entries the owner keeps in step.
    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        match &mut self.data {
            CardData::Single { record, .. } => std::slice::from_mut(record),
            CardData::Multi { records, .. } => records,
        }
    }

    pub fn pending(&self) -> PendingChanges<'_> {
        match &self.data {
            CardData::Single { changes, .. } => PendingChanges::Single(changes),
            CardData::Multi { changes, .. } => PendingChanges::Multi(changes),
        }
    }

    pub fn is_excluded(
        &self,
        key: &str,
    ) -> bool {
        self.excluded_keys.contains(key)
    }

    /// Starts an edit session with an empty buffer.
    pub fn begin_edit(&mut self) {
        self.data.clear_changes();
        debug!(card = %self.title, "edit session started");
    }

    /// Buffers `value` for `key` without touching the source data.
    ///
    /// Multi-item cards need the id of one of their records; single-item
    /// cards refuse one.
    pub fn set_field(
        &mut self,
        key: &str,
        value: impl Into<FieldValue>,
        record_id: Option<RecordId>,
    ) -> Result<(), CardError> {
        if self.excluded_keys.contains(key) {
            return Err(CardError::ExcludedKey(key.to_string()));
        }
        if self.read_only_keys.contains(key) {
            return Err(CardError::ReadOnlyKey(key.to_string()));
        }

        match &mut self.data {
            CardData::Single { changes, .. } => {
                if record_id.is_some() {
                    return Err(CardError::UnexpectedRecordId);
                }
                changes.insert(key.to_string(), value.into());
            }
            CardData::Multi { records, changes } => {
                let id = record_id.ok_or(CardError::MissingRecordId)?;
                if !records.iter().any(|r| r.id() == Some(id)) {
                    return Err(CardError::UnknownRecord(id));
                }
                changes
                    .entry(id)
                    .or_default()
                    .insert(key.to_string(), value.into());
            }
        }
        Ok(())
    }

    /// The buffered value for `key` on `record` if there is one, else the
    /// record's own value. Records that are not this card's never see its
    /// buffer.
    pub fn resolve_display_value<'a>(
        &'a self,
        record: &'a Record,
        key: &str,
    ) -> Option<&'a FieldValue> {
        let pending = match &self.data {
            CardData::Single { record: own, changes } if is_same_record(own, record) => {
                changes.get(key)
            }
            CardData::Single { .. } => None,
            CardData::Multi { changes, .. } => buffered(changes, record.id(), key),
        };
        pending.or_else(|| record.get(key))
    }

    /// Rows to render for `record`, skipping excluded keys.
    pub fn field_views(
        &self,
        record: &Record,
        editing: bool,
    ) -> Vec<FieldView> {
        record
            .keys()
            .filter(|key| !self.excluded_keys.contains(*key))
            .map(|key| FieldView {
                key: key.to_string(),
                label: format_label(key),
                value: self
                    .resolve_display_value(record, key)
                    .map_or_else(|| FieldValue::Null.to_string(), ToString::to_string),
                input: editing && !self.read_only_keys.contains(key),
            })
            .collect()
    }

    /// Saves the buffered edits through `saver`, one record at a time.
    ///
    /// Single-item cards issue exactly one save. Multi-item cards issue one
    /// save per edited record in ascending id order and none for untouched
    /// records. A failed save is logged and reported but does not stop the
    /// remaining saves; there is no rollback. Successful saves are merged
    /// into the card's data. The buffer is empty afterwards in every case.
    pub async fn commit(
        &mut self,
        saver: &dyn CardSaver,
    ) -> EditOutcome {
        let mut report = CommitReport::default();

        match &mut self.data {
            CardData::Single { record, changes } => {
                let changes = std::mem::take(changes);
                match saver.save(&changes, record).await {
                    Ok(()) => {
                        record.apply_changes(&changes);
                        info!(card = %self.title, fields = changes.len(), "card saved");
                        report.saved.push(None);
                    }
                    Err(error) => {
                        error!(card = %self.title, %error, "card save failed");
                        report.failed.push(SaveFailure {
                            record_id: None,
                            error,
                        });
                    }
                }
            }
            CardData::Multi { records, changes } => {
                for (id, changes) in std::mem::take(changes) {
                    if changes.is_empty() {
                        continue;
                    }
                    let Some(record) = records.iter_mut().find(|r| r.id() == Some(id)) else {
                        warn!(card = %self.title, record = id, "edited record no longer present");
                        continue;
                    };
                    match saver.save(&changes, record).await {
                        Ok(()) => {
                            record.apply_changes(&changes);
                            info!(card = %self.title, record = id, "record saved");
                            report.saved.push(Some(id));
                        }
                        Err(error) => {
                            error!(card = %self.title, record = id, %error, "record save failed");
                            report.failed.push(SaveFailure {
                                record_id: Some(id),
                                error,
                            });
                        }
                    }
                }
            }
        }

        EditOutcome::Committed(report)
    }

    /// Drops the buffered edits without saving.
    pub fn cancel(&mut self) -> EditOutcome {
        self.data.clear_changes();
        debug!(card = %self.title, "edit session cancelled");
        EditOutcome::Cancelled
    }
}

// Rows with ids match by id; rows without one must be equal.
fn is_same_record(
    own: &Record,
    other: &Record,
) -> bool {
    match (own.id(), other.id()) {
        (Some(a), Some(b)) => a == b,
        _ => own == other,
    }
}
