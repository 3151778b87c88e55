use std::collections::BTreeMap;

use crate::models::{FieldChanges, FieldValue, RecordId};

/// Read-only view of the edits buffered on a card.
///
/// The shape follows the card: a single-record card buffers one change
/// map, a multi-record card buffers one map per record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingChanges<'a> {
    Single(&'a FieldChanges),
    Multi(&'a BTreeMap<RecordId, FieldChanges>),
}

impl PendingChanges<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(changes) => changes.is_empty(),
            Self::Multi(by_record) => by_record.values().all(FieldChanges::is_empty),
        }
    }

    /// Number of buffered field edits across all records.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(changes) => changes.len(),
            Self::Multi(by_record) => by_record.values().map(FieldChanges::len).sum(),
        }
    }

    /// Changes buffered for one record of a multi-record card.
    pub fn for_record(
        &self,
        record_id: RecordId,
    ) -> Option<&FieldChanges> {
        match self {
            Self::Single(_) => None,
            Self::Multi(by_record) => by_record.get(&record_id),
        }
    }
}

/// Buffered value for `key` on the record with `record_id`.
pub(crate) fn buffered<'a>(
    by_record: &'a BTreeMap<RecordId, FieldChanges>,
    record_id: Option<RecordId>,
    key: &str,
) -> Option<&'a FieldValue> {
    record_id
        .and_then(|id| by_record.get(&id))
        .and_then(|changes| changes.get(key))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn multi_lookup_is_scoped_by_record() {
        let mut changes = FieldChanges::new();
        changes.insert("age".into(), FieldValue::from("7"));
        let mut by_record = BTreeMap::new();
        by_record.insert(10, changes);

        assert_eq!(buffered(&by_record, Some(10), "age"), Some(&FieldValue::from("7")));
        assert_eq!(buffered(&by_record, Some(11), "age"), None);
        assert_eq!(buffered(&by_record, None, "age"), None);

        let pending = PendingChanges::Multi(&by_record);
        assert_eq!(pending.len(), 1);
        assert!(pending.for_record(10).is_some());
    }

    #[test]
    fn records_with_empty_maps_count_as_empty() {
        let mut by_record = BTreeMap::new();
        by_record.insert(10, FieldChanges::new());
        assert!(PendingChanges::Multi(&by_record).is_empty());
    }
}
