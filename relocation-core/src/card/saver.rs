use async_trait::async_trait;
use tracing::debug;

use super::CardSaver;
use crate::db::{DataSource, RepositoryError};
use crate::models::{FieldChanges, Record, RecordKind};

/// [`CardSaver`] that writes each record back to its table by id.
pub struct DataSourceSaver<'a> {
    source: &'a dyn DataSource,
    kind: RecordKind,
}

impl<'a> DataSourceSaver<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        kind: RecordKind,
    ) -> Self {
        Self { source, kind }
    }
}

#[async_trait]
impl CardSaver for DataSourceSaver<'_> {
    async fn save(
        &self,
        changes: &FieldChanges,
        original: &Record,
    ) -> Result<(), RepositoryError> {
        if changes.is_empty() {
            debug!(kind = %self.kind, "nothing to save");
            return Ok(());
        }
        let id = original.id().ok_or(RepositoryError::NotFound)?;
        self.source.update(self.kind, id, changes).await
    }
}
