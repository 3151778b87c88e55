use std::path::PathBuf;

use async_trait::async_trait;
use relocation_core::db::{DataSource, DataSourceFactory, DbConfig, RepositoryError};
use tracing::info;

use crate::repository::SqliteDataSource;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`RELOCATION_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir** (`$CARGO_MANIFEST_DIR/seeds`) as last resort.
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELOCATION_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`DataSourceFactory`] for SQLite.
///
/// ```rust,no_run
/// use relocation_core::db::DataSourceRegistry;
/// use relocation_db_sqlite::SqliteDataSourceFactory;
///
/// let mut registry = DataSourceRegistry::new();
/// registry.register(Box::new(SqliteDataSourceFactory));
/// ```
pub struct SqliteDataSourceFactory;

#[async_trait]
impl DataSourceFactory for SqliteDataSourceFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open `config.connection_string` (a path, a `sqlite:` URL, or
    /// `:memory:`), migrate it and apply the seed files.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn DataSource>, RepositoryError> {
        let source = SqliteDataSource::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        source
            .run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        let seeds = seeds_dir();
        source
            .run_seeds(&seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        info!(database = %config.connection_string, seeds = %seeds.display(), "sqlite data source ready");
        Ok(Box::new(source))
    }
}

#[cfg(test)]
mod tests {
    use relocation_core::RecordKind;
    use relocation_core::db::{DataSourceFactory, DataSourceRegistry, DbConfig};

    use super::SqliteDataSourceFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteDataSourceFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_seeded_in_memory_source() {
        let mut registry = DataSourceRegistry::new();
        registry.register(Box::new(SqliteDataSourceFactory));

        let source = registry
            .create(&DbConfig::default())
            .await
            .expect("failed to create in-memory data source");

        let schools = source
            .list(RecordKind::Schools)
            .await
            .expect("Should list schools");
        assert!(!schools.is_empty());
    }
}
