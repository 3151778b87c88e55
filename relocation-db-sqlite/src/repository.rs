use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use relocation_core::{
    DataSource, FieldChanges, FieldValue, Record, RecordId, RecordKind, RepositoryError,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use tracing::debug;

use crate::schema::{self, columns, select_all, writable_column};
use crate::value::{SqlValue, read_field, to_sql};

pub struct SqliteDataSource {
    pool: SqlitePool,
}

impl SqliteDataSource {
    /// Open `database_url`, creating the file if needed. Accepts sqlx URLs
    /// (`sqlite:relocation.db`), bare paths, and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "seed file applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_record(
        kind: RecordKind,
        row: &SqliteRow,
    ) -> Result<Record, RepositoryError> {
        columns(kind)
            .iter()
            .map(|column| Ok((column.name, read_field(row, *column)?)))
            .collect()
    }

    /// Validated `(column, value)` pairs for a write.
    fn bindings(
        kind: RecordKind,
        fields: &FieldChanges,
    ) -> Result<Vec<(&'static str, SqlValue)>, RepositoryError> {
        fields
            .iter()
            .map(|(key, value)| {
                let column = writable_column(kind, key)?;
                Ok((column.name, to_sql(kind, column, value)?))
            })
            .collect()
    }
}

#[async_trait]
impl DataSource for SqliteDataSource {
    async fn list(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<Record>, RepositoryError> {
        let rows = sqlx::query(&format!("{} ORDER BY id", select_all(kind)))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| Self::row_to_record(kind, row))
            .collect()
    }

    async fn list_where(
        &self,
        kind: RecordKind,
        column: &str,
        value: &FieldValue,
    ) -> Result<Vec<Record>, RepositoryError> {
        let column = schema::column(kind, column)?;
        let sql = format!("{} WHERE {} = ? ORDER BY id", select_all(kind), column.name);
        let query = to_sql(kind, column, value)?.bind(sqlx::query(&sql));

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| Self::row_to_record(kind, row))
            .collect()
    }

    async fn get_by_id(
        &self,
        kind: RecordKind,
        id: RecordId,
    ) -> Result<Record, RepositoryError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", select_all(kind)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        Self::row_to_record(kind, &row)
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: RecordId,
        fields: &FieldChanges,
    ) -> Result<(), RepositoryError> {
        let bindings = Self::bindings(kind, fields)?;
        if bindings.is_empty() {
            debug!(%kind, id, "empty update skipped");
            return Ok(());
        }

        let assignments: Vec<String> = bindings
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            kind.as_str(),
            assignments.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in bindings {
            query = value.bind(query);
        }
        let result = query
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!(%kind, id, fields = fields.len(), "record updated");
        Ok(())
    }

    async fn insert(
        &self,
        kind: RecordKind,
        fields: &FieldChanges,
    ) -> Result<RecordId, RepositoryError> {
        let bindings = Self::bindings(kind, fields)?;

        let sql = if bindings.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", kind.as_str())
        } else {
            let names: Vec<&str> = bindings.iter().map(|(name, _)| *name).collect();
            let placeholders = vec!["?"; names.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                kind.as_str(),
                names.join(", "),
                placeholders
            )
        };

        let mut query = sqlx::query(&sql);
        for (_, value) in bindings {
            query = value.bind(query);
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        debug!(%kind, id, "record inserted");
        Ok(id)
    }
}
