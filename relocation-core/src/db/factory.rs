use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{DataSource, RepositoryError};

/// Which backend to open and where.
///
/// `backend` names a registered [`DataSourceFactory`]; the factory alone
/// interprets `connection_string`.
///
/// | backend    | connection_string examples                 |
/// |------------|--------------------------------------------|
/// | `sqlite`   | `relocation.db`, `:memory:`                |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens data sources for one storage backend. Backend crates export one
/// of these for the binaries to register.
#[async_trait]
pub trait DataSourceFactory: Send + Sync {
    /// Lowercase name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Returns a data source ready for queries; schema setup happens here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn DataSource>, RepositoryError>;
}

/// Backend factories by name. Binaries fill one at startup and open the
/// configured backend through [`DataSourceRegistry::create`].
pub struct DataSourceRegistry {
    factories: HashMap<&'static str, Box<dyn DataSourceFactory>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Adds `factory`, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn DataSourceFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens `config` with the factory registered under `config.backend`.
    ///
    /// An unregistered backend is a [`RepositoryError::Configuration`]
    /// naming the backends that are available. Factory errors are returned
    /// as they are.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn DataSource>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        tracing::debug!(
            backend = %config.backend,
            connection = %config.connection_string,
            "opening data source"
        );
        factory.create(config).await
    }
}

impl Default for DataSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{FieldChanges, FieldValue, Record, RecordId, RecordKind};

    /// Holds one profile; enough to tell which backend produced it.
    struct FixedSource(&'static str);

    #[async_trait]
    impl DataSource for FixedSource {
        async fn list(
            &self,
            kind: RecordKind,
        ) -> Result<Vec<Record>, RepositoryError> {
            let profile = Record::new().with("id", 1_i64).with("full_name", self.0);
            Ok(match kind {
                RecordKind::Profiles => vec![profile],
                _ => Vec::new(),
            })
        }

        async fn list_where(
            &self,
            _kind: RecordKind,
            _column: &str,
            _value: &FieldValue,
        ) -> Result<Vec<Record>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn get_by_id(
            &self,
            _kind: RecordKind,
            _id: RecordId,
        ) -> Result<Record, RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn update(
            &self,
            _kind: RecordKind,
            _id: RecordId,
            _fields: &FieldChanges,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn insert(
            &self,
            _kind: RecordKind,
            _fields: &FieldChanges,
        ) -> Result<RecordId, RepositoryError> {
            Ok(1)
        }
    }

    /// Remembers the connection strings it was asked to open.
    struct RecordingFactory {
        name: &'static str,
        opened: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingFactory {
        fn boxed(name: &'static str) -> (Box<dyn DataSourceFactory>, Arc<Mutex<Vec<String>>>) {
            let opened = Arc::new(Mutex::new(Vec::new()));
            let factory = Self {
                name,
                opened: opened.clone(),
            };
            (Box::new(factory), opened)
        }
    }

    #[async_trait]
    impl DataSourceFactory for RecordingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        async fn create(
            &self,
            config: &DbConfig,
        ) -> Result<Box<dyn DataSource>, RepositoryError> {
            self.opened
                .lock()
                .unwrap()
                .push(config.connection_string.clone());
            Ok(Box::new(FixedSource(self.name)))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl DataSourceFactory for Unreachable {
        fn backend_name(&self) -> &'static str {
            "remote"
        }

        async fn create(
            &self,
            config: &DbConfig,
        ) -> Result<Box<dyn DataSource>, RepositoryError> {
            Err(RepositoryError::Connection(format!(
                "{} did not answer",
                config.connection_string
            )))
        }
    }

    fn open(
        backend: &str,
        connection_string: &str,
    ) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: connection_string.to_string(),
        }
    }

    #[test]
    fn default_config_is_in_memory_sqlite() {
        assert_eq!(DbConfig::default(), open("sqlite", ":memory:"));
    }

    #[test]
    fn backends_are_listed_by_name() {
        let mut registry = DataSourceRegistry::default();
        assert!(registry.available_backends().is_empty());

        for name in ["sqlite", "remote", "sqlite"] {
            registry.register(RecordingFactory::boxed(name).0);
        }
        assert_eq!(registry.available_backends(), vec!["remote", "sqlite"]);
    }

    #[tokio::test]
    async fn create_opens_the_requested_backend() {
        let mut registry = DataSourceRegistry::new();
        let (sqlite, sqlite_opened) = RecordingFactory::boxed("sqlite");
        let (remote, remote_opened) = RecordingFactory::boxed("remote");
        registry.register(sqlite);
        registry.register(remote);

        let source = registry
            .create(&open("sqlite", "relocation.db"))
            .await
            .expect("sqlite is registered");
        let profiles = source.list(RecordKind::Profiles).await.unwrap();

        assert_eq!(profiles[0].text("full_name"), Some("sqlite"));
        assert_eq!(*sqlite_opened.lock().unwrap(), vec!["relocation.db".to_string()]);
        assert!(remote_opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_backend_lists_the_known_ones() {
        let mut registry = DataSourceRegistry::new();
        registry.register(RecordingFactory::boxed("sqlite").0);

        let Err(RepositoryError::Configuration(message)) =
            registry.create(&open("postgres", "")).await
        else {
            panic!("expected a configuration error");
        };
        assert!(message.contains("'postgres'"));
        assert!(message.contains("sqlite"));
    }

    #[tokio::test]
    async fn factory_errors_pass_through() {
        let mut registry = DataSourceRegistry::new();
        registry.register(Box::new(Unreachable));

        let result = registry.create(&open("remote", "db.internal")).await;
        assert_eq!(
            result.err(),
            Some(RepositoryError::Connection("db.internal did not answer".into()))
        );
    }
}
