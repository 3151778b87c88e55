pub mod factory;
pub mod repository;

pub use factory::{DataSourceFactory, DataSourceRegistry, DbConfig};
pub use repository::{DataSource, RepositoryError};
