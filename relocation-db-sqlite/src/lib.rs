mod factory;
pub mod repository;
pub mod schema;
mod value;

pub use factory::SqliteDataSourceFactory;
pub use repository::SqliteDataSource;
