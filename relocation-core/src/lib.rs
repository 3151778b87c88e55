pub mod card;
pub mod db;
pub mod listing;
pub mod models;
pub mod profile;
pub mod session;
pub mod utils;
pub mod wizard;

pub use db::{DataSource, RepositoryError};
pub use models::*;
pub use session::Session;
