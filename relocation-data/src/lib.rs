mod loader;

pub use loader::{ListingKind, ListingLoader, ListingLoaderError, ListingRecord, PropertyRecord, SchoolRecord};
