//! Integration tests for listing import against the SQLite backend.

use pretty_assertions::assert_eq;
use relocation_core::listing::{ListingFilter, ListingOutcome, SchoolQuery};
use relocation_core::{DataSource, FieldValue, RecordKind};
use relocation_data::{ListingLoader, ListingLoaderError};
use relocation_db_sqlite::SqliteDataSource;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const PROPERTIES_CSV: &str = include_str!("../test-data/properties.csv");
const SCHOOLS_CSV: &str = include_str!("../test-data/schools.csv");

/// Migrated database without seed data.
async fn setup_test_db() -> SqliteDataSource {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let source = SqliteDataSource::new_with_pool(pool).await;
    source
        .run_migrations()
        .await
        .expect("Failed to run migrations");

    source
}

#[tokio::test]
async fn test_load_all_properties() {
    let source = setup_test_db().await;

    let records =
        ListingLoader::parse_properties(PROPERTIES_CSV.as_bytes()).expect("Failed to parse CSV");
    let inserted = ListingLoader::load(&source, &records)
        .await
        .expect("Failed to load properties");

    assert_eq!(inserted, 5);

    let stored = source
        .list(RecordKind::Properties)
        .await
        .expect("Failed to list properties");
    assert_eq!(stored.len(), 5);
    assert_eq!(stored[0].text("name"), Some("Marina Loft"));
    assert_eq!(stored[0].get("price"), Some(&FieldValue::Decimal(dec!(1850000))));
    assert_eq!(stored[3].get("latitude"), Some(&FieldValue::Null));
    assert_eq!(stored[4].get("price"), Some(&FieldValue::Null));
}

#[tokio::test]
async fn test_reload_skips_stored_listings() {
    let source = setup_test_db().await;
    let records =
        ListingLoader::parse_properties(PROPERTIES_CSV.as_bytes()).expect("Failed to parse CSV");

    ListingLoader::load(&source, &records)
        .await
        .expect("Failed to load properties");
    let second = ListingLoader::load(&source, &records)
        .await
        .expect("Failed to reload properties");

    assert_eq!(second, 0);
    let stored = source
        .list(RecordKind::Properties)
        .await
        .expect("Failed to list properties");
    assert_eq!(stored.len(), 5);
}

#[tokio::test]
async fn test_loaded_properties_filter_by_listing_type() {
    let source = setup_test_db().await;
    let records =
        ListingLoader::parse_properties(PROPERTIES_CSV.as_bytes()).expect("Failed to parse CSV");
    ListingLoader::load(&source, &records)
        .await
        .expect("Failed to load properties");

    let stored = source
        .list(RecordKind::Properties)
        .await
        .expect("Failed to list properties");

    match ListingFilter::Buy.apply(&stored) {
        ListingOutcome::Items(items) => {
            let names: Vec<_> = items.iter().map(|p| p.text("name")).collect();
            assert_eq!(names, vec![Some("Al Reem Studio"), Some("Jumeirah Townhouse")]);
        }
        other => panic!("expected buy listings, got {other:?}"),
    }
}

#[tokio::test]
async fn test_load_schools_and_rank() {
    let source = setup_test_db().await;

    let records = ListingLoader::parse_schools(SCHOOLS_CSV.as_bytes()).expect("Failed to parse CSV");
    let inserted = ListingLoader::load(&source, &records)
        .await
        .expect("Failed to load schools");
    assert_eq!(inserted, 4);

    let stored = source
        .list(RecordKind::Schools)
        .await
        .expect("Failed to list schools");
    assert_eq!(stored[0].get("transport"), Some(&FieldValue::Bool(true)));
    assert_eq!(stored[3].get("transport"), Some(&FieldValue::Bool(false)));
    assert_eq!(stored[0].text("fees_range"), Some("45,000-80,000"));

    let top: Vec<_> = SchoolQuery::top_rated(2)
        .run(&stored)
        .iter()
        .map(|s| s.text("name"))
        .collect();
    assert_eq!(top, vec![Some("Dubai College"), Some("Raha International School")]);
}

#[tokio::test]
async fn test_load_fails_without_migrations() {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    let source = SqliteDataSource::new_with_pool(pool).await;

    let records =
        ListingLoader::parse_properties(PROPERTIES_CSV.as_bytes()).expect("Failed to parse CSV");
    let result = ListingLoader::load(&source, &records).await;

    assert!(matches!(result, Err(ListingLoaderError::Repository(_))));
}
