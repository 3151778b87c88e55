use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use relocation_data::{ListingLoader, PropertyRecord, SchoolRecord};
use relocation_db_sqlite::SqliteDataSource;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Properties,
    Schools,
}

/// Load property or school listings from a CSV file into the database.
///
/// Properties CSV columns: name, city, type, listing_type (sell|buy), price,
/// bedrooms, latitude, longitude.
///
/// Schools CSV columns: name, location, type, curriculum, grades, fees_range,
/// rating (0-5), transport (yes|no), contact, website, latitude, longitude.
///
/// Only `name` is required; rows already stored (same name and place) are
/// skipped.
#[derive(Parser, Debug)]
#[command(name = "relocation-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// Which listings the file contains
    #[arg(short, long, value_enum)]
    kind: Kind,

    /// SQLite database URL (e.g., sqlite:relocation.db)
    #[arg(short, long, default_value = "sqlite:relocation.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let source = SqliteDataSource::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        source
            .run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        source
            .run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading {:?} from: {}", args.kind, args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let inserted = match args.kind {
        Kind::Properties => {
            let records: Vec<PropertyRecord> = ListingLoader::parse_properties(file)
                .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;
            println!("Parsed {} records from CSV", records.len());
            ListingLoader::load(&source, &records).await
        }
        Kind::Schools => {
            let records: Vec<SchoolRecord> = ListingLoader::parse_schools(file)
                .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;
            println!("Parsed {} records from CSV", records.len());
            ListingLoader::load(&source, &records).await
        }
    }
    .context("Failed to load listings into database")?;

    println!("Successfully loaded {} listings into the database.", inserted);

    Ok(())
}
