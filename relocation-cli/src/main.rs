use std::fs;
use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use relocation_cli::app::{self, Assignment, WizardAnswers};
use relocation_cli::config::AppConfig;
use relocation_cli::logging;
use relocation_core::{RecordId, RecordKind};
use relocation_core::listing::{ListingFilter, SchoolQuery};
use relocation_core::profile::{ProfilePage, ProfileSection};
use relocation_core::wizard::WizardError;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Relocation assistant: questionnaire, profile cards and listings.
///
/// Settings come from `--config` (TOML) and are overridden by the flags
/// below.
#[derive(Debug, Parser)]
#[command(name = "relocation", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `relocation.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or `EnvFilter` directive. `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Keep log output off the terminal.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer the relocation questionnaire from a TOML file and store it.
    Wizard {
        /// Answers document.
        #[arg(long)]
        answers: PathBuf,

        #[arg(long, default_value_t = 1)]
        user_id: RecordId,

        /// Print the parsed profile instead of storing it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or edit a user's profile cards.
    Profile {
        #[arg(long, default_value_t = 1)]
        user_id: RecordId,

        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// List properties.
    Properties {
        /// all, sell or buy.
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: ListingFilter,
    },

    /// List schools, best rated first.
    Schools {
        /// Curriculum to look for (case-insensitive, partial match).
        #[arg(long)]
        curriculum: Option<String>,

        #[arg(long)]
        min_rating: Option<Decimal>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileAction {
    Show,

    /// Edit one card and save it.
    Edit {
        /// user, children or preferences.
        #[arg(long, value_parser = parse_section)]
        card: ProfileSection,

        /// `key=value`; repeat for several fields.
        #[arg(long = "set", required = true)]
        assignments: Vec<Assignment>,

        /// Child id, required when editing the children card.
        #[arg(long)]
        record: Option<RecordId>,
    },
}

fn parse_filter(s: &str) -> Result<ListingFilter, String> {
    ListingFilter::parse(s).ok_or_else(|| format!("unknown filter '{s}' (expected all, sell or buy)"))
}

fn parse_section(s: &str) -> Result<ProfileSection, String> {
    ProfileSection::parse(s)
        .ok_or_else(|| format!("unknown card '{s}' (expected user, children or preferences)"))
}

fn resolve_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(backend) = &cli.backend {
        config.database.backend = backend.clone();
    }
    if let Some(db) = &cli.db {
        config.database.connection_string = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_file.is_some() {
        config.logging.file = cli.log_file.clone();
    }
    if cli.quiet {
        config.logging.console = false;
    }
    Ok(config)
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.logging.level);
    if !config.logging.console {
        logging::set_console_enabled(false)?;
    }
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }

    let db_config = config.db_config();
    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let source = registry.create(&db_config).await.with_context(|| {
        format!(
            "Failed to open {} database '{}'",
            db_config.backend, db_config.connection_string
        )
    })?;

    match cli.command {
        Command::Wizard {
            answers,
            user_id,
            dry_run,
        } => {
            let text = fs::read_to_string(&answers)
                .with_context(|| format!("Failed to read answers: {}", answers.display()))?;
            let answers = WizardAnswers::from_toml_str(&text)
                .with_context(|| format!("Failed to parse answers: {}", answers.display()))?;

            let snapshot = match app::run_wizard(&answers) {
                Ok(snapshot) => snapshot,
                Err(WizardError::Validation { step, errors }) => {
                    println!("{step} is incomplete:\n{}", app::render_field_errors(&errors));
                    bail!("questionnaire not submitted");
                }
                Err(e) => return Err(e).context("questionnaire not submitted"),
            };
            let profile = snapshot.to_profile().map_err(|errors| {
                anyhow!("answers could not be read:\n{}", app::render_field_errors(&errors))
            })?;

            if dry_run {
                print!("{}", toml::to_string_pretty(&profile)?);
                return Ok(());
            }

            let summary = app::persist_submission(&*source, user_id, &profile)
                .await
                .context("Failed to save relocation profile")?;
            println!(
                "Saved relocation profile for user {user_id}: workplace #{}, {} child(ren).",
                summary.workplace_id,
                summary.children.len()
            );
        }

        Command::Profile { user_id, action } => {
            let session = app::sign_in(&*source, user_id)
                .await
                .context("Failed to look up user")?;
            if session.profile().is_none() {
                println!("{}", session.greeting());
                return Ok(());
            }
            let mut page = ProfilePage::load(&*source, &session).await?;

            if let Some(ProfileAction::Edit {
                card,
                assignments,
                record,
            }) = action
            {
                let report = app::edit_section(&mut page, &*source, card, &assignments, record).await?;
                if report.all_saved() {
                    println!("Saved {} record(s).", report.saved.len());
                } else {
                    println!("{}", card.failure_notice());
                }
                println!();
            }

            println!("{}", app::render_profile(&session, Some(&page)));
        }

        Command::Properties { filter } => {
            let properties = source
                .list(RecordKind::Properties)
                .await
                .context("Failed to load properties")?;
            println!("{}", app::render_properties(&properties, filter));
        }

        Command::Schools {
            curriculum,
            min_rating,
            limit,
        } => {
            let schools = source
                .list(RecordKind::Schools)
                .await
                .context("Failed to load schools")?;
            let query = SchoolQuery {
                curriculum,
                min_rating,
                limit,
            };
            println!("{}", app::render_schools(&schools, &query));
        }
    }

    Ok(())
}
