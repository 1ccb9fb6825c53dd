//! # Notion Routine CLI (`routine`)
//!
//! Provisions the daily-routine workspace and keeps its Monthly Summary
//! rollups current.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `routine setup` | Create all collections and seed today's entries |
//! | `routine seed` | Seed today's entries into existing collections |
//! | `routine summary create` | Create the Monthly Summary collection |
//! | `routine summary rollups` | Add missing rollup fields to the Monthly Summary |
//! | `routine inspect` | Print the Daily Routine schema and every linked schema |
//!
//! ## Environment
//!
//! | Variable | Used by |
//! |----------|---------|
//! | `NOTION_API_KEY` | all commands |
//! | `NOTION_PAGE_ID` | `setup`, `summary create` |
//! | `DAILY_ROUTINE_DB_ID` | `seed`, `summary`, `inspect` |
//! | `MONTHLY_SUMMARY_DB_ID` | `summary rollups` |
//!
//! A `.env` file in the working directory is loaded first. Log verbosity
//! follows `RUST_LOG` (default `notion_routine=info`); logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use notion_routine::{config, inspect, rollup, schema, seed, summary};

const DEFAULT_CONFIG: &str = "./config/routine.toml";
const DEFAULT_LOG_FILTER: &str = "notion_routine=info";

/// Provision and maintain a daily-routine workspace in Notion.
///
/// Ids and the credential come from the environment; `--config` may point
/// to a TOML file providing the API endpoint and collection ids.
#[derive(Parser)]
#[command(
    name = "routine",
    about = "Provision and maintain a daily-routine workspace in Notion",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Optional at the default location.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the supporting collections and the Daily Routine collection,
    /// then seed this month's budget record and today's routine record.
    ///
    /// Run once per workspace: collection creation is not idempotent.
    Setup,

    /// Seed this month's budget record (if absent) and a new routine record
    /// for today into existing collections.
    Seed,

    /// Manage the Monthly Summary collection.
    Summary {
        #[command(subcommand)]
        action: SummaryAction,
    },

    /// Print the Daily Routine schema and every collection it references.
    Inspect {
        /// Emit one JSON object per collection instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SummaryAction {
    /// Create the Monthly Summary collection.
    ///
    /// Supporting collections are discovered from the Daily Routine
    /// collection unless given explicitly.
    Create {
        /// Supporting collection as `NAME=ID` (repeatable).
        #[arg(long = "collection", value_parser = parse_key_val)]
        collections: Vec<(String, String)>,
    },

    /// Add the rollup fields that the Monthly Summary is missing.
    ///
    /// Safe to repeat: existing labels are never re-added.
    Rollups,
}

/// Parse a `key=value` pair for `--collection` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid NAME=ID: no '=' found in '{}'", s))?;
    let (name, id) = (s[..pos].trim(), s[pos + 1..].trim());
    if name.is_empty() || id.is_empty() {
        return Err(format!("invalid NAME=ID: empty name or id in '{}'", s));
    }
    Ok((name.to_string(), id.to_string()))
}

/// Log filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`] when
/// the variable is unset, blank or unparsable.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();

    let allow_missing = cli.config == PathBuf::from(DEFAULT_CONFIG);
    let cfg = config::load_config(&cli.config, allow_missing)?;

    match cli.command {
        Commands::Setup => {
            schema::run_setup(&cfg).await?;
        }
        Commands::Seed => {
            seed::run_seed(&cfg).await?;
        }
        Commands::Summary { action } => match action {
            SummaryAction::Create { collections } => {
                summary::run_create_summary(&cfg, collections).await?;
            }
            SummaryAction::Rollups => {
                rollup::run_rollups(&cfg).await?;
            }
        },
        Commands::Inspect { json } => {
            inspect::run_inspect(&cfg, json).await?;
        }
    }

    Ok(())
}
