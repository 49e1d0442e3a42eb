//! # Earmark Assistant CLI (`ema`)
//!
//! The `ema` binary drives the earmark question-answering service. It
//! provides commands for database initialization, CSV import, offline
//! search, one-shot AI answers, and starting the HTTP API server.
//!
//! ## Usage
//!
//! ```bash
//! ema --config ./config/ema.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ema init` | Create the SQLite database and run schema migrations |
//! | `ema import <csv>` | Load earmark records from a CSV export |
//! | `ema search "<question>"` | Show what a question matches, without the LLM |
//! | `ema ask "<question>"` | Run the full pipeline and print the AI answer |
//! | `ema serve` | Start the JSON HTTP API server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use earmark_assistant::{ask, config, import, migrate, search, server};

/// Earmark Assistant — ask natural-language questions about U.S. federal
/// earmark (Community Project Funding) records.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ema.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ema",
    about = "Earmark Assistant — natural-language Q&A over federal earmark records",
    version,
    long_about = "Earmark Assistant answers questions about U.S. congressional earmarks. \
    Questions are parsed for members, fiscal years, agencies, and dollar bounds, matched \
    against a local SQLite copy of the earmark table, and answered by a hosted LLM with \
    the matching rows as context."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ema.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the earmarks table, its FTS index,
    /// and secondary indexes. Idempotent — running it twice is safe.
    Init,

    /// Import earmark records from a CSV file.
    ///
    /// Expects columns: year, member, recipient, amount, agency,
    /// subcommittee, account, budget_function, location. Rows are
    /// deduplicated by content hash, so re-importing is safe.
    Import {
        /// Path to the CSV file.
        csv: PathBuf,

        /// Parse and count rows without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what a question matches, without calling the LLM.
    ///
    /// Prints the extracted filters and the matching earmark rows.
    Search {
        /// The question or keyword phrase.
        question: String,

        /// Maximum number of rows to print.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Ask a question and print the AI-generated answer.
    ///
    /// Requires the OPENAI_API_KEY environment variable.
    Ask {
        /// The natural-language question.
        question: String,
    },

    /// Start the JSON HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { csv, dry_run } => {
            import::run_import(&cfg, &csv, dry_run).await?;
        }
        Commands::Search { question, limit } => {
            search::run_search(&cfg, &question, limit).await?;
        }
        Commands::Ask { question } => {
            ask::run_ask(&cfg, &question).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
