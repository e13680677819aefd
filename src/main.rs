//! # DocuPilot CLI (`docupilot`)
//!
//! Manages the projects of a Docusaurus documentation site: wires them into
//! `docusaurus.config.js`, tracks them in a SQLite registry, and serves the
//! project API.
//!
//! ## Usage
//!
//! ```bash
//! docupilot --config ./config/docupilot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docupilot init` | Create the SQLite database and run schema migrations |
//! | `docupilot add "<title>"` | Add a project to the site config only |
//! | `docupilot remove <slug>` | Remove a project from the site config only |
//! | `docupilot nav` | List projects present in the site config |
//! | `docupilot create "<title>" --repo <url>` | Initialize, register and wire a project |
//! | `docupilot delete <slug>` | Back up, unregister and unwire a project |
//! | `docupilot list` | List registered projects |
//! | `docupilot search <term>` | Find active projects by title, description or slug |
//! | `docupilot purge <slug>` | Drop the registry record of a deleted project |
//! | `docupilot stats` | Registry statistics |
//! | `docupilot serve` | Start the HTTP API |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docupilot::{commands, config, migrate, server};

/// DocuPilot: project management for a Docusaurus documentation site.
#[derive(Parser)]
#[command(name = "docupilot", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docupilot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Add a project's plugin entry, navbar item and sidebar file.
    Add {
        /// Human-readable project title, e.g. "Tesla RHBme".
        title: String,
    },

    /// Remove a project's plugin entry, navbar item and sidebar file.
    Remove {
        /// Project slug, e.g. `tesla-rhbme`.
        slug: String,
    },

    /// List projects currently wired into the site config.
    Nav,

    /// Create a project: run the init script, register it, wire it in.
    Create {
        title: String,

        /// Repository URL (https://, git@host:path or ssh://git@...).
        #[arg(long)]
        repo: String,

        /// Branch to check out. Defaults to `[workspace].default_branch`.
        #[arg(long)]
        branch: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project, moving its directories into the backups folder.
    Delete { slug: String },

    /// List registered projects, newest first.
    List,

    /// Search active projects by title, description or slug.
    Search {
        term: String,

        /// Maximum number of results.
        #[arg(long, default_value = "20")]
        limit: i64,
    },

    /// Drop the registry record of a deleted project.
    Purge { slug: String },

    /// Show registry statistics.
    Stats,

    /// Start the HTTP API server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add { title } => {
            commands::run_add(&cfg, &title)?;
        }
        Commands::Remove { slug } => {
            commands::run_remove(&cfg, &slug)?;
        }
        Commands::Nav => {
            commands::run_nav(&cfg)?;
        }
        Commands::Create {
            title,
            repo,
            branch,
            description,
        } => {
            commands::run_create(&cfg, &title, &repo, branch, description).await?;
        }
        Commands::Delete { slug } => {
            commands::run_delete(&cfg, &slug).await?;
        }
        Commands::List => {
            commands::run_list(&cfg).await?;
        }
        Commands::Search { term, limit } => {
            commands::run_search(&cfg, &term, limit).await?;
        }
        Commands::Purge { slug } => {
            commands::run_purge(&cfg, &slug).await?;
        }
        Commands::Stats => {
            commands::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
