//! # Main — CLI Entry Point
//!
//! Routes CLI subcommands to the API server and to a few database
//! administration helpers.
//!
//! ## Subcommands
//!
//! - `serve`: run the REST API (optionally applying the schema first).
//! - `migrate`: apply the embedded schema and exit.
//! - `research list|show`: inspect stored researches from a terminal.
//! - `catalog add-field|add-tag|add-author`: seed the rows researches link to.
//!
//! ## Global Options
//!
//! - `--database-url` / `DATABASE_URL`: PostgreSQL connection URL.
//!
//! `LOG_FORMAT=json` switches logs to JSON lines; `RUST_LOG` sets the filter.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use researches::models::{UserType, MAX_TOP};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "researches", about = "Academic research records API")]
struct Cli {
    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API server
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 7001)]
        port: u16,
        /// Maximum pooled database connections
        #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
        max_connections: u32,
        /// Row cap for listing endpoints (1..=100)
        #[arg(long, default_value_t = MAX_TOP, value_parser = clap::value_parser!(i64).range(1..=MAX_TOP))]
        max_top: i64,
        /// Apply the database schema before accepting traffic
        #[arg(long)]
        migrate: bool,
    },
    /// Apply the database schema and exit
    Migrate,
    /// Inspect stored researches
    Research {
        #[command(subcommand)]
        action: ResearchAction,
    },
    /// Manage the fields, tags and authors researches link to
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum ResearchAction {
    /// List researches in insertion order
    List {
        /// Maximum number of rows (capped at 100)
        #[arg(long, default_value_t = MAX_TOP)]
        top: i64,
    },
    /// Show one research with its associations
    Show {
        /// Research id
        id: i64,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Add a research field
    AddField {
        /// Field name (must be unique)
        name: String,
    },
    /// Add a tag
    AddTag {
        /// Tag name (must be unique)
        name: String,
    },
    /// Add an author
    AddAuthor {
        /// Author display name
        name: String,
        /// Contact email
        #[arg(long, default_value = "")]
        email: String,
        /// Editor or Publicator
        #[arg(long, default_value = "Editor")]
        user_type: UserType,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize structured logging: LOG_FORMAT=json for K8s, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            port,
            max_connections,
            max_top,
            migrate,
        } => cli::run_serve(&cli, *port, *max_connections, *max_top, *migrate),
        Commands::Migrate => cli::run_migrate(&cli),
        Commands::Research { action } => cli::run_research(&cli, action),
        Commands::Catalog { action } => cli::run_catalog(&cli, action),
    }
}
