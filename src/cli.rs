//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Each subcommand gets
//! its own tokio runtime and database connection.

use anyhow::Result;
use researches::db;
use researches::dto::{AuthorRequest, NamedRequest};
use tracing::info;

use super::{CatalogAction, Cli, ResearchAction};

/// Connections used by one-shot admin commands.
const ADMIN_MAX_CONNECTIONS: u32 = 2;

fn require_database_url(cli: &Cli) -> Result<&str> {
    cli.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url or env)")
    })
}

pub fn run_serve(
    cli: &Cli,
    port: u16,
    max_connections: u32,
    max_top: i64,
    migrate: bool,
) -> Result<()> {
    let database_url = require_database_url(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let database = db::Database::connect(database_url, max_connections).await?;
        if migrate {
            database.migrate().await?;
        }
        researches::server::run(port, database, max_top).await
    })
}

pub fn run_migrate(cli: &Cli) -> Result<()> {
    let database_url = require_database_url(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let database = rt.block_on(db::Database::connect(database_url, ADMIN_MAX_CONNECTIONS))?;
    rt.block_on(database.migrate())?;
    info!(target_db = %db::redact_database_url(database_url), "migration complete");
    Ok(())
}

pub fn run_research(cli: &Cli, action: &ResearchAction) -> Result<()> {
    let database_url = require_database_url(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let database = rt.block_on(db::Database::connect(database_url, ADMIN_MAX_CONNECTIONS))?;

    match action {
        ResearchAction::List { top } => {
            let limit = (*top).clamp(1, researches::models::MAX_TOP);
            let rows = rt.block_on(database.list_researches(limit))?;
            if rows.is_empty() {
                eprintln!("No researches found");
                return Ok(());
            }
            eprintln!(
                "{:<8} {:<10} {:<25} {:<6} {:<6} {:<6} {}",
                "ID", "STATUS", "LAST UPDATED", "FIELDS", "TAGS", "AUTH", "TITLE"
            );
            eprintln!("{}", "-".repeat(90));
            for r in &rows {
                eprintln!(
                    "{:<8} {:<10} {:<25} {:<6} {:<6} {:<6} {}",
                    r.id,
                    r.status,
                    r.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
                    r.fields.len(),
                    r.tags.len(),
                    r.authors.len(),
                    r.title
                );
            }
        }
        ResearchAction::Show { id } => {
            let r = rt.block_on(database.get_research(*id))?;
            eprintln!("Research {}: {}", r.id, r.title);
            eprintln!("  Status:        {}", r.status);
            eprintln!("  Published:     {}", r.publication_date);
            eprintln!("  Thumbnail:     {}", r.thumbnail);
            eprintln!("  Last updated:  {}", r.last_updated.to_rfc3339());
            eprintln!("  Summary:       {}", r.summary);
            eprintln!("  Fields:");
            for f in &r.fields {
                eprintln!("    - [{}] {}", f.id, f.name);
            }
            eprintln!("  Tags:");
            for t in &r.tags {
                eprintln!("    - [{}] {}", t.id, t.name);
            }
            eprintln!("  Authors:");
            for a in &r.authors {
                eprintln!("    - [{}] {} ({})", a.id, a.name, a.user_type);
            }
        }
    }
    Ok(())
}

pub fn run_catalog(cli: &Cli, action: &CatalogAction) -> Result<()> {
    let database_url = require_database_url(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let database = rt.block_on(db::Database::connect(database_url, ADMIN_MAX_CONNECTIONS))?;

    match action {
        CatalogAction::AddField { name } => {
            let field = rt.block_on(database.create_field(&NamedRequest { name: name.clone() }))?;
            eprintln!("Field '{}' created (id={})", field.name, field.id);
        }
        CatalogAction::AddTag { name } => {
            let tag = rt.block_on(database.create_tag(&NamedRequest { name: name.clone() }))?;
            eprintln!("Tag '{}' created (id={})", tag.name, tag.id);
        }
        CatalogAction::AddAuthor {
            name,
            email,
            user_type,
        } => {
            let author = rt.block_on(database.create_author(&AuthorRequest {
                name: name.clone(),
                email: email.clone(),
                user_type: *user_type,
            }))?;
            eprintln!(
                "Author '{}' created (id={}, type={})",
                author.name, author.id, author.user_type
            );
        }
    }
    Ok(())
}
