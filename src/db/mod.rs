//! # Database — PostgreSQL Storage Layer
//!
//! Async store operations over a `sqlx::PgPool`.
//!
//! ## Schema
//!
//! - `researches`: title, summary, status, publication_date, thumbnail, last_updated
//! - `fields`, `tags`, `authors`: catalogs a research can reference
//! - `research_fields`, `research_tags`, `research_authors`: association rows
//!   keyed by `(research_id, <entity>_id)` with a `position` column preserving
//!   client order
//!
//! The schema ships embedded in the binary ([`SCHEMA`]) and is applied by
//! [`Database::migrate`]. Every statement is idempotent.
//!
//! ## Module Structure
//!
//! - [`researches`]: Research CRUD and association replacement
//! - [`fields`], [`tags`], [`authors`]: catalog create/get/list
//!
//! Writes that touch more than one table run in a single transaction, so a
//! failed association check leaves no partial record behind.

mod authors;
mod fields;
mod researches;
mod tags;

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Full schema, applied by `researches migrate` and `serve --migrate`.
pub const SCHEMA: &str = include_str!("../../migrations/001_create_researches.sql");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and verify the connection with one checkout.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let opts: PgConnectOptions = database_url.parse()?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(opts)
            .await?;
        info!(
            target_db = %redact_database_url(database_url),
            max_connections,
            "connected to database"
        );
        Ok(Database { pool })
    }

    /// Build a pool without opening any connection until the first query.
    ///
    /// Lets the router come up (and serve health or validation failures) while
    /// the database is still unreachable.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self> {
        let opts: PgConnectOptions = database_url.parse()?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(opts);
        Ok(Database { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Database { pool }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check: execute `SELECT 1` to verify database connectivity.
    ///
    /// Used by the `/readyz` readiness probe.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    /// Apply the embedded schema.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("schema applied");
        Ok(())
    }
}

/// Render a connection URL as `host:port/database`, dropping credentials.
pub fn redact_database_url(database_url: &str) -> String {
    match url::Url::parse(database_url) {
        Ok(url) => format!(
            "{}:{}/{}",
            url.host_str().unwrap_or("localhost"),
            url.port().unwrap_or(5432),
            url.path().trim_start_matches('/')
        ),
        Err(_) => "<unparsable url>".to_string(),
    }
}

/// Group `(research_id, item)` pairs into per-research lists, keeping the
/// order in which rows arrived.
pub(crate) fn group_by_research<T>(
    links: impl IntoIterator<Item = (i64, T)>,
) -> std::collections::HashMap<i64, Vec<T>> {
    let mut grouped: std::collections::HashMap<i64, Vec<T>> = std::collections::HashMap::new();
    for (research_id, item) in links {
        grouped.entry(research_id).or_default().push(item);
    }
    grouped
}

// ── Tests ───────────────────────────────────────────────────────
