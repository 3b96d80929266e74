//! Research CRUD: create, get, list, update, delete.
//!
//! A research is stored as one `researches` row plus association rows in
//! `research_fields`, `research_tags` and `research_authors`. Updates replace
//! the association sets wholesale: existing rows are deleted and the new ids
//! inserted with their list position.
//!
//! ## Lifecycle
//!
//! 1. `create_research`: validates ids, checks they exist, inserts the row and
//!    its associations in one transaction, returns the materialized record
//! 2. `update_research`: locks the row (`FOR UPDATE`), replaces columns and
//!    association sets, refreshes `last_updated`
//! 3. `delete_research`: removes the row; association rows go with it
//!    through `ON DELETE CASCADE`

use super::{group_by_research, Database};
use crate::dto::ResearchRequest;
use crate::error::StoreError;
use crate::models::{Author, Field, Research, ResearchStatus, Tag};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::info;

const RESEARCH_COLUMNS: &str =
    "id, title, summary, status, publication_date, thumbnail, last_updated";

#[derive(sqlx::FromRow)]
struct ResearchRow {
    id: i64,
    title: String,
    summary: String,
    #[sqlx(try_from = "String")]
    status: ResearchStatus,
    publication_date: String,
    thumbnail: String,
    last_updated: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct FieldLink {
    research_id: i64,
    #[sqlx(flatten)]
    field: Field,
}

#[derive(sqlx::FromRow)]
struct TagLink {
    research_id: i64,
    #[sqlx(flatten)]
    tag: Tag,
}

#[derive(sqlx::FromRow)]
struct AuthorLink {
    research_id: i64,
    #[sqlx(flatten)]
    author: Author,
}

/// One many-to-many association: its join table, the catalog it points at,
/// and the entity name used in error messages.
struct Association {
    join_table: &'static str,
    column: &'static str,
    catalog: &'static str,
    entity: &'static str,
}

const FIELDS: Association = Association {
    join_table: "research_fields",
    column: "field_id",
    catalog: "fields",
    entity: "field",
};

const TAGS: Association = Association {
    join_table: "research_tags",
    column: "tag_id",
    catalog: "tags",
    entity: "tag",
};

const AUTHORS: Association = Association {
    join_table: "research_authors",
    column: "author_id",
    catalog: "authors",
    entity: "author",
};

impl Database {
    /// Create a research with its associations and return the stored record.
    pub async fn create_research(&self, request: &ResearchRequest) -> Result<Research, StoreError> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;
        ensure_references_exist(&mut tx, request).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO researches (title, summary, status, publication_date, thumbnail, last_updated)
             VALUES ($1, $2, $3, $4, $5, NOW())
             RETURNING id",
        )
        .bind(&request.title)
        .bind(&request.summary)
        .bind(request.status.unwrap_or_default().as_str())
        .bind(request.publication_date.as_deref().unwrap_or(""))
        .bind(request.thumbnail.as_deref().unwrap_or(""))
        .fetch_one(&mut *tx)
        .await?;

        replace_associations(&mut tx, id, request).await?;
        let research = load_research(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found("research", id))?;
        tx.commit().await?;

        info!(
            research_id = id,
            fields = research.fields.len(),
            tags = research.tags.len(),
            authors = research.authors.len(),
            "research created"
        );
        Ok(research)
    }

    /// Get a single research by id with its associations resolved.
    pub async fn get_research(&self, id: i64) -> Result<Research, StoreError> {
        let mut conn = self.pool.acquire().await?;
        load_research(&mut conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found("research", id))
    }

    /// List researches in insertion order, at most `limit` of them.
    pub async fn list_researches(&self, limit: i64) -> Result<Vec<Research>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, ResearchRow>(&format!(
            "SELECT {} FROM researches ORDER BY id LIMIT $1",
            RESEARCH_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
        Ok(attach_associations(&mut conn, rows).await?)
    }

    /// Replace a research's content and association sets.
    ///
    /// `title`, `summary` and the three association lists are always replaced.
    /// `status`, `publication_date` and `thumbnail` are replaced only when the
    /// request carries them.
    pub async fn update_research(
        &self,
        id: i64,
        request: &ResearchRequest,
    ) -> Result<Research, StoreError> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;
        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM researches WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(StoreError::not_found("research", id));
        }
        ensure_references_exist(&mut tx, request).await?;

        sqlx::query(
            "UPDATE researches
                SET title = $1,
                    summary = $2,
                    status = COALESCE($3, status),
                    publication_date = COALESCE($4, publication_date),
                    thumbnail = COALESCE($5, thumbnail),
                    last_updated = NOW()
              WHERE id = $6",
        )
        .bind(&request.title)
        .bind(&request.summary)
        .bind(request.status.map(|s| s.as_str()))
        .bind(request.publication_date.as_deref())
        .bind(request.thumbnail.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        replace_associations(&mut tx, id, request).await?;
        let research = load_research(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found("research", id))?;
        tx.commit().await?;

        info!(research_id = id, status = %research.status, "research updated");
        Ok(research)
    }

    /// Hard-delete a research and its association rows.
    pub async fn delete_research(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM researches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("research", id));
        }
        info!(research_id = id, "research deleted");
        Ok(())
    }
}

/// Fail with NotFound on the first referenced id missing from its catalog.
async fn ensure_references_exist(
    conn: &mut PgConnection,
    request: &ResearchRequest,
) -> Result<(), StoreError> {
    for (association, ids) in [
        (&FIELDS, request.field_ids()),
        (&TAGS, request.tag_ids()),
        (&AUTHORS, request.author_ids()),
    ] {
        if ids.is_empty() {
            continue;
        }
        let found: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE id = ANY($1)",
            association.catalog
        ))
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;
        if let Some(missing) = ids.iter().copied().find(|id| !found.contains(id)) {
            return Err(StoreError::not_found(association.entity, missing));
        }
    }
    Ok(())
}

/// Delete the research's association rows and insert the requested ones,
/// numbering `position` from zero in list order.
async fn replace_associations(
    conn: &mut PgConnection,
    research_id: i64,
    request: &ResearchRequest,
) -> Result<(), sqlx::Error> {
    for (association, ids) in [
        (&FIELDS, request.field_ids()),
        (&TAGS, request.tag_ids()),
        (&AUTHORS, request.author_ids()),
    ] {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE research_id = $1",
            association.join_table
        ))
        .bind(research_id)
        .execute(&mut *conn)
        .await?;

        if ids.is_empty() {
            continue;
        }
        sqlx::query(&format!(
            "INSERT INTO {} (research_id, {}, position)
             SELECT $1, t.ref_id, (t.ord - 1)::INTEGER
               FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(ref_id, ord)",
            association.join_table, association.column
        ))
        .bind(research_id)
        .bind(&ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_research(conn: &mut PgConnection, id: i64) -> Result<Option<Research>, sqlx::Error> {
    let row = sqlx::query_as::<_, ResearchRow>(&format!(
        "SELECT {} FROM researches WHERE id = $1",
        RESEARCH_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => Ok(attach_associations(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Resolve associations for a batch of rows with one query per join table.
async fn attach_associations(
    conn: &mut PgConnection,
    rows: Vec<ResearchRow>,
) -> Result<Vec<Research>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let field_links = sqlx::query_as::<_, FieldLink>(
        "SELECT rf.research_id, f.id, f.name
           FROM research_fields rf
           JOIN fields f ON f.id = rf.field_id
          WHERE rf.research_id = ANY($1)
          ORDER BY rf.research_id, rf.position",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let tag_links = sqlx::query_as::<_, TagLink>(
        "SELECT rt.research_id, t.id, t.name
           FROM research_tags rt
           JOIN tags t ON t.id = rt.tag_id
          WHERE rt.research_id = ANY($1)
          ORDER BY rt.research_id, rt.position",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let author_links = sqlx::query_as::<_, AuthorLink>(
        "SELECT ra.research_id, a.id, a.name, a.email, a.user_type
           FROM research_authors ra
           JOIN authors a ON a.id = ra.author_id
          WHERE ra.research_id = ANY($1)
          ORDER BY ra.research_id, ra.position",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut fields = group_by_research(field_links.into_iter().map(|l| (l.research_id, l.field)));
    let mut tags = group_by_research(tag_links.into_iter().map(|l| (l.research_id, l.tag)));
    let mut authors =
        group_by_research(author_links.into_iter().map(|l| (l.research_id, l.author)));

    Ok(rows
        .into_iter()
        .map(|row| Research {
            fields: fields.remove(&row.id).unwrap_or_default(),
            tags: tags.remove(&row.id).unwrap_or_default(),
            authors: authors.remove(&row.id).unwrap_or_default(),
            id: row.id,
            title: row.title,
            summary: row.summary,
            status: row.status,
            publication_date: row.publication_date,
            thumbnail: row.thumbnail,
            last_updated: row.last_updated,
        })
        .collect())
}
