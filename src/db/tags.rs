//! Tag catalog: free keywords attached to researches.

use super::Database;
use crate::dto::NamedRequest;
use crate::error::StoreError;
use crate::models::Tag;
use tracing::info;

impl Database {
    /// Insert a tag. Names are trimmed and must be unique.
    pub async fn create_tag(&self, request: &NamedRequest) -> Result<Tag, StoreError> {
        let name = request.normalized_name("tag")?;
        let tag = sqlx::query_as::<_, Tag>("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
            .bind(&name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_constraint(e, format!("tag '{}' already exists", name)))?;
        info!(tag_id = tag.id, name = %tag.name, "tag created");
        Ok(tag)
    }

    pub async fn get_tag(&self, id: i64) -> Result<Tag, StoreError> {
        sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("tag", id))
    }

    pub async fn list_tags(&self, limit: i64) -> Result<Vec<Tag>, StoreError> {
        let rows = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY id LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
