//! Author catalog.
//!
//! Authors are user accounts with a `user_type` of `Editor` (default) or
//! `Publicator`. Unlike fields and tags, names are not unique: two people can
//! share a name.

use super::Database;
use crate::dto::AuthorRequest;
use crate::error::StoreError;
use crate::models::Author;
use tracing::info;

impl Database {
    pub async fn create_author(&self, request: &AuthorRequest) -> Result<Author, StoreError> {
        let name = request.normalized_name()?;
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name, email, user_type) VALUES ($1, $2, $3)
             RETURNING id, name, email, user_type",
        )
        .bind(&name)
        .bind(request.email.trim())
        .bind(request.user_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_constraint(e, format!("author '{}' already exists", name)))?;
        info!(author_id = author.id, user_type = %author.user_type, "author created");
        Ok(author)
    }

    pub async fn get_author(&self, id: i64) -> Result<Author, StoreError> {
        sqlx::query_as::<_, Author>(
            "SELECT id, name, email, user_type FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("author", id))
    }

    pub async fn list_authors(&self, limit: i64) -> Result<Vec<Author>, StoreError> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT id, name, email, user_type FROM authors ORDER BY id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
