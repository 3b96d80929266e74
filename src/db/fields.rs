//! Field catalog: the research areas a research can be filed under.

use super::Database;
use crate::dto::NamedRequest;
use crate::error::StoreError;
use crate::models::Field;
use tracing::info;

impl Database {
    /// Insert a field. Names are trimmed and must be unique.
    pub async fn create_field(&self, request: &NamedRequest) -> Result<Field, StoreError> {
        let name = request.normalized_name("field")?;
        let field = sqlx::query_as::<_, Field>(
            "INSERT INTO fields (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_constraint(e, format!("field '{}' already exists", name)))?;
        info!(field_id = field.id, name = %field.name, "field created");
        Ok(field)
    }

    pub async fn get_field(&self, id: i64) -> Result<Field, StoreError> {
        sqlx::query_as::<_, Field>("SELECT id, name FROM fields WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("field", id))
    }

    pub async fn list_fields(&self, limit: i64) -> Result<Vec<Field>, StoreError> {
        let rows = sqlx::query_as::<_, Field>("SELECT id, name FROM fields ORDER BY id LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
