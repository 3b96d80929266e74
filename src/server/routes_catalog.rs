//! Catalog endpoints for the rows a research can reference.
//!
//! Fields, tags and authors are created here and then linked from research
//! requests by id. Listing follows the same `?top=N` cap as researches. Every
//! store call is counted in `researches_store_operations_total`.

use super::AppState;
use crate::dto::{AuthorRequest, ListQuery, NamedRequest};
use crate::error::StoreError;
use crate::models::{Author, Field, Tag};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;

// ── Fields ──────────────────────────────────────────────────────

pub(super) async fn handler_field_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NamedRequest>, JsonRejection>,
) -> Result<Json<Field>, StoreError> {
    let Json(request) = payload?;
    let result = state.db.create_field(&request).await;
    state.prom_metrics.observe_store("field_create", &result);
    Ok(Json(result?))
}

pub(super) async fn handler_fields_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Field>>, StoreError> {
    let Query(query) = query?;
    let limit = query.limit(state.max_top)?;
    let result = state.db.list_fields(limit).await;
    state.prom_metrics.observe_store("field_list", &result);
    Ok(Json(result?))
}

pub(super) async fn handler_field_get(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Field>, StoreError> {
    let Path(id) = id?;
    let result = state.db.get_field(id).await;
    state.prom_metrics.observe_store("field_get", &result);
    Ok(Json(result?))
}

// ── Tags ────────────────────────────────────────────────────────

pub(super) async fn handler_tag_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NamedRequest>, JsonRejection>,
) -> Result<Json<Tag>, StoreError> {
    let Json(request) = payload?;
    let result = state.db.create_tag(&request).await;
    state.prom_metrics.observe_store("tag_create", &result);
    Ok(Json(result?))
}

pub(super) async fn handler_tags_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Tag>>, StoreError> {
    let Query(query) = query?;
    let limit = query.limit(state.max_top)?;
    let result = state.db.list_tags(limit).await;
    state.prom_metrics.observe_store("tag_list", &result);
    Ok(Json(result?))
}

pub(super) async fn handler_tag_get(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Tag>, StoreError> {
    let Path(id) = id?;
    let result = state.db.get_tag(id).await;
    state.prom_metrics.observe_store("tag_get", &result);
    Ok(Json(result?))
}

// ── Authors ─────────────────────────────────────────────────────

pub(super) async fn handler_author_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthorRequest>, JsonRejection>,
) -> Result<Json<Author>, StoreError> {
    let Json(request) = payload?;
    let result = state.db.create_author(&request).await;
    state.prom_metrics.observe_store("author_create", &result);
    Ok(Json(result?))
}

pub(super) async fn handler_authors_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Author>>, StoreError> {
    let Query(query) = query?;
    let limit = query.limit(state.max_top)?;
    let result = state.db.list_authors(limit).await;
    state.prom_metrics.observe_store("author_list", &result);
    Ok(Json(result?))
}

pub(super) async fn handler_author_get(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Author>, StoreError> {
    let Path(id) = id?;
    let result = state.db.get_author(id).await;
    state.prom_metrics.observe_store("author_get", &result);
    Ok(Json(result?))
}
