//! # Research REST API
//!
//! | Endpoint | Store call |
//! |----------|------------|
//! | `POST /api/Researches/` | [`Database::create_research`](crate::db::Database::create_research) |
//! | `GET /api/Researches/?top=N` | [`Database::list_researches`](crate::db::Database::list_researches) |
//! | `GET /api/Researches/{id}` | [`Database::get_research`](crate::db::Database::get_research) |
//! | `PUT /api/Researches/{id}` | [`Database::update_research`](crate::db::Database::update_research) |
//! | `DELETE /api/Researches/{id}` | [`Database::delete_research`](crate::db::Database::delete_research) |
//!
//! Success answers 200. Store errors render through
//! [`StoreError`]'s `IntoResponse` impl (404 / 400 / 500).

use super::AppState;
use crate::dto::{ListQuery, ResearchRequest, ResearchResponse};
use crate::error::StoreError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

pub(super) async fn handler_research_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<ResearchResponse>, StoreError> {
    let Json(request) = payload?;
    let result = state.db.create_research(&request).await;
    state.prom_metrics.observe_store("research_create", &result);
    Ok(Json(result?.into()))
}

pub(super) async fn handler_researches_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<ResearchResponse>>, StoreError> {
    let Query(query) = query?;
    let limit = query.limit(state.max_top)?;
    let result = state.db.list_researches(limit).await;
    state.prom_metrics.observe_store("research_list", &result);
    Ok(Json(result?.into_iter().map(ResearchResponse::from).collect()))
}

pub(super) async fn handler_research_get(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ResearchResponse>, StoreError> {
    let Path(id) = id?;
    let result = state.db.get_research(id).await;
    state.prom_metrics.observe_store("research_get", &result);
    Ok(Json(result?.into()))
}

pub(super) async fn handler_research_update(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<ResearchResponse>, StoreError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let result = state.db.update_research(id, &request).await;
    state.prom_metrics.observe_store("research_update", &result);
    Ok(Json(result?.into()))
}

pub(super) async fn handler_research_delete(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, StoreError> {
    let Path(id) = id?;
    let result = state.db.delete_research(id).await;
    state.prom_metrics.observe_store("research_delete", &result);
    result?;
    Ok(StatusCode::OK)
}
