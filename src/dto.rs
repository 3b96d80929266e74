//! # DTOs — JSON Request and Response Shapes
//!
//! Wire format for the REST API. Keys are camelCase and association lists use
//! wrapper objects so the payloads stay compatible with existing clients:
//!
//! ```json
//! {
//!   "title": "Integration test research",
//!   "fields":  [{ "field":  { "id": 1 } }],
//!   "tags":    [{ "tag":    { "id": 1 } }],
//!   "authors": [{ "author": { "id": 1 } }]
//! }
//! ```
//!
//! Responses expand each reference to the full catalog entry
//! (`{"field": {"id": 1, "name": "Computer Science"}}`).

use crate::error::StoreError;
use crate::models::{Author, Field, Research, ResearchStatus, Tag, UserType, MAX_TOP};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

// ── Research requests ───────────────────────────────────────────

/// Reference to an existing catalog row by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchFieldRef {
    pub field: IdRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchTagRef {
    pub tag: IdRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchAuthorRef {
    pub author: IdRef,
}

/// Body of `POST /api/Researches/` and `PUT /api/Researches/{id}`.
///
/// `title`, `summary` and the association lists treat a missing key or `null`
/// as empty. On update, omitted `status`, `publicationDate` and `thumbnail`
/// keep their stored values, while the three association lists always replace
/// the stored sets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default)]
    pub status: Option<ResearchStatus>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<ResearchFieldRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<ResearchTagRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<ResearchAuthorRef>,
}

impl ResearchRequest {
    pub fn field_ids(&self) -> Vec<i64> {
        self.fields.iter().map(|f| f.field.id).collect()
    }

    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|t| t.tag.id).collect()
    }

    pub fn author_ids(&self) -> Vec<i64> {
        self.authors.iter().map(|a| a.author.id).collect()
    }

    /// Reject ids that can never exist and lists that repeat an id.
    ///
    /// Existence of the referenced rows is checked by the store inside the
    /// write transaction.
    pub fn validate(&self) -> Result<(), StoreError> {
        check_ids("field", &self.field_ids())?;
        check_ids("tag", &self.tag_ids())?;
        check_ids("author", &self.author_ids())?;
        Ok(())
    }
}

/// Treat an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn check_ids(entity: &str, ids: &[i64]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for &id in ids {
        if id <= 0 {
            return Err(StoreError::validation(format!(
                "{} id must be positive, got {}",
                entity, id
            )));
        }
        if !seen.insert(id) {
            return Err(StoreError::validation(format!(
                "{} {} is listed more than once",
                entity, id
            )));
        }
    }
    Ok(())
}

// ── Research responses ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFieldItem {
    pub field: Field,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchTagItem {
    pub tag: Tag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchAuthorItem {
    pub author: Author,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub status: ResearchStatus,
    pub publication_date: String,
    pub thumbnail: String,
    pub last_updated: DateTime<Utc>,
    pub fields: Vec<ResearchFieldItem>,
    pub tags: Vec<ResearchTagItem>,
    pub authors: Vec<ResearchAuthorItem>,
}

impl From<Research> for ResearchResponse {
    fn from(r: Research) -> Self {
        ResearchResponse {
            id: r.id,
            title: r.title,
            summary: r.summary,
            status: r.status,
            publication_date: r.publication_date,
            thumbnail: r.thumbnail,
            last_updated: r.last_updated,
            fields: r.fields.into_iter().map(|field| ResearchFieldItem { field }).collect(),
            tags: r.tags.into_iter().map(|tag| ResearchTagItem { tag }).collect(),
            authors: r
                .authors
                .into_iter()
                .map(|author| ResearchAuthorItem { author })
                .collect(),
        }
    }
}

// ── Catalog requests ────────────────────────────────────────────

/// Body of `POST /api/Fields/` and `POST /api/Tags/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NamedRequest {
    pub name: String,
}

impl NamedRequest {
    /// Trimmed name, rejecting blank input.
    pub fn normalized_name(&self, entity: &str) -> Result<String, StoreError> {
        non_blank(entity, &self.name)
    }
}

/// Body of `POST /api/Authors/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_type: UserType,
}

impl AuthorRequest {
    pub fn normalized_name(&self) -> Result<String, StoreError> {
        non_blank("author", &self.name)
    }
}

fn non_blank(entity: &str, name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(format!(
            "{} name must not be empty",
            entity
        )));
    }
    Ok(trimmed.to_string())
}

// ── Listing ─────────────────────────────────────────────────────

/// Query string accepted by the listing endpoints (`?top=N`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub top: Option<i64>,
}

impl ListQuery {
    /// Resolve the row limit: `top` when given, clamped to `max_top`.
    pub fn limit(&self, max_top: i64) -> Result<i64, StoreError> {
        let max_top = max_top.clamp(1, MAX_TOP);
        match self.top {
            Some(top) if top < 1 => Err(StoreError::validation(format!(
                "top must be at least 1, got {}",
                top
            ))),
            Some(top) => Ok(top.min(max_top)),
            None => Ok(max_top),
        }
    }
}
