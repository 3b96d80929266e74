//! # Models — Persisted Entities
//!
//! Materialized records as they come out of PostgreSQL. These are the shapes
//! the store hands back; the wire format lives in [`crate::dto`].
//!
//! | Entity | Table | Associations |
//! |--------|-------|--------------|
//! | [`Research`] | `researches` | `research_fields`, `research_tags`, `research_authors` |
//! | [`Field`] | `fields` | none |
//! | [`Tag`] | `tags` | none |
//! | [`Author`] | `authors` | none |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on the number of records any listing endpoint returns.
pub const MAX_TOP: i64 = 100;

/// Raised when a stored enum column holds a value outside its closed set.
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

// ── Research status ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchStatus {
    #[default]
    Ongoing,
    Finished,
    Canceled,
}

impl ResearchStatus {
    pub const ALL: [ResearchStatus; 3] = [
        ResearchStatus::Ongoing,
        ResearchStatus::Finished,
        ResearchStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchStatus::Ongoing => "ongoing",
            ResearchStatus::Finished => "finished",
            ResearchStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ResearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ResearchStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ongoing" => Ok(ResearchStatus::Ongoing),
            "finished" => Ok(ResearchStatus::Finished),
            "canceled" => Ok(ResearchStatus::Canceled),
            other => Err(ParseEnumError {
                kind: "research status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ResearchStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ── Author user type ────────────────────────────────────────────

/// Role an author account plays in the publishing workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[default]
    Editor,
    Publicator,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Editor => "Editor",
            UserType::Publicator => "Publicator",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Editor" => Ok(UserType::Editor),
            "Publicator" => Ok(UserType::Publicator),
            other => Err(ParseEnumError {
                kind: "user type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for UserType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ── Catalog entities ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Field {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub user_type: UserType,
}

// ── Research ────────────────────────────────────────────────────

/// A research record with its associations resolved, in the order they were
/// supplied on the last write.
#[derive(Debug, Clone, PartialEq)]
pub struct Research {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub status: ResearchStatus,
    pub publication_date: String,
    pub thumbnail: String,
    pub last_updated: DateTime<Utc>,
    pub fields: Vec<Field>,
    pub tags: Vec<Tag>,
    pub authors: Vec<Author>,
}
