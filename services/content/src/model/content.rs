//! Content record definitions.
//!
//! # Purpose
//! Defines the stored content record and the attribute sets accepted by the
//! repository on insert and update.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored content record as returned by every repository backend.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Content {
    pub id: i64,
    pub name: String,
    pub namespace: String,
    pub slug: String,
    /// Opaque payload, returned byte-for-byte as stored.
    pub content: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes of a record about to be inserted.
///
/// The slug is computed by the caller before the record reaches a repository;
/// the repository only enforces its uniqueness.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub name: String,
    pub namespace: String,
    pub slug: String,
    pub content: String,
    pub created_by: String,
}

/// Mutable attributes of an existing record.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ContentUpdate {
    pub content: String,
    pub updated_by: String,
}
