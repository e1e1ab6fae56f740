//! Content repository abstraction.
//!
//! # Purpose
//! Defines the capability interface every storage backend implements, plus the
//! shared error type. Backends are picked once at startup and never switched
//! while the process runs.
//!
//! # Backends
//! - [`arangodb::ArangoStore`]: single document collection with a JSON schema
//!   and a unique slug index.
//! - [`postgres::PostgresStore`]: `content` and `namespace` tables joined by a
//!   foreign key; namespaces are find-or-created inside the insert transaction.
//! - [`memory::InMemoryStore`]: process-local maps for development and tests.
use crate::model::{Content, ContentUpdate, NewContent};
use async_trait::async_trait;
use thiserror::Error;

pub mod arangodb;
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Content>>;
    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Content>>;
    /// Insert a new record. Fails with [`StoreError::Conflict`] when the slug
    /// is already taken.
    async fn add(&self, content: NewContent) -> StoreResult<Content>;
    /// Replace the payload and updater of an existing record.
    async fn edit(&self, id: i64, update: ContentUpdate) -> StoreResult<Content>;
    async fn delete(&self, id: i64) -> StoreResult<()>;
    async fn exists(&self, id: i64) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Structural checks shared by every backend before a write.
///
/// The document store enforces the same rules again through its collection
/// schema; the relational and in-memory backends rely on this alone.
pub(crate) fn validate_new(content: &NewContent) -> StoreResult<()> {
    let required = [
        ("name", &content.name),
        ("namespace", &content.namespace),
        ("slug", &content.slug),
        ("content", &content.content),
        ("created_by", &content.created_by),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("{field} is required")));
        }
    }
    Ok(())
}

pub(crate) fn validate_update(update: &ContentUpdate) -> StoreResult<()> {
    if update.content.trim().is_empty() {
        return Err(StoreError::Validation("content is required".into()));
    }
    if update.updated_by.trim().is_empty() {
        return Err(StoreError::Validation("updated_by is required".into()));
    }
    Ok(())
}
