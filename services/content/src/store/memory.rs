//! In-memory implementation of the content repository.
//!
//! # Purpose
//! Implements [`ContentRepository`] with process-local maps guarded by a
//! `tokio::sync::RwLock`. It exists for:
//! - local development without a database
//! - unit and HTTP tests of the service and gateway layers
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Every mutation holds the write lock for its whole duration, so the record
//!   map and the slug index never disagree.
//! - Ids are assigned from a counter starting at 1 and are never reused.
use super::{ContentRepository, StoreError, StoreResult, validate_new, validate_update};
use crate::model::{Content, ContentUpdate, NewContent};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    records: HashMap<i64, Content>,
    /// Unique index: slug → id.
    slugs: HashMap<String, i64>,
}

/// In-memory content repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentRepository for InMemoryStore {
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Content>> {
        let tables = self.tables.read().await;
        Ok(tables
            .slugs
            .get(slug)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Content>> {
        Ok(self.tables.read().await.records.get(&id).cloned())
    }

    async fn add(&self, content: NewContent) -> StoreResult<Content> {
        validate_new(&content)?;
        let mut tables = self.tables.write().await;
        if tables.slugs.contains_key(&content.slug) {
            return Err(StoreError::Conflict(format!(
                "slug {} already exists",
                content.slug
            )));
        }
        tables.next_id += 1;
        let id = tables.next_id;
        let now = Utc::now();
        let record = Content {
            id,
            name: content.name,
            namespace: content.namespace,
            slug: content.slug,
            content: content.content,
            updated_by: content.created_by.clone(),
            created_by: content.created_by,
            created_at: now,
            updated_at: now,
        };
        tables.slugs.insert(record.slug.clone(), id);
        tables.records.insert(id, record.clone());
        Ok(record)
    }

    async fn edit(&self, id: i64, update: ContentUpdate) -> StoreResult<Content> {
        validate_update(&update)?;
        let mut tables = self.tables.write().await;
        let record = tables
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("content {id}")))?;
        // Clock resolution can make `now` equal to the creation instant.
        let now = Utc::now().max(record.created_at + Duration::microseconds(1));
        record.content = update.content;
        record.updated_by = update.updated_by;
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let record = tables
            .records
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("content {id}")))?;
        tables.slugs.remove(&record.slug);
        Ok(())
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.read().await.records.contains_key(&id))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
