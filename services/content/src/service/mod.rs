//! Content lifecycle orchestration.
//!
//! # Purpose
//! [`ContentService`] composes the slug normalizer, the user directory, the
//! repository and the event publisher into the six content operations. Both
//! the gRPC surface and the HTTP gateway call into it.
//!
//! # Request flow
//! 1. Validate the request shape; nothing is touched on failure.
//! 2. Store only: ask the user directory whether the creator exists, bounded by
//!    `user_lookup_timeout`. This happens before any storage work.
//! 3. Update/Delete: check the record exists.
//! 4. Persist with a single repository call (the backend owns atomicity).
//! 5. Publish the lifecycle event on a spawned task. Failures are logged and
//!    counted, never returned.
//! 6. Return the envelope.
mod error;
mod validate;

pub use error::ServiceError;

use crate::message::{EventPublisher, UserDirectory};
use crate::model::{ContentEnvelope, ContentUpdate, NewContent};
use crate::slug;
use crate::store::ContentRepository;
use std::sync::Arc;
use std::time::Duration;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Subjects lifecycle events are published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub create: String,
    pub update: String,
    pub delete: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            create: "ContentService.Create".to_string(),
            update: "ContentService.Update".to_string(),
            delete: "ContentService.Delete".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Resource type name used in envelopes and links.
    pub resource: String,
    pub base_url: String,
    pub topics: Topics,
    pub user_lookup_timeout: Duration,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            resource: "contents".to_string(),
            base_url: base_url.into(),
            topics: Topics::default(),
            user_lookup_timeout: Duration::from_secs(10),
        }
    }

    pub fn validate(&self) -> ServiceResult<()> {
        let required = [
            ("resource", &self.resource),
            ("base_url", &self.base_url),
            ("topics.create", &self.topics.create),
            ("topics.update", &self.topics.update),
            ("topics.delete", &self.topics.delete),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ServiceError::InvalidArgument(format!(
                    "service config: {field} is required"
                )));
            }
        }
        if self.user_lookup_timeout.is_zero() {
            return Err(ServiceError::InvalidArgument(
                "service config: user_lookup_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Attributes accepted by Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContentAttributes {
    pub name: String,
    pub namespace: String,
    pub created_by: String,
    pub content: String,
}

/// Attributes accepted by Update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingContentAttributes {
    pub updated_by: String,
    pub content: String,
}

pub struct ContentService {
    config: ServiceConfig,
    repository: Arc<dyn ContentRepository>,
    directory: Arc<dyn UserDirectory>,
    publisher: Arc<dyn EventPublisher>,
}

impl ContentService {
    pub fn new(
        config: ServiceConfig,
        repository: Arc<dyn ContentRepository>,
        directory: Arc<dyn UserDirectory>,
        publisher: Arc<dyn EventPublisher>,
    ) -> ServiceResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            repository,
            directory,
            publisher,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn ContentRepository> {
        &self.repository
    }

    /// Liveness only; never consults dependencies.
    pub fn healthz(&self) {}

    pub async fn get_content(&self, id: i64) -> ServiceResult<ContentEnvelope> {
        record("get_content", self.fetch_by_id(id).await)
    }

    pub async fn get_content_by_slug(&self, slug: &str) -> ServiceResult<ContentEnvelope> {
        record("get_content_by_slug", self.fetch_by_slug(slug).await)
    }

    pub async fn store_content(
        &self,
        attributes: NewContentAttributes,
    ) -> ServiceResult<ContentEnvelope> {
        record("store_content", self.store(attributes).await)
    }

    pub async fn update_content(
        &self,
        id: i64,
        attributes: ExistingContentAttributes,
    ) -> ServiceResult<ContentEnvelope> {
        record("update_content", self.update(id, attributes).await)
    }

    pub async fn delete_content(&self, id: i64) -> ServiceResult<()> {
        record("delete_content", self.delete(id).await)
    }

    async fn fetch_by_id(&self, id: i64) -> ServiceResult<ContentEnvelope> {
        let content = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("id {id} not found")))?;
        Ok(self.envelope(content))
    }

    async fn fetch_by_slug(&self, slug: &str) -> ServiceResult<ContentEnvelope> {
        let content = self
            .repository
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("slug {slug} not found")))?;
        Ok(self.envelope(content))
    }

    async fn store(&self, attributes: NewContentAttributes) -> ServiceResult<ContentEnvelope> {
        validate::new_content(&attributes)?;
        let slug = slug::slug(&attributes.namespace, &attributes.name);
        if slug.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "name and namespace produce an empty slug".to_string(),
            ));
        }
        self.ensure_user(&attributes.created_by).await?;
        let created = self
            .repository
            .add(NewContent {
                name: attributes.name,
                namespace: attributes.namespace,
                slug,
                content: attributes.content,
                created_by: attributes.created_by,
            })
            .await?;
        let envelope = self.envelope(created);
        self.publish(&self.config.topics.create, &envelope);
        Ok(envelope)
    }

    async fn update(
        &self,
        id: i64,
        attributes: ExistingContentAttributes,
    ) -> ServiceResult<ContentEnvelope> {
        validate::existing_content(&attributes)?;
        if !self.repository.exists(id).await? {
            return Err(ServiceError::NotFound(format!("id {id} not found")));
        }
        let updated = self
            .repository
            .edit(
                id,
                ContentUpdate {
                    content: attributes.content,
                    updated_by: attributes.updated_by,
                },
            )
            .await?;
        let envelope = self.envelope(updated);
        self.publish(&self.config.topics.update, &envelope);
        Ok(envelope)
    }

    async fn delete(&self, id: i64) -> ServiceResult<()> {
        // The existing record doubles as the existence check and the event payload.
        let existing = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("id {id} not found")))?;
        self.repository.delete(id).await?;
        let envelope = self.envelope(existing);
        self.publish(&self.config.topics.delete, &envelope);
        Ok(())
    }

    async fn ensure_user(&self, identity: &str) -> ServiceResult<()> {
        let lookup = tokio::time::timeout(
            self.config.user_lookup_timeout,
            self.directory.user_exists(identity),
        )
        .await
        .map_err(|_| {
            ServiceError::Unavailable(format!("user directory: deadline exceeded for {identity}"))
        })?;
        if !lookup? {
            return Err(ServiceError::NotFound(format!("user {identity} not found")));
        }
        Ok(())
    }

    fn envelope(&self, content: crate::model::Content) -> ContentEnvelope {
        ContentEnvelope::new(content, &self.config.resource, &self.config.base_url)
    }

    fn publish(&self, subject: &str, envelope: &ContentEnvelope) {
        let publisher = self.publisher.clone();
        let subject = subject.to_string();
        let envelope = envelope.clone();
        tokio::spawn(async move {
            if let Err(err) = publisher.publish(&subject, &envelope).await {
                tracing::warn!(
                    subject = %subject,
                    id = envelope.data.id,
                    error = %err,
                    "content event publish failed"
                );
                metrics::counter!("content_event_publish_failures_total", "topic" => subject)
                    .increment(1);
            }
        });
    }
}

fn record<T>(op: &'static str, result: ServiceResult<T>) -> ServiceResult<T> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    metrics::counter!("content_requests_total", "op" => op, "outcome" => outcome).increment(1);
    result
}

#[cfg(test)]
mod tests;
