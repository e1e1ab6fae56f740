//! Message bus seams: the user directory lookup and the lifecycle event
//! publisher.
//!
//! # Purpose
//! The orchestrator only talks to the bus through [`UserDirectory`] and
//! [`EventPublisher`]. The NATS implementation lives in [`nats`]; [`memory`]
//! holds in-process doubles used by tests and local runs, and [`DisabledBus`]
//! stands in when no bus is configured.
//!
//! # Wire format
//! Requests, replies and events are prost-encoded. The identity request and
//! user reply messages are declared here; events reuse the gRPC `Content`
//! message so subscribers decode the same resource the API returns.
use crate::model::ContentEnvelope;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod nats;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("message bus is not configured")]
    Disabled,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("upstream error {code}: {message}")]
    Upstream { code: i32, message: String },
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("malformed reply: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Request sent on the user-exists subject.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IdentityRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

/// Error carried inside a reply by the user service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReplyStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserReply {
    #[prost(bool, tag = "1")]
    pub exist: bool,
    #[prost(message, optional, tag = "2")]
    pub status: ::core::option::Option<ReplyStatus>,
}

impl UserReply {
    /// Interpret a reply: a carried status wins over the `exist` flag.
    pub fn into_result(self) -> Result<bool, BusError> {
        match self.status {
            Some(status) => Err(BusError::Upstream {
                code: status.code,
                message: status.message,
            }),
            None => Ok(self.exist),
        }
    }
}

/// Synchronous existence check against the external user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, identity: &str) -> Result<bool, BusError>;
}

/// Fire-and-forget publication of lifecycle events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, subject: &str, event: &ContentEnvelope) -> Result<(), BusError>;
    /// Flush anything buffered and release the connection.
    async fn close(&self) -> Result<(), BusError>;
}

/// Bus used when no broker URL is configured.
///
/// Lookups fail with [`BusError::Disabled`]; events are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBus;

#[async_trait]
impl UserDirectory for DisabledBus {
    async fn user_exists(&self, _identity: &str) -> Result<bool, BusError> {
        Err(BusError::Disabled)
    }
}

#[async_trait]
impl EventPublisher for DisabledBus {
    async fn publish(&self, subject: &str, event: &ContentEnvelope) -> Result<(), BusError> {
        tracing::debug!(subject, id = event.data.id, "message bus disabled, dropping event");
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        Ok(())
    }
}
