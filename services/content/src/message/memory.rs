//! In-process bus doubles.
//!
//! [`StaticUserDirectory`] answers lookups from a fixed set of identities and
//! [`ChannelPublisher`] forwards events into a tokio channel. Both can be told
//! to fail or stall so the orchestrator's error paths can be driven from tests.
use super::{BusError, EventPublisher, UserDirectory};
use crate::model::ContentEnvelope;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    known: HashSet<String>,
    failure: Option<(i32, String)>,
    delay: Option<Duration>,
}

impl StaticUserDirectory {
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: known.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Answer every lookup with an upstream error status.
    pub fn failing(code: i32, message: &str) -> Self {
        Self {
            failure: Some((code, message.to_string())),
            ..Self::default()
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn user_exists(&self, identity: &str) -> Result<bool, BusError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((code, message)) = &self.failure {
            return Err(BusError::Upstream {
                code: *code,
                message: message.clone(),
            });
        }
        Ok(self.known.contains(identity))
    }
}

/// A published event as observed by a [`ChannelPublisher`] receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub subject: String,
    pub event: ContentEnvelope,
}

#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<PublishedEvent>,
    fail: bool,
}

impl ChannelPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PublishedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                fail: false,
            },
            receiver,
        )
    }

    /// A publisher whose every publish fails; the receiver never sees events.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<PublishedEvent>) {
        let (mut publisher, receiver) = Self::new();
        publisher.fail = true;
        (publisher, receiver)
    }
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, subject: &str, event: &ContentEnvelope) -> Result<(), BusError> {
        if self.fail {
            return Err(BusError::Publish("publisher configured to fail".into()));
        }
        self.sender
            .send(PublishedEvent {
                subject: subject.to_string(),
                event: event.clone(),
            })
            .map_err(|_| BusError::Publish("receiver dropped".into()))
    }

    async fn close(&self) -> Result<(), BusError> {
        Ok(())
    }
}
