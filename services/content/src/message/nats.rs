//! NATS implementation of the bus seams.
//!
//! One [`async_nats::Client`] is shared by the user lookups and the event
//! publisher. The client reconnects on its own; calls made while it is
//! disconnected fail and are reported to the caller.
use super::{BusError, EventPublisher, IdentityRequest, UserDirectory, UserReply};
use crate::model::ContentEnvelope;
use crate::rpc::convert;
use async_trait::async_trait;
use prost::Message;

#[derive(Clone)]
pub struct NatsBus {
    client: async_nats::Client,
    user_exists_subject: String,
}

impl NatsBus {
    /// Connect to `url`; lookups are sent on `user_exists_subject`.
    pub async fn connect(url: &str, user_exists_subject: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|err| BusError::Connect(err.to_string()))?;
        tracing::info!(subject = user_exists_subject, "connected to nats");
        Ok(Self::from_client(client, user_exists_subject))
    }

    pub fn from_client(client: async_nats::Client, user_exists_subject: &str) -> Self {
        Self {
            client,
            user_exists_subject: user_exists_subject.to_string(),
        }
    }
}

#[async_trait]
impl UserDirectory for NatsBus {
    async fn user_exists(&self, identity: &str) -> Result<bool, BusError> {
        let request = IdentityRequest {
            id: identity.to_string(),
        };
        let reply = self
            .client
            .request(
                self.user_exists_subject.clone(),
                request.encode_to_vec().into(),
            )
            .await
            .map_err(|err| BusError::Request(err.to_string()))?;
        UserReply::decode(reply.payload)?.into_result()
    }
}

#[async_trait]
impl EventPublisher for NatsBus {
    async fn publish(&self, subject: &str, event: &ContentEnvelope) -> Result<(), BusError> {
        let payload = convert::envelope_to_proto(event).encode_to_vec();
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|err| BusError::Publish(err.to_string()))
    }

    async fn close(&self) -> Result<(), BusError> {
        self.client
            .flush()
            .await
            .map_err(|err| BusError::Publish(err.to_string()))
    }
}
