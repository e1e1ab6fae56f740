//! HTTP gateway request/response types.
//!
//! Response envelopes reuse [`crate::model::ContentEnvelope`]; only the
//! request bodies and system payloads live here.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
    pub durable: bool,
}

/// Body of `GET /healthz`; always `{}`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct EmptyBody {}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct NewContentAttributesBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct StoreContentData {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    pub attributes: Option<NewContentAttributesBody>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct StoreContentBody {
    pub data: Option<StoreContentData>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct ExistingContentAttributesBody {
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UpdateContentData {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    /// Optional; when present it must match the path id.
    #[serde(default)]
    pub id: i64,
    pub attributes: Option<ExistingContentAttributesBody>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UpdateContentBody {
    pub data: Option<UpdateContentData>,
}
