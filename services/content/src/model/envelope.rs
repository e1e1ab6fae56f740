//! Resource envelope for content responses.
//!
//! # Purpose
//! Wraps a content record as `{data: {type, id, attributes, links}, links}`.
//! The same envelope is returned by the gateway and published on the bus.
use super::Content;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ContentAttributes {
    pub name: String,
    pub namespace: String,
    pub slug: String,
    pub content: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ContentData {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: i64,
    pub attributes: ContentAttributes,
    pub links: Links,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ContentEnvelope {
    pub data: ContentData,
    pub links: Links,
}

impl ContentEnvelope {
    /// Build the envelope for `content`, linking it under `base_url/resource/id`.
    pub fn new(content: Content, resource: &str, base_url: &str) -> Self {
        let self_link = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            resource,
            content.id
        );
        Self {
            data: ContentData {
                resource_type: resource.to_string(),
                id: content.id,
                attributes: ContentAttributes {
                    name: content.name,
                    namespace: content.namespace,
                    slug: content.slug,
                    content: content.content,
                    created_by: content.created_by,
                    updated_by: content.updated_by,
                    created_at: content.created_at,
                    updated_at: content.updated_at,
                },
                links: Links {
                    self_link: self_link.clone(),
                },
            },
            links: Links { self_link },
        }
    }
}
