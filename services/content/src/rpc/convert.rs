//! Conversions between the domain envelope and the wire messages.
use super::proto;
use crate::model::{ContentAttributes, ContentData, ContentEnvelope, Links};
use crate::service::{ExistingContentAttributes, NewContentAttributes};
use chrono::{DateTime, Utc};
use prost_types::Timestamp;

pub fn timestamp(value: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: value.timestamp(),
        nanos: value.timestamp_subsec_nanos() as i32,
    }
}

pub fn datetime(value: Option<&Timestamp>) -> Result<DateTime<Utc>, tonic::Status> {
    let value = value.ok_or_else(|| tonic::Status::internal("missing timestamp"))?;
    let nanos = u32::try_from(value.nanos)
        .map_err(|_| tonic::Status::internal("negative timestamp nanos"))?;
    DateTime::from_timestamp(value.seconds, nanos)
        .ok_or_else(|| tonic::Status::internal("timestamp out of range"))
}

fn links(links: &Links) -> proto::Links {
    proto::Links {
        self_link: links.self_link.clone(),
    }
}

pub fn envelope_to_proto(envelope: &ContentEnvelope) -> proto::Content {
    let data = &envelope.data;
    let attributes = &data.attributes;
    proto::Content {
        data: Some(proto::ContentData {
            r#type: data.resource_type.clone(),
            id: data.id,
            attributes: Some(proto::ContentAttributes {
                name: attributes.name.clone(),
                namespace: attributes.namespace.clone(),
                slug: attributes.slug.clone(),
                content: attributes.content.clone(),
                created_by: attributes.created_by.clone(),
                updated_by: attributes.updated_by.clone(),
                created_at: Some(timestamp(attributes.created_at)),
                updated_at: Some(timestamp(attributes.updated_at)),
            }),
            links: Some(links(&data.links)),
        }),
        links: Some(links(&envelope.links)),
    }
}

/// Rebuild the JSON envelope from a gRPC reply.
pub fn envelope_from_proto(content: proto::Content) -> Result<ContentEnvelope, tonic::Status> {
    let data = content
        .data
        .ok_or_else(|| tonic::Status::internal("content reply without data"))?;
    let attributes = data
        .attributes
        .ok_or_else(|| tonic::Status::internal("content reply without attributes"))?;
    Ok(ContentEnvelope {
        data: ContentData {
            resource_type: data.r#type,
            id: data.id,
            attributes: ContentAttributes {
                created_at: datetime(attributes.created_at.as_ref())?,
                updated_at: datetime(attributes.updated_at.as_ref())?,
                name: attributes.name,
                namespace: attributes.namespace,
                slug: attributes.slug,
                content: attributes.content,
                created_by: attributes.created_by,
                updated_by: attributes.updated_by,
            },
            links: Links {
                self_link: data.links.map(|l| l.self_link).unwrap_or_default(),
            },
        },
        links: Links {
            self_link: content.links.map(|l| l.self_link).unwrap_or_default(),
        },
    })
}

pub fn store_request(request: proto::StoreContentRequest) -> Result<NewContentAttributes, tonic::Status> {
    let attributes = request
        .data
        .and_then(|data| data.attributes)
        .ok_or_else(|| tonic::Status::invalid_argument("data.attributes is required"))?;
    Ok(NewContentAttributes {
        name: attributes.name,
        namespace: attributes.namespace,
        created_by: attributes.created_by,
        content: attributes.content,
    })
}

pub fn update_request(
    request: proto::UpdateContentRequest,
) -> Result<(i64, ExistingContentAttributes), tonic::Status> {
    let data = request
        .data
        .ok_or_else(|| tonic::Status::invalid_argument("data is required"))?;
    if data.id != 0 && data.id != request.id {
        return Err(tonic::Status::invalid_argument(format!(
            "data.id {} does not match id {}",
            data.id, request.id
        )));
    }
    let attributes = data
        .attributes
        .ok_or_else(|| tonic::Status::invalid_argument("data.attributes is required"))?;
    Ok((
        request.id,
        ExistingContentAttributes {
            updated_by: attributes.updated_by,
            content: attributes.content,
        },
    ))
}
