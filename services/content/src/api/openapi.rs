//! OpenAPI document for the HTTP gateway, served at `/openapi.json`.
use crate::api::types::{
    EmptyBody, ErrorResponse, ExistingContentAttributesBody, HealthStatus,
    NewContentAttributesBody, StoreContentBody, StoreContentData, UpdateContentBody,
    UpdateContentData,
};
use crate::api::{contents, system};
use crate::model::{ContentAttributes, ContentData, ContentEnvelope, Links};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "modware-content",
        version = "v1",
        description = "dictyBase content service HTTP gateway"
    ),
    paths(
        contents::healthz,
        contents::get_content,
        contents::get_content_by_slug,
        contents::store_content,
        contents::update_content,
        contents::delete_content,
        system::system_health
    ),
    components(schemas(
        EmptyBody,
        ErrorResponse,
        HealthStatus,
        ContentEnvelope,
        ContentData,
        ContentAttributes,
        Links,
        StoreContentBody,
        StoreContentData,
        NewContentAttributesBody,
        UpdateContentBody,
        UpdateContentData,
        ExistingContentAttributesBody
    )),
    tags(
        (name = "contents", description = "Content lifecycle"),
        (name = "system", description = "Readiness")
    )
)]
pub struct ApiDoc;
