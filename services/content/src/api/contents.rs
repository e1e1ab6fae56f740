//! Content API handlers.
//!
//! # Purpose
//! Translates the JSON gateway routes into RPC requests and invokes the gRPC
//! implementation in-process, so both protocols share decoding, validation
//! and error mapping. RPC responses are converted back into the JSON envelope.
use crate::api::error::{ApiError, api_invalid_argument};
use crate::api::types::{EmptyBody, StoreContentBody, UpdateContentBody};
use crate::app::AppState;
use crate::model::ContentEnvelope;
use crate::rpc::content_service::content_service_server::ContentService as _;
use crate::rpc::{convert, proto};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use tonic::Request;

const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Forward inbound headers as gRPC metadata so trace context and request ids
/// survive the in-process hop.
fn rpc_request<T>(headers: &HeaderMap, message: T) -> Request<T> {
    let mut request = Request::new(message);
    *request.metadata_mut() = tonic::metadata::MetadataMap::from_headers(headers.clone());
    request
}

fn envelope(response: tonic::Response<proto::Content>) -> Result<ContentEnvelope, ApiError> {
    Ok(convert::envelope_from_proto(response.into_inner())?)
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "contents",
    responses(
        (status = 200, description = "Service is alive", body = EmptyBody)
    )
)]
pub(crate) async fn healthz(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EmptyBody>, ApiError> {
    state
        .rpc
        .healthz(rpc_request(&headers, proto::HealthzIdRequest::default()))
        .await
        .map_err(|status| ApiError::from(status).with_request_id(request_id(&headers)))?;
    Ok(Json(EmptyBody {}))
}

#[utoipa::path(
    get,
    path = "/contents/{id}",
    tag = "contents",
    params(
        ("id" = i64, Path, description = "Content identifier")
    ),
    responses(
        (status = 200, description = "Content record", body = ContentEnvelope),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse)
    )
)]
pub(crate) async fn get_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ContentEnvelope>, ApiError> {
    let with_id = |err: ApiError| err.with_request_id(request_id(&headers));
    let Path(id) = id.map_err(|err| with_id(err.into()))?;
    let response = state
        .rpc
        .get_content(rpc_request(&headers, proto::ContentIdRequest { id }))
        .await
        .map_err(|status| with_id(status.into()))?;
    envelope(response).map(Json).map_err(with_id)
}

#[utoipa::path(
    get,
    path = "/contents/slug/{slug}",
    tag = "contents",
    params(
        ("slug" = String, Path, description = "Content slug, `<namespace>-<name>`")
    ),
    responses(
        (status = 200, description = "Content record", body = ContentEnvelope),
        (status = 404, description = "Content not found", body = ErrorResponse)
    )
)]
pub(crate) async fn get_content_by_slug(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<ContentEnvelope>, ApiError> {
    let with_id = |err: ApiError| err.with_request_id(request_id(&headers));
    let response = state
        .rpc
        .get_content_by_slug(rpc_request(&headers, proto::ContentRequest { slug }))
        .await
        .map_err(|status| with_id(status.into()))?;
    envelope(response).map(Json).map_err(with_id)
}

#[utoipa::path(
    post,
    path = "/contents",
    tag = "contents",
    request_body = StoreContentBody,
    responses(
        (status = 201, description = "Content created", body = ContentEnvelope),
        (status = 400, description = "Invalid attributes", body = ErrorResponse),
        (status = 404, description = "Creator not found", body = ErrorResponse),
        (status = 409, description = "Slug already exists", body = ErrorResponse),
        (status = 503, description = "User directory unavailable", body = ErrorResponse)
    )
)]
pub(crate) async fn store_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<StoreContentBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let with_id = |err: ApiError| err.with_request_id(request_id(&headers));
    let Json(body) = body.map_err(|err| with_id(err.into()))?;
    let data = body
        .data
        .ok_or_else(|| with_id(api_invalid_argument("data is required")))?;
    let request = proto::StoreContentRequest {
        data: Some(proto::StoreContentData {
            r#type: data.resource_type,
            attributes: data.attributes.map(|attrs| proto::NewContentAttributes {
                name: attrs.name,
                namespace: attrs.namespace,
                created_by: attrs.created_by,
                content: attrs.content,
            }),
        }),
    };
    let response = state
        .rpc
        .store_content(rpc_request(&headers, request))
        .await
        .map_err(|status| with_id(status.into()))?;
    let created = envelope(response).map_err(with_id)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    patch,
    path = "/contents/{id}",
    tag = "contents",
    params(
        ("id" = i64, Path, description = "Content identifier")
    ),
    request_body = UpdateContentBody,
    responses(
        (status = 200, description = "Content updated", body = ContentEnvelope),
        (status = 400, description = "Invalid attributes or mismatched id", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse)
    )
)]
pub(crate) async fn update_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateContentBody>, JsonRejection>,
) -> Result<Json<ContentEnvelope>, ApiError> {
    let with_id = |err: ApiError| err.with_request_id(request_id(&headers));
    let Path(id) = id.map_err(|err| with_id(err.into()))?;
    let Json(body) = body.map_err(|err| with_id(err.into()))?;
    let data = body
        .data
        .ok_or_else(|| with_id(api_invalid_argument("data is required")))?;
    let request = proto::UpdateContentRequest {
        id,
        data: Some(proto::UpdateContentData {
            r#type: data.resource_type,
            id: data.id,
            attributes: data
                .attributes
                .map(|attrs| proto::ExistingContentAttributes {
                    updated_by: attrs.updated_by,
                    content: attrs.content,
                }),
        }),
    };
    let response = state
        .rpc
        .update_content(rpc_request(&headers, request))
        .await
        .map_err(|status| with_id(status.into()))?;
    envelope(response).map(Json).map_err(with_id)
}

#[utoipa::path(
    delete,
    path = "/contents/{id}",
    tag = "contents",
    params(
        ("id" = i64, Path, description = "Content identifier")
    ),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 404, description = "Content not found", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let with_id = |err: ApiError| err.with_request_id(request_id(&headers));
    let Path(id) = id.map_err(|err| with_id(err.into()))?;
    state
        .rpc
        .delete_content(rpc_request(&headers, proto::ContentIdRequest { id }))
        .await
        .map_err(|status| with_id(status.into()))?;
    Ok(StatusCode::NO_CONTENT)
}
