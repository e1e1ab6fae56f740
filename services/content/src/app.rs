//! HTTP gateway and gRPC application wiring.
//!
//! # Purpose
//! Builds the Axum gateway router and the tonic route table from one shared
//! [`ContentRpc`], so both protocols on the front door reach the same service.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::rpc::{ContentRpc, ContentServiceServer, descriptor};
use crate::service::ContentService;
use axum::Json;
use axum::Router;
use axum::http::Method;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub rpc: ContentRpc,
}

impl AppState {
    pub fn new(service: Arc<ContentService>) -> Self {
        Self {
            rpc: ContentRpc::new(service),
        }
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/healthz", axum::routing::get(api::contents::healthz))
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/contents",
            axum::routing::post(api::contents::store_content),
        )
        .route(
            "/contents/slug/:slug",
            axum::routing::get(api::contents::get_content_by_slug),
        )
        .route(
            "/contents/:id",
            axum::routing::get(api::contents::get_content)
                .patch(api::contents::update_content)
                .put(api::contents::update_content)
                .delete(api::contents::delete_content),
        )
        .route(
            "/openapi.json",
            axum::routing::get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(cors_layer())
        .layer(trace_layer)
        .with_state(state)
}

/// gRPC route table served on the h2c side of the front door: the content
/// service plus server reflection for tools such as grpcurl.
pub fn grpc_routes(
    state: &AppState,
) -> Result<tonic::service::Routes, tonic_reflection::server::Error> {
    let reflection = tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(descriptor::file_descriptor_set())
        .build_v1()?;
    Ok(tonic::service::Routes::new(ContentServiceServer::new(state.rpc.clone()))
        .add_service(reflection))
}
