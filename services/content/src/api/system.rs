//! System/health API handlers.
//!
//! `GET /healthz` only proves the process answers; this readiness probe also
//! touches the backing store.
use crate::api::error::{ApiError, api_unavailable};
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Service and storage are healthy", body = HealthStatus),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    let repository = state.rpc.service().repository();
    if let Err(err) = repository.health_check().await {
        tracing::error!(error = %err, backend = repository.backend_name(), "storage health check failed");
        return Err(api_unavailable("storage unavailable"));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        backend: repository.backend_name().to_string(),
        durable: repository.is_durable(),
    }))
}
