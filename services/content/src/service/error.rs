use crate::message::BusError;
use crate::store::StoreError;
use thiserror::Error;

/// Failure of a content operation, independent of the transport.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Unavailable(_) => "unavailable",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => ServiceError::NotFound(message),
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            StoreError::Validation(message) => ServiceError::InvalidArgument(message),
            StoreError::Unexpected(err) => ServiceError::Internal(err),
        }
    }
}

impl From<BusError> for ServiceError {
    fn from(err: BusError) -> Self {
        ServiceError::Unavailable(format!("user directory: {err}"))
    }
}

impl From<ServiceError> for tonic::Status {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(message) => tonic::Status::invalid_argument(message),
            ServiceError::NotFound(message) => tonic::Status::not_found(message),
            ServiceError::Conflict(message) => tonic::Status::already_exists(message),
            ServiceError::Unavailable(message) => tonic::Status::unavailable(message),
            ServiceError::Internal(err) => {
                tracing::error!(error = ?err, "content operation failed");
                tonic::Status::internal("internal error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn store_errors_keep_their_category() {
        assert!(matches!(
            ServiceError::from(StoreError::Conflict("dup".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Validation("bad".into())),
            ServiceError::InvalidArgument(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Unexpected(anyhow::anyhow!("io"))),
            ServiceError::Internal(_)
        ));
    }

    #[test]
    fn statuses_use_grpc_codes() {
        let cases = [
            (ServiceError::InvalidArgument("x".into()), Code::InvalidArgument),
            (ServiceError::NotFound("x".into()), Code::NotFound),
            (ServiceError::Conflict("x".into()), Code::AlreadyExists),
            (ServiceError::Unavailable("x".into()), Code::Unavailable),
            (ServiceError::Internal(anyhow::anyhow!("secret")), Code::Internal),
        ];
        for (err, code) in cases {
            assert_eq!(tonic::Status::from(err).code(), code);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let status = tonic::Status::from(ServiceError::Internal(anyhow::anyhow!("password=hunter2")));
        assert_eq!(status.message(), "internal error");
    }
}
