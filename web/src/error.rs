use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};

use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = status_and_message(&self.0.error_kind);

        if status.is_server_error() {
            error!("Responding {status}: {:?}", self.0);
        } else {
            warn!("Responding {status}: {:?}", self.0);
        }

        let body = Json(json!({
            "success": false,
            "message": message,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// The single point where domain error kinds become HTTP statuses. Messages
// stay coarse on purpose: clients get a status and human-readable text, the
// logs get the full error tree.
fn status_and_message(error_kind: &DomainErrorKind) -> (StatusCode, String) {
    match error_kind {
        DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
            InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                EntityErrorKind::NotFound => {
                    (StatusCode::NOT_FOUND, "Resource not found".to_string())
                }
                EntityErrorKind::NoCredentials => {
                    (StatusCode::NOT_FOUND, "No keys found".to_string())
                }
                EntityErrorKind::Invalid => (StatusCode::BAD_REQUEST, "Bad request".to_string()),
                EntityErrorKind::Unauthenticated => {
                    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
                }
                EntityErrorKind::Other(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
            InternalErrorKind::Config | InternalErrorKind::Other(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
        DomainErrorKind::External(external_error_kind) => match external_error_kind {
            ExternalErrorKind::Network => (
                StatusCode::BAD_GATEWAY,
                "Upstream provider unreachable".to_string(),
            ),
            ExternalErrorKind::KeyRejected => (
                StatusCode::BAD_REQUEST,
                "The key you added is invalid".to_string(),
            ),
            ExternalErrorKind::Upstream(Some(status)) => (
                StatusCode::BAD_GATEWAY,
                format!("Upstream provider error (status {status})"),
            ),
            ExternalErrorKind::Upstream(None) => (
                StatusCode::BAD_GATEWAY,
                "Upstream provider error".to_string(),
            ),
            ExternalErrorKind::Other(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_records_map_to_not_found() {
        let (status, _) = status_and_message(&DomainErrorKind::Internal(
            InternalErrorKind::Entity(EntityErrorKind::NotFound),
        ));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn empty_aggregation_input_maps_to_not_found_with_its_own_message() {
        let (status, message) = status_and_message(&DomainErrorKind::Internal(
            InternalErrorKind::Entity(EntityErrorKind::NoCredentials),
        ));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "No keys found");
    }

    #[test]
    fn rejected_keys_map_to_bad_request() {
        let (status, message) =
            status_and_message(&DomainErrorKind::External(ExternalErrorKind::KeyRejected));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "The key you added is invalid");
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway_and_echo_the_status() {
        let (status, message) = status_and_message(&DomainErrorKind::External(
            ExternalErrorKind::Upstream(Some(503)),
        ));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(message.contains("503"));
    }

    #[test]
    fn unexpected_errors_are_redacted_to_a_generic_message() {
        let (status, message) = status_and_message(&DomainErrorKind::Internal(
            InternalErrorKind::Other("secret internal detail".to_string()),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("secret internal detail"));
    }
}
