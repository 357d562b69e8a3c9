use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::workflow::SubmissionStatus;

/// Failures raised by a `PortalStore`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("cannot move submission from {from} to {to}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Everything a handler can answer with besides success. The `Display` text
/// is what the client sees.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Unauthorized access. Please log in as {0}.")]
    Authorization(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid request method.")]
    MethodNotAllowed,

    #[error("{message}")]
    Persistence {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Failed to render page.")]
    Render(#[from] tera::Error),

    #[error("Internal server error.")]
    Internal(String),
}

impl PortalError {
    /// Wraps a store failure behind a fixed client-facing message.
    pub fn persistence(message: &'static str) -> impl FnOnce(StoreError) -> PortalError {
        move |source| PortalError::Persistence { message, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Authorization(_) => StatusCode::UNAUTHORIZED,
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Conflict(_) => StatusCode::CONFLICT,
            PortalError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            PortalError::Persistence { .. } | PortalError::Render(_) | PortalError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        match &self {
            PortalError::Persistence { message, source } => {
                tracing::error!("{}: {:?}", message, source);
            }
            PortalError::Render(e) => {
                tracing::error!("Template error: {:?}", e);
            }
            PortalError::Internal(detail) => {
                tracing::error!("{}", detail);
            }
            _ => {}
        }

        (
            self.status_code(),
            Json(Envelope::failure(self.to_string())),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoData {}

/// `{success, message, ...data}` body shared by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl Envelope<NoData> {
    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            data: NoData {},
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(Envelope<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        ApiSuccess(Envelope {
            success: true,
            message: message.into(),
            data,
        })
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_has_only_flag_and_message() {
        let body = serde_json::to_value(Envelope::failure("nope".to_string())).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "message": "nope"}));
    }

    #[test]
    fn persistence_message_hides_source() {
        let err = PortalError::persistence("Failed to update payment status.")(StoreError::Database(
            sqlx::Error::Protocol("relation \"submission_reviews\" does not exist".to_string()),
        ));
        assert_eq!(err.to_string(), "Failed to update payment status.");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
