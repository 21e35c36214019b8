//! Error responses.
//!
//! Every failure leaves the server as `{"error": <class>, "message": ..}`.
//! Provider and store details go to the log; raw model output never reaches
//! a response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::artifacts::{ArtifactError, FailureClass};
use crate::brand::BrandField;
use crate::llms::GenerationError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
    missing: Option<Vec<BrandField>>,
    retryable: bool,
}

impl ApiError {
    fn new(status: StatusCode, error: impl ToString, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.to_string(),
            message: message.into(),
            missing: None,
            retryable: false,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "the x-user-id header is required",
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, FailureClass::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, FailureClass::NotFound, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ArtifactError> for ApiError {
    fn from(err: ArtifactError) -> Self {
        let class = err.class();
        let retryable = err.is_retryable();
        let mut api = match &err {
            ArtifactError::NotFound => Self::not_found("brand not found"),
            ArtifactError::Rejected { missing } => {
                let mut api = Self::new(StatusCode::BAD_REQUEST, class, err.to_string());
                api.missing = Some(missing.clone());
                api
            }
            ArtifactError::InvalidInput(message) => Self::bad_request(message.clone()),
            ArtifactError::Service(e) => {
                let status = match e {
                    GenerationError::Quota(_) => StatusCode::TOO_MANY_REQUESTS,
                    GenerationError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
                    GenerationError::Auth(_) | GenerationError::UnknownResponseShape(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                log::warn!("Generative service failure ({}): {}", e.kind(), e);
                let message = match e {
                    GenerationError::UnknownResponseShape(_) => {
                        "the generated output could not be processed".to_string()
                    }
                    other => format!("generative service failure: {}", other.kind()),
                };
                Self::new(status, class, message)
            }
            ArtifactError::Malformed(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                class,
                "the generated output could not be processed",
            ),
            ArtifactError::Store(e) => {
                log::error!("Store failure: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, class, "internal error")
            }
        };
        api.retryable = retryable;
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "message": self.message,
            "retryable": self.retryable,
        });
        if let Some(missing) = self.missing {
            body["missing"] = json!(missing);
        }
        (self.status, Json(body)).into_response()
    }
}
