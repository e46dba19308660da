// api/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use learnhub_flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment Processor Error: {0}")]
  Upstream(String),

  #[error("Payment processor returned unclassified status '{0}'")]
  UnclassifiedUpstreamStatus(String),

  /// The processor captured the money but the registration could not be updated.
  #[error("Capture {payment_id} completed upstream but registration {registration_id} was not updated: {reason}")]
  CaptureNotRecorded {
    registration_id: uuid::Uuid,
    payment_id: String,
    reason: String,
  },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// Short machine-readable category used as the `error` field of responses.
  pub fn category(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "ValidationError",
      AppError::Auth(_) => "AuthError",
      AppError::Forbidden(_) => "Forbidden",
      AppError::NotFound(_) => "NotFound",
      AppError::Conflict(_) => "Conflict",
      AppError::Upstream(_) => "UpstreamError",
      AppError::UnclassifiedUpstreamStatus(_) => "UnclassifiedUpstreamStatus",
      AppError::CaptureNotRecorded { .. } => "PersistenceError",
      AppError::Config(_) => "ConfigError",
      AppError::Sqlx(_) => "PersistenceError",
      AppError::Workflow { .. } => "WorkflowError",
      AppError::Internal(_) => "InternalError",
    }
  }

  /// Text shown to clients. Database and processor internals stay in the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m) => m.clone(),
      AppError::Upstream(_) => "The payment processor could not complete the request.".to_string(),
      AppError::UnclassifiedUpstreamStatus(status) => {
        format!("The payment processor returned an unrecognised status: {}", status)
      }
      AppError::CaptureNotRecorded { .. } => {
        "Payment was captured but the enrollment could not be updated. Support has been notified.".to_string()
      }
      AppError::Sqlx(_) => "Database operation failed.".to_string(),
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        "An internal error occurred.".to_string()
      }
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Upstream(_)
      | AppError::UnclassifiedUpstreamStatus(_)
      | AppError::CaptureNotRecorded { .. }
      | AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::debug!(application_error = %self, "Responding with client error");
    }
    HttpResponse::build(status).json(json!({
      "error": self.category(),
      "message": self.public_message(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn duplicate_registration_is_a_bad_request() {
    let err = AppError::Conflict("already registered".into());
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.category(), "Conflict");
  }

  #[test]
  fn capture_not_recorded_is_distinct_from_upstream_failure() {
    let not_recorded = AppError::CaptureNotRecorded {
      registration_id: uuid::Uuid::nil(),
      payment_id: "PAY-1".into(),
      reason: "connection reset".into(),
    };
    let upstream = AppError::Upstream("timeout".into());
    assert_eq!(not_recorded.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(not_recorded.category(), upstream.category());
    assert!(!not_recorded.public_message().contains("connection reset"));
  }
}
