// api/src/pipelines/capture_pipeline.rs

//! CaptureAndConfirm.
//!
//! Steps: parse and check the inputs, resolve the registration, capture with
//! the processor, then act on the processor's status. Only `Completed` writes
//! to the ledger. A failed write after a completed capture is reported on the
//! `reconciliation` log target and surfaces as `CaptureNotRecorded`.

use crate::errors::AppError;
use crate::models::RegistrationStatus;
use crate::orchestrator::CaptureOutcome;
use crate::pipelines::contexts::CaptureCtxData;
use crate::services::payment::CaptureStatus;
use learnhub_flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{error, event, info, warn, Level};
use uuid::Uuid;

/// The id is interpolated into the processor URL, so only a conservative alphabet is accepted.
pub fn validate_payment_id(payment_id: &str) -> Result<(), AppError> {
  if payment_id.is_empty() {
    return Err(AppError::Validation("paymentId is required.".to_string()));
  }
  if payment_id.len() > 64
    || !payment_id
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
  {
    return Err(AppError::Validation("paymentId is malformed.".to_string()));
  }
  Ok(())
}

pub fn register_capture_pipeline(flow: &Flow<AppError>) {
  let mut capture_p = Pipeline::<CaptureCtxData, AppError>::new(&[
    ("validate_capture_input", false, None),
    ("load_registration", false, None),
    ("capture_upstream_payment", false, None),
    ("apply_capture_outcome", false, None),
  ]);

  capture_p.on_step("validate_capture_input", |ctx_data: ContextData<CaptureCtxData>| {
    Box::pin(async move {
      let (raw_registration_id, payment_id) = {
        let guard = ctx_data.read();
        (guard.raw_registration_id.trim().to_string(), guard.payment_id.trim().to_string())
      };

      if raw_registration_id.is_empty() {
        return Err(AppError::Validation("registrationId is required.".to_string()));
      }
      let registration_id = Uuid::parse_str(&raw_registration_id).map_err(|_| {
        warn!(%raw_registration_id, "Malformed registration id on capture.");
        AppError::Validation("registrationId is invalid.".to_string())
      })?;
      validate_payment_id(&payment_id)?;

      let mut guard = ctx_data.write();
      guard.registration_id = Some(registration_id);
      guard.payment_id = payment_id;
      Ok(PipelineControl::Continue)
    })
  });

  capture_p.on_step("load_registration", |ctx_data: ContextData<CaptureCtxData>| {
    Box::pin(async move {
      let (ledger, registration_id) = {
        let guard = ctx_data.read();
        (guard.services.ledger.clone(), guard.registration_id)
      };
      let registration_id =
        registration_id.ok_or_else(|| AppError::Internal("Registration id missing after validation.".to_string()))?;

      let registration = ledger
        .get_by_id(registration_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Registration {} not found.", registration_id)))?;

      if registration.status == RegistrationStatus::Cancelled {
        warn!(%registration_id, "Capture attempted on a cancelled registration.");
        return Err(AppError::Conflict(
          "This registration was cancelled; register again before paying.".to_string(),
        ));
      }
      event!(Level::DEBUG, %registration_id, status = %registration.status, "Registration resolved for capture.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  capture_p.on_step("capture_upstream_payment", |ctx_data: ContextData<CaptureCtxData>| {
    Box::pin(async move {
      let (gateway, payment_id) = {
        let guard = ctx_data.read();
        (guard.services.gateway.clone(), guard.payment_id.clone())
      };

      let capture = gateway.capture_order(&payment_id).await?;
      info!(%payment_id, status = ?capture.status, "Processor answered capture.");

      ctx_data.write().capture = Some(capture);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  capture_p.on_step("apply_capture_outcome", |ctx_data: ContextData<CaptureCtxData>| {
    Box::pin(async move {
      let (ledger, registration_id, payment_id, status) = {
        let guard = ctx_data.read();
        (
          guard.services.ledger.clone(),
          guard.registration_id,
          guard.payment_id.clone(),
          guard.capture.as_ref().map(|c| c.status.clone()),
        )
      };
      let (registration_id, status) = match (registration_id, status) {
        (Some(id), Some(status)) => (id, status),
        _ => return Err(AppError::Internal("Capture context incomplete.".to_string())),
      };

      let outcome = match status {
        CaptureStatus::Completed => match ledger.confirm_payment(registration_id).await {
          Ok(registration) => {
            info!(%registration_id, %payment_id, "Registration confirmed after capture.");
            CaptureOutcome::Confirmed(registration)
          }
          Err(persist_err) => {
            error!(
              target: "reconciliation",
              %registration_id,
              %payment_id,
              error = %persist_err,
              "Payment captured upstream but registration was not confirmed."
            );
            return Err(AppError::CaptureNotRecorded {
              registration_id,
              payment_id,
              reason: persist_err.to_string(),
            });
          }
        },
        CaptureStatus::Pending => CaptureOutcome::PendingUpstream,
        CaptureStatus::Declined => CaptureOutcome::Declined,
        CaptureStatus::Failed => CaptureOutcome::Failed,
        CaptureStatus::Unknown(raw_status) => {
          warn!(%registration_id, %payment_id, %raw_status, "Processor returned an unclassified capture status.");
          return Err(AppError::UnclassifiedUpstreamStatus(raw_status));
        }
      };

      ctx_data.write().outcome = Some(outcome);
      Ok(PipelineControl::Continue)
    })
  });

  flow.register_pipeline(capture_p);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn payment_ids_are_restricted() {
    assert!(validate_payment_id("5O190127TN364715T").is_ok());
    assert!(validate_payment_id("MOCK-abc_123").is_ok());
    assert!(validate_payment_id("").is_err());
    assert!(validate_payment_id("../v1/oauth2/token").is_err());
    assert!(validate_payment_id("id with spaces").is_err());
  }
}
