// api/src/pipelines/admin_override_pipeline.rs

use crate::errors::AppError;
use crate::models::RegistrationStatus;
use crate::pipelines::contexts::AdminOverrideCtxData;
use learnhub_flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{info, warn};

/// AdminOverride: Confirmed or Cancelled only, and a cancelled registration stays cancelled.
pub fn register_admin_override_pipeline(flow: &Flow<AppError>) {
  let mut override_p = Pipeline::<AdminOverrideCtxData, AppError>::new(&[
    ("validate_requested_status", false, None),
    ("load_registration", false, None),
    ("apply_status", false, None),
  ]);

  override_p.on_step("validate_requested_status", |ctx_data: ContextData<AdminOverrideCtxData>| {
    Box::pin(async move {
      let requested = ctx_data.read().requested;
      match requested {
        RegistrationStatus::Confirmed | RegistrationStatus::Cancelled => Ok(PipelineControl::Continue),
        RegistrationStatus::Pending => Err(AppError::Validation(
          "Status must be either Confirmed or Cancelled.".to_string(),
        )),
      }
    })
  });

  override_p.on_step("load_registration", |ctx_data: ContextData<AdminOverrideCtxData>| {
    Box::pin(async move {
      let (ledger, registration_id, requested) = {
        let guard = ctx_data.read();
        (guard.services.ledger.clone(), guard.registration_id, guard.requested)
      };

      let current = ledger
        .get_by_id(registration_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Registration {} not found.", registration_id)))?;

      if current.status == RegistrationStatus::Cancelled && requested == RegistrationStatus::Confirmed {
        warn!(%registration_id, "Refused to confirm a cancelled registration.");
        return Err(AppError::Conflict(
          "A cancelled registration cannot be confirmed; the user must register again.".to_string(),
        ));
      }

      let unchanged = current.status == requested;
      ctx_data.write().registration = Some(current);
      if unchanged {
        info!(%registration_id, status = %requested, "Registration already has the requested status.");
        return Ok(PipelineControl::Stop);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  override_p.on_step("apply_status", |ctx_data: ContextData<AdminOverrideCtxData>| {
    Box::pin(async move {
      let (ledger, registration_id, requested) = {
        let guard = ctx_data.read();
        (guard.services.ledger.clone(), guard.registration_id, guard.requested)
      };

      // Confirming goes through the conditional write so a cancel landing after the load still wins.
      let updated = match requested {
        RegistrationStatus::Confirmed => ledger.confirm_payment(registration_id).await?,
        _ => ledger.set_status(registration_id, requested).await?,
      };
      info!(%registration_id, status = %updated.status, "Registration status overridden by admin.");

      ctx_data.write().registration = Some(updated);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flow.register_pipeline(override_p);
}
