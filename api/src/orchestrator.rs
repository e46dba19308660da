// api/src/orchestrator.rs

//! Drives a registration from creation to confirmation.
//!
//! Each operation seeds a context, runs the pipeline registered for it and
//! reads the result back. Upstream failures are reported, never retried here:
//! retrying a capture is the client's move.

use crate::errors::{AppError, Result};
use crate::models::{Registration, RegistrationStatus};
use crate::pipelines::{
  self,
  contexts::{AdminOverrideCtxData, CaptureCtxData, EnrollCtxData, RequestOrderCtxData},
};
use crate::services::payment::OrderHandle;
use crate::state::EnrollmentServices;
use learnhub_flow::{ContextData, Flow};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Result of a capture the processor answered with a known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
  Confirmed(Registration),
  /// Processor is still working on it; nothing recorded.
  PendingUpstream,
  Declined,
  Failed,
}

#[derive(Clone)]
pub struct Orchestrator {
  flow: Arc<Flow<AppError>>,
  services: EnrollmentServices,
}

/// Takes the context's data back once the pipeline has released its clones.
fn into_inner<T: Send + Sync + 'static>(ctx: ContextData<T>) -> Result<T> {
  ctx
    .try_into_inner()
    .map_err(|_| AppError::Internal("Pipeline context still shared after run.".to_string()))
}

impl Orchestrator {
  /// `flow` must already hold the enrollment pipelines.
  pub fn new(flow: Arc<Flow<AppError>>, services: EnrollmentServices) -> Self {
    Self { flow, services }
  }

  /// Builds a private registry with just the enrollment pipelines.
  pub fn standalone(services: EnrollmentServices) -> Self {
    let flow = Arc::new(Flow::<AppError>::new());
    pipelines::register_enrollment_pipelines(&flow);
    Self::new(flow, services)
  }

  pub fn services(&self) -> &EnrollmentServices {
    &self.services
  }

  /// Creates a registration: `Confirmed` for free courses, otherwise `Pending`.
  #[instrument(name = "orchestrator::enroll", skip(self), err(Display))]
  pub async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> Result<Registration> {
    let ctx = ContextData::new(EnrollCtxData {
      services: self.services.clone(),
      user_id,
      course_id,
      price: None,
      registration: None,
    });
    self.flow.run(ctx.clone()).await?;
    into_inner(ctx)?
      .registration
      .ok_or_else(|| AppError::Internal("Enrollment finished without a registration.".to_string()))
  }

  /// Asks the processor for an order. The ledger is not touched.
  #[instrument(name = "orchestrator::request_order", skip(self), fields(%amount), err(Display))]
  pub async fn request_order(&self, amount: Decimal) -> Result<OrderHandle> {
    let ctx = ContextData::new(RequestOrderCtxData {
      services: self.services.clone(),
      amount,
      order: None,
    });
    self.flow.run(ctx.clone()).await?;
    into_inner(ctx)?
      .order
      .ok_or_else(|| AppError::Internal("Order request finished without an order.".to_string()))
  }

  /// Captures `payment_id` and records the result against the registration.
  ///
  /// `registration_id` is taken raw so malformed ids are rejected before any
  /// network call.
  #[instrument(name = "orchestrator::capture_and_confirm", skip(self), err(Display))]
  pub async fn capture_and_confirm(&self, registration_id: &str, payment_id: &str) -> Result<CaptureOutcome> {
    let ctx = ContextData::new(CaptureCtxData {
      services: self.services.clone(),
      raw_registration_id: registration_id.to_string(),
      payment_id: payment_id.to_string(),
      registration_id: None,
      capture: None,
      outcome: None,
    });
    self.flow.run(ctx.clone()).await?;
    into_inner(ctx)?
      .outcome
      .ok_or_else(|| AppError::Internal("Capture finished without an outcome.".to_string()))
  }

  /// Administrative status change that bypasses payment.
  #[instrument(name = "orchestrator::admin_override", skip(self), err(Display))]
  pub async fn admin_override(&self, registration_id: Uuid, status: RegistrationStatus) -> Result<Registration> {
    let ctx = ContextData::new(AdminOverrideCtxData {
      services: self.services.clone(),
      registration_id,
      requested: status,
      registration: None,
    });
    // A `Stopped` run means the registration already had the requested status.
    self.flow.run(ctx.clone()).await?;
    into_inner(ctx)?
      .registration
      .ok_or_else(|| AppError::Internal("Override finished without a registration.".to_string()))
  }
}
