// api/src/pipelines/mod.rs

//! Pipelines registered with the application's `Flow` registry.

use crate::errors::AppError;
use learnhub_flow::Flow;

pub mod contexts;

pub mod admin_override_pipeline;
pub mod capture_pipeline;
pub mod enrollment_pipeline;
pub mod order_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;

/// The four enrollment/payment operations.
pub fn register_enrollment_pipelines(flow: &Flow<AppError>) {
  enrollment_pipeline::register_enrollment_pipeline(flow);
  order_pipeline::register_order_pipeline(flow);
  capture_pipeline::register_capture_pipeline(flow);
  admin_override_pipeline::register_admin_override_pipeline(flow);
}

pub fn register_all_pipelines(flow: &Flow<AppError>) {
  tracing::info!("Registering pipelines...");
  register_enrollment_pipelines(flow);
  signup_pipeline::register_signup_pipeline(flow);
  signin_pipeline::register_signin_pipeline(flow);
  tracing::info!("All application pipelines registered.");
}
