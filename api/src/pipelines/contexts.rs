// api/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers receive these wrapped in
//! `learnhub_flow::ContextData`.

use crate::models::{PriceInfo, Registration, RegistrationStatus, Role, User};
use crate::orchestrator::CaptureOutcome;
use crate::services::payment::{CaptureResult, OrderHandle};
use crate::state::{AppState, EnrollmentServices};
use rust_decimal::Decimal;
use uuid::Uuid;

// --- Enrollment / payment ---

pub struct EnrollCtxData {
  pub services: EnrollmentServices,
  pub user_id: Uuid,
  pub course_id: Uuid,
  pub price: Option<PriceInfo>,
  pub registration: Option<Registration>,
}

pub struct RequestOrderCtxData {
  pub services: EnrollmentServices,
  pub amount: Decimal,
  pub order: Option<OrderHandle>,
}

pub struct CaptureCtxData {
  pub services: EnrollmentServices,
  /// As received on the path; parsed by the first step.
  pub raw_registration_id: String,
  pub payment_id: String,
  pub registration_id: Option<Uuid>,
  pub capture: Option<CaptureResult>,
  pub outcome: Option<CaptureOutcome>,
}

pub struct AdminOverrideCtxData {
  pub services: EnrollmentServices,
  pub registration_id: Uuid,
  pub requested: RegistrationStatus,
  pub registration: Option<Registration>,
}

// --- Accounts ---

pub struct SignupCtxData {
  pub app_state: AppState,
  pub user_name: String,
  pub email: String,
  pub name: String,
  pub password: String,
  /// Self-service sign-up must confirm the password; admin creation does not.
  pub confirm_password: Option<String>,
  pub role: Role,
  pub created_user: Option<User>,
}

pub struct SigninCtxData {
  pub app_state: AppState,
  pub user_name: String,
  pub password: String,
  pub user: Option<User>,
  pub access_token: Option<String>,
  pub refresh_token: Option<String>,
}
