// api/src/state.rs

use crate::catalog::CourseCatalog;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::ledger::RegistrationLedger;
use crate::orchestrator::Orchestrator;
use crate::services::payment::PaymentGateway;
use crate::services::token_service::TokenService;
use learnhub_flow::Flow;
use sqlx::PgPool;
use std::sync::Arc;

/// Collaborators of the enrollment/payment pipelines. Kept apart from
/// `AppState` so those pipelines run without a database.
#[derive(Clone)]
pub struct EnrollmentServices {
  pub ledger: Arc<dyn RegistrationLedger>,
  pub catalog: Arc<dyn CourseCatalog>,
  pub gateway: Arc<dyn PaymentGateway>,
}

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub flow: Arc<Flow<AppError>>,
  pub config: Arc<AppConfig>,
  pub tokens: Arc<TokenService>,
  pub orchestrator: Orchestrator,
}
