// api/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use learnhub_api::catalog::InMemoryCourseCatalog;
use learnhub_api::errors::{AppError, Result};
use learnhub_api::ledger::{InMemoryRegistrationLedger, RegistrationLedger};
use learnhub_api::models::{PriceInfo, Registration, RegistrationStatus};
use learnhub_api::orchestrator::Orchestrator;
use learnhub_api::services::payment::mock::MockGateway;
use learnhub_api::state::EnrollmentServices;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

/// Enrollment collaborators with handles kept for scripting and inspection.
pub struct TestHarness {
  pub ledger: Arc<InMemoryRegistrationLedger>,
  pub catalog: Arc<InMemoryCourseCatalog>,
  pub gateway: Arc<MockGateway>,
  pub orchestrator: Orchestrator,
}

impl TestHarness {
  pub fn new() -> Self {
    let ledger = Arc::new(InMemoryRegistrationLedger::new());
    Self::with_ledger(ledger.clone(), ledger)
  }

  /// `ledger_impl` is what the pipelines talk to; `ledger` stays inspectable.
  pub fn with_ledger(ledger: Arc<InMemoryRegistrationLedger>, ledger_impl: Arc<dyn RegistrationLedger>) -> Self {
    setup_tracing();
    let catalog = Arc::new(InMemoryCourseCatalog::new());
    let gateway = Arc::new(MockGateway::new());
    let services = EnrollmentServices {
      ledger: ledger_impl,
      catalog: catalog.clone(),
      gateway: gateway.clone(),
    };
    Self {
      ledger,
      catalog,
      gateway,
      orchestrator: Orchestrator::standalone(services),
    }
  }

  pub fn paid_course(&self, price: Decimal) -> Uuid {
    self.catalog.add_course(PriceInfo::new(price, None))
  }

  pub fn free_course(&self) -> Uuid {
    self.catalog.add_course(PriceInfo::new(Decimal::ZERO, None))
  }

  pub async fn status_of(&self, registration_id: Uuid) -> RegistrationStatus {
    self
      .ledger
      .get_by_id(registration_id)
      .await
      .unwrap()
      .expect("registration should exist")
      .status
  }
}

/// Delegates to an in-memory ledger but refuses to record payments.
pub struct UnwritableConfirmLedger {
  pub inner: Arc<InMemoryRegistrationLedger>,
}

#[async_trait]
impl RegistrationLedger for UnwritableConfirmLedger {
  async fn create(&self, user_id: Uuid, course_id: Uuid, price: &PriceInfo) -> Result<Registration> {
    self.inner.create(user_id, course_id, price).await
  }

  async fn get_by_user(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Registration>> {
    self.inner.get_by_user(user_id, course_id).await
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
    self.inner.get_by_id(id).await
  }

  async fn set_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration> {
    self.inner.set_status(id, status).await
  }

  async fn confirm_payment(&self, _id: Uuid) -> Result<Registration> {
    Err(AppError::Internal("simulated write failure".to_string()))
  }

  async fn list_all(&self, newest_first: bool) -> Result<Vec<Registration>> {
    self.inner.list_all(newest_first).await
  }

  async fn count_all(&self) -> Result<i64> {
    self.inner.count_all().await
  }

  async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Registration>> {
    self.inner.list_for_course(course_id).await
  }

  async fn list_confirmed_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>> {
    self.inner.list_confirmed_for_user(user_id).await
  }
}

/// Hands out the stored row, then cancels it before the caller can act on what it read.
pub struct CancelAfterReadLedger {
  pub inner: Arc<InMemoryRegistrationLedger>,
}

#[async_trait]
impl RegistrationLedger for CancelAfterReadLedger {
  async fn create(&self, user_id: Uuid, course_id: Uuid, price: &PriceInfo) -> Result<Registration> {
    self.inner.create(user_id, course_id, price).await
  }

  async fn get_by_user(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Registration>> {
    self.inner.get_by_user(user_id, course_id).await
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
    let stale = self.inner.get_by_id(id).await?;
    if stale.is_some() {
      self.inner.set_status(id, RegistrationStatus::Cancelled).await?;
    }
    Ok(stale)
  }

  async fn set_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration> {
    self.inner.set_status(id, status).await
  }

  async fn confirm_payment(&self, id: Uuid) -> Result<Registration> {
    self.inner.confirm_payment(id).await
  }

  async fn list_all(&self, newest_first: bool) -> Result<Vec<Registration>> {
    self.inner.list_all(newest_first).await
  }

  async fn count_all(&self) -> Result<i64> {
    self.inner.count_all().await
  }

  async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Registration>> {
    self.inner.list_for_course(course_id).await
  }

  async fn list_confirmed_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>> {
    self.inner.list_confirmed_for_user(user_id).await
  }
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
