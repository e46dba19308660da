// api/src/ledger/mod.rs

//! The Enrollment Ledger: durable record of each user's registration attempts.
//!
//! Both implementations enforce "at most one Pending/Confirmed registration per
//! (user, course)" atomically. The ledger performs no transition checks beyond
//! [`RegistrationLedger::confirm_payment`]; sequencing belongs to the enrollment
//! pipelines.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{PriceInfo, Registration, RegistrationStatus};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::InMemoryRegistrationLedger;
pub use postgres::PgRegistrationLedger;

/// Initial status of a new registration: free courses are confirmed outright.
pub fn initial_status(price: &PriceInfo) -> RegistrationStatus {
  if price.is_free() {
    RegistrationStatus::Confirmed
  } else {
    RegistrationStatus::Pending
  }
}

#[async_trait]
pub trait RegistrationLedger: Send + Sync {
  /// Fails with `Conflict` while an active registration exists for the pair.
  async fn create(&self, user_id: Uuid, course_id: Uuid, price: &PriceInfo) -> Result<Registration>;

  /// Most recently updated registration for the pair, whatever its status.
  async fn get_by_user(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Registration>>;

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Registration>>;

  /// Unconditional status write. `NotFound` for unknown ids.
  async fn set_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration>;

  /// Marks a registration paid. Refuses `Cancelled` with `Conflict`; an already
  /// confirmed registration is returned unchanged.
  async fn confirm_payment(&self, id: Uuid) -> Result<Registration>;

  async fn list_all(&self, newest_first: bool) -> Result<Vec<Registration>>;

  async fn count_all(&self) -> Result<i64>;

  async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Registration>>;

  async fn list_confirmed_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>>;
}
