// api/src/ledger/memory.rs

use super::{initial_status, RegistrationLedger};
use crate::errors::{AppError, Result};
use crate::models::{PriceInfo, Registration, RegistrationStatus};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

/// Process-local ledger used by the enrollment tests.
///
/// Every operation takes the mutex once, which gives the same atomicity the
/// partial unique index gives the Postgres ledger.
#[derive(Default)]
pub struct InMemoryRegistrationLedger {
  rows: Mutex<Vec<Registration>>,
}

impl InMemoryRegistrationLedger {
  pub fn new() -> Self {
    Self::default()
  }
}

fn not_found(id: Uuid) -> AppError {
  AppError::NotFound(format!("Registration {} not found.", id))
}

#[async_trait]
impl RegistrationLedger for InMemoryRegistrationLedger {
  async fn create(&self, user_id: Uuid, course_id: Uuid, price: &PriceInfo) -> Result<Registration> {
    let mut rows = self.rows.lock();
    if rows
      .iter()
      .any(|r| r.user_id == user_id && r.course_id == course_id && r.status.is_active())
    {
      return Err(AppError::Conflict(
        "An active registration for this course already exists.".to_string(),
      ));
    }
    let now = Utc::now();
    let registration = Registration {
      id: Uuid::new_v4(),
      user_id,
      course_id,
      status: initial_status(price),
      created_at: now,
      updated_at: now,
    };
    rows.push(registration.clone());
    Ok(registration)
  }

  async fn get_by_user(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Registration>> {
    let rows = self.rows.lock();
    // `max_by_key` keeps the last of equal keys, i.e. the latest inserted.
    Ok(
      rows
        .iter()
        .filter(|r| r.user_id == user_id && r.course_id == course_id)
        .max_by_key(|r| r.updated_at)
        .cloned(),
    )
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
    Ok(self.rows.lock().iter().find(|r| r.id == id).cloned())
  }

  async fn set_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration> {
    let mut rows = self.rows.lock();
    let idx = rows.iter().position(|r| r.id == id).ok_or_else(|| not_found(id))?;
    if status.is_active() {
      let (user_id, course_id) = (rows[idx].user_id, rows[idx].course_id);
      if rows
        .iter()
        .any(|r| r.id != id && r.user_id == user_id && r.course_id == course_id && r.status.is_active())
      {
        return Err(AppError::Conflict(
          "An active registration for this course already exists.".to_string(),
        ));
      }
    }
    let row = &mut rows[idx];
    row.status = status;
    row.updated_at = Utc::now();
    Ok(row.clone())
  }

  async fn confirm_payment(&self, id: Uuid) -> Result<Registration> {
    let mut rows = self.rows.lock();
    let row = rows.iter_mut().find(|r| r.id == id).ok_or_else(|| not_found(id))?;
    match row.status {
      RegistrationStatus::Cancelled => Err(AppError::Conflict(format!(
        "Registration {} is cancelled and cannot be confirmed.",
        id
      ))),
      RegistrationStatus::Confirmed => Ok(row.clone()),
      RegistrationStatus::Pending => {
        row.status = RegistrationStatus::Confirmed;
        row.updated_at = Utc::now();
        Ok(row.clone())
      }
    }
  }

  async fn list_all(&self, newest_first: bool) -> Result<Vec<Registration>> {
    let mut all = self.rows.lock().clone();
    // Stable sort keeps insertion order for equal timestamps.
    all.sort_by_key(|r| r.created_at);
    if newest_first {
      all.reverse();
    }
    Ok(all)
  }

  async fn count_all(&self) -> Result<i64> {
    Ok(self.rows.lock().len() as i64)
  }

  async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Registration>> {
    let mut rows: Vec<Registration> = self.rows.lock().iter().filter(|r| r.course_id == course_id).cloned().collect();
    rows.sort_by_key(|r| r.created_at);
    rows.reverse();
    Ok(rows)
  }

  async fn list_confirmed_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>> {
    let mut rows: Vec<Registration> = self
      .rows
      .lock()
      .iter()
      .filter(|r| r.user_id == user_id && r.status == RegistrationStatus::Confirmed)
      .cloned()
      .collect();
    rows.sort_by_key(|r| r.updated_at);
    rows.reverse();
    Ok(rows)
  }
}
