// api/src/models/registration.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status")]
pub enum RegistrationStatus {
  Pending,
  Confirmed,
  Cancelled,
}

impl RegistrationStatus {
  /// Pending and Confirmed registrations block a new one for the same pair.
  pub fn is_active(self) -> bool {
    matches!(self, RegistrationStatus::Pending | RegistrationStatus::Confirmed)
  }
}

impl std::fmt::Display for RegistrationStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      RegistrationStatus::Pending => "Pending",
      RegistrationStatus::Confirmed => "Confirmed",
      RegistrationStatus::Cancelled => "Cancelled",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub id: Uuid,
  pub user_id: Uuid,
  pub course_id: Uuid,
  pub status: RegistrationStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A user registered on a course, as listed for administrators.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
  pub registration_id: Uuid,
  pub user_id: Uuid,
  pub user_name: String,
  pub email: String,
  pub name: String,
  pub status: RegistrationStatus,
  pub registered_at: DateTime<Utc>,
}

/// A registration joined with who registered and for which course, as listed for administrators.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetail {
  pub id: Uuid,
  pub user_id: Uuid,
  pub user_name: String,
  pub email: String,
  pub name: String,
  pub course_id: Uuid,
  pub course_name: String,
  pub status: RegistrationStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
