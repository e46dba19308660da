// api/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum Role {
  User,
  Admin,
}

impl Default for Role {
  fn default() -> Self {
    Role::User
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub user_name: String,
  pub email: String,
  pub name: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role: Role,
  pub avatar_url: Option<String>,
  #[serde(skip_serializing)]
  pub reset_password_token: Option<String>,
  #[serde(skip_serializing)]
  pub reset_password_expires_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}
