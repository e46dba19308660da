// api/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id: Uuid,
  pub course_id: Uuid,
  pub user_id: Uuid,
  pub rating: i16,
  pub review: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub review: Review,
  pub author_name: String,
  pub author_email: String,
}
