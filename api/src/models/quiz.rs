// api/src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
  pub id: Uuid,
  pub course_id: Uuid,
  pub title: String,
  pub description: String,
  pub questions: Json<Vec<Question>>,
  #[sqlx(rename = "quiz_order")]
  pub order: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Quiz {
  pub fn without_questions(mut self) -> Self {
    self.questions.0.clear();
    self
  }
}
