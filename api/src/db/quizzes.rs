// api/src/db/quizzes.rs

use super::conflict_on_unique;
use crate::errors::{AppError, Result};
use crate::models::{Question, Quiz};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const QUIZ_COLUMNS: &str = "id, course_id, title, description, questions, quiz_order, created_at, updated_at";
const ORDER_TAKEN: &str = "Another quiz of this course already uses that order.";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuiz {
  pub course_id: Uuid,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub questions: Vec<Question>,
  pub order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub questions: Option<Vec<Question>>,
  pub order: Option<i32>,
}

/// Each question needs options and an answer drawn from them.
pub fn validate_questions(questions: &[Question]) -> Result<()> {
  for (idx, q) in questions.iter().enumerate() {
    if q.question.trim().is_empty() || q.options.is_empty() {
      return Err(AppError::Validation(format!(
        "Question {} needs text and at least one option.",
        idx + 1
      )));
    }
    if !q.options.contains(&q.correct_answer) {
      return Err(AppError::Validation(format!(
        "Question {}: the correct answer must be one of the options.",
        idx + 1
      )));
    }
  }
  Ok(())
}

pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Quiz>> {
  let quizzes = sqlx::query_as::<_, Quiz>(&format!(
    "SELECT {} FROM quizzes WHERE course_id = $1 ORDER BY quiz_order ASC",
    QUIZ_COLUMNS
  ))
  .bind(course_id)
  .fetch_all(pool)
  .await?;
  Ok(quizzes)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Quiz>> {
  let quiz = sqlx::query_as::<_, Quiz>(&format!("SELECT {} FROM quizzes WHERE id = $1", QUIZ_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(quiz)
}

pub async fn create(pool: &PgPool, new_quiz: NewQuiz) -> Result<Quiz> {
  if new_quiz.title.trim().is_empty() {
    return Err(AppError::Validation("Quiz title is required.".to_string()));
  }
  validate_questions(&new_quiz.questions)?;
  let quiz = sqlx::query_as::<_, Quiz>(&format!(
    "INSERT INTO quizzes (id, course_id, title, description, questions, quiz_order) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    QUIZ_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(new_quiz.course_id)
  .bind(new_quiz.title.trim())
  .bind(&new_quiz.description)
  .bind(Json(&new_quiz.questions))
  .bind(new_quiz.order)
  .fetch_one(pool)
  .await
  .map_err(conflict_on_unique(ORDER_TAKEN))?;
  Ok(quiz)
}

pub async fn update(pool: &PgPool, id: Uuid, patch: QuizPatch) -> Result<Quiz> {
  let mut quiz = find_by_id(pool, id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found.", id)))?;
  if let Some(title) = patch.title {
    quiz.title = title;
  }
  if let Some(description) = patch.description {
    quiz.description = description;
  }
  if let Some(questions) = patch.questions {
    validate_questions(&questions)?;
    quiz.questions = Json(questions);
  }
  if let Some(order) = patch.order {
    quiz.order = order;
  }

  let updated = sqlx::query_as::<_, Quiz>(&format!(
    "UPDATE quizzes SET title = $2, description = $3, questions = $4, quiz_order = $5, updated_at = now() \
     WHERE id = $1 RETURNING {}",
    QUIZ_COLUMNS
  ))
  .bind(id)
  .bind(&quiz.title)
  .bind(&quiz.description)
  .bind(&quiz.questions)
  .bind(quiz.order)
  .fetch_optional(pool)
  .await
  .map_err(conflict_on_unique(ORDER_TAKEN))?;
  updated.ok_or_else(|| AppError::NotFound(format!("Quiz {} not found.", id)))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<()> {
  let deleted = sqlx::query("DELETE FROM quizzes WHERE id = $1")
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
  if deleted == 0 {
    return Err(AppError::NotFound(format!("Quiz {} not found.", id)));
  }
  Ok(())
}

pub async fn delete_for_course(conn: &mut PgConnection, course_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM quizzes WHERE course_id = $1")
    .bind(course_id)
    .execute(&mut *conn)
    .await?;
  Ok(result.rows_affected())
}
