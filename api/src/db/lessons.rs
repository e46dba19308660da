// api/src/db/lessons.rs

use super::conflict_on_unique;
use crate::errors::{AppError, Result};
use crate::models::{Lesson, Video};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const LESSON_COLUMNS: &str = "id, course_id, title, description, videos, lesson_order, created_at, updated_at";
const ORDER_TAKEN: &str = "Another lesson of this course already uses that order.";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLesson {
  pub course_id: Uuid,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub videos: Vec<Video>,
  pub order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub videos: Option<Vec<Video>>,
  pub order: Option<i32>,
}

pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Lesson>> {
  let lessons = sqlx::query_as::<_, Lesson>(&format!(
    "SELECT {} FROM lessons WHERE course_id = $1 ORDER BY lesson_order ASC",
    LESSON_COLUMNS
  ))
  .bind(course_id)
  .fetch_all(pool)
  .await?;
  Ok(lessons)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Lesson>> {
  let lesson = sqlx::query_as::<_, Lesson>(&format!("SELECT {} FROM lessons WHERE id = $1", LESSON_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(lesson)
}

pub async fn create(pool: &PgPool, new_lesson: NewLesson) -> Result<Lesson> {
  if new_lesson.title.trim().is_empty() {
    return Err(AppError::Validation("Lesson title is required.".to_string()));
  }
  let lesson = sqlx::query_as::<_, Lesson>(&format!(
    "INSERT INTO lessons (id, course_id, title, description, videos, lesson_order) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    LESSON_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(new_lesson.course_id)
  .bind(new_lesson.title.trim())
  .bind(&new_lesson.description)
  .bind(Json(&new_lesson.videos))
  .bind(new_lesson.order)
  .fetch_one(pool)
  .await
  .map_err(conflict_on_unique(ORDER_TAKEN))?;
  Ok(lesson)
}

pub async fn update(pool: &PgPool, id: Uuid, patch: LessonPatch) -> Result<Lesson> {
  let mut lesson = find_by_id(pool, id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found.", id)))?;
  if let Some(title) = patch.title {
    lesson.title = title;
  }
  if let Some(description) = patch.description {
    lesson.description = description;
  }
  if let Some(videos) = patch.videos {
    lesson.videos = Json(videos);
  }
  if let Some(order) = patch.order {
    lesson.order = order;
  }

  let updated = sqlx::query_as::<_, Lesson>(&format!(
    "UPDATE lessons SET title = $2, description = $3, videos = $4, lesson_order = $5, updated_at = now() \
     WHERE id = $1 RETURNING {}",
    LESSON_COLUMNS
  ))
  .bind(id)
  .bind(&lesson.title)
  .bind(&lesson.description)
  .bind(&lesson.videos)
  .bind(lesson.order)
  .fetch_optional(pool)
  .await
  .map_err(conflict_on_unique(ORDER_TAKEN))?;
  updated.ok_or_else(|| AppError::NotFound(format!("Lesson {} not found.", id)))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<()> {
  let deleted = sqlx::query("DELETE FROM lessons WHERE id = $1")
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
  if deleted == 0 {
    return Err(AppError::NotFound(format!("Lesson {} not found.", id)));
  }
  Ok(())
}

pub async fn delete_for_course(conn: &mut PgConnection, course_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM lessons WHERE course_id = $1")
    .bind(course_id)
    .execute(&mut *conn)
    .await?;
  Ok(result.rows_affected())
}
