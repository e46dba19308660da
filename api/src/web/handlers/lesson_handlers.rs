// api/src/web/handlers/lesson_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::course_handlers::can_view_content;
use crate::db::{courses, lessons};
use crate::db::lessons::{LessonPatch, NewLesson};
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, MaybeUser};

/// Lists a course's lessons; video URLs are blanked unless the viewer has access.
#[instrument(name = "handler::lessons_by_course", skip(app_state, viewer))]
pub async fn lessons_by_course_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
  viewer: MaybeUser,
) -> Result<HttpResponse, AppError> {
  let course_id = course_id.into_inner();
  courses::require(&app_state.db_pool, course_id).await?;

  let mut lessons = lessons::list_by_course(&app_state.db_pool, course_id).await?;
  if !can_view_content(&app_state, &viewer, course_id).await? {
    debug!(%course_id, "Serving lesson outline without video URLs.");
    lessons = lessons.into_iter().map(|l| l.without_video_urls()).collect();
  }
  Ok(HttpResponse::Ok().json(lessons))
}

#[instrument(name = "handler::create_lesson", skip(app_state, payload, _admin), fields(course_id = %payload.course_id))]
pub async fn create_lesson_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewLesson>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  courses::require(&app_state.db_pool, payload.course_id).await?;
  let lesson = lessons::create(&app_state.db_pool, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(lesson))
}

#[instrument(name = "handler::lesson_details", skip(app_state, _admin))]
pub async fn lesson_details_handler(
  app_state: web::Data<AppState>,
  lesson_id: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let lesson_id = lesson_id.into_inner();
  let lesson = lessons::find_by_id(&app_state.db_pool, lesson_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found.", lesson_id)))?;
  Ok(HttpResponse::Ok().json(lesson))
}

#[instrument(name = "handler::update_lesson", skip(app_state, payload, _admin))]
pub async fn update_lesson_handler(
  app_state: web::Data<AppState>,
  lesson_id: web::Path<Uuid>,
  payload: web::Json<LessonPatch>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let lesson = lessons::update(&app_state.db_pool, lesson_id.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(lesson))
}

#[instrument(name = "handler::delete_lesson", skip(app_state, _admin))]
pub async fn delete_lesson_handler(
  app_state: web::Data<AppState>,
  lesson_id: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let lesson_id = lesson_id.into_inner();
  lessons::delete(&app_state.db_pool, lesson_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Lesson deleted.", "lessonId": lesson_id })))
}
