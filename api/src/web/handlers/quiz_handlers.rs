// api/src/web/handlers/quiz_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use super::course_handlers::can_view_content;
use crate::db::quizzes::{self, NewQuiz, QuizPatch};
use crate::db::courses;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, MaybeUser};

#[instrument(name = "handler::quizzes_by_course", skip(app_state, viewer))]
pub async fn quizzes_by_course_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
  viewer: MaybeUser,
) -> Result<HttpResponse, AppError> {
  let course_id = course_id.into_inner();
  courses::require(&app_state.db_pool, course_id).await?;

  let quizzes = quizzes::list_by_course(&app_state.db_pool, course_id).await?;
  let quizzes = if can_view_content(&app_state, &viewer, course_id).await? {
    quizzes
  } else {
    quizzes.into_iter().map(|q| q.without_questions()).collect()
  };
  Ok(HttpResponse::Ok().json(quizzes))
}

#[instrument(name = "handler::create_quiz", skip(app_state, payload, _admin), fields(course_id = %payload.course_id))]
pub async fn create_quiz_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewQuiz>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  courses::require(&app_state.db_pool, payload.course_id).await?;
  let quiz = quizzes::create(&app_state.db_pool, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(quiz))
}

#[instrument(name = "handler::quiz_details", skip(app_state, _admin))]
pub async fn quiz_details_handler(
  app_state: web::Data<AppState>,
  quiz_id: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let quiz_id = quiz_id.into_inner();
  let quiz = quizzes::find_by_id(&app_state.db_pool, quiz_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found.", quiz_id)))?;
  Ok(HttpResponse::Ok().json(quiz))
}

#[instrument(name = "handler::update_quiz", skip(app_state, payload, _admin))]
pub async fn update_quiz_handler(
  app_state: web::Data<AppState>,
  quiz_id: web::Path<Uuid>,
  payload: web::Json<QuizPatch>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let quiz = quizzes::update(&app_state.db_pool, quiz_id.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(quiz))
}

#[instrument(name = "handler::delete_quiz", skip(app_state, _admin))]
pub async fn delete_quiz_handler(
  app_state: web::Data<AppState>,
  quiz_id: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let quiz_id = quiz_id.into_inner();
  quizzes::delete(&app_state.db_pool, quiz_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Quiz deleted.", "quizId": quiz_id })))
}
