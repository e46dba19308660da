// api/src/web/handlers/course_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::courses::{self, CoursePatch, NewCourse};
use crate::errors::AppError;
use crate::models::RegistrationStatus;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser, MaybeUser};

const DEFAULT_PAGE_SIZE: i64 = 12;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

impl PageQuery {
  fn resolve(&self) -> (i64, i64) {
    let page = self.page.unwrap_or(1).max(1);
    let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
  }
}

/// Admins and holders of a confirmed registration see a course's full content.
pub(crate) async fn can_view_content(
  app_state: &AppState,
  viewer: &MaybeUser,
  course_id: Uuid,
) -> Result<bool, AppError> {
  let Some(user) = &viewer.0 else {
    return Ok(false);
  };
  if user.is_admin() {
    return Ok(true);
  }
  let registration = app_state
    .orchestrator
    .services()
    .ledger
    .get_by_user(user.user_id, course_id)
    .await?;
  Ok(matches!(registration, Some(r) if r.status == RegistrationStatus::Confirmed))
}

// --- Public catalog ---

#[instrument(name = "handler::list_courses", skip(app_state))]
pub async fn list_courses_handler(
  app_state: web::Data<AppState>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let (page, limit) = query.resolve();
  let courses = courses::list_page(&app_state.db_pool, page, limit).await?;
  let total = courses::count(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({
    "courses": courses,
    "page": page,
    "limit": limit,
    "totalCourses": total,
  })))
}

#[instrument(name = "handler::course_by_slug", skip(app_state))]
pub async fn course_by_slug_handler(
  app_state: web::Data<AppState>,
  slug: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let course = courses::find_by_slug(&app_state.db_pool, &slug)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Course '{}' not found.", slug)))?;
  Ok(HttpResponse::Ok().json(course))
}

#[instrument(name = "handler::my_courses", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn my_courses_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let courses = courses::list_my_courses(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(courses))
}

// --- Admin ---

#[instrument(name = "handler::create_course", skip(app_state, payload, _admin), fields(name = %payload.name))]
pub async fn create_course_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewCourse>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let course = courses::create(&app_state.db_pool, &payload).await?;
  info!(course_id = %course.id, slug = %course.url_slug, "Course created.");
  Ok(HttpResponse::Created().json(course))
}

/// All or nothing: one invalid entry rejects the batch.
#[instrument(name = "handler::create_many_courses", skip(app_state, payload, _admin), fields(count = payload.len()))]
pub async fn create_many_courses_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<Vec<NewCourse>>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  if payload.is_empty() {
    return Err(AppError::Validation("At least one course is required.".to_string()));
  }
  let created = courses::create_many(&app_state.db_pool, &payload).await?;
  Ok(HttpResponse::Created().json(created))
}

#[instrument(name = "handler::get_course", skip(app_state, _admin))]
pub async fn get_course_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(courses::require(&app_state.db_pool, course_id.into_inner()).await?))
}

#[instrument(name = "handler::update_course", skip(app_state, payload, _admin))]
pub async fn update_course_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
  payload: web::Json<CoursePatch>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let course = courses::update(&app_state.db_pool, course_id.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(course))
}

#[instrument(name = "handler::delete_course", skip(app_state, _admin))]
pub async fn delete_course_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let course_id = course_id.into_inner();
  courses::delete_cascade(&app_state.db_pool, course_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Course deleted.", "courseId": course_id })))
}

#[instrument(name = "handler::registered_users", skip(app_state, _admin))]
pub async fn registered_users_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let course_id = course_id.into_inner();
  courses::require(&app_state.db_pool, course_id).await?;
  let users = courses::registered_users(&app_state.db_pool, course_id).await?;
  Ok(HttpResponse::Ok().json(users))
}

#[instrument(name = "handler::total_courses", skip_all)]
pub async fn total_courses_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let total = courses::count(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({ "totalCourses": total })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_query_defaults_and_clamps() {
    assert_eq!(PageQuery::default().resolve(), (1, DEFAULT_PAGE_SIZE));
    let query = PageQuery { page: Some(0), limit: Some(10_000) };
    assert_eq!(query.resolve(), (1, MAX_PAGE_SIZE));
    let query = PageQuery { page: Some(3), limit: Some(5) };
    assert_eq!(query.resolve(), (3, 5));
  }
}
