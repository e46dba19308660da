// api/src/web/handlers/registration_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger::postgres as ledger_pg;
use crate::models::RegistrationStatus;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCoursePayload {
  pub course_id: Uuid,
}

#[derive(Deserialize, Debug)]
pub struct StatusOverridePayload {
  pub status: RegistrationStatus,
}

#[instrument(
  name = "handler::register_course",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, course_id = %payload.course_id)
)]
pub async fn register_course_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterCoursePayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let registration = app_state
    .orchestrator
    .enroll(auth_user.user_id, payload.course_id)
    .await?;
  info!(registration_id = %registration.id, status = %registration.status, "Registration created.");
  Ok(HttpResponse::Created().json(registration))
}

#[instrument(name = "handler::get_registration", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_registration_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let course_id = course_id.into_inner();
  let registration = app_state
    .orchestrator
    .services()
    .ledger
    .get_by_user(auth_user.user_id, course_id)
    .await?
    .ok_or_else(|| AppError::NotFound("No registration found for this course.".to_string()))?;
  Ok(HttpResponse::Ok().json(registration))
}

#[instrument(name = "handler::list_registrations", skip_all)]
pub async fn list_registrations_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let registrations = ledger_pg::list_with_details(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(registrations))
}

#[instrument(
  name = "handler::override_registration",
  skip(app_state, payload, admin),
  fields(admin_id = %admin.0.user_id, status = %payload.status)
)]
pub async fn override_registration_handler(
  app_state: web::Data<AppState>,
  registration_id: web::Path<Uuid>,
  payload: web::Json<StatusOverridePayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let registration = app_state
    .orchestrator
    .admin_override(registration_id.into_inner(), payload.status)
    .await?;
  Ok(HttpResponse::Ok().json(registration))
}

#[instrument(name = "handler::total_registrations", skip_all)]
pub async fn total_registrations_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let total = app_state.orchestrator.services().ledger.count_all().await?;
  Ok(HttpResponse::Ok().json(json!({ "totalRegistrations": total })))
}
