// api/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::courses;
use crate::db::reviews::{self, NewReview, ReviewPatch};
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

/// Loads a review and checks the caller may modify it.
async fn owned_review(app_state: &AppState, review_id: Uuid, caller: &AuthenticatedUser) -> Result<(), AppError> {
  let review = reviews::find_by_id(&app_state.db_pool, review_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Review {} not found.", review_id)))?;
  if review.user_id != caller.user_id && !caller.is_admin() {
    warn!(%review_id, caller = %caller.user_id, "Review modification by non-owner refused.");
    return Err(AppError::Forbidden("You can only modify your own reviews.".to_string()));
  }
  Ok(())
}

#[instrument(
  name = "handler::create_review",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, course_id = %payload.course_id)
)]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewReview>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  courses::require(&app_state.db_pool, payload.course_id).await?;
  let review = reviews::create(&app_state.db_pool, auth_user.user_id, &payload).await?;
  info!(review_id = %review.id, "Review created.");
  Ok(HttpResponse::Created().json(review))
}

#[instrument(name = "handler::update_review", skip(app_state, payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn update_review_handler(
  app_state: web::Data<AppState>,
  review_id: web::Path<Uuid>,
  payload: web::Json<ReviewPatch>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let review_id = review_id.into_inner();
  owned_review(&app_state, review_id, &auth_user).await?;
  let review = reviews::update(&app_state.db_pool, review_id, payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(name = "handler::delete_review", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  review_id: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let review_id = review_id.into_inner();
  owned_review(&app_state, review_id, &auth_user).await?;
  reviews::delete(&app_state.db_pool, review_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Review deleted.", "reviewId": review_id })))
}

#[instrument(name = "handler::reviews_by_course", skip(app_state))]
pub async fn reviews_by_course_handler(
  app_state: web::Data<AppState>,
  course_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let course_id = course_id.into_inner();
  courses::require(&app_state.db_pool, course_id).await?;
  Ok(HttpResponse::Ok().json(reviews::list_by_course(&app_state.db_pool, course_id).await?))
}

#[instrument(name = "handler::total_reviews", skip_all)]
pub async fn total_reviews_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let total = reviews::count(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({ "totalReviews": total })))
}
