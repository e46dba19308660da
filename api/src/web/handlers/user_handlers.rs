// api/src/web/handlers/user_handlers.rs

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::users::{self, ProfileUpdate, UserSearch};
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::pipelines::contexts::{SigninCtxData, SignupCtxData};
use crate::services::{auth_service, email_mock};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use learnhub_flow::{ContextData, PipelineResult};

pub const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/user";
const RESET_CODE_VALID_MINUTES: i64 = 5;

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
  pub user_name: String,
  pub email: String,
  #[serde(default)]
  pub name: String,
  pub password: String,
  pub confirm_password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
  pub user_name: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AvatarPayload {
  pub avatar_url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
  pub current_password: String,
  pub new_password: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetCodePayload {
  pub token: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetPasswordPayload {
  pub email: String,
  pub token: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateUserPayload {
  pub user_name: String,
  pub email: String,
  #[serde(default)]
  pub name: String,
  pub password: String,
  #[serde(default)]
  pub role: Role,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminEditPayload {
  pub user_id: Uuid,
  pub name: Option<String>,
  pub role: Option<Role>,
}

// --- Helpers ---

fn refresh_cookie(app_state: &AppState, token: String) -> Cookie<'static> {
  Cookie::build(REFRESH_COOKIE, token)
    .path(REFRESH_COOKIE_PATH)
    .http_only(true)
    .secure(app_state.config.cookie_secure)
    .same_site(SameSite::Strict)
    .max_age(CookieDuration::seconds(app_state.tokens.refresh_ttl().as_secs() as i64))
    .finish()
}

fn generate_reset_code() -> String {
  format!("{:06}", OsRng.next_u32() % 1_000_000)
}

/// Checks a reset code against the stored hash and its expiry.
fn reset_code_matches(user: &User, code: &str) -> Result<bool, AppError> {
  let (Some(stored_hash), Some(expires_at)) = (&user.reset_password_token, user.reset_password_expires_at) else {
    return Ok(false);
  };
  if expires_at < Utc::now() {
    return Ok(false);
  }
  auth_service::verify_password(stored_hash, code.trim())
}

async fn run_signup(app_state: &AppState, ctx: SignupCtxData) -> Result<User, AppError> {
  let ctx_data = ContextData::new(ctx);
  match app_state.flow.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let created = ctx_data.read().created_user.clone();
      created.ok_or_else(|| AppError::Internal("Signup completed without creating a user.".to_string()))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Signup was halted by an internal step.".to_string())),
  }
}

// --- Self-service account handlers ---

#[instrument(name = "handler::register", skip(app_state, payload), fields(user_name = %payload.user_name))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let user = run_signup(
    &app_state,
    SignupCtxData {
      app_state: app_state.get_ref().clone(),
      user_name: payload.user_name,
      email: payload.email,
      name: payload.name,
      password: payload.password,
      confirm_password: Some(payload.confirm_password),
      role: Role::User,
      created_user: None,
    },
  )
  .await?;
  Ok(HttpResponse::Created().json(json!({ "userName": user.user_name, "email": user.email })))
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(user_name = %payload.user_name))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx_data = ContextData::new(SigninCtxData {
    app_state: app_state.get_ref().clone(),
    user_name: payload.user_name,
    password: payload.password,
    user: None,
    access_token: None,
    refresh_token: None,
  });

  match app_state.flow.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => {
      let (user, access_token, refresh_token) = {
        let guard = ctx_data.read();
        (guard.user.clone(), guard.access_token.clone(), guard.refresh_token.clone())
      };
      let (Some(user), Some(access_token), Some(refresh_token)) = (user, access_token, refresh_token) else {
        warn!("Signin pipeline completed without user or tokens.");
        return Err(AppError::Internal("Signin completed without issuing tokens.".to_string()));
      };
      Ok(
        HttpResponse::Ok()
          .cookie(refresh_cookie(&app_state, refresh_token))
          .json(json!({ "accessToken": access_token, "user": user })),
      )
    }
    Ok(PipelineResult::Stopped) => Err(AppError::Auth("Authentication was unexpectedly halted.".to_string())),
    Err(app_err) => Err(app_err),
  }
}

pub async fn logout_handler() -> HttpResponse {
  let mut removal = Cookie::build(REFRESH_COOKIE, "")
    .path(REFRESH_COOKIE_PATH)
    .http_only(true)
    .finish();
  removal.make_removal();
  HttpResponse::Ok()
    .cookie(removal)
    .json(json!({ "message": "Logged out." }))
}

#[instrument(name = "handler::refresh_token", skip_all)]
pub async fn refresh_token_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
  let cookie = req
    .cookie(REFRESH_COOKIE)
    .ok_or_else(|| AppError::Auth("Refresh token is missing.".to_string()))?;
  let claims = app_state.tokens.verify_refresh(cookie.value())?;
  // Role is re-read so a changed role takes effect on the next refresh.
  let user = users::find_by_id(&app_state.db_pool, claims.sub)
    .await?
    .ok_or_else(|| AppError::Forbidden("Account no longer exists.".to_string()))?;
  let access_token = app_state.tokens.issue_access(user.id, user.role)?;
  Ok(HttpResponse::Ok().json(json!({ "accessToken": access_token })))
}

#[instrument(name = "handler::profile", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user = users::require(&app_state.db_pool, auth_user.user_id).await?;
  let profile = users::find_profile(&app_state.db_pool, user.id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "userName": user.user_name,
    "email": user.email,
    "name": user.name,
    "role": user.role,
    "avatarUrl": user.avatar_url,
    "profile": profile,
  })))
}

#[instrument(name = "handler::update_profile", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ProfileUpdate>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let profile = users::upsert_profile(&app_state.db_pool, auth_user.user_id, &payload).await?;
  Ok(HttpResponse::Ok().json(profile))
}

#[instrument(name = "handler::update_avatar", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn update_avatar_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AvatarPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let url = payload.avatar_url.trim();
  if !(url.starts_with("https://") || url.starts_with("http://")) {
    return Err(AppError::Validation("avatarUrl must be an http(s) URL.".to_string()));
  }
  let user = users::set_avatar(&app_state.db_pool, auth_user.user_id, url).await?;
  Ok(HttpResponse::Ok().json(json!({ "avatarUrl": user.avatar_url })))
}

#[instrument(name = "handler::change_password", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn change_password_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ChangePasswordPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user = users::require(&app_state.db_pool, auth_user.user_id).await?;
  if !auth_service::verify_password(&user.password_hash, &payload.current_password)? {
    return Err(AppError::Validation("Current password is incorrect.".to_string()));
  }
  auth_service::validate_new_password(&payload.new_password, None)?;
  let new_hash = auth_service::hash_password(&payload.new_password)?;
  users::update_password(&app_state.db_pool, user.id, &new_hash).await?;
  info!("Password changed.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Password updated." })))
}

/// Always answers 200 so the endpoint does not reveal which emails exist.
#[instrument(name = "handler::forgot_password", skip_all)]
pub async fn forgot_password_handler(
  app_state: web::Data<AppState>,
  email: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  if let Some(user) = users::find_by_email(&app_state.db_pool, email.trim()).await? {
    let code = generate_reset_code();
    let code_hash = auth_service::hash_password(&code)?;
    let expires_at = Utc::now() + Duration::minutes(RESET_CODE_VALID_MINUTES);
    users::set_reset_token(&app_state.db_pool, user.id, &code_hash, expires_at).await?;
    email_mock::send_password_reset_code(&app_state.config.mail_sender, &user.email, &code, RESET_CODE_VALID_MINUTES)
      .await?;
    info!(user_id = %user.id, "Password reset code issued.");
  }
  Ok(HttpResponse::Ok().json(json!({
    "message": "If the email is registered, a reset code has been sent."
  })))
}

#[instrument(name = "handler::verify_reset_code", skip_all)]
pub async fn verify_reset_code_handler(
  app_state: web::Data<AppState>,
  email: web::Path<String>,
  payload: web::Json<ResetCodePayload>,
) -> Result<HttpResponse, AppError> {
  let valid = match users::find_by_email(&app_state.db_pool, email.trim()).await? {
    Some(user) => reset_code_matches(&user, &payload.token)?,
    None => false,
  };
  Ok(HttpResponse::Ok().json(json!({ "valid": valid })))
}

#[instrument(name = "handler::reset_password", skip_all)]
pub async fn reset_password_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ResetPasswordPayload>,
) -> Result<HttpResponse, AppError> {
  let invalid = || AppError::Validation("Invalid or expired reset code.".to_string());
  let user = users::find_by_email(&app_state.db_pool, payload.email.trim())
    .await?
    .ok_or_else(invalid)?;
  if !reset_code_matches(&user, &payload.token)? {
    return Err(invalid());
  }
  auth_service::validate_new_password(&payload.password, None)?;
  let new_hash = auth_service::hash_password(&payload.password)?;
  users::update_password(&app_state.db_pool, user.id, &new_hash).await?;
  info!(user_id = %user.id, "Password reset.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Password has been reset." })))
}

// --- Admin handlers ---

#[instrument(name = "handler::admin_list_users", skip_all)]
pub async fn admin_list_users_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(users::list_all(&app_state.db_pool).await?))
}

#[instrument(name = "handler::admin_create_user", skip(app_state, payload, _admin), fields(user_name = %payload.user_name))]
pub async fn admin_create_user_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AdminCreateUserPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let user = run_signup(
    &app_state,
    SignupCtxData {
      app_state: app_state.get_ref().clone(),
      user_name: payload.user_name,
      email: payload.email,
      name: payload.name,
      password: payload.password,
      confirm_password: None,
      role: payload.role,
      created_user: None,
    },
  )
  .await?;
  Ok(HttpResponse::Created().json(user))
}

#[instrument(name = "handler::admin_edit_user", skip(app_state, payload, _admin), fields(user_id = %payload.user_id))]
pub async fn admin_edit_user_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AdminEditPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let user = users::admin_update(&app_state.db_pool, payload.user_id, payload.name.as_deref(), payload.role).await?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::admin_delete_user", skip(app_state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn admin_delete_user_handler(
  app_state: web::Data<AppState>,
  user_id: web::Path<Uuid>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let user_id = user_id.into_inner();
  if user_id == admin.0.user_id {
    return Err(AppError::Validation("Administrators cannot delete their own account.".to_string()));
  }
  users::delete_cascade(&app_state.db_pool, user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "User deleted.", "userId": user_id })))
}

#[instrument(name = "handler::admin_search_users", skip_all)]
pub async fn admin_search_users_handler(
  app_state: web::Data<AppState>,
  filter: web::Query<UserSearch>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(users::search(&app_state.db_pool, &filter).await?))
}

#[instrument(name = "handler::admin_total_users", skip_all)]
pub async fn admin_total_users_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let total = users::count(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({ "totalUsers": total })))
}
