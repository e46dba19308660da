// api/src/web/extractors.rs

//! Caller identity taken from the `Authorization: Bearer <token>` header.

use crate::errors::AppError;
use crate::models::Role;
use crate::state::AppState;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: Role,
}

impl AuthenticatedUser {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}

/// An authenticated caller whose token carries the Admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthenticatedUser);

/// The caller's identity when a valid token is present; anonymous otherwise.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

/// `Ok(None)` when there is no header at all; `Err` when it is not a bearer token.
fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AppError> {
  let Some(header) = req.headers().get(actix_web::http::header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = header
    .to_str()
    .map_err(|_| AppError::Auth("Authorization header is not valid text.".to_string()))?;
  let token = value
    .strip_prefix("Bearer ")
    .ok_or_else(|| AppError::Auth("Authorization header must start with \"Bearer \".".to_string()))?
    .trim();
  if token.is_empty() {
    return Err(AppError::Auth("Token is missing from Authorization header.".to_string()));
  }
  Ok(Some(token))
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let token = bearer_token(req)?.ok_or_else(|| AppError::Auth("Authorization header is missing.".to_string()))?;
  let app_state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
  let claims = app_state.tokens.verify_access(token)?;
  Ok(AuthenticatedUser {
    user_id: claims.sub,
    role: claims.role,
  })
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req).map_err(|e| {
      warn!(path = %req.path(), error = %e, "Request rejected by authentication.");
      e
    }))
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = authenticate(req).and_then(|user| {
      if user.is_admin() {
        Ok(AdminUser(user))
      } else {
        warn!(user_id = %user.user_id, path = %req.path(), "Non-admin attempted an admin route.");
        Err(AppError::Forbidden("Administrator access required.".to_string()))
      }
    });
    ready(result)
  }
}

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Ok(MaybeUser(authenticate(req).ok())))
  }
}
