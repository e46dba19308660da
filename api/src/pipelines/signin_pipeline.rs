// api/src/pipelines/signin_pipeline.rs

use crate::db::users;
use crate::errors::AppError;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use learnhub_flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

const BAD_CREDENTIALS: &str = "Invalid user name or password.";

pub fn register_signin_pipeline(flow: &Flow<AppError>) {
  let mut signin_p = Pipeline::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("fetch_user", false, None),
    ("verify_user_password", false, None),
    ("issue_tokens", false, None),
  ]);

  signin_p.on_step("validate_signin_input", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      if guard.user_name.trim().is_empty() || guard.password.is_empty() {
        return Err(AppError::Validation("userName and password are required.".to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  signin_p.on_step("fetch_user", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let (user_name, db_pool) = {
        let guard = ctx_data.read();
        (guard.user_name.trim().to_string(), guard.app_state.db_pool.clone())
      };

      match users::find_by_user_name(&db_pool, &user_name).await? {
        Some(user) => {
          event!(Level::DEBUG, user_id = %user.id, "User found for signin.");
          ctx_data.write().user = Some(user);
          Ok(PipelineControl::Continue)
        }
        None => {
          warn!(%user_name, "Signin for unknown user name.");
          Err(AppError::Auth(BAD_CREDENTIALS.to_string()))
        }
      }
    })
  });

  signin_p.on_step("verify_user_password", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let user = guard
        .user
        .as_ref()
        .ok_or_else(|| AppError::Internal("User missing before password check.".to_string()))?;

      if auth_service::verify_password(&user.password_hash, &guard.password)? {
        Ok(PipelineControl::Continue)
      } else {
        warn!(user_id = %user.id, "Password mismatch on signin.");
        Err(AppError::Auth(BAD_CREDENTIALS.to_string()))
      }
    })
  });

  signin_p.on_step("issue_tokens", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let (tokens, identity) = {
        let guard = ctx_data.read();
        (guard.app_state.tokens.clone(), guard.user.as_ref().map(|u| (u.id, u.role)))
      };
      let (user_id, role) =
        identity.ok_or_else(|| AppError::Internal("User missing before token issue.".to_string()))?;

      let access_token = tokens.issue_access(user_id, role)?;
      let refresh_token = tokens.issue_refresh(user_id)?;
      info!(%user_id, "Signin successful; tokens issued.");

      let mut guard = ctx_data.write();
      guard.access_token = Some(access_token);
      guard.refresh_token = Some(refresh_token);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flow.register_pipeline(signin_p);
}
