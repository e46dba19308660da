// api/src/pipelines/signup_pipeline.rs

use crate::db::users::{self, NewUser};
use crate::errors::AppError;
use crate::pipelines::contexts::SignupCtxData;
use crate::services::auth_service;
use learnhub_flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

/// Account creation, shared by self-service registration and admin creation.
pub fn register_signup_pipeline(flow: &Flow<AppError>) {
  let mut signup_p = Pipeline::<SignupCtxData, AppError>::new(&[
    ("validate_signup_input", false, None),
    ("check_existing_user", false, None),
    ("create_user_in_db", false, None),
  ]);

  signup_p.on_step("validate_signup_input", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      event!(Level::DEBUG, user_name = %guard.user_name, "Validating signup input.");

      if guard.user_name.trim().is_empty() {
        return Err(AppError::Validation("userName is required.".to_string()));
      }
      auth_service::validate_email(guard.email.trim())?;
      auth_service::validate_new_password(&guard.password, guard.confirm_password.as_deref())?;
      Ok(PipelineControl::Continue)
    })
  });

  signup_p.on_step("check_existing_user", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (user_name, email, db_pool) = {
        let guard = ctx_data.read();
        (
          guard.user_name.trim().to_string(),
          guard.email.trim().to_string(),
          guard.app_state.db_pool.clone(),
        )
      };

      if users::exists_user_name_or_email(&db_pool, &user_name, &email).await? {
        warn!(%user_name, "Signup with an existing user name or email.");
        return Err(AppError::Conflict("User name or email is already in use.".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  signup_p.on_step("create_user_in_db", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (user_name, email, name, password, role, db_pool) = {
        let guard = ctx_data.read();
        (
          guard.user_name.trim().to_string(),
          guard.email.trim().to_string(),
          guard.name.trim().to_string(),
          guard.password.clone(),
          guard.role,
          guard.app_state.db_pool.clone(),
        )
      };

      let password_hash = auth_service::hash_password(&password)?;
      // The unique constraints still catch a concurrent signup that passed the check above.
      let user = users::insert(
        &db_pool,
        NewUser {
          user_name: &user_name,
          email: &email,
          name: &name,
          password_hash,
          role,
        },
      )
      .await?;
      info!(user_id = %user.id, ?role, "User created.");

      ctx_data.write().created_user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flow.register_pipeline(signup_p);
}
