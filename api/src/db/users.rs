// api/src/db/users.rs

use super::{conflict_on_unique, reviews};
use crate::errors::{AppError, Result};
use crate::ledger::postgres as ledger_pg;
use crate::models::{Profile, Role, User};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, user_name, email, name, password_hash, role, avatar_url, reset_password_token, \
                            reset_password_expires_at, created_at, updated_at";
const PROFILE_COLUMNS: &str = "user_id, full_name, phone, birthday, address, created_at, updated_at";

pub struct NewUser<'a> {
  pub user_name: &'a str,
  pub email: &'a str,
  pub name: &'a str,
  pub password_hash: String,
  pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub birthday: Option<NaiveDate>,
  pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearch {
  pub user_name: Option<String>,
  pub name: Option<String>,
  pub email: Option<String>,
  pub role: Option<Role>,
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
  let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(user)
}

pub async fn require(pool: &PgPool, id: Uuid) -> Result<User> {
  find_by_id(pool, id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found.", id)))
}

pub async fn find_by_user_name(pool: &PgPool, user_name: &str) -> Result<Option<User>> {
  let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE user_name = $1", USER_COLUMNS))
    .bind(user_name)
    .fetch_optional(pool)
    .await?;
  Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
  let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS))
    .bind(email)
    .fetch_optional(pool)
    .await?;
  Ok(user)
}

pub async fn exists_user_name_or_email(pool: &PgPool, user_name: &str, email: &str) -> Result<bool> {
  let exists = sqlx::query_scalar::<_, bool>(
    "SELECT EXISTS(SELECT 1 FROM users WHERE user_name = $1 OR lower(email) = lower($2))",
  )
  .bind(user_name)
  .bind(email)
  .fetch_one(pool)
  .await?;
  Ok(exists)
}

pub async fn insert(pool: &PgPool, new_user: NewUser<'_>) -> Result<User> {
  let user = sqlx::query_as::<_, User>(&format!(
    "INSERT INTO users (id, user_name, email, name, password_hash, role) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    USER_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(new_user.user_name)
  .bind(new_user.email)
  .bind(new_user.name)
  .bind(new_user.password_hash)
  .bind(new_user.role)
  .fetch_one(pool)
  .await
  .map_err(conflict_on_unique("User name or email is already in use."))?;
  Ok(user)
}

/// Stores a new hash and invalidates any outstanding reset code.
pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
  sqlx::query(
    "UPDATE users SET password_hash = $2, reset_password_token = NULL, reset_password_expires_at = NULL, \
     updated_at = now() WHERE id = $1",
  )
  .bind(id)
  .bind(password_hash)
  .execute(pool)
  .await?;
  Ok(())
}

pub async fn set_avatar(pool: &PgPool, id: Uuid, avatar_url: &str) -> Result<User> {
  let user = sqlx::query_as::<_, User>(&format!(
    "UPDATE users SET avatar_url = $2, updated_at = now() WHERE id = $1 RETURNING {}",
    USER_COLUMNS
  ))
  .bind(id)
  .bind(avatar_url)
  .fetch_optional(pool)
  .await?;
  user.ok_or_else(|| AppError::NotFound(format!("User {} not found.", id)))
}

pub async fn set_reset_token(pool: &PgPool, id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
  sqlx::query("UPDATE users SET reset_password_token = $2, reset_password_expires_at = $3 WHERE id = $1")
    .bind(id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;
  Ok(())
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<User>> {
  let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS))
    .fetch_all(pool)
    .await?;
  Ok(users)
}

pub async fn search(pool: &PgPool, filter: &UserSearch) -> Result<Vec<User>> {
  let users = sqlx::query_as::<_, User>(&format!(
    "SELECT {} FROM users \
     WHERE ($1::text IS NULL OR user_name ILIKE '%' || $1 || '%') \
       AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%') \
       AND ($3::text IS NULL OR email ILIKE '%' || $3 || '%') \
       AND ($4::user_role IS NULL OR role = $4) \
     ORDER BY created_at DESC",
    USER_COLUMNS
  ))
  .bind(&filter.user_name)
  .bind(&filter.name)
  .bind(&filter.email)
  .bind(filter.role)
  .fetch_all(pool)
  .await?;
  Ok(users)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
  Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(pool).await?)
}

pub async fn admin_update(pool: &PgPool, id: Uuid, name: Option<&str>, role: Option<Role>) -> Result<User> {
  let user = sqlx::query_as::<_, User>(&format!(
    "UPDATE users SET name = COALESCE($2, name), role = COALESCE($3, role), updated_at = now() \
     WHERE id = $1 RETURNING {}",
    USER_COLUMNS
  ))
  .bind(id)
  .bind(name)
  .bind(role)
  .fetch_optional(pool)
  .await?;
  user.ok_or_else(|| AppError::NotFound(format!("User {} not found.", id)))
}

/// Deletes a user with their reviews, registrations and profile in one transaction.
#[instrument(name = "db::users::delete_cascade", skip(pool), fields(%id), err(Display))]
pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<()> {
  let mut tx = pool.begin().await?;
  let reviews_removed = reviews::delete_for_user(&mut tx, id).await?;
  let registrations_removed = ledger_pg::delete_for_user(&mut tx, id).await?;
  sqlx::query("DELETE FROM profiles WHERE user_id = $1")
    .bind(id)
    .execute(&mut *tx)
    .await?;
  let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
  if deleted == 0 {
    return Err(AppError::NotFound(format!("User {} not found.", id)));
  }
  tx.commit().await?;
  info!(reviews_removed, registrations_removed, "User deleted with dependents.");
  Ok(())
}

pub async fn find_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>> {
  let profile = sqlx::query_as::<_, Profile>(&format!("SELECT {} FROM profiles WHERE user_id = $1", PROFILE_COLUMNS))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
  Ok(profile)
}

/// Creates the profile on first write; later writes only touch the supplied fields.
pub async fn upsert_profile(pool: &PgPool, user_id: Uuid, update: &ProfileUpdate) -> Result<Profile> {
  let profile = sqlx::query_as::<_, Profile>(&format!(
    "INSERT INTO profiles (user_id, full_name, phone, birthday, address) VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (user_id) DO UPDATE SET \
       full_name = COALESCE(EXCLUDED.full_name, profiles.full_name), \
       phone = COALESCE(EXCLUDED.phone, profiles.phone), \
       birthday = COALESCE(EXCLUDED.birthday, profiles.birthday), \
       address = COALESCE(EXCLUDED.address, profiles.address), \
       updated_at = now() \
     RETURNING {}",
    PROFILE_COLUMNS
  ))
  .bind(user_id)
  .bind(&update.full_name)
  .bind(&update.phone)
  .bind(update.birthday)
  .bind(&update.address)
  .fetch_one(pool)
  .await?;
  Ok(profile)
}
