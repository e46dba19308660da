// api/src/ledger/postgres.rs

use super::{initial_status, RegistrationLedger};
use crate::db::conflict_on_unique;
use crate::errors::{AppError, Result};
use crate::models::{PriceInfo, Registration, RegistrationDetail, RegistrationStatus};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{event, instrument, Level};
use uuid::Uuid;

const REGISTRATION_COLUMNS: &str = "id, user_id, course_id, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgRegistrationLedger {
  pool: PgPool,
}

impl PgRegistrationLedger {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

const ACTIVE_EXISTS: &str = "An active registration for this course already exists.";

#[async_trait]
impl RegistrationLedger for PgRegistrationLedger {
  #[instrument(name = "ledger::create", skip(self, price), fields(%user_id, %course_id), err(Display))]
  async fn create(&self, user_id: Uuid, course_id: Uuid, price: &PriceInfo) -> Result<Registration> {
    let status = initial_status(price);
    let registration = sqlx::query_as::<_, Registration>(&format!(
      "INSERT INTO registrations (id, user_id, course_id, status) VALUES ($1, $2, $3, $4) RETURNING {}",
      REGISTRATION_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(course_id)
    .bind(status)
    .fetch_one(&self.pool)
    .await
    .map_err(conflict_on_unique(ACTIVE_EXISTS))?;

    event!(Level::INFO, registration_id = %registration.id, %status, "Registration created.");
    Ok(registration)
  }

  async fn get_by_user(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Registration>> {
    let registration = sqlx::query_as::<_, Registration>(&format!(
      "SELECT {} FROM registrations WHERE user_id = $1 AND course_id = $2 \
       ORDER BY updated_at DESC, created_at DESC LIMIT 1",
      REGISTRATION_COLUMNS
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(registration)
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
    let registration =
      sqlx::query_as::<_, Registration>(&format!("SELECT {} FROM registrations WHERE id = $1", REGISTRATION_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(registration)
  }

  #[instrument(name = "ledger::set_status", skip(self), fields(%id, %status), err(Display))]
  async fn set_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration> {
    let registration = sqlx::query_as::<_, Registration>(&format!(
      "UPDATE registrations SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
      REGISTRATION_COLUMNS
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(&self.pool)
    .await
    .map_err(conflict_on_unique(ACTIVE_EXISTS))?;

    registration.ok_or_else(|| AppError::NotFound(format!("Registration {} not found.", id)))
  }

  #[instrument(name = "ledger::confirm_payment", skip(self), fields(%id), err(Display))]
  async fn confirm_payment(&self, id: Uuid) -> Result<Registration> {
    // Single statement so a concurrent cancel is never overwritten.
    let updated = sqlx::query_as::<_, Registration>(&format!(
      "UPDATE registrations \
       SET status = 'Confirmed', \
           updated_at = CASE WHEN status = 'Confirmed' THEN updated_at ELSE now() END \
       WHERE id = $1 AND status <> 'Cancelled' RETURNING {}",
      REGISTRATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(conflict_on_unique(ACTIVE_EXISTS))?;

    match updated {
      Some(registration) => Ok(registration),
      None => match self.get_by_id(id).await? {
        Some(_) => Err(AppError::Conflict(format!(
          "Registration {} is cancelled and cannot be confirmed.",
          id
        ))),
        None => Err(AppError::NotFound(format!("Registration {} not found.", id))),
      },
    }
  }

  async fn list_all(&self, newest_first: bool) -> Result<Vec<Registration>> {
    let direction = if newest_first { "DESC" } else { "ASC" };
    let registrations = sqlx::query_as::<_, Registration>(&format!(
      "SELECT {} FROM registrations ORDER BY created_at {}",
      REGISTRATION_COLUMNS, direction
    ))
    .fetch_all(&self.pool)
    .await?;
    Ok(registrations)
  }

  async fn count_all(&self) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations")
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Registration>> {
    let registrations = sqlx::query_as::<_, Registration>(&format!(
      "SELECT {} FROM registrations WHERE course_id = $1 ORDER BY created_at DESC",
      REGISTRATION_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(registrations)
  }

  async fn list_confirmed_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>> {
    let registrations = sqlx::query_as::<_, Registration>(&format!(
      "SELECT {} FROM registrations WHERE user_id = $1 AND status = 'Confirmed' ORDER BY updated_at DESC",
      REGISTRATION_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(registrations)
  }
}

/// Every registration with its user and course names, newest first.
pub async fn list_with_details(pool: &PgPool) -> Result<Vec<RegistrationDetail>> {
  let registrations = sqlx::query_as::<_, RegistrationDetail>(
    "SELECT r.id, u.id AS user_id, u.user_name, u.email, u.name, \
            c.id AS course_id, c.name AS course_name, r.status, r.created_at, r.updated_at \
     FROM registrations r \
     JOIN users u ON u.id = r.user_id \
     JOIN courses c ON c.id = r.course_id \
     ORDER BY r.created_at DESC",
  )
  .fetch_all(pool)
  .await?;
  Ok(registrations)
}

/// Removes every registration of a course inside the caller's transaction.
pub async fn delete_for_course(conn: &mut PgConnection, course_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM registrations WHERE course_id = $1")
    .bind(course_id)
    .execute(&mut *conn)
    .await?;
  Ok(result.rows_affected())
}

/// Removes every registration of a user inside the caller's transaction.
pub async fn delete_for_user(conn: &mut PgConnection, user_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM registrations WHERE user_id = $1")
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
  Ok(result.rows_affected())
}
