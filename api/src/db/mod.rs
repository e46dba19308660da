// api/src/db/mod.rs

//! Postgres access for the account directory and course catalog.
//!
//! Functions that take `&mut PgConnection` run inside a caller-owned
//! transaction; cascading deletes thread one connection through every step.

pub mod courses;
pub mod lessons;
pub mod quizzes;
pub mod reviews;
pub mod users;

use crate::errors::AppError;

/// Maps a unique-constraint violation to `Conflict(message)`; anything else stays a database error.
pub fn conflict_on_unique(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
  move |err| match &err {
    sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(message.to_string()),
    _ => AppError::Sqlx(err),
  }
}

/// Lets a JSON patch tell "field absent" (`None`) from "field set to null" (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  T: serde::Deserialize<'de>,
  D: serde::Deserializer<'de>,
{
  serde::Deserialize::deserialize(deserializer).map(Some)
}
