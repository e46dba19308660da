// api/src/db/reviews.rs

use super::conflict_on_unique;
use crate::errors::{AppError, Result};
use crate::models::{Review, ReviewWithAuthor};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, course_id, user_id, rating, review, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
  pub course_id: Uuid,
  pub rating: i16,
  #[serde(default)]
  pub review: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
  pub rating: Option<i16>,
  pub review: Option<String>,
}

pub fn validate_rating(rating: i16) -> Result<()> {
  if !(1..=5).contains(&rating) {
    return Err(AppError::Validation("Rating must be between 1 and 5.".to_string()));
  }
  Ok(())
}

pub async fn create(pool: &PgPool, user_id: Uuid, new_review: &NewReview) -> Result<Review> {
  validate_rating(new_review.rating)?;
  let review = sqlx::query_as::<_, Review>(&format!(
    "INSERT INTO reviews (id, course_id, user_id, rating, review) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
    REVIEW_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(new_review.course_id)
  .bind(user_id)
  .bind(new_review.rating)
  .bind(&new_review.review)
  .fetch_one(pool)
  .await
  .map_err(conflict_on_unique("You have already reviewed this course."))?;
  Ok(review)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Review>> {
  let review = sqlx::query_as::<_, Review>(&format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(review)
}

pub async fn update(pool: &PgPool, id: Uuid, patch: ReviewPatch) -> Result<Review> {
  if let Some(rating) = patch.rating {
    validate_rating(rating)?;
  }
  let review = sqlx::query_as::<_, Review>(&format!(
    "UPDATE reviews SET rating = COALESCE($2, rating), review = COALESCE($3, review), updated_at = now() \
     WHERE id = $1 RETURNING {}",
    REVIEW_COLUMNS
  ))
  .bind(id)
  .bind(patch.rating)
  .bind(patch.review)
  .fetch_optional(pool)
  .await?;
  review.ok_or_else(|| AppError::NotFound(format!("Review {} not found.", id)))
}

pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<ReviewWithAuthor>> {
  let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
    "SELECT r.id, r.course_id, r.user_id, r.rating, r.review, r.created_at, r.updated_at, \
            u.name AS author_name, u.email AS author_email \
     FROM reviews r JOIN users u ON u.id = r.user_id \
     WHERE r.course_id = $1 \
     ORDER BY r.created_at DESC",
  )
  .bind(course_id)
  .fetch_all(pool)
  .await?;
  Ok(reviews)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<()> {
  let deleted = sqlx::query("DELETE FROM reviews WHERE id = $1")
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
  if deleted == 0 {
    return Err(AppError::NotFound(format!("Review {} not found.", id)));
  }
  Ok(())
}

pub async fn count(pool: &PgPool) -> Result<i64> {
  Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews").fetch_one(pool).await?)
}

pub async fn delete_for_course(conn: &mut PgConnection, course_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM reviews WHERE course_id = $1")
    .bind(course_id)
    .execute(&mut *conn)
    .await?;
  Ok(result.rows_affected())
}

pub async fn delete_for_user(conn: &mut PgConnection, user_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM reviews WHERE user_id = $1")
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
  Ok(result.rows_affected())
}
