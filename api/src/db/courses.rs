// api/src/db/courses.rs

use super::{conflict_on_unique, double_option, lessons, quizzes, reviews};
use crate::errors::{AppError, Result};
use crate::ledger::postgres as ledger_pg;
use crate::models::course::slugify;
use crate::models::{Course, MyCourse, RegisteredUser};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use tracing::{info, instrument};
use uuid::Uuid;

const COURSE_COLUMNS: &str =
  "id, name, url_slug, category, level, price, discount_price, image, description, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
  pub name: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub level: String,
  pub price: Decimal,
  #[serde(default)]
  pub discount_price: Option<Decimal>,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
  pub name: Option<String>,
  pub category: Option<String>,
  pub level: Option<String>,
  pub price: Option<Decimal>,
  #[serde(default, deserialize_with = "double_option")]
  pub discount_price: Option<Option<Decimal>>,
  #[serde(default, deserialize_with = "double_option")]
  pub image: Option<Option<String>>,
  pub description: Option<String>,
}

/// Price rules shared by create and update.
pub fn validate_pricing(name: &str, price: Decimal, discount_price: Option<Decimal>) -> Result<()> {
  if name.trim().is_empty() {
    return Err(AppError::Validation("Course name is required.".to_string()));
  }
  if price.is_sign_negative() {
    return Err(AppError::Validation("Price must not be negative.".to_string()));
  }
  if let Some(discount) = discount_price {
    if discount.is_sign_negative() {
      return Err(AppError::Validation("Discount price must not be negative.".to_string()));
    }
    if discount > price {
      return Err(AppError::Validation(
        "Discount price must not exceed the price.".to_string(),
      ));
    }
  }
  Ok(())
}

/// First of `base`, `base-1`, `base-2`... not present in `taken`.
pub fn next_free_slug(base: &str, taken: &HashSet<String>) -> String {
  let base = if base.is_empty() { "course" } else { base };
  if !taken.contains(base) {
    return base.to_string();
  }
  (1u32..)
    .map(|n| format!("{}-{}", base, n))
    .find(|candidate| !taken.contains(candidate))
    .unwrap_or_else(|| format!("{}-{}", base, Uuid::new_v4()))
}

async fn unique_slug(conn: &mut PgConnection, name: &str, exclude: Option<Uuid>) -> Result<String> {
  let base = slugify(name);
  let taken: Vec<String> = sqlx::query_scalar(
    "SELECT url_slug FROM courses WHERE (url_slug = $1 OR url_slug LIKE $1 || '-%') AND ($2::uuid IS NULL OR id <> $2)",
  )
  .bind(&base)
  .bind(exclude)
  .fetch_all(&mut *conn)
  .await?;
  Ok(next_free_slug(&base, &taken.into_iter().collect()))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Course>> {
  let course = sqlx::query_as::<_, Course>(&format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?;
  Ok(course)
}

pub async fn find_by_slug(pool: &PgPool, url_slug: &str) -> Result<Option<Course>> {
  let course = sqlx::query_as::<_, Course>(&format!("SELECT {} FROM courses WHERE url_slug = $1", COURSE_COLUMNS))
    .bind(url_slug)
    .fetch_optional(pool)
    .await?;
  Ok(course)
}

pub async fn require(pool: &PgPool, id: Uuid) -> Result<Course> {
  find_by_id(pool, id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Course {} not found.", id)))
}

pub async fn list_page(pool: &PgPool, page: i64, limit: i64) -> Result<Vec<Course>> {
  let offset = (page.max(1) - 1) * limit;
  let courses = sqlx::query_as::<_, Course>(&format!(
    "SELECT {} FROM courses ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    COURSE_COLUMNS
  ))
  .bind(limit)
  .bind(offset)
  .fetch_all(pool)
  .await?;
  Ok(courses)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
  Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses").fetch_one(pool).await?)
}

async fn insert(conn: &mut PgConnection, new_course: &NewCourse) -> Result<Course> {
  validate_pricing(&new_course.name, new_course.price, new_course.discount_price)?;
  let url_slug = unique_slug(&mut *conn, &new_course.name, None).await?;
  let course = sqlx::query_as::<_, Course>(&format!(
    "INSERT INTO courses (id, name, url_slug, category, level, price, discount_price, image, description) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
    COURSE_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(new_course.name.trim())
  .bind(&url_slug)
  .bind(&new_course.category)
  .bind(&new_course.level)
  .bind(new_course.price)
  .bind(new_course.discount_price)
  .bind(&new_course.image)
  .bind(&new_course.description)
  .fetch_one(&mut *conn)
  .await
  .map_err(conflict_on_unique("A course with this URL already exists."))?;
  Ok(course)
}

#[instrument(name = "db::courses::create", skip(pool, new_course), fields(name = %new_course.name), err(Display))]
pub async fn create(pool: &PgPool, new_course: &NewCourse) -> Result<Course> {
  let mut tx = pool.begin().await?;
  let course = insert(&mut tx, new_course).await?;
  tx.commit().await?;
  info!(course_id = %course.id, url_slug = %course.url_slug, "Course created.");
  Ok(course)
}

/// All-or-nothing bulk insert.
#[instrument(name = "db::courses::create_many", skip(pool, new_courses), fields(count = new_courses.len()), err(Display))]
pub async fn create_many(pool: &PgPool, new_courses: &[NewCourse]) -> Result<Vec<Course>> {
  if new_courses.is_empty() {
    return Err(AppError::Validation("At least one course is required.".to_string()));
  }
  let mut tx = pool.begin().await?;
  let mut created = Vec::with_capacity(new_courses.len());
  for new_course in new_courses {
    created.push(insert(&mut tx, new_course).await?);
  }
  tx.commit().await?;
  Ok(created)
}

#[instrument(name = "db::courses::update", skip(pool, patch), fields(%id), err(Display))]
pub async fn update(pool: &PgPool, id: Uuid, patch: CoursePatch) -> Result<Course> {
  let mut tx = pool.begin().await?;
  let mut course = sqlx::query_as::<_, Course>(&format!(
    "SELECT {} FROM courses WHERE id = $1 FOR UPDATE",
    COURSE_COLUMNS
  ))
  .bind(id)
  .fetch_optional(&mut *tx)
  .await?
  .ok_or_else(|| AppError::NotFound(format!("Course {} not found.", id)))?;

  if let Some(name) = patch.name {
    if name.trim() != course.name {
      course.url_slug = unique_slug(&mut tx, &name, Some(id)).await?;
      course.name = name.trim().to_string();
    }
  }
  if let Some(category) = patch.category {
    course.category = category;
  }
  if let Some(level) = patch.level {
    course.level = level;
  }
  if let Some(price) = patch.price {
    course.price = price;
  }
  if let Some(discount_price) = patch.discount_price {
    course.discount_price = discount_price;
  }
  if let Some(image) = patch.image {
    course.image = image;
  }
  if let Some(description) = patch.description {
    course.description = description;
  }
  validate_pricing(&course.name, course.price, course.discount_price)?;

  let updated = sqlx::query_as::<_, Course>(&format!(
    "UPDATE courses SET name = $2, url_slug = $3, category = $4, level = $5, price = $6, discount_price = $7, \
     image = $8, description = $9, updated_at = now() WHERE id = $1 RETURNING {}",
    COURSE_COLUMNS
  ))
  .bind(id)
  .bind(&course.name)
  .bind(&course.url_slug)
  .bind(&course.category)
  .bind(&course.level)
  .bind(course.price)
  .bind(course.discount_price)
  .bind(&course.image)
  .bind(&course.description)
  .fetch_one(&mut *tx)
  .await
  .map_err(conflict_on_unique("A course with this URL already exists."))?;
  tx.commit().await?;
  Ok(updated)
}

/// Deletes a course with its lessons, quizzes, reviews and registrations in one transaction.
#[instrument(name = "db::courses::delete_cascade", skip(pool), fields(%id), err(Display))]
pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<()> {
  let mut tx = pool.begin().await?;
  let lessons_removed = lessons::delete_for_course(&mut tx, id).await?;
  let quizzes_removed = quizzes::delete_for_course(&mut tx, id).await?;
  let reviews_removed = reviews::delete_for_course(&mut tx, id).await?;
  let registrations_removed = ledger_pg::delete_for_course(&mut tx, id).await?;
  let deleted = sqlx::query("DELETE FROM courses WHERE id = $1")
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
  if deleted == 0 {
    // Dropping `tx` rolls back the dependent deletes.
    return Err(AppError::NotFound(format!("Course {} not found.", id)));
  }
  tx.commit().await?;
  info!(
    lessons_removed,
    quizzes_removed, reviews_removed, registrations_removed, "Course deleted with dependents."
  );
  Ok(())
}

pub async fn list_my_courses(pool: &PgPool, user_id: Uuid) -> Result<Vec<MyCourse>> {
  let courses = sqlx::query_as::<_, MyCourse>(
    "SELECT c.id, c.name, c.url_slug, c.category, c.level, c.price, c.discount_price, c.image, c.description, \
            c.created_at, c.updated_at, r.updated_at AS registered_at \
     FROM registrations r JOIN courses c ON c.id = r.course_id \
     WHERE r.user_id = $1 AND r.status = 'Confirmed' \
     ORDER BY r.updated_at DESC",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;
  Ok(courses)
}

pub async fn registered_users(pool: &PgPool, course_id: Uuid) -> Result<Vec<RegisteredUser>> {
  let users = sqlx::query_as::<_, RegisteredUser>(
    "SELECT r.id AS registration_id, u.id AS user_id, u.user_name, u.email, u.name, r.status, \
            r.created_at AS registered_at \
     FROM registrations r JOIN users u ON u.id = r.user_id \
     WHERE r.course_id = $1 \
     ORDER BY r.created_at DESC",
  )
  .bind(course_id)
  .fetch_all(pool)
  .await?;
  Ok(users)
}
