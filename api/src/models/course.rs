// api/src/models/course.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What the enrollment flow needs to know about a course's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
  pub price: Decimal,
  pub discount_price: Option<Decimal>,
}

impl PriceInfo {
  pub fn new(price: Decimal, discount_price: Option<Decimal>) -> Self {
    Self { price, discount_price }
  }

  /// A course is free when its base price or its discount price is zero.
  pub fn is_free(&self) -> bool {
    self.price.is_zero() || self.discount_price.map_or(false, |d| d.is_zero())
  }

  pub fn effective_price(&self) -> Decimal {
    if self.is_free() {
      return Decimal::ZERO;
    }
    self.discount_price.unwrap_or(self.price)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: Uuid,
  pub name: String,
  pub url_slug: String,
  pub category: String,
  pub level: String,
  pub price: Decimal,
  pub discount_price: Option<Decimal>,
  pub image: Option<String>,
  pub description: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Course {
  pub fn price_info(&self) -> PriceInfo {
    PriceInfo::new(self.price, self.discount_price)
  }
}

/// A course the caller holds a confirmed registration for.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MyCourse {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub course: Course,
  pub registered_at: DateTime<Utc>,
}

/// Lower-case, dash-separated form of a course name used in URLs.
pub fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  let mut pending_dash = false;
  for ch in name.trim().chars() {
    if ch.is_alphanumeric() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.extend(ch.to_lowercase());
    } else {
      pending_dash = true;
    }
  }
  slug
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn slugify_collapses_separators() {
    assert_eq!(slugify("  Rust for   Web Devs! "), "rust-for-web-devs");
    assert_eq!(slugify("C++ & Go"), "c-go");
    assert_eq!(slugify("---"), "");
  }

  #[test]
  fn zero_price_or_zero_discount_is_free() {
    assert!(PriceInfo::new(dec!(0), None).is_free());
    assert!(PriceInfo::new(dec!(49.99), Some(dec!(0))).is_free());
    assert!(!PriceInfo::new(dec!(20.00), None).is_free());
    assert!(!PriceInfo::new(dec!(20.00), Some(dec!(5.00))).is_free());
  }

  #[test]
  fn effective_price_prefers_discount() {
    assert_eq!(PriceInfo::new(dec!(20.00), Some(dec!(15.00))).effective_price(), dec!(15.00));
    assert_eq!(PriceInfo::new(dec!(20.00), None).effective_price(), dec!(20.00));
    assert_eq!(PriceInfo::new(dec!(20.00), Some(dec!(0))).effective_price(), Decimal::ZERO);
  }
}
