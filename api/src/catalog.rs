// api/src/catalog.rs

//! The slice of the course catalog the enrollment flow depends on.

use crate::db;
use crate::errors::Result;
use crate::models::PriceInfo;
use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait CourseCatalog: Send + Sync {
  /// `None` when the course does not exist.
  async fn price_info(&self, course_id: Uuid) -> Result<Option<PriceInfo>>;
}

#[derive(Clone)]
pub struct PgCourseCatalog {
  pool: PgPool,
}

impl PgCourseCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CourseCatalog for PgCourseCatalog {
  async fn price_info(&self, course_id: Uuid) -> Result<Option<PriceInfo>> {
    Ok(db::courses::find_by_id(&self.pool, course_id).await?.map(|c| c.price_info()))
  }
}

#[derive(Default)]
pub struct InMemoryCourseCatalog {
  prices: RwLock<HashMap<Uuid, PriceInfo>>,
}

impl InMemoryCourseCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a course and returns its id.
  pub fn add_course(&self, price: PriceInfo) -> Uuid {
    let id = Uuid::new_v4();
    self.prices.write().insert(id, price);
    id
  }
}

#[async_trait]
impl CourseCatalog for InMemoryCourseCatalog {
  async fn price_info(&self, course_id: Uuid) -> Result<Option<PriceInfo>> {
    Ok(self.prices.read().get(&course_id).copied())
  }
}
