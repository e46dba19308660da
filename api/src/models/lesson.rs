// api/src/models/lesson.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
  pub title: String,
  /// Blank (and omitted from JSON) when the caller may not watch the video.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub url: String,
  /// Seconds.
  #[serde(default)]
  pub duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: Uuid,
  pub course_id: Uuid,
  pub title: String,
  pub description: String,
  pub videos: Json<Vec<Video>>,
  #[sqlx(rename = "lesson_order")]
  pub order: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Lesson {
  /// Keeps titles and durations, blanks the playable URLs.
  pub fn without_video_urls(mut self) -> Self {
    for video in self.videos.0.iter_mut() {
      video.url.clear();
    }
    self
  }
}
