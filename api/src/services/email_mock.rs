// api/src/services/email_mock.rs

//! Mail transport stand-in: messages are logged, not delivered.

use crate::errors::Result as AppResult;
use tracing::{info, instrument};

#[derive(Debug)]
pub struct SentEmailInfo {
  pub to: String,
  pub from: String,
  pub subject: String,
  pub message_id: String,
}

#[instrument(name = "email_mock::send_password_reset_code", skip(code))]
pub async fn send_password_reset_code(from: &str, to: &str, code: &str, valid_minutes: i64) -> AppResult<SentEmailInfo> {
  let subject = "Your LearnHub password reset code";
  let body = format!(
    "Use the code {} to reset your password. It expires in {} minutes.",
    code, valid_minutes
  );
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;

  let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
  info!(%message_id, body_len = body.len(), "Password reset email accepted by mock transport.");
  Ok(SentEmailInfo {
    to: to.to_string(),
    from: from.to_string(),
    subject: subject.to_string(),
    message_id,
  })
}
