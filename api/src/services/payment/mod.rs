// api/src/services/payment/mod.rs

//! Payment processor boundary: create an order, capture it.

pub mod mock;
pub mod paypal;

use crate::errors::AppError;
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

pub use mock::MockGateway;
pub use paypal::PaypalGateway;

/// Orders are always settled in this currency.
pub const SETTLEMENT_CURRENCY: &str = "USD";

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("could not reach payment processor: {0}")]
  Transport(String),

  #[error("payment processor did not answer in time")]
  Timeout,

  #[error("payment processor answered {status}: {body}")]
  Http { status: u16, body: String },

  #[error("unexpected payment processor response: {0}")]
  Parse(String),
}

impl From<GatewayError> for AppError {
  fn from(err: GatewayError) -> Self {
    AppError::Upstream(err.to_string())
  }
}

/// The processor's order representation, passed back to the client untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OrderHandle(pub serde_json::Value);

impl OrderHandle {
  pub fn id(&self) -> Option<&str> {
    self.0.get("id").and_then(|v| v.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
  Completed,
  Pending,
  Declined,
  Failed,
  /// Anything the processor reports outside the known set, kept verbatim.
  Unknown(String),
}

impl CaptureStatus {
  pub fn from_raw(raw: &str) -> Self {
    match raw {
      "COMPLETED" => CaptureStatus::Completed,
      "PENDING" => CaptureStatus::Pending,
      "DECLINED" => CaptureStatus::Declined,
      "FAILED" => CaptureStatus::Failed,
      _ => CaptureStatus::Unknown(raw.to_string()),
    }
  }
}

#[derive(Debug, Clone)]
pub struct CaptureResult {
  pub status: CaptureStatus,
  pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_order(&self, amount: Decimal) -> Result<OrderHandle, GatewayError>;

  async fn capture_order(&self, payment_id: &str) -> Result<CaptureResult, GatewayError>;
}

/// Two-decimal string the processor expects, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
  format!("{:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn capture_status_matches_exact_strings_and_keeps_unknowns() {
    assert_eq!(CaptureStatus::from_raw("COMPLETED"), CaptureStatus::Completed);
    assert_eq!(CaptureStatus::from_raw("PENDING"), CaptureStatus::Pending);
    assert_eq!(CaptureStatus::from_raw("DECLINED"), CaptureStatus::Declined);
    assert_eq!(CaptureStatus::from_raw("FAILED"), CaptureStatus::Failed);
    assert_eq!(CaptureStatus::from_raw("completed"), CaptureStatus::Unknown("completed".to_string()));
    assert_eq!(CaptureStatus::from_raw(" COMPLETED "), CaptureStatus::Unknown(" COMPLETED ".to_string()));
    assert_eq!(
      CaptureStatus::from_raw("PAYER_ACTION_REQUIRED"),
      CaptureStatus::Unknown("PAYER_ACTION_REQUIRED".to_string())
    );
  }

  #[test]
  fn amounts_have_two_decimals() {
    assert_eq!(format_amount(dec!(20)), "20.00");
    assert_eq!(format_amount(dec!(19.995)), "20.00");
    assert_eq!(format_amount(dec!(0.1)), "0.10");
    assert_eq!(format_amount(dec!(12.344)), "12.34");
  }

  #[test]
  fn order_handle_exposes_id() {
    let handle = OrderHandle(serde_json::json!({"id": "5O190127TN364715T", "status": "CREATED"}));
    assert_eq!(handle.id(), Some("5O190127TN364715T"));
    assert_eq!(OrderHandle(serde_json::json!({})).id(), None);
  }
}
