// api/src/services/payment/mock.rs

use super::{format_amount, CaptureResult, CaptureStatus, GatewayError, OrderHandle, PaymentGateway, SETTLEMENT_CURRENCY};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, instrument};
use uuid::Uuid;

/// What the next capture call should report.
#[derive(Debug, Clone)]
pub enum MockCaptureOutcome {
  Status(String),
  Timeout,
  HttpError(u16),
}

/// In-process processor used with `PAYMENT_PROVIDER=mock` and in tests.
/// Captures report `COMPLETED` unless scripted otherwise.
pub struct MockGateway {
  capture_outcome: Mutex<MockCaptureOutcome>,
  create_calls: AtomicUsize,
  capture_calls: AtomicUsize,
}

impl Default for MockGateway {
  fn default() -> Self {
    Self {
      capture_outcome: Mutex::new(MockCaptureOutcome::Status("COMPLETED".to_string())),
      create_calls: AtomicUsize::new(0),
      capture_calls: AtomicUsize::new(0),
    }
  }
}

impl MockGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_capture_status(&self, raw_status: &str) {
    *self.capture_outcome.lock() = MockCaptureOutcome::Status(raw_status.to_string());
  }

  pub fn set_capture_outcome(&self, outcome: MockCaptureOutcome) {
    *self.capture_outcome.lock() = outcome;
  }

  pub fn create_calls(&self) -> usize {
    self.create_calls.load(Ordering::SeqCst)
  }

  pub fn capture_calls(&self) -> usize {
    self.capture_calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  #[instrument(name = "mock_gateway::create_order", skip(self))]
  async fn create_order(&self, amount: Decimal) -> Result<OrderHandle, GatewayError> {
    self.create_calls.fetch_add(1, Ordering::SeqCst);
    let order_id = format!("MOCK-{}", Uuid::new_v4().simple());
    info!(%order_id, "Mock order created.");
    Ok(OrderHandle(json!({
      "id": order_id,
      "status": "CREATED",
      "intent": "CAPTURE",
      "purchase_units": [{
        "amount": { "currency_code": SETTLEMENT_CURRENCY, "value": format_amount(amount) }
      }]
    })))
  }

  #[instrument(name = "mock_gateway::capture_order", skip(self))]
  async fn capture_order(&self, payment_id: &str) -> Result<CaptureResult, GatewayError> {
    self.capture_calls.fetch_add(1, Ordering::SeqCst);
    let outcome = self.capture_outcome.lock().clone();
    match outcome {
      MockCaptureOutcome::Status(raw_status) => {
        info!(%raw_status, "Mock capture answered.");
        Ok(CaptureResult {
          status: CaptureStatus::from_raw(&raw_status),
          raw: json!({ "id": payment_id, "status": raw_status }),
        })
      }
      MockCaptureOutcome::Timeout => Err(GatewayError::Timeout),
      MockCaptureOutcome::HttpError(status) => Err(GatewayError::Http {
        status,
        body: json!({ "name": "MOCK_ERROR" }).to_string(),
      }),
    }
  }
}
