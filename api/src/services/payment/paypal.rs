// api/src/services/payment/paypal.rs

use super::{format_amount, CaptureResult, CaptureStatus, GatewayError, OrderHandle, PaymentGateway, SETTLEMENT_CURRENCY};
use crate::config::PaypalConfig;
use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

/// PayPal Orders v2 client. Every call performs its own client-credentials exchange.
pub struct PaypalGateway {
  http: reqwest::Client,
  api_base: String,
  client_id: SecretString,
  secret: SecretString,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
  access_token: String,
}

fn transport_error(err: reqwest::Error) -> GatewayError {
  if err.is_timeout() {
    GatewayError::Timeout
  } else {
    GatewayError::Transport(err.to_string())
  }
}

/// Non-success statuses become `Http` with the body kept for the logs.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  warn!(status = status.as_u16(), %body, "Payment processor returned an error status.");
  Err(GatewayError::Http {
    status: status.as_u16(),
    body,
  })
}

impl PaypalGateway {
  pub fn new(config: &PaypalConfig) -> Result<Self, GatewayError> {
    let http = reqwest::Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| GatewayError::Transport(e.to_string()))?;
    Ok(Self {
      http,
      api_base: config.api_base.clone(),
      client_id: SecretString::from(config.client_id.expose_secret().to_string()),
      secret: SecretString::from(config.secret.expose_secret().to_string()),
    })
  }

  async fn access_token(&self) -> Result<String, GatewayError> {
    let response = self
      .http
      .post(format!("{}/v1/oauth2/token", self.api_base))
      .basic_auth(self.client_id.expose_secret(), Some(self.secret.expose_secret()))
      .form(&[("grant_type", "client_credentials")])
      .send()
      .await
      .map_err(transport_error)?;
    let token: AccessTokenResponse = check_status(response)
      .await?
      .json()
      .await
      .map_err(|e| GatewayError::Parse(e.to_string()))?;
    debug!("Obtained processor access token.");
    Ok(token.access_token)
  }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
  #[instrument(name = "paypal::create_order", skip(self), err(Display))]
  async fn create_order(&self, amount: Decimal) -> Result<OrderHandle, GatewayError> {
    let token = self.access_token().await?;
    let body = json!({
      "intent": "CAPTURE",
      "purchase_units": [{
        "amount": {
          "currency_code": SETTLEMENT_CURRENCY,
          "value": format_amount(amount),
        }
      }]
    });
    let response = self
      .http
      .post(format!("{}/v2/checkout/orders", self.api_base))
      .bearer_auth(token)
      .json(&body)
      .send()
      .await
      .map_err(transport_error)?;
    let order: serde_json::Value = check_status(response)
      .await?
      .json()
      .await
      .map_err(|e| GatewayError::Parse(e.to_string()))?;
    Ok(OrderHandle(order))
  }

  #[instrument(name = "paypal::capture_order", skip(self), err(Display))]
  async fn capture_order(&self, payment_id: &str) -> Result<CaptureResult, GatewayError> {
    let token = self.access_token().await?;
    let response = self
      .http
      .post(format!("{}/v2/checkout/orders/{}/capture", self.api_base, payment_id))
      .bearer_auth(token)
      .json(&json!({}))
      .send()
      .await
      .map_err(transport_error)?;
    let raw: serde_json::Value = check_status(response)
      .await?
      .json()
      .await
      .map_err(|e| GatewayError::Parse(e.to_string()))?;
    let status = raw
      .get("status")
      .and_then(|s| s.as_str())
      .map(CaptureStatus::from_raw)
      .ok_or_else(|| GatewayError::Parse("capture response has no status".to_string()))?;
    Ok(CaptureResult { status, raw })
  }
}
