// api/src/web/handlers/paypal_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::orchestrator::CaptureOutcome;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct CreateOrderPayload {
  pub amount: Decimal,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOrderPayload {
  #[serde(default)]
  pub payment_id: String,
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, amount = %payload.amount)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orchestrator.request_order(payload.amount).await?;
  Ok(HttpResponse::Created().json(order))
}

/// 200 confirmed, 202 still pending upstream, 400 declined or failed.
/// Errors map through `AppError` (400 validation, 404 unknown registration, 500 upstream).
#[instrument(
  name = "handler::capture_order",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, registration_id = %registration_id)
)]
pub async fn capture_order_handler(
  app_state: web::Data<AppState>,
  registration_id: web::Path<String>,
  payload: web::Json<CaptureOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let outcome = app_state
    .orchestrator
    .capture_and_confirm(&registration_id, &payload.payment_id)
    .await?;

  let response = match outcome {
    CaptureOutcome::Confirmed(registration) => {
      info!(registration_id = %registration.id, "Payment captured and registration confirmed.");
      HttpResponse::Ok().json(json!({
        "message": "Payment successful and the registration has been confirmed.",
        "registration": registration,
      }))
    }
    CaptureOutcome::PendingUpstream => {
      HttpResponse::Accepted().json(json!({ "message": "Payment is processing, please retry later." }))
    }
    CaptureOutcome::Declined => {
      warn!("Payment declined by processor.");
      HttpResponse::BadRequest().json(json!({
        "error": "PaymentDeclined",
        "message": "Payment was declined, please try again.",
      }))
    }
    CaptureOutcome::Failed => {
      warn!("Payment failed at processor.");
      HttpResponse::BadRequest().json(json!({
        "error": "PaymentFailed",
        "message": "Payment failed, please check your payment details.",
      }))
    }
  };
  Ok(response)
}
