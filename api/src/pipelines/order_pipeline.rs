// api/src/pipelines/order_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::RequestOrderCtxData;
use learnhub_flow::{ContextData, Flow, Pipeline, PipelineControl};
use rust_decimal::RoundingStrategy;
use tracing::{info, warn};

/// RequestOrder: validate the client's amount, then ask the processor for an order.
/// The amount is not compared with any course price.
pub fn register_order_pipeline(flow: &Flow<AppError>) {
  let mut order_p = Pipeline::<RequestOrderCtxData, AppError>::new(&[
    ("validate_order_amount", false, None),
    ("create_upstream_order", false, None),
  ]);

  order_p.on_step("validate_order_amount", |ctx_data: ContextData<RequestOrderCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let rounded = guard.amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
      if rounded <= rust_decimal::Decimal::ZERO {
        warn!(amount = %guard.amount, "Rejected non-positive order amount.");
        return Err(AppError::Validation("Amount must be greater than zero.".to_string()));
      }
      guard.amount = rounded;
      Ok(PipelineControl::Continue)
    })
  });

  order_p.on_step("create_upstream_order", |ctx_data: ContextData<RequestOrderCtxData>| {
    Box::pin(async move {
      let (gateway, amount) = {
        let guard = ctx_data.read();
        (guard.services.gateway.clone(), guard.amount)
      };

      let order = gateway.create_order(amount).await?;
      info!(order_id = ?order.id(), %amount, "Processor order created.");

      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flow.register_pipeline(order_p);
}
