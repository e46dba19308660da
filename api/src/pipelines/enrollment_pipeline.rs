// api/src/pipelines/enrollment_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::EnrollCtxData;
use learnhub_flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{event, info, Level};

/// Enroll: look up the course price, then create the registration.
pub fn register_enrollment_pipeline(flow: &Flow<AppError>) {
  let mut enroll_p = Pipeline::<EnrollCtxData, AppError>::new(&[
    ("load_course_price", false, None),
    ("create_registration", false, None),
  ]);

  enroll_p.on_step("load_course_price", |ctx_data: ContextData<EnrollCtxData>| {
    Box::pin(async move {
      let (catalog, course_id) = {
        let guard = ctx_data.read();
        (guard.services.catalog.clone(), guard.course_id)
      };

      let price = catalog
        .price_info(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found.", course_id)))?;
      event!(
        Level::DEBUG,
        %course_id,
        free = price.is_free(),
        amount_due = %price.effective_price(),
        "Course price loaded."
      );

      ctx_data.write().price = Some(price);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  enroll_p.on_step("create_registration", |ctx_data: ContextData<EnrollCtxData>| {
    Box::pin(async move {
      let (ledger, user_id, course_id, price) = {
        let guard = ctx_data.read();
        (guard.services.ledger.clone(), guard.user_id, guard.course_id, guard.price)
      };
      let price =
        price.ok_or_else(|| AppError::Internal("Course price missing when creating registration.".to_string()))?;

      let registration = ledger.create(user_id, course_id, &price).await?;
      info!(
        registration_id = %registration.id,
        status = %registration.status,
        "Enrollment recorded."
      );

      ctx_data.write().registration = Some(registration);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flow.register_pipeline(enroll_p);
}
