// core/src/pipeline/execution.rs

//! `Pipeline::run`.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::{Handler, Pipeline};
use tracing::{event, instrument, span, Instrument, Level};

/// What a phase asked for once all its handlers returned.
enum PhaseOutcome {
  Continue,
  Stop,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  async fn run_phase(
    handlers: Option<&Vec<Handler<TData, Err>>>,
    phase: &'static str,
    ctx_data: &ContextData<TData>,
  ) -> Result<PhaseOutcome, Err> {
    let Some(handlers) = handlers else {
      return Ok(PhaseOutcome::Continue);
    };
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      let handler_span = span!(Level::DEBUG, "handler", phase, handler_index = handler_idx);
      match handler_fn(ctx_data.clone()).instrument(handler_span).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, phase, "Pipeline stopped by a handler.");
          return Ok(PhaseOutcome::Stop);
        }
        Err(e) => {
          event!(Level::ERROR, phase, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PhaseOutcome::Continue)
  }

  /// Executes every step in order against `ctx_data`.
  ///
  /// Stops at the first handler that returns `Stop` or an error. A
  /// non-optional step without any handler fails with
  /// [`FlowError::HandlerMissing`].
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      let step_result = async {
        if let Some(skip_if) = &step_def.skip_if {
          if skip_if(ctx_data.clone()) {
            event!(Level::INFO, "Step skipped by its skip condition.");
            return Ok(PhaseOutcome::Continue);
          }
        }

        let before = self.before.get(step_name).filter(|v| !v.is_empty());
        let on = self.on.get(step_name).filter(|v| !v.is_empty());
        let after = self.after.get(step_name).filter(|v| !v.is_empty());

        if before.is_none() && on.is_none() && after.is_none() {
          if step_def.optional {
            event!(Level::DEBUG, "Optional step has no handlers, skipping.");
            return Ok(PhaseOutcome::Continue);
          }
          event!(Level::ERROR, "Non-optional step has no handlers.");
          return Err(Err::from(FlowError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }

        for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
          match Self::run_phase(handlers, phase, &ctx_data).await {
            Ok(PhaseOutcome::Continue) => {}
            Ok(PhaseOutcome::Stop) => return Ok(PhaseOutcome::Stop),
            Err(e) => return Err(e),
          }
        }
        Ok::<PhaseOutcome, Err>(PhaseOutcome::Continue)
      }
      .instrument(step_span)
      .await;

      match step_result {
        Ok(PhaseOutcome::Continue) => {}
        Ok(PhaseOutcome::Stop) => return Ok(PipelineResult::Stopped),
        Err(e) => return Err(e),
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}
