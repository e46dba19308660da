// core/src/lib.rs

//! learnhub-flow: the asynchronous step-pipeline engine behind the LearnHub
//! enrollment, payment and account workflows.
//!
//! A workflow is a [`Pipeline`] of named steps. Each step carries `before`,
//! `on` and `after` handlers that receive a shared [`ContextData`] and decide
//! whether execution continues or stops. Pipelines are registered in a
//! [`Flow`] registry keyed by their context type, so callers only need to
//! build a context and hand it to [`Flow::run`].

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::pipeline::definition::{Handler, Pipeline};

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Flow;

/*
    Typical wiring:
    1. Define a context struct `EnrollCtx` holding inputs, collaborators and outputs.
    2. Build `Pipeline::<EnrollCtx, AppError>::new(&[("load", false, None), ("persist", false, None)])`.
    3. Attach handlers with `on_step`, `before_step`, `after_step`.
    4. `flow.register_pipeline(pipeline)` once at start-up.
    5. Per request: `flow.run(ContextData::new(EnrollCtx { .. })).await`, then read outputs back from the context.
*/
