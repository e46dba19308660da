// core/src/core/control.rs

//! Signals for steering a pipeline and the outcome of a run.

/// Returned by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Keep going: remaining handlers of this step, then the next step.
  Continue,
  /// Halt immediately. Nothing else in this run executes.
  Stop,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step ran (or was skipped) without a handler asking to stop.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
