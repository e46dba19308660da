// core/tests/pipeline_execution_tests.rs
mod common;

use common::*;
use learnhub_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, SkipCondition};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("step1", false, None), ("step2", false, None), ("step3", false, None)]);

  pipeline.on_step("step1", create_simple_handler("step1", " S1"));
  pipeline.on_step("step2", create_simple_handler("step2", " S2"));
  pipeline.on_step("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(PipelineResult::Completed));
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("stepA", false, None),
    ("stopStep", false, None),
    ("stepC", false, None),
  ]);

  pipeline.on_step("stepA", create_simple_handler("stepA", "A"));
  pipeline.on_step("stopStep", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push("stopStep".to_string());
      Ok::<PipelineControl, FlowError>(PipelineControl::Stop)
    })
  });
  pipeline.on_step("stepC", create_simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(PipelineResult::Stopped));
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("good_step", false, None),
    ("bad_step", false, None),
    ("another_step", false, None),
  ]);

  pipeline.on_step("good_step", create_simple_handler("good_step", "Good"));
  pipeline.on_step("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  pipeline.on_step("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Err(TestError::Handler("I am a bad step!".to_string())));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false, None)]);

  pipeline.after_step("only", create_simple_handler("after", "[after]"));
  pipeline.on_step("only", create_simple_handler("on", "[on]"));
  pipeline.before_step("only", create_simple_handler("before", "[before]"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().message, "[before][on][after]");
}

#[tokio::test]
#[serial]
async fn test_stop_in_before_phase_skips_on_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("guarded", false, None), ("next", false, None)]);

  pipeline.before_step("guarded", create_simple_handler("guard", "G"));
  pipeline.on_step("guarded", create_simple_handler("work", "W"));
  pipeline.on_step("next", create_simple_handler("next", "N"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("guard".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Stopped));
  assert_eq!(ctx.read().message, "G");
}

#[tokio::test]
#[serial]
async fn test_non_optional_step_without_handler_fails() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("has_handler", false, None), ("bare", false, None)]);
  pipeline.on_step("has_handler", create_simple_handler("has_handler", "H"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  match result {
    Err(TestError::Flow(msg)) => assert!(msg.contains("HandlerMissing"), "unexpected message: {msg}"),
    other => panic!("Expected HandlerMissing, got {:?}", other),
  }
  assert_eq!(ctx.read().counter, 1);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("first", false, None), ("maybe", true, None), ("last", false, None)]);
  pipeline.on_step("first", create_simple_handler("first", "1"));
  pipeline.on_step("last", create_simple_handler("last", "3"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().message, "13");
}

#[tokio::test]
#[serial]
async fn test_skip_condition_reads_context() {
  setup_tracing();
  let skip_when_positive: SkipCondition<TestContext> = Arc::new(|ctx: ContextData<TestContext>| ctx.read().counter > 0);
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("bump", false, None),
    ("only_when_zero", false, Some(skip_when_positive)),
  ]);
  pipeline.on_step("bump", create_simple_handler("bump", "B"));
  pipeline.on_step("only_when_zero", create_simple_handler("only_when_zero", "Z"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().message, "B");
}

#[tokio::test]
#[serial]
async fn test_insert_and_remove_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false, None), ("c", false, None)]);
  pipeline.insert_after_step("a", "b", false, None).expect("step a exists");
  assert_eq!(pipeline.step_names(), vec!["a", "b", "c"]);

  pipeline.on_step("a", create_simple_handler("a", "a"));
  pipeline.on_step("b", create_simple_handler("b", "b"));
  pipeline.on_step("c", create_simple_handler("c", "c"));
  pipeline.remove_step("b");
  assert_eq!(pipeline.step_names(), vec!["a", "c"]);

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().message, "ac");

  assert!(matches!(
    pipeline.insert_after_step("missing", "x", false, None),
    Err(FlowError::StepNotFound { .. })
  ));
}

#[test]
#[should_panic(expected = "not found in pipeline definition")]
fn test_registering_handler_on_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("known", false, None)]);
  pipeline.on_step("unknown", create_simple_handler("unknown", "x"));
}
