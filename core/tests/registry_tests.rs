// core/tests/registry_tests.rs
mod common;

use common::*;
use learnhub_flow::{ContextData, Flow, FlowError, Pipeline, PipelineControl, PipelineResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct AlphaContext {
  val: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct BetaContext {
  num: i32,
}

#[tokio::test]
async fn test_registry_dispatches_by_context_type() {
  setup_tracing();
  let flow = Flow::<TestError>::new();

  let mut p_alpha = Pipeline::<AlphaContext, TestError>::new(&[("alpha_task", false, None)]);
  p_alpha.on_step("alpha_task", |ctx: ContextData<AlphaContext>| {
    Box::pin(async move {
      ctx.write().val = "alpha_processed".to_string();
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });
  flow.register_pipeline(p_alpha);

  let mut p_beta = Pipeline::<BetaContext, TestError>::new(&[("beta_task", false, None)]);
  p_beta.on_step("beta_task", |ctx: ContextData<BetaContext>| {
    Box::pin(async move {
      ctx.write().num = 100;
      Ok::<PipelineControl, TestError>(PipelineControl::Continue)
    })
  });
  flow.register_pipeline(p_beta);

  assert!(flow.is_registered::<AlphaContext>());
  assert!(flow.is_registered::<BetaContext>());

  let ctx_alpha = ContextData::new(AlphaContext::default());
  assert_eq!(flow.run(ctx_alpha.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx_alpha.read().val, "alpha_processed");

  let ctx_beta = ContextData::new(BetaContext::default());
  assert_eq!(flow.run(ctx_beta.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx_beta.read().num, 100);
}

#[tokio::test]
async fn test_registry_reports_unregistered_context() {
  setup_tracing();
  let flow = Flow::<TestError>::new();

  let result = flow.run(ContextData::new(AlphaContext::default())).await;
  match result {
    Err(TestError::Flow(msg)) => assert!(msg.contains("NotRegistered"), "unexpected message: {msg}"),
    other => panic!("Expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn test_registering_twice_replaces_pipeline() {
  setup_tracing();
  let flow = Flow::<TestError>::new();

  let mut first = Pipeline::<BetaContext, TestError>::new(&[("set", false, None)]);
  first.on_step("set", |ctx: ContextData<BetaContext>| {
    Box::pin(async move {
      ctx.write().num = 1;
      Ok::<_, TestError>(PipelineControl::Continue)
    })
  });
  flow.register_pipeline(first);

  let mut second = Pipeline::<BetaContext, TestError>::new(&[("set", false, None)]);
  second.on_step("set", |ctx: ContextData<BetaContext>| {
    Box::pin(async move {
      ctx.write().num = 2;
      Ok::<_, TestError>(PipelineControl::Continue)
    })
  });
  flow.register_pipeline(second);

  let ctx = ContextData::new(BetaContext::default());
  flow.run(ctx.clone()).await.expect("pipeline runs");
  assert_eq!(ctx.read().num, 2);
}

#[tokio::test]
async fn test_context_can_be_unwrapped_after_run() {
  setup_tracing();
  let flow = Flow::<TestError>::new();
  let mut p = Pipeline::<AlphaContext, TestError>::new(&[("fill", false, None)]);
  p.on_step("fill", |ctx: ContextData<AlphaContext>| {
    Box::pin(async move {
      ctx.write().val.push_str("done");
      Ok::<_, TestError>(PipelineControl::Continue)
    })
  });
  flow.register_pipeline(p);

  let ctx = ContextData::new(AlphaContext::default());
  flow.run(ctx.clone()).await.expect("pipeline runs");
  let inner = ctx.try_into_inner().expect("no other clones alive");
  assert_eq!(inner.val, "done");
}
