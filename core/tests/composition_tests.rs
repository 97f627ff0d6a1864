// tests/composition_tests.rs
mod common;

use common::*;
use sluice::{
  build_dispatcher, compile, default_builder, Context, HookRegistry, PathArgs, Pipeline, RouteBuilder,
};

fn get_context() -> Context {
  Context::for_request("GET", "/")
}

fn recorder_pipeline(labels: &[&'static str], trace: &Trace) -> Pipeline {
  let mut pipeline = Pipeline::new();
  for label in labels {
    pipeline.push(RecorderPipe::new(label, trace.clone()));
  }
  pipeline
}

#[tokio::test]
async fn route_pipes_run_after_app_pipes_and_close_before_them() {
  setup_tracing();
  let trace = new_trace();
  let app = recorder_pipeline(&["p1", "p2", "p3"], &trace);

  let route = RouteBuilder::new("index", ok_handler("ok"))
    .pipe(RecorderPipe::new("p4", trace.clone()))
    .build(&app, None, &HookRegistry::new());

  route.dispatch(get_context(), PathArgs::new()).await.unwrap();

  assert_eq!(
    trace_calls(&trace),
    vec![
      "p1.open", "p2.open", "p3.open", "p4.open",
      "p1.pipe", "p2.pipe", "p3.pipe", "p4.pipe",
      "p4.success", "p3.success", "p2.success", "p1.success",
      "p4.close", "p3.close", "p2.close", "p1.close",
    ]
  );
}

#[tokio::test]
async fn module_pipeline_sits_between_app_and_route_pipes() {
  setup_tracing();
  let trace = new_trace();
  let app = recorder_pipeline(&["p1", "p2", "p3"], &trace);
  let module = recorder_pipeline(&["p5"], &trace);

  // Module route with no route-level pipes: effective [p1, p2, p3, p5].
  let plain = RouteBuilder::new("module.plain", ok_handler("ok")).build(&app, Some(&module), &HookRegistry::new());
  plain.dispatch(get_context(), PathArgs::new()).await.unwrap();
  assert_eq!(
    trace_calls(&trace),
    vec![
      "p1.open", "p2.open", "p3.open", "p5.open",
      "p1.pipe", "p2.pipe", "p3.pipe", "p5.pipe",
      "p5.success", "p3.success", "p2.success", "p1.success",
      "p5.close", "p3.close", "p2.close", "p1.close",
    ]
  );

  // Module route with an extra route pipe: effective [p1, p2, p3, p5, p6].
  trace.lock().clear();
  let extended = RouteBuilder::new("module.extended", ok_handler("ok"))
    .pipe(RecorderPipe::new("p6", trace.clone()))
    .build(&app, Some(&module), &HookRegistry::new());
  extended.dispatch(get_context(), PathArgs::new()).await.unwrap();
  assert_eq!(
    trace_calls(&trace),
    vec![
      "p1.open", "p2.open", "p3.open", "p5.open", "p6.open",
      "p1.pipe", "p2.pipe", "p3.pipe", "p5.pipe", "p6.pipe",
      "p6.success", "p5.success", "p3.success", "p2.success", "p1.success",
      "p6.close", "p5.close", "p3.close", "p2.close", "p1.close",
    ]
  );
}

#[tokio::test]
async fn merge_concatenates_without_deduplication() {
  setup_tracing();
  let trace = new_trace();
  let shared = std::sync::Arc::new(RecorderPipe::new("shared", trace.clone()));

  let mut app = Pipeline::new();
  app.push_arc(shared.clone());
  let mut route = Pipeline::new();
  route.push_arc(shared);

  let effective = Pipeline::merged(&app, None, &route);
  assert_eq!(effective.len(), 2);

  let registry = HookRegistry::new();
  let unit = compile(&effective, ok_handler("ok"), &registry);
  let dispatcher = build_dispatcher(unit, default_builder(None));
  dispatcher.dispatch(get_context(), PathArgs::new()).await.unwrap();

  // Same instance appears twice: both occurrences wrap and open/close.
  assert_eq!(
    trace_calls(&trace),
    vec![
      "shared.open", "shared.open",
      "shared.pipe", "shared.pipe",
      "shared.success", "shared.success",
      "shared.close", "shared.close",
    ]
  );
}

#[tokio::test]
async fn compilation_is_idempotent() {
  setup_tracing();
  let trace = new_trace();
  let mut pipeline = Pipeline::new();
  pipeline.push(RecorderPipe::new("a", trace.clone()));
  pipeline.push(RecorderPipe::new("b", trace.clone()));

  let registry = HookRegistry::new();
  let first = compile(&pipeline, ok_handler("same"), &registry);
  let second = compile(&pipeline, ok_handler("same"), &registry);

  let d1 = build_dispatcher(first, default_builder(None));
  let r1 = d1.dispatch(get_context(), PathArgs::new()).await.unwrap();
  let calls_first = trace_calls(&trace);

  trace.lock().clear();
  let d2 = build_dispatcher(second, default_builder(None));
  let r2 = d2.dispatch(get_context(), PathArgs::new()).await.unwrap();
  let calls_second = trace_calls(&trace);

  assert_eq!(r1, r2);
  assert_eq!(calls_first, calls_second);
}

#[tokio::test]
async fn handler_receives_resolved_path_args() {
  setup_tracing();
  let app = Pipeline::new();
  let route = RouteBuilder::new("echo", echo_args_handler()).build(&app, None, &HookRegistry::new());

  let mut args = PathArgs::new();
  args.insert("id".to_string(), "42".to_string());
  args.insert("slug".to_string(), "news".to_string());

  let response = route.dispatch(get_context(), args).await.unwrap();
  assert_eq!(response.body, b"id=42&slug=news");
}
