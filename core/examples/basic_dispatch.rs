// sluice/examples/basic_dispatch.rs

use async_trait::async_trait;
use sluice::{
  handler, Context, FlowError, FlowResult, HookRegistry, HookSet, Next, Output, PathArgs, Pipe,
  Pipeline, RouteBuilder,
};
use tracing::info;

// 1. Define a pipe. Instances are shared across requests, so fields are
//    configuration only; per-request data goes into the Context.
struct TimingPipe;

#[async_trait]
impl Pipe for TimingPipe {
  fn declared_hooks(&self) -> HookSet {
    HookSet::PIPE | HookSet::ON_SUCCESS | HookSet::ON_FAILURE
  }

  fn name(&self) -> &'static str {
    "timing"
  }

  async fn pipe(&self, next: Next, ctx: Context, args: PathArgs) -> FlowResult<Output> {
    ctx.write().store(self.name(), std::time::Instant::now());
    next.run(ctx, args).await
  }

  async fn on_pipe_success(&self, ctx: &Context) {
    if let Some(started) = ctx.read().fetch::<std::time::Instant>(self.name()) {
      info!(elapsed = ?started.elapsed(), "request served");
    }
  }

  async fn on_pipe_failure(&self, ctx: &Context) {
    if let Some(started) = ctx.read().fetch::<std::time::Instant>(self.name()) {
      info!(elapsed = ?started.elapsed(), "request failed");
    }
  }
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Dispatch Example ---");

  // 2. App-level pipeline shared by every route.
  let mut app = Pipeline::new();
  app.push(TimingPipe);

  // 3. Expose a route. The pipeline is merged and compiled once, here.
  let registry = HookRegistry::new();
  let hello = handler(|_ctx: Context, args: PathArgs| async move {
    let name = args.get("name").cloned().unwrap_or_else(|| "world".to_string());
    Ok(Output::Str(format!("hello, {name}")))
  });
  let route = RouteBuilder::new("hello", hello).build(&app, None, &registry);

  // 4. Dispatch a request through it.
  let mut args = PathArgs::new();
  args.insert("name".to_string(), "sluice".to_string());
  let response = route.dispatch(Context::for_request("GET", "/hello/sluice"), args).await?;

  info!(status = response.status, body = %String::from_utf8_lossy(&response.body), "response");
  Ok(())
}
