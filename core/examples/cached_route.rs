// sluice/examples/cached_route.rs
//
// GET responses are cached by route identity + resolved args; the second
// dispatch replays the stored headers and body without running the handler.

use sluice::{
  handler, CachePolicy, Context, DefaultKeyBuilder, HookRegistry, MemoryCache, Output, PathArgs,
  Pipeline, RouteBuilder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

  let executions = Arc::new(AtomicUsize::new(0));
  let counter = executions.clone();
  let expensive = handler(move |_ctx: Context, _args: PathArgs| {
    let counter = counter.clone();
    async move {
      let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
      Ok(Output::Str(format!("expensive result #{n}")))
    }
  });

  let app = Pipeline::new();
  let registry = HookRegistry::new();
  let route = RouteBuilder::new("report", expensive)
    .cached(CachePolicy {
      key_builder: Arc::new(DefaultKeyBuilder),
      store: Arc::new(MemoryCache::new()),
      duration: Duration::from_secs(30),
    })
    .build(&app, None, &registry);

  for attempt in 1..=3 {
    let response = route
      .dispatch(Context::for_request("GET", "/report"), PathArgs::new())
      .await
      .expect("dispatch");
    info!(
      attempt,
      body = %String::from_utf8_lossy(&response.body),
      handler_runs = executions.load(Ordering::SeqCst),
      "dispatched"
    );
  }
}
