// sluice/examples/short_circuit_auth.rs
//
// An auth pipe that redirects anonymous requests instead of calling the
// handler. The redirect is an Interrupt: enclosing pipes treat it as a
// success outcome, and the outer layer turns it into the final response.

use async_trait::async_trait;
use sluice::{
  redirect, Context, FlowError, FlowResult, HookRegistry, HookSet, Next, Output, PathArgs, Pipe,
  Pipeline, Response, RouteBuilder,
};
use tracing::info;

struct RequireUserPipe {
  login_url: &'static str,
}

#[async_trait]
impl Pipe for RequireUserPipe {
  fn declared_hooks(&self) -> HookSet {
    HookSet::PIPE
  }

  fn name(&self) -> &'static str {
    "require_user"
  }

  async fn pipe(&self, next: Next, ctx: Context, args: PathArgs) -> FlowResult<Output> {
    let authenticated = ctx.read().query.contains_key("user");
    if !authenticated {
      return Err(redirect(self.login_url));
    }
    next.run(ctx, args).await
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let app = Pipeline::new();
  let registry = HookRegistry::new();

  let route = RouteBuilder::new("account", sluice::handler(|_ctx: Context, _args: PathArgs| async move {
    Ok(Output::Str("your account".to_string()))
  }))
  .pipe(RequireUserPipe { login_url: "/login" })
  .build(&app, None, &registry);

  // Anonymous request: the pipe short-circuits with a redirect.
  let anonymous = Context::for_request("GET", "/account");
  match route.dispatch(anonymous, PathArgs::new()).await {
    Err(FlowError::Interrupt(interrupt)) => {
      let response = Response::from(interrupt);
      info!(status = response.status, location = ?response.header("location"), "redirected");
    }
    other => info!(?other, "unexpected outcome"),
  }

  // Authenticated request: the handler runs.
  let signed_in = Context::for_request("GET", "/account");
  signed_in.write().query.insert("user".to_string(), "ada".to_string());
  match route.dispatch(signed_in, PathArgs::new()).await {
    Ok(response) => info!(body = %String::from_utf8_lossy(&response.body), "served"),
    Err(err) => info!(error = %err, "failed"),
  }
}
