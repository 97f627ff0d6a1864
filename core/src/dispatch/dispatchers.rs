// sluice/src/dispatch/dispatchers.rs

//! Per-route dispatchers: run the open hooks, the wrapped handler chain and
//! the close hooks for a single request, then build the response.
//!
//! Four variants exist so that routes whose pipelines carry no lifecycle
//! hooks pay no scheduling overhead for them. The variant is picked once at
//! route build time by [`build_dispatcher`].
//!
//! Open hooks of one dispatch are launched concurrently; the dispatcher
//! waits for all of them to settle before proceeding. On failure the first
//! error (in pipeline order) is reported and later ones are logged at WARN
//! and suppressed. Close hooks run sequentially in reverse pipeline order
//! exactly once per dispatch regardless of outcome, including when an open
//! hook already failed.

use crate::core::context::Context;
use crate::error::{FlowError, FlowResult};
use crate::pipeline::compiler::DispatchUnit;
use crate::pipes::{Handler, PathArgs, Pipe};
use crate::response::{BuildResponse, Response};
use async_trait::async_trait;
use futures::future;
use std::sync::Arc;
use tracing::{event, Level};

/// A route-bound execution object. Implementations are read-only at request
/// time and shared across concurrent dispatches.
#[async_trait]
pub trait Dispatch: Send + Sync {
  async fn dispatch(&self, ctx: Context, args: PathArgs) -> FlowResult<Response>;
}

/// Selects the cheapest dispatcher variant for the compiled unit.
pub fn build_dispatcher(unit: DispatchUnit, build_response: BuildResponse) -> Arc<dyn Dispatch> {
  let DispatchUnit {
    wrapped,
    open_hooks,
    close_hooks,
  } = unit;
  match (open_hooks.is_empty(), close_hooks.is_empty()) {
    (true, true) => Arc::new(PlainDispatcher {
      wrapped,
      build_response,
    }),
    (false, true) => Arc::new(OpenDispatcher {
      wrapped,
      open_hooks,
      build_response,
    }),
    (true, false) => Arc::new(CloseDispatcher {
      wrapped,
      close_hooks,
      build_response,
    }),
    (false, false) => Arc::new(FullDispatcher {
      wrapped,
      open_hooks,
      close_hooks,
      build_response,
    }),
  }
}

/// Launches every open hook concurrently and waits for all to settle.
///
/// Policy for partial failure (documented choice): siblings are not
/// cancelled; everything runs to completion, the first error in pipeline
/// order is returned, later errors are logged and suppressed.
async fn run_open_hooks(hooks: &[Arc<dyn Pipe>], ctx: &Context) -> FlowResult<()> {
  let results = future::join_all(hooks.iter().map(|pipe| pipe.open(ctx))).await;
  let mut first: Option<FlowError> = None;
  for (pipe, result) in hooks.iter().zip(results) {
    if let Err(err) = result {
      if first.is_none() {
        event!(Level::ERROR, pipe = pipe.name(), error = %err, "open hook failed");
        first = Some(err);
      } else {
        event!(
          Level::WARN,
          pipe = pipe.name(),
          error = %err,
          "open hook error suppressed in favor of an earlier failure"
        );
      }
    }
  }
  match first {
    Some(err) => Err(err),
    None => Ok(()),
  }
}

/// Runs close hooks sequentially, already in reverse pipeline order.
async fn run_close_hooks(hooks: &[Arc<dyn Pipe>], ctx: &Context) {
  for pipe in hooks {
    event!(Level::TRACE, pipe = pipe.name(), "running close hook");
    pipe.close(ctx).await;
  }
}

/// No lifecycle hooks: handler chain + response building only.
pub struct PlainDispatcher {
  pub(crate) wrapped: Handler,
  pub(crate) build_response: BuildResponse,
}

#[async_trait]
impl Dispatch for PlainDispatcher {
  async fn dispatch(&self, ctx: Context, args: PathArgs) -> FlowResult<Response> {
    let output = (self.wrapped)(ctx, args).await?;
    Ok((self.build_response)(output))
  }
}

/// Open hooks only.
pub struct OpenDispatcher {
  pub(crate) wrapped: Handler,
  pub(crate) open_hooks: Vec<Arc<dyn Pipe>>,
  pub(crate) build_response: BuildResponse,
}

#[async_trait]
impl Dispatch for OpenDispatcher {
  async fn dispatch(&self, ctx: Context, args: PathArgs) -> FlowResult<Response> {
    run_open_hooks(&self.open_hooks, &ctx).await?;
    let output = (self.wrapped)(ctx, args).await?;
    Ok((self.build_response)(output))
  }
}

/// Close hooks only, with finally-semantics around the handler chain.
pub struct CloseDispatcher {
  pub(crate) wrapped: Handler,
  pub(crate) close_hooks: Vec<Arc<dyn Pipe>>,
  pub(crate) build_response: BuildResponse,
}

#[async_trait]
impl Dispatch for CloseDispatcher {
  async fn dispatch(&self, ctx: Context, args: PathArgs) -> FlowResult<Response> {
    let outcome = (self.wrapped)(ctx.clone(), args).await;
    run_close_hooks(&self.close_hooks, &ctx).await;
    Ok((self.build_response)(outcome?))
  }
}

/// Both lifecycle phases. Close hooks still run when an open hook failed:
/// compilation pairs open/close by pipeline membership, and releasing
/// resources symmetrically on partial open failure is the contract.
pub struct FullDispatcher {
  pub(crate) wrapped: Handler,
  pub(crate) open_hooks: Vec<Arc<dyn Pipe>>,
  pub(crate) close_hooks: Vec<Arc<dyn Pipe>>,
  pub(crate) build_response: BuildResponse,
}

#[async_trait]
impl Dispatch for FullDispatcher {
  async fn dispatch(&self, ctx: Context, args: PathArgs) -> FlowResult<Response> {
    if let Err(err) = run_open_hooks(&self.open_hooks, &ctx).await {
      run_close_hooks(&self.close_hooks, &ctx).await;
      return Err(err);
    }
    let outcome = (self.wrapped)(ctx.clone(), args).await;
    run_close_hooks(&self.close_hooks, &ctx).await;
    Ok((self.build_response)(outcome?))
  }
}
