// sluice/src/pipes/mod.rs

//! The `Pipe` trait: a middleware unit with a fixed lifecycle contract
//! (open, wrap the request, react to success/failure, close), plus the
//! `Handler` and `Next` plumbing the compiler folds pipes around.
//!
//! A pipe must report which hooks it actually implements via
//! [`Pipe::declared_hooks`]; the compiler uses that set (cached per type in
//! a [`capability::HookRegistry`]) to pick the cheapest wrapping strategy
//! and to decide whether the pipe participates in the wrapped chain at all.
//!
//! Pipes are constructed once per pipeline at app-build time and shared
//! across all concurrent requests: instance fields are configuration, never
//! per-request state. Request-scoped data belongs in the [`Context`].

pub mod capability;

use crate::core::context::Context;
use crate::core::output::{Output, OutputHint};
use crate::error::FlowResult;
use async_trait::async_trait;
use std::any::TypeId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use capability::HookSet;

/// Resolved path arguments for one request, as produced by the routing layer.
pub type PathArgs = HashMap<String, String>;

/// Boxed future returned by handlers and wrapper closures.
pub type HookFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The route handler / composed-wrapper callable shape.
///
/// The compiled chain is built once and shared across concurrent requests,
/// hence the `Arc` and the owned `Context`/`PathArgs` per invocation.
pub type Handler = Arc<dyn Fn(Context, PathArgs) -> HookFuture<FlowResult<Output>> + Send + Sync>;

/// Wraps an async function as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
  F: Fn(Context, PathArgs) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = FlowResult<Output>> + Send + 'static,
{
  Arc::new(move |ctx, args| Box::pin(f(ctx, args)))
}

/// Wraps a synchronous function as a [`Handler`] via a trivial async shim.
/// The coercion happens once here, not per request.
pub fn sync_handler<F>(f: F) -> Handler
where
  F: Fn(Context, PathArgs) -> FlowResult<Output> + Send + Sync + 'static,
{
  let f = Arc::new(f);
  Arc::new(move |ctx, args| {
    let f = f.clone();
    Box::pin(async move { f(ctx, args) })
  })
}

/// The next callable in the wrapped chain: either the next pipe's wrapper
/// or, for the innermost pipe, the route handler itself.
pub struct Next {
  inner: Handler,
}

impl Next {
  pub(crate) fn new(inner: Handler) -> Self {
    Self { inner }
  }

  /// Invokes the remainder of the chain. A pipe's `pipe()` hook either
  /// delegates here and returns the result, or returns a substitute value
  /// without calling it (short-circuit).
  pub async fn run(&self, ctx: Context, args: PathArgs) -> FlowResult<Output> {
    (self.inner)(ctx, args).await
  }
}

/// A middleware unit with five optional lifecycle hooks.
///
/// Each hook's default is a no-op (or a pure delegation, for `pipe`), but
/// defaults are not introspectable in Rust, so a pipe type must state what
/// it overrides in `declared_hooks`. A type composing a base pipe reports
/// the union of the base's declared set and its own additions, which gives
/// the same effective-set semantics as an inheritance chain.
///
/// Success/failure hooks are per-pipe: pipe N's wrapper calls pipe N's
/// `pipe()`, and when that call errors it fires pipe N's own
/// `on_pipe_failure` before re-raising. Each enclosing pipe then observes
/// the re-raised error in turn.
#[async_trait]
pub trait Pipe: Send + Sync + 'static {
  /// The subset of the five hooks this type (including any composed base)
  /// actually implements.
  fn declared_hooks(&self) -> HookSet;

  /// Stable name for this pipe, used to key scratch storage in the
  /// [`Context`] and for logging.
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  /// Optional hint about the output this pipe produces, consumed by
  /// response-builder selection.
  fn output(&self) -> Option<OutputHint> {
    None
  }

  /// Concrete type identity, used by the capability cache.
  fn type_key(&self) -> TypeId {
    TypeId::of::<Self>()
  }

  /// Runs before the handler chain. Launched concurrently with the other
  /// pipes' `open` hooks of the same dispatch; side effects only.
  async fn open(&self, _ctx: &Context) -> FlowResult<()> {
    Ok(())
  }

  /// Wraps the remainder of the chain. Default: pure delegation.
  async fn pipe(&self, next: Next, ctx: Context, args: PathArgs) -> FlowResult<Output> {
    next.run(ctx, args).await
  }

  /// Fires after this pipe's own `pipe()` call settled without an
  /// unrecognized error (interrupts included).
  async fn on_pipe_success(&self, _ctx: &Context) {}

  /// Fires after this pipe's own `pipe()` call raised a non-interrupt error.
  async fn on_pipe_failure(&self, _ctx: &Context) {}

  /// Always runs once per dispatch, mirroring `open`, regardless of outcome.
  async fn close(&self, _ctx: &Context) {}
}
