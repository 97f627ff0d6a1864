// sluice/src/pipeline/compiler.rs

//! The pipeline compiler: folds flow-responsible pipes around the handler
//! into a single composed async callable, and collects the forward-ordered
//! open hooks and reverse-ordered close hooks.
//!
//! The fold runs right-to-left over the pipe list, so the last pipe becomes
//! the innermost wrapper (closest to the handler) and the first pipe the
//! outermost. Each wrapper strategy closes over the previous `wrapped` value
//! and the pipe instance; compilation is a pure function of the pipe list
//! and handler, performed once per route at application build time.

use crate::core::context::Context;
use crate::pipeline::definition::Pipeline;
use crate::pipes::capability::{HookRegistry, HookSet};
use crate::pipes::{Handler, Next, PathArgs, Pipe};
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// The compiled, route-bound combination of wrapped handler + open-hook
/// list + close-hook list. Created once at app build time; read-only at
/// request time.
#[derive(Clone)]
pub struct DispatchUnit {
  pub(crate) wrapped: Handler,
  pub(crate) open_hooks: Vec<Arc<dyn Pipe>>,
  pub(crate) close_hooks: Vec<Arc<dyn Pipe>>,
}

impl DispatchUnit {
  /// Pipes with an `open` hook, in pipeline order.
  pub fn open_hooks(&self) -> &[Arc<dyn Pipe>] {
    &self.open_hooks
  }

  /// Pipes with a `close` hook, in reverse pipeline order.
  pub fn close_hooks(&self) -> &[Arc<dyn Pipe>] {
    &self.close_hooks
  }
}

impl std::fmt::Debug for DispatchUnit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DispatchUnit")
      .field("open_hooks", &self.open_hooks.iter().map(|p| p.name()).collect::<Vec<_>>())
      .field("close_hooks", &self.close_hooks.iter().map(|p| p.name()).collect::<Vec<_>>())
      .finish()
  }
}

/// Compiles an ordered pipeline and a handler into a [`DispatchUnit`].
#[instrument(name = "compile", skip_all, fields(num_pipes = pipeline.len()))]
pub fn compile(pipeline: &Pipeline, handler: Handler, registry: &HookRegistry) -> DispatchUnit {
  let mut open_hooks = Vec::new();
  for pipe in pipeline.pipes() {
    if registry.effective(pipe.as_ref()).contains(HookSet::OPEN) {
      open_hooks.push(pipe.clone());
    }
  }

  let mut close_hooks = Vec::new();
  for pipe in pipeline.pipes().iter().rev() {
    if registry.effective(pipe.as_ref()).contains(HookSet::CLOSE) {
      close_hooks.push(pipe.clone());
    }
  }

  let mut wrapped = handler;
  for pipe in pipeline.pipes().iter().rev() {
    let caps = registry.effective(pipe.as_ref());
    if !caps.is_flow_responsible() {
      event!(Level::TRACE, pipe = pipe.name(), "lifecycle-only pipe, not folded");
      continue;
    }
    let outcome_hooks = (caps.contains(HookSet::ON_SUCCESS), caps.contains(HookSet::ON_FAILURE));
    let strategy = match outcome_hooks {
      (true, true) => "complete",
      (true, false) => "success-only",
      (false, true) => "failure-only",
      (false, false) => "basic",
    };
    event!(Level::TRACE, pipe = pipe.name(), strategy, "folding pipe into wrapper chain");
    wrapped = match outcome_hooks {
      (true, true) => wrap_complete(pipe.clone(), wrapped),
      (true, false) => wrap_success_only(pipe.clone(), wrapped),
      (false, true) => wrap_failure_only(pipe.clone(), wrapped),
      (false, false) => wrap_basic(pipe.clone(), wrapped),
    };
  }

  event!(
    Level::DEBUG,
    open_hooks = open_hooks.len(),
    close_hooks = close_hooks.len(),
    "pipeline compiled"
  );
  DispatchUnit {
    wrapped,
    open_hooks,
    close_hooks,
  }
}

/// Both outcome hooks present: success fires on normal return and on
/// interrupt; failure fires on any other error. Errors always re-raise.
fn wrap_complete(pipe: Arc<dyn Pipe>, inner: Handler) -> Handler {
  Arc::new(move |ctx: Context, args: PathArgs| {
    let pipe = pipe.clone();
    let inner = inner.clone();
    Box::pin(async move {
      match pipe.pipe(Next::new(inner), ctx.clone(), args).await {
        Ok(value) => {
          pipe.on_pipe_success(&ctx).await;
          Ok(value)
        }
        Err(err) if err.interrupts() => {
          pipe.on_pipe_success(&ctx).await;
          Err(err)
        }
        Err(err) => {
          pipe.on_pipe_failure(&ctx).await;
          Err(err)
        }
      }
    })
  })
}

/// Only `on_pipe_success` declared: non-interrupt errors propagate uncaught.
fn wrap_success_only(pipe: Arc<dyn Pipe>, inner: Handler) -> Handler {
  Arc::new(move |ctx: Context, args: PathArgs| {
    let pipe = pipe.clone();
    let inner = inner.clone();
    Box::pin(async move {
      match pipe.pipe(Next::new(inner), ctx.clone(), args).await {
        Ok(value) => {
          pipe.on_pipe_success(&ctx).await;
          Ok(value)
        }
        Err(err) if err.interrupts() => {
          pipe.on_pipe_success(&ctx).await;
          Err(err)
        }
        Err(err) => Err(err),
      }
    })
  })
}

/// Only `on_pipe_failure` declared: success and interrupt pass through.
fn wrap_failure_only(pipe: Arc<dyn Pipe>, inner: Handler) -> Handler {
  Arc::new(move |ctx: Context, args: PathArgs| {
    let pipe = pipe.clone();
    let inner = inner.clone();
    Box::pin(async move {
      match pipe.pipe(Next::new(inner), ctx.clone(), args).await {
        Ok(value) => Ok(value),
        Err(err) if err.interrupts() => Err(err),
        Err(err) => {
          pipe.on_pipe_failure(&ctx).await;
          Err(err)
        }
      }
    })
  })
}

/// Only `pipe` declared: plain delegation, no outcome hooks.
fn wrap_basic(pipe: Arc<dyn Pipe>, inner: Handler) -> Handler {
  Arc::new(move |ctx: Context, args: PathArgs| {
    let pipe = pipe.clone();
    let inner = inner.clone();
    Box::pin(async move { pipe.pipe(Next::new(inner), ctx, args).await })
  })
}
