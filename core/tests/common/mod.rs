// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice::{
  abort, handler, Context, FlowResult, Handler, HookSet, Next, Output, PathArgs, Pipe,
};
use std::sync::Arc;
use tracing::Level;

// --- Hook-call trace shared between pipes and assertions ---

pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn new_trace() -> Trace {
  Arc::new(Mutex::new(Vec::new()))
}

pub fn trace_calls(trace: &Trace) -> Vec<String> {
  trace.lock().clone()
}

// --- Recorder pipes ---
// The trace Arc is fixed configuration set at construction; pushing into the
// Mutex'd vec is safe under concurrent dispatches. Nothing request-scoped
// ever lands on the pipe itself.

/// Declares all five hooks and records every call.
pub struct RecorderPipe {
  label: &'static str,
  trace: Trace,
}

impl RecorderPipe {
  pub fn new(label: &'static str, trace: Trace) -> Self {
    Self { label, trace }
  }

  fn record(&self, hook: &str) {
    self.trace.lock().push(format!("{}.{}", self.label, hook));
  }
}

#[async_trait]
impl Pipe for RecorderPipe {
  fn declared_hooks(&self) -> HookSet {
    HookSet::OPEN | HookSet::PIPE | HookSet::ON_SUCCESS | HookSet::ON_FAILURE | HookSet::CLOSE
  }

  fn name(&self) -> &'static str {
    self.label
  }

  async fn open(&self, _ctx: &Context) -> FlowResult<()> {
    self.record("open");
    Ok(())
  }

  async fn pipe(&self, next: Next, ctx: Context, args: PathArgs) -> FlowResult<Output> {
    self.record("pipe");
    next.run(ctx, args).await
  }

  async fn on_pipe_success(&self, _ctx: &Context) {
    self.record("success");
  }

  async fn on_pipe_failure(&self, _ctx: &Context) {
    self.record("failure");
  }

  async fn close(&self, _ctx: &Context) {
    self.record("close");
  }
}

/// Records like `RecorderPipe` but its `pipe()` returns a substitute value
/// without ever calling `next` (simulates a block).
pub struct BlockerPipe {
  label: &'static str,
  trace: Trace,
}

impl BlockerPipe {
  pub fn new(label: &'static str, trace: Trace) -> Self {
    Self { label, trace }
  }
}

#[async_trait]
impl Pipe for BlockerPipe {
  fn declared_hooks(&self) -> HookSet {
    HookSet::OPEN | HookSet::PIPE | HookSet::ON_SUCCESS | HookSet::ON_FAILURE | HookSet::CLOSE
  }

  fn name(&self) -> &'static str {
    self.label
  }

  async fn open(&self, _ctx: &Context) -> FlowResult<()> {
    self.trace.lock().push(format!("{}.open", self.label));
    Ok(())
  }

  async fn pipe(&self, _next: Next, _ctx: Context, _args: PathArgs) -> FlowResult<Output> {
    self.trace.lock().push(format!("{}.pipe", self.label));
    Ok(Output::Str("blocked".to_string()))
  }

  async fn on_pipe_success(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.success", self.label));
  }

  async fn on_pipe_failure(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.failure", self.label));
  }

  async fn close(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.close", self.label));
  }
}

/// Records like `RecorderPipe` but its `pipe()` raises the recognized
/// interrupt instead of calling `next`.
pub struct InterruptPipe {
  label: &'static str,
  status: u16,
  trace: Trace,
}

impl InterruptPipe {
  pub fn new(label: &'static str, status: u16, trace: Trace) -> Self {
    Self { label, status, trace }
  }
}

#[async_trait]
impl Pipe for InterruptPipe {
  fn declared_hooks(&self) -> HookSet {
    HookSet::PIPE | HookSet::ON_SUCCESS | HookSet::ON_FAILURE | HookSet::CLOSE
  }

  fn name(&self) -> &'static str {
    self.label
  }

  async fn pipe(&self, _next: Next, _ctx: Context, _args: PathArgs) -> FlowResult<Output> {
    self.trace.lock().push(format!("{}.pipe", self.label));
    Err(abort(self.status))
  }

  async fn on_pipe_success(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.success", self.label));
  }

  async fn on_pipe_failure(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.failure", self.label));
  }

  async fn close(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.close", self.label));
  }
}

/// Lifecycle-only pipe: open/close, never part of the wrapped chain.
pub struct LifecyclePipe {
  label: &'static str,
  trace: Trace,
}

impl LifecyclePipe {
  pub fn new(label: &'static str, trace: Trace) -> Self {
    Self { label, trace }
  }
}

#[async_trait]
impl Pipe for LifecyclePipe {
  fn declared_hooks(&self) -> HookSet {
    HookSet::OPEN | HookSet::CLOSE
  }

  fn name(&self) -> &'static str {
    self.label
  }

  async fn open(&self, _ctx: &Context) -> FlowResult<()> {
    self.trace.lock().push(format!("{}.open", self.label));
    Ok(())
  }

  async fn close(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.close", self.label));
  }
}

/// Open hook fails; close still declared so symmetric release is observable.
pub struct FailingOpenPipe {
  label: &'static str,
  trace: Trace,
}

impl FailingOpenPipe {
  pub fn new(label: &'static str, trace: Trace) -> Self {
    Self { label, trace }
  }
}

#[async_trait]
impl Pipe for FailingOpenPipe {
  fn declared_hooks(&self) -> HookSet {
    HookSet::OPEN | HookSet::CLOSE
  }

  fn name(&self) -> &'static str {
    self.label
  }

  async fn open(&self, _ctx: &Context) -> FlowResult<()> {
    self.trace.lock().push(format!("{}.open", self.label));
    Err(anyhow::anyhow!("{} refused to open", self.label).into())
  }

  async fn close(&self, _ctx: &Context) {
    self.trace.lock().push(format!("{}.close", self.label));
  }
}

// --- Handlers ---

pub fn ok_handler(body: &'static str) -> Handler {
  handler(move |_ctx: Context, _args: PathArgs| async move { Ok(Output::Str(body.to_string())) })
}

pub fn failing_handler(message: &'static str) -> Handler {
  handler(move |_ctx: Context, _args: PathArgs| async move {
    Err(anyhow::anyhow!(message).into())
  })
}

pub fn echo_args_handler() -> Handler {
  handler(|_ctx: Context, args: PathArgs| async move {
    let mut pairs: Vec<_> = args.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    Ok(Output::Str(pairs.join("&")))
  })
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
