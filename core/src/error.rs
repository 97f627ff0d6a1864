// sluice/src/error.rs

//! The crate-wide error enum, including the recognized control-flow
//! interrupt used by redirects and aborts.
//!
//! An `Interrupt` is a deliberate application-level response, not a failure:
//! every flow-responsible pipe routes it through its success hook before
//! re-raising it, and the outer request layer converts it into the final
//! HTTP response.

use anyhow::Error as AnyhowError;
use thiserror::Error;

/// A deliberate short-circuit response (redirect, abort-with-status).
///
/// Carried inside [`FlowError::Interrupt`] so it can travel through the
/// pipe-wrapper chain with ordinary `?` propagation while still being
/// distinguishable from genuine failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interrupt {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub cookies: Vec<String>,
  pub body: Vec<u8>,
}

impl Interrupt {
  pub fn new(status: u16) -> Self {
    Self {
      status,
      headers: Vec::new(),
      cookies: Vec::new(),
      body: Vec::new(),
    }
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
    self.cookies.push(cookie.into());
    self
  }

  pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = body.into();
    self
  }
}

#[derive(Debug, Error)]
pub enum FlowError {
  /// Recognized control-flow signal. Treated as a success outcome by the
  /// pipe wrappers, but still terminates normal execution flow.
  #[error("dispatch interrupted with status {}", .0.status)]
  Interrupt(Interrupt),

  /// Error in a user-provided handler or pipe hook.
  #[error("error in user-provided handler or pipe. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  /// Route/app assembly error (e.g. dispatching a method that was never exposed).
  #[error("configuration error for route '{route}': {message}")]
  Config { route: String, message: String },

  #[error("internal sluice error: {0}")]
  Internal(String),
}

impl FlowError {
  /// True iff this error is the recognized short-circuit signal.
  ///
  /// Every wrapper strategy classifies with this before choosing between
  /// `on_pipe_success` and `on_pipe_failure`.
  pub fn interrupts(&self) -> bool {
    matches!(self, FlowError::Interrupt(_))
  }
}

// The key conversion sluice provides for external errors: anything a handler
// bubbles up via anyhow becomes a pipe-local failure.
impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

/// Aborts the dispatch with the given status code.
///
/// Raised as an [`Interrupt`], so enclosing pipes see a success outcome.
pub fn abort(status: u16) -> FlowError {
  FlowError::Interrupt(Interrupt::new(status))
}

/// Redirects to `location` with a 302 status.
pub fn redirect(location: impl Into<String>) -> FlowError {
  redirect_with(location, 302)
}

/// Redirects to `location` with an explicit status code.
pub fn redirect_with(location: impl Into<String>, status: u16) -> FlowError {
  FlowError::Interrupt(Interrupt::new(status).with_header("location", location))
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
