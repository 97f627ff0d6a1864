// sluice/src/response.rs

//! The final response shape and the per-method response-builder contract.
//!
//! Response building proper belongs to the routing layer; this module only
//! defines the callable shape the dispatcher invokes after the wrapped
//! handler chain produces its output, plus a default builder keyed off the
//! route's output hint.

use crate::core::output::{Output, OutputHint};
use crate::error::Interrupt;
use std::sync::Arc;

/// The response a dispatch produces (or an interrupt converts into).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16) -> Self {
    Self {
      status,
      headers: Vec::new(),
      body: Vec::new(),
    }
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = body.into();
    self
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

// Interrupts become responses at the outer request layer; cookies are
// flattened into set-cookie headers here.
impl From<Interrupt> for Response {
  fn from(interrupt: Interrupt) -> Self {
    let mut headers = interrupt.headers;
    for cookie in interrupt.cookies {
      headers.push(("set-cookie".to_string(), cookie));
    }
    Self {
      status: interrupt.status,
      headers,
      body: interrupt.body,
    }
  }
}

/// Converts handler output into the final response. One per exposed HTTP
/// method, supplied by the routing layer.
pub type BuildResponse = Arc<dyn Fn(Output) -> Response + Send + Sync>;

/// The stock builder: 200 with a content type chosen by the route's output
/// hint (`Str` and unhinted routes get text/html, `Bytes` an octet stream).
pub fn default_builder(hint: Option<OutputHint>) -> BuildResponse {
  let content_type = match hint {
    Some(OutputHint::Bytes) => "application/octet-stream",
    _ => "text/html; charset=utf-8",
  };
  Arc::new(move |output: Output| {
    Response::new(200)
      .with_header("content-type", content_type)
      .with_body(output.into_bytes())
  })
}
