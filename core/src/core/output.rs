// sluice/src/core/output.rs

//! Handler output and the optional output hint a pipe may declare.

/// Value produced by the wrapped handler chain, handed to the response
/// builder by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
  Empty,
  Str(String),
  Bytes(Vec<u8>),
}

impl Output {
  pub fn into_bytes(self) -> Vec<u8> {
    match self {
      Output::Empty => Vec::new(),
      Output::Str(s) => s.into_bytes(),
      Output::Bytes(b) => b,
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Output::Empty => true,
      Output::Str(s) => s.is_empty(),
      Output::Bytes(b) => b.is_empty(),
    }
  }
}

impl From<String> for Output {
  fn from(s: String) -> Self {
    Output::Str(s)
  }
}

impl From<&str> for Output {
  fn from(s: &str) -> Self {
    Output::Str(s.to_string())
  }
}

impl From<Vec<u8>> for Output {
  fn from(b: Vec<u8>) -> Self {
    Output::Bytes(b)
  }
}

/// Hint a pipe may declare about the output it produces, consumed by
/// response-builder selection at route-assembly time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputHint {
  Str,
  Bytes,
}
