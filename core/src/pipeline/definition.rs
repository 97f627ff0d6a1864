// sluice/src/pipeline/definition.rs

//! The `Pipeline` struct: an ordered list of pipe instances, plus the
//! app/module/route merge.
//!
//! Insertion order is the execution order for `open` and `pipe` hooks and
//! the reverse order for `close`, `on_pipe_success` and `on_pipe_failure`:
//! the first pipe added opens first and wraps outermost, the last pipe added
//! is innermost and closes first. Pipelines are immutable once a route has
//! been built from them.

use crate::pipes::Pipe;
use std::sync::Arc;

/// Ordered list of pipes owned by a scope (app default, module, or route).
#[derive(Default)]
pub struct Pipeline {
  pipes: Vec<Arc<dyn Pipe>>,
}

impl Pipeline {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(pipes: Vec<Arc<dyn Pipe>>) -> Self {
    Self { pipes }
  }

  /// Appends a pipe, taking ownership.
  pub fn push(&mut self, pipe: impl Pipe) -> &mut Self {
    self.pipes.push(Arc::new(pipe));
    self
  }

  /// Appends an already-shared pipe instance.
  pub fn push_arc(&mut self, pipe: Arc<dyn Pipe>) -> &mut Self {
    self.pipes.push(pipe);
    self
  }

  /// Appends every pipe of `other`, preserving order.
  pub fn extend(&mut self, other: &Pipeline) -> &mut Self {
    self.pipes.extend(other.pipes.iter().cloned());
    self
  }

  /// The effective pipeline for a route: app defaults first, owning module
  /// second, route-specific pipes last. No deduplication. Performed once
  /// per route at application build time.
  pub fn merged(app: &Pipeline, module: Option<&Pipeline>, route: &Pipeline) -> Pipeline {
    let mut merged = Pipeline::new();
    merged.extend(app);
    if let Some(module_pipeline) = module {
      merged.extend(module_pipeline);
    }
    merged.extend(route);
    merged
  }

  pub fn pipes(&self) -> &[Arc<dyn Pipe>] {
    &self.pipes
  }

  pub fn len(&self) -> usize {
    self.pipes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pipes.is_empty()
  }
}

impl Clone for Pipeline {
  fn clone(&self) -> Self {
    Self {
      pipes: self.pipes.clone(),
    }
  }
}

impl std::fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.pipes.iter().map(|p| p.name())).finish()
  }
}

impl FromIterator<Arc<dyn Pipe>> for Pipeline {
  fn from_iter<I: IntoIterator<Item = Arc<dyn Pipe>>>(iter: I) -> Self {
    Self {
      pipes: iter.into_iter().collect(),
    }
  }
}
