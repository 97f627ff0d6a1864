// sluice/src/pipes/capability.rs

//! Hook capability sets and the per-type capability cache.
//!
//! The source of truth is each pipe type's [`Pipe::declared_hooks`]
//! declaration; `HookRegistry` memoizes it by concrete `TypeId` so that
//! pipeline compilation (which runs once per route at app-build time, for
//! every route) never re-queries a pipe instance, and request dispatch never
//! touches it at all.

use crate::pipes::Pipe;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;

/// Bitset over the five lifecycle hooks a pipe may declare.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HookSet(u8);

impl HookSet {
  pub const EMPTY: HookSet = HookSet(0);
  pub const OPEN: HookSet = HookSet(1 << 0);
  pub const PIPE: HookSet = HookSet(1 << 1);
  pub const ON_SUCCESS: HookSet = HookSet(1 << 2);
  pub const ON_FAILURE: HookSet = HookSet(1 << 3);
  pub const CLOSE: HookSet = HookSet(1 << 4);

  /// The hooks that make a pipe flow-responsible, i.e. a participant in the
  /// wrapped handler chain.
  pub const FLOW: HookSet = HookSet(Self::PIPE.0 | Self::ON_SUCCESS.0 | Self::ON_FAILURE.0);

  pub const fn union(self, other: HookSet) -> HookSet {
    HookSet(self.0 | other.0)
  }

  pub const fn contains(self, other: HookSet) -> bool {
    self.0 & other.0 == other.0
  }

  pub const fn intersects(self, other: HookSet) -> bool {
    self.0 & other.0 != 0
  }

  /// True iff this set intersects `{pipe, on_pipe_success, on_pipe_failure}`.
  /// Lifecycle-only pipes (open/close only) never wrap the handler.
  pub const fn is_flow_responsible(self) -> bool {
    self.intersects(Self::FLOW)
  }

  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }
}

impl std::ops::BitOr for HookSet {
  type Output = HookSet;

  fn bitor(self, rhs: HookSet) -> HookSet {
    self.union(rhs)
  }
}

impl std::fmt::Debug for HookSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut names = Vec::new();
    if self.contains(Self::OPEN) {
      names.push("open");
    }
    if self.contains(Self::PIPE) {
      names.push("pipe");
    }
    if self.contains(Self::ON_SUCCESS) {
      names.push("on_pipe_success");
    }
    if self.contains(Self::ON_FAILURE) {
      names.push("on_pipe_failure");
    }
    if self.contains(Self::CLOSE) {
      names.push("close");
    }
    write!(f, "HookSet{{{}}}", names.join(", "))
  }
}

/// Per-concrete-type cache of effective hook sets.
///
/// Owned by whoever drives compilation (the app layer, or a test); not a
/// process-wide global. The first compilation touching a pipe type pays the
/// single `declared_hooks()` call, every later one hits the cache.
#[derive(Default)]
pub struct HookRegistry {
  cache: RwLock<HashMap<TypeId, HookSet>>,
}

impl HookRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The effective hook set for the concrete type behind `pipe`.
  ///
  /// A pipe type composing a base pipe reports the union of the base's
  /// declared set and its own additions from `declared_hooks`, which is what
  /// lands in the cache here.
  pub fn effective(&self, pipe: &dyn Pipe) -> HookSet {
    let id = pipe.type_key();
    if let Some(set) = self.cache.read().get(&id) {
      return *set;
    }
    let set = pipe.declared_hooks();
    self.cache.write().insert(id, set);
    set
  }

  /// Number of pipe types seen so far. Mostly useful for assertions.
  pub fn cached_types(&self) -> usize {
    self.cache.read().len()
  }
}
