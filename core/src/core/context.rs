// sluice/src/core/context.rs

//! The request-scoped execution context threaded through every pipe hook.
//!
//! Pipe instances are built once at app-build time and shared across all
//! concurrent requests, so they must never carry per-request state. Anything
//! a pipe wants to remember for the duration of one dispatch goes into the
//! [`Context`] instead, usually under its own name via the typed storage.
//!
//! IMPORTANT: lock guards obtained from `Context` are blocking and MUST NOT
//! be held across `.await` suspension points.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Mutable per-request state: HTTP method, query parameters, and a typed
/// scratch map for pipe-local data.
#[derive(Default)]
pub struct RequestScope {
  pub method: String,
  pub path: String,
  pub query: HashMap<String, String>,
  storage: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl RequestScope {
  pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      method: method.into(),
      path: path.into(),
      query: HashMap::new(),
      storage: HashMap::new(),
    }
  }

  /// Stores a pipe-scoped value under `key`, replacing any previous value.
  pub fn store<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
    self.storage.insert(key.into(), Box::new(value));
  }

  /// Fetches a previously stored value, if present and of the right type.
  pub fn fetch<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
    self.storage.get(key).and_then(|boxed| boxed.downcast_ref::<T>())
  }

  pub fn fetch_mut<T: Any + Send + Sync>(&mut self, key: &str) -> Option<&mut T> {
    self.storage.get_mut(key).and_then(|boxed| boxed.downcast_mut::<T>())
  }

  /// Removes and returns a stored value.
  pub fn take<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
    let boxed = self.storage.remove(key)?;
    match boxed.downcast::<T>() {
      Ok(value) => Some(*value),
      Err(other) => {
        // Wrong type requested: put it back untouched.
        self.storage.insert(key.to_string(), other);
        None
      }
    }
  }
}

impl std::fmt::Debug for RequestScope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RequestScope")
      .field("method", &self.method)
      .field("path", &self.path)
      .field("query", &self.query)
      .field("storage_keys", &self.storage.keys().collect::<Vec<_>>())
      .finish()
  }
}

/// Cheaply clonable handle to the request scope (`Arc<RwLock<..>>`).
///
/// Hooks receive clones of the same handle; mutations made under a write
/// guard are visible to every later hook of the same dispatch.
#[derive(Debug)]
pub struct Context(Arc<RwLock<RequestScope>>);

impl Context {
  pub fn new(scope: RequestScope) -> Self {
    Context(Arc::new(RwLock::new(scope)))
  }

  /// Convenience constructor for the common case.
  pub fn for_request(method: impl Into<String>, path: impl Into<String>) -> Self {
    Self::new(RequestScope::new(method, path))
  }

  /// Acquires a read lock. The guard MUST be dropped before any `.await`.
  pub fn read(&self) -> RwLockReadGuard<'_, RequestScope> {
    self.0.read()
  }

  /// Acquires a write lock. The guard MUST be dropped before any `.await`.
  pub fn write(&self) -> RwLockWriteGuard<'_, RequestScope> {
    self.0.write()
  }

  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, RequestScope>> {
    self.0.try_read()
  }

  pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, RequestScope>> {
    self.0.try_write()
  }

  /// The request method, cloned out so no guard escapes.
  pub fn method(&self) -> String {
    self.read().method.clone()
  }
}

impl Clone for Context {
  fn clone(&self) -> Self {
    Context(Arc::clone(&self.0))
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::new(RequestScope::default())
  }
}
