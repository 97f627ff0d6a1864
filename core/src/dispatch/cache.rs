// sluice/src/dispatch/cache.rs

//! Response caching for dispatchers: the external key-builder and store
//! contracts, the cache-augmented dispatcher wrapper, and a small in-memory
//! TTL store for tests and demos.

use crate::core::context::Context;
use crate::dispatch::dispatchers::Dispatch;
use crate::error::FlowResult;
use crate::pipes::PathArgs;
use crate::response::Response;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{event, Level};

/// What the store keeps per entry: headers and body. Replays are emitted as
/// 200, and only 200 results are ever stored, so no status is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

/// Builds a cache key from the route identity and the resolved request
/// arguments. Supplied by the caching subsystem.
pub trait CacheKeyBuilder: Send + Sync {
  fn build_key(&self, route: &str, args: &PathArgs) -> String;
}

/// Stock key builder: route name plus sorted `k=v` argument pairs.
#[derive(Debug, Default)]
pub struct DefaultKeyBuilder;

impl CacheKeyBuilder for DefaultKeyBuilder {
  fn build_key(&self, route: &str, args: &PathArgs) -> String {
    let mut pairs: Vec<_> = args.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{route}:{}", pairs.join("&"))
  }
}

/// The store contract. Async because real backends (redis, memcached) are.
#[async_trait]
pub trait ResponseCache: Send + Sync {
  async fn get(&self, key: &str) -> Option<CachedResponse>;
  async fn set(&self, key: &str, entry: CachedResponse, duration: Duration);
}

/// In-memory TTL store. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryCache {
  entries: RwLock<HashMap<String, (CachedResponse, Instant)>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }
}

#[async_trait]
impl ResponseCache for MemoryCache {
  async fn get(&self, key: &str) -> Option<CachedResponse> {
    let expired = {
      let guard = self.entries.read();
      match guard.get(key) {
        Some((entry, deadline)) if Instant::now() < *deadline => return Some(entry.clone()),
        Some(_) => true,
        None => false,
      }
    };
    if expired {
      self.entries.write().remove(key);
    }
    None
  }

  async fn set(&self, key: &str, entry: CachedResponse, duration: Duration) {
    let deadline = Instant::now() + duration;
    self.entries.write().insert(key.to_string(), (entry, deadline));
  }
}

const CACHEABLE_METHODS: [&str; 2] = ["GET", "HEAD"];

/// Wraps any dispatcher with response caching for GET/HEAD requests.
///
/// On a hit the stored headers and body are replayed directly and handler
/// execution is skipped entirely. On a miss the request executes normally
/// and a 200 result is stored under the route's configured duration.
/// Non-cacheable methods always execute normally.
pub struct CachedDispatcher {
  inner: Arc<dyn Dispatch>,
  route: String,
  key_builder: Arc<dyn CacheKeyBuilder>,
  store: Arc<dyn ResponseCache>,
  duration: Duration,
}

impl CachedDispatcher {
  pub fn new(
    inner: Arc<dyn Dispatch>,
    route: impl Into<String>,
    key_builder: Arc<dyn CacheKeyBuilder>,
    store: Arc<dyn ResponseCache>,
    duration: Duration,
  ) -> Self {
    Self {
      inner,
      route: route.into(),
      key_builder,
      store,
      duration,
    }
  }
}

#[async_trait]
impl Dispatch for CachedDispatcher {
  async fn dispatch(&self, ctx: Context, args: PathArgs) -> FlowResult<Response> {
    let method = ctx.method();
    if !CACHEABLE_METHODS.contains(&method.as_str()) {
      return self.inner.dispatch(ctx, args).await;
    }

    let key = self.key_builder.build_key(&self.route, &args);
    if let Some(hit) = self.store.get(&key).await {
      event!(Level::DEBUG, route = %self.route, %key, "cache hit, replaying stored response");
      return Ok(Response {
        status: 200,
        headers: hit.headers,
        body: hit.body,
      });
    }

    let response = self.inner.dispatch(ctx, args).await?;
    if response.status == 200 {
      event!(Level::DEBUG, route = %self.route, %key, "storing response");
      self
        .store
        .set(
          &key,
          CachedResponse {
            headers: response.headers.clone(),
            body: response.body.clone(),
          },
          self.duration,
        )
        .await;
    }
    Ok(response)
  }
}
