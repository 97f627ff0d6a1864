pub mod cache;
pub mod dispatchers;

pub use cache::{CacheKeyBuilder, CachedDispatcher, CachedResponse, DefaultKeyBuilder, MemoryCache, ResponseCache};
pub use dispatchers::{build_dispatcher, Dispatch};
