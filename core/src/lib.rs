// src/lib.rs

//! Sluice: an ASYNC request-pipeline and middleware composition engine.
//!
//! Sluice compiles a declarative, ordered list of middleware ("pipes") into
//! a nested chain of asynchronous wrappers with:
//!  - A five-hook pipe lifecycle: open, pipe, on_pipe_success,
//!    on_pipe_failure, close.
//!  - Strict ordering semantics: open/pipe run in pipeline order,
//!    success/failure/close in reverse order, close with finally semantics.
//!  - Short-circuiting via a recognized interrupt signal (redirect/abort)
//!    that routes through the success path, distinct from genuine failures.
//!  - Per-route and per-module pipeline composition (app ⊕ module ⊕ route).
//!  - Capability-driven wrapping: each pipe type's declared hook set is
//!    cached per type and used to pick the cheapest wrapper strategy.
//!  - Per-route dispatchers with concurrent open hooks and optional
//!    response caching.

// Declare modules according to the planned structure
pub mod core;
pub mod pipes;
pub mod pipeline;
pub mod dispatch;
pub mod error;
pub mod response;
pub mod route;

// --- Re-exports for the Public API ---

// Core types that users will interact with frequently
pub use crate::core::context::{Context, RequestScope};
pub use crate::core::output::{Output, OutputHint};

pub use crate::pipes::capability::{HookRegistry, HookSet};
pub use crate::pipes::{handler, sync_handler, Handler, HookFuture, Next, PathArgs, Pipe};

// Pipeline construction and compilation
pub use crate::pipeline::compiler::{compile, DispatchUnit};
pub use crate::pipeline::definition::Pipeline;

// Request-time execution
pub use crate::dispatch::cache::{
  CacheKeyBuilder, CachedDispatcher, CachedResponse, DefaultKeyBuilder, MemoryCache, ResponseCache,
};
pub use crate::dispatch::dispatchers::{build_dispatcher, Dispatch};

pub use crate::error::{abort, redirect, redirect_with, FlowError, FlowResult, Interrupt};
pub use crate::response::{default_builder, BuildResponse, Response};
pub use crate::route::{CachePolicy, Route, RouteBuilder};

/*
    Core Workflow:
    1. Implement `Pipe` for your middleware types, declaring their hook sets.
    2. Collect app-level, module-level and route-level pipes into `Pipeline`s.
    3. Expose routes with `RouteBuilder::new(name, handler)`, adding
       route-level pipes, methods, and an optional cache policy.
    4. `RouteBuilder::build(&app_pipeline, module_pipeline, &registry)` merges
       the pipelines, compiles the wrapper chain once, and returns a `Route`.
    5. Per request, construct a `Context` (method, path, query) and call
       `route.dispatch(ctx, path_args).await`.
    6. Convert an `Err(FlowError::Interrupt(..))` into a `Response` at the
       outer layer; any other error is a genuine failure (500-equivalent).
*/
