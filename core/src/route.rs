// sluice/src/route.rs

//! Route assembly: merges the app/module/route pipelines, compiles them
//! once, and builds one dispatcher per exposed HTTP method.
//!
//! This is the build-time glue between the pipeline compiler and the
//! dispatchers; everything it produces is immutable at request time.

use crate::core::context::Context;
use crate::core::output::OutputHint;
use crate::dispatch::cache::{CacheKeyBuilder, CachedDispatcher, ResponseCache};
use crate::dispatch::dispatchers::{build_dispatcher, Dispatch};
use crate::error::{FlowError, FlowResult};
use crate::pipeline::compiler::compile;
use crate::pipeline::definition::Pipeline;
use crate::pipes::capability::HookRegistry;
use crate::pipes::{Handler, PathArgs, Pipe};
use crate::response::{default_builder, BuildResponse, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{event, instrument, Level};

/// Response-caching configuration for a route.
#[derive(Clone)]
pub struct CachePolicy {
  pub key_builder: Arc<dyn CacheKeyBuilder>,
  pub store: Arc<dyn ResponseCache>,
  pub duration: Duration,
}

/// Builder for one exposed route.
pub struct RouteBuilder {
  name: String,
  methods: Vec<String>,
  pipes: Pipeline,
  handler: Handler,
  output: Option<OutputHint>,
  cache: Option<CachePolicy>,
  builders: HashMap<String, BuildResponse>,
}

impl RouteBuilder {
  /// A new route exposing `handler` under `name`, defaulting to GET.
  pub fn new(name: impl Into<String>, handler: Handler) -> Self {
    Self {
      name: name.into(),
      methods: vec!["GET".to_string()],
      pipes: Pipeline::new(),
      handler,
      output: None,
      cache: None,
      builders: HashMap::new(),
    }
  }

  pub fn methods<I, S>(mut self, methods: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.methods = methods.into_iter().map(|m| m.into().to_uppercase()).collect();
    self
  }

  /// Appends a route-level pipe.
  pub fn pipe(mut self, pipe: impl Pipe) -> Self {
    self.pipes.push(pipe);
    self
  }

  pub fn pipe_arc(mut self, pipe: Arc<dyn Pipe>) -> Self {
    self.pipes.push_arc(pipe);
    self
  }

  /// Replaces the route-level pipeline wholesale.
  pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
    self.pipes = pipeline;
    self
  }

  /// Explicit output hint, overriding anything the pipes declare.
  pub fn output(mut self, hint: OutputHint) -> Self {
    self.output = Some(hint);
    self
  }

  pub fn cached(mut self, policy: CachePolicy) -> Self {
    self.cache = Some(policy);
    self
  }

  /// Overrides the response builder for one method.
  pub fn response_builder(mut self, method: impl Into<String>, builder: BuildResponse) -> Self {
    self.builders.insert(method.into().to_uppercase(), builder);
    self
  }

  /// Merges pipelines (app ⊕ module ⊕ route), compiles once, and picks a
  /// dispatcher variant per method.
  #[instrument(name = "RouteBuilder::build", skip_all, fields(route = %self.name, num_methods = self.methods.len()))]
  pub fn build(self, app: &Pipeline, module: Option<&Pipeline>, registry: &HookRegistry) -> Route {
    let effective = Pipeline::merged(app, module, &self.pipes);
    event!(
      Level::DEBUG,
      effective_pipes = effective.len(),
      "building route from effective pipeline"
    );

    // Explicit hint wins; otherwise the last pipe declaring one.
    let hint = self
      .output
      .or_else(|| effective.pipes().iter().rev().find_map(|p| p.output()));

    let unit = compile(&effective, self.handler, registry);

    let mut dispatchers = HashMap::new();
    for method in &self.methods {
      let builder = self
        .builders
        .get(method)
        .cloned()
        .unwrap_or_else(|| default_builder(hint));
      let mut dispatcher = build_dispatcher(unit.clone(), builder);
      if let Some(policy) = &self.cache {
        dispatcher = Arc::new(CachedDispatcher::new(
          dispatcher,
          self.name.clone(),
          policy.key_builder.clone(),
          policy.store.clone(),
          policy.duration,
        ));
      }
      dispatchers.insert(method.clone(), dispatcher);
    }

    Route {
      name: self.name,
      dispatchers,
    }
  }
}

/// An exposed route: one dispatcher per HTTP method.
pub struct Route {
  name: String,
  dispatchers: HashMap<String, Arc<dyn Dispatch>>,
}

impl Route {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn methods(&self) -> Vec<&str> {
    self.dispatchers.keys().map(|m| m.as_str()).collect()
  }

  /// Dispatches one request through the method's dispatcher.
  #[instrument(name = "Route::dispatch", skip_all, fields(route = %self.name), err(Display))]
  pub async fn dispatch(&self, ctx: Context, args: PathArgs) -> FlowResult<Response> {
    let method = ctx.method();
    let dispatcher = self.dispatchers.get(&method).ok_or_else(|| FlowError::Config {
      route: self.name.clone(),
      message: format!("method {method} not exposed"),
    })?;
    dispatcher.dispatch(ctx, args).await
  }
}

impl std::fmt::Debug for Route {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Route")
      .field("name", &self.name)
      .field("methods", &self.methods())
      .finish()
  }
}
