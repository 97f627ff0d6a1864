pub mod context;
pub mod output;

// Re-export key types for easier access from other sluice modules (and lib.rs)
pub use context::{Context, RequestScope};
pub use output::{Output, OutputHint};
