pub mod compiler;
pub mod definition;

pub use compiler::{compile, DispatchUnit};
pub use definition::Pipeline;
