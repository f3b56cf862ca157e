//! The dependency graph of resolved values.
pub mod dag;
pub mod error;

// Re-export key types for convenient access
pub use dag::DependencyGraph;
pub use error::GraphError;
