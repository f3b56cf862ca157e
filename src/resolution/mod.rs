//! Matches requirements against candidate specifications.
pub mod config;
pub mod resolver;

pub use config::{ConfigError, ResolutionConfig};
pub use resolver::{ExactTargetResolver, Resolution, Resolver, TargetResolver};
