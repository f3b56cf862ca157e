//! Core of the value resolution engine.
//!
//! Functions declare what they need as [`ValueRequirement`]s and what they
//! produce as [`ValueSpecification`]s. The property algebra in [`value`]
//! decides which offers satisfy which asks and narrows a matching offer to
//! the exact value that gets computed, cached and published.

pub mod graph;
pub mod intern;
pub mod resolution;
pub mod target;
pub mod value;

pub mod display {
    pub mod trace;
}

// Re-export key types for convenient access
pub use intern::Interner;
pub use resolution::{Resolution, ResolutionConfig, Resolver};
pub use target::{TargetSpecification, TargetType, UniqueId};
pub use value::{
    PropertyConstraint, ValueError, ValueProperties, ValuePropertiesBuilder, ValueRequirement,
    ValueSpecification,
};
