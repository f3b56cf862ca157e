//! The property algebra and the two value shapes built on it.
//!
//! A [`ValueRequirement`] is an ask: a value name, a target, and constraints.
//! A [`ValueSpecification`] is an offer: the same identity with ground
//! properties, always naming the producing function. The graph builder keeps a
//! specification for a requirement when `requirement.is_satisfied_by(spec)`
//! holds, then calls `spec.compose(&requirement)` to get the tightened
//! specification used as cache key and published output.
//!
//! Everything here is immutable and `Send + Sync`; no operation locks.

pub mod names;

mod constraint;
mod error;
mod properties;
mod requirement;
mod specification;

pub use constraint::PropertyConstraint;
pub use error::ValueError;
pub use properties::{ValueProperties, ValuePropertiesBuilder};
pub use requirement::ValueRequirement;
pub use specification::ValueSpecification;
