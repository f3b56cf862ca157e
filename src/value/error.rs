//! Defines the error types for the value module.
//!
//! Every variant here is a programming error: a function or the graph builder
//! handed the algebra a malformed requirement or specification. Resolution
//! outcomes ("no match", "not composable") are never reported through this type.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("value name must not be empty")]
    EmptyValueName,
    #[error("property name must not be empty")]
    EmptyPropertyName,
    #[error("property '{name}' was given an empty value")]
    EmptyPropertyValue { name: String },
    #[error("malformed constraint: {0}")]
    MalformedConstraint(String),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("specification properties must include the '{name}' property")]
    MissingFunction { name: &'static str },
    #[error("the '{name}' property must hold exactly one non-optional value, found {found}")]
    InvalidFunction { name: &'static str, found: String },
    #[error("property '{name}' contains only wild-card values")]
    WildcardProperty { name: String },
    #[error("property '{name}' has {count} values where a single value was expected")]
    MultiValuedProperty { name: String, count: usize },
}
