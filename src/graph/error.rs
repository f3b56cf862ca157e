//! Defines the error types for the dependency graph.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Cycle detected involving {value}")]
    Cycle { value: String },
    #[error("Value not in graph: {0}")]
    UnknownValue(String),
    #[error("{input} does not satisfy {requirement}")]
    Unsatisfied { requirement: String, input: String },
}
