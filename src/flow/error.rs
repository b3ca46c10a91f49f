//! Flow engine error types.
//!
//! Business and indeterminate outcomes never appear here: they travel
//! through `ResultStatus`. These errors are defects or collaborator
//! failures, and they escape to the caller.

use thiserror::Error;

use super::processor::ResultStatus;

/// Flow engine errors.
#[derive(Error, Debug, Clone)]
pub enum FlowError {
    #[error("flow not found: {0}")]
    FlowNotFound(String),

    #[error("node not found: {flow}/{node}")]
    NodeNotFound { flow: String, node: String },

    /// A processor returned a status the node's transition table does not
    /// declare. A defect, not a business outcome; never coerced silently.
    #[error("illegal processor output {status} at node {flow}/{node}")]
    IllegalProcessorOutput {
        flow: String,
        node: String,
        status: ResultStatus,
    },

    #[error("invalid resume target {flow}/{node}: {reason}")]
    InvalidResumeTarget {
        flow: String,
        node: String,
        reason: String,
    },

    #[error("invalid flow definition {flow}: {reason}")]
    InvalidDefinition { flow: String, reason: String },

    #[error("context store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Context store errors.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for FlowError {
    fn from(e: StoreError) -> Self {
        FlowError::Store(e.to_string())
    }
}

impl From<anyhow::Error> for FlowError {
    fn from(e: anyhow::Error) -> Self {
        FlowError::Internal(e.to_string())
    }
}
