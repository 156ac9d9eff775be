//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

use crate::types::NodeId;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Maximum tree depth exceeded: {current} > {max}")]
    MaxDepthExceeded { current: usize, max: usize },

    #[error("No identities left to assign")]
    IdentitiesExhausted,
}
