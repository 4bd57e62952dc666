//! Engine-wide error type.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Traversal re-entered a node for an overlapping time range, or a
    /// connection edit would close a loop.
    #[error("cycle detected at node {node}")]
    CycleDetected { node: Uuid },

    /// A connected input names an upstream node that is not in the graph.
    #[error("input '{input}' on node {node} is connected to a missing node")]
    MissingUpstream { node: Uuid, input: String },

    #[error("node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("node {node} has no input '{input}'")]
    UnknownInput { node: Uuid, input: String },

    #[error("input '{input}' on node {node} is not keyframable")]
    NotKeyframable { node: Uuid, input: String },

    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
