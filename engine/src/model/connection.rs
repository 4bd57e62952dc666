//! Connections — edges of the data-flow graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::param::InputRef;

/// An edge from a node's output into another node's input element.
///
/// Nodes have a single implicit output (their value table), so the source is
/// just a node id; the destination addresses a specific input element.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: Uuid,
    pub to: InputRef,
}

impl Connection {
    pub fn new(from: Uuid, to: InputRef) -> Self {
        Self { from, to }
    }
}
