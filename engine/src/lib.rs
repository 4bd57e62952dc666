//! Node-graph evaluation engine for the video editor.
//!
//! The graph is a document: plain serializable nodes, inputs, keyframes, and
//! connections. Evaluation pulls values downstream-to-upstream through a
//! [`eval::NodeTraverser`], producing typed value tables whose texture and
//! audio entries are deferred job descriptions for an external backend.
//! Mutation goes through [`model::Graph`] and synchronously propagates cache
//! invalidation to every affected downstream node.

pub mod cache;
pub mod error;
pub mod eval;
pub mod job;
pub mod model;
pub mod nodes;
pub mod time;

pub use error::EngineError;
pub use eval::{CancelAtom, NodeGlobals, NodeTraverser};
pub use model::{Graph, Node};
pub use nodes::NodeKind;
pub use time::{Rational, TimeRange, TimeRangeList};
