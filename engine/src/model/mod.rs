//! Document model: values, keyframes, inputs, nodes, connections, the graph.

pub mod connection;
pub mod graph;
pub mod keyframe;
pub mod math;
pub mod node;
pub mod param;
pub mod params;
pub mod value;

pub use connection::Connection;
pub use graph::{AffectedRanges, Graph};
pub use keyframe::{Keyframe, KeyframeInterp, KeyframeTrack};
pub use math::{Color, Mat4, Vec2, Vec3, Vec4};
pub use node::Node;
pub use param::{InputElement, InputFlags, InputRef, NodeInput};
pub use params::{AudioParams, VideoParams};
pub use value::{NodeValue, NodeValueRow, NodeValueTable, ValueData, ValueKind};
