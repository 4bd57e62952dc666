//! Built-in node kinds and their behavior dispatch.
//!
//! A node's behavior is a closed enum rather than trait objects: kind-specific
//! input declarations, value functions, and time adjustments are free
//! functions in the submodules, dispatched from here. This keeps the document
//! model plain data and makes exhaustiveness a compiler concern when a kind is
//! added.

pub mod audio;
pub mod distort;
pub mod filter;
pub mod generator;
pub mod math;
pub mod time;

use serde::{Deserialize, Serialize};

use crate::eval::globals::NodeGlobals;
use crate::model::node::Node;
use crate::model::param::NodeInput;
use crate::model::value::{NodeValueRow, NodeValueTable};
use crate::time::TimeRange;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Value,
    Solid,
    Flip,
    BoxBlur,
    DropShadow,
    Transform,
    MathAdd,
    Sum,
    TimeOffset,
    Volume,
    Tone,
}

impl NodeKind {
    /// Stable identifier used in documents and by external backends.
    pub fn id(&self) -> &'static str {
        match self {
            NodeKind::Value => "generator.value",
            NodeKind::Solid => "generator.solid",
            NodeKind::Flip => "distort.flip",
            NodeKind::BoxBlur => "filter.boxblur",
            NodeKind::DropShadow => "filter.dropshadow",
            NodeKind::Transform => "distort.transform",
            NodeKind::MathAdd => "math.add",
            NodeKind::Sum => "math.sum",
            NodeKind::TimeOffset => "time.offset",
            NodeKind::Volume => "audio.volume",
            NodeKind::Tone => "generator.tone",
        }
    }

    /// Human-readable default label.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Value => "Value",
            NodeKind::Solid => "Solid",
            NodeKind::Flip => "Flip",
            NodeKind::BoxBlur => "Box Blur",
            NodeKind::DropShadow => "Drop Shadow",
            NodeKind::Transform => "Transform",
            NodeKind::MathAdd => "Add",
            NodeKind::Sum => "Sum",
            NodeKind::TimeOffset => "Time Offset",
            NodeKind::Volume => "Volume",
            NodeKind::Tone => "Tone",
        }
    }

    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Value,
            NodeKind::Solid,
            NodeKind::Flip,
            NodeKind::BoxBlur,
            NodeKind::DropShadow,
            NodeKind::Transform,
            NodeKind::MathAdd,
            NodeKind::Sum,
            NodeKind::TimeOffset,
            NodeKind::Volume,
            NodeKind::Tone,
        ]
    }
}

/// Input declarations for a kind, called once at node construction.
pub fn create_inputs(kind: NodeKind) -> Vec<NodeInput> {
    match kind {
        NodeKind::Value => generator::value_inputs(),
        NodeKind::Solid => generator::solid_inputs(),
        NodeKind::Flip => distort::flip_inputs(),
        NodeKind::BoxBlur => filter::box_blur_inputs(),
        NodeKind::DropShadow => filter::drop_shadow_inputs(),
        NodeKind::Transform => distort::transform_inputs(),
        NodeKind::MathAdd => math::add_inputs(),
        NodeKind::Sum => math::sum_inputs(),
        NodeKind::TimeOffset => time::offset_inputs(),
        NodeKind::Volume => audio::volume_inputs(),
        NodeKind::Tone => audio::tone_inputs(),
    }
}

/// Evaluate a node over its resolved input row, pushing outputs into `table`.
/// Deterministic and side-effect free; anything proportional to buffer size
/// becomes a deferred job.
pub fn process(node: &Node, row: &NodeValueRow, globals: &NodeGlobals, table: &mut NodeValueTable) {
    match node.kind() {
        NodeKind::Value => generator::value_value(node, row, table),
        NodeKind::Solid => generator::solid_value(node, row, globals, table),
        NodeKind::Flip => distort::flip_value(node, row, table),
        NodeKind::BoxBlur => filter::box_blur_value(node, row, table),
        NodeKind::DropShadow => filter::drop_shadow_value(node, row, table),
        NodeKind::Transform => distort::transform_value(node, row, table),
        NodeKind::MathAdd => math::add_value(node, row, table),
        NodeKind::Sum => math::sum_value(node, row, table),
        NodeKind::TimeOffset => time::offset_value(row, table),
        NodeKind::Volume => audio::volume_value(node, row, table),
        NodeKind::Tone => audio::tone_value(node, row, globals, table),
    }
}

/// Time range to request from the branch feeding `input`, given the range
/// this node is being evaluated over. Identity for all but time nodes.
pub fn input_time_adjustment(
    node: &Node,
    input: &str,
    _element: usize,
    range: &TimeRange,
) -> TimeRange {
    match node.kind() {
        NodeKind::TimeOffset => time::offset_input_time(node, input, range),
        _ => *range,
    }
}

/// Inverse of [`input_time_adjustment`]: given a changed range on the branch
/// feeding `input`, the range of this node's output affected by it.
pub fn output_time_adjustment(
    node: &Node,
    input: &str,
    _element: usize,
    range: &TimeRange,
) -> TimeRange {
    match node.kind() {
        NodeKind::TimeOffset => time::offset_output_time(node, input, range),
        _ => *range,
    }
}

/// Hook run after an input value edit; adjusts derived input state such as
/// the visibility of dependent inputs. Never touches evaluation state.
pub fn input_value_changed(node: &mut Node, input: &str, _element: usize) {
    if node.kind() == NodeKind::Transform {
        distort::transform_input_changed(node, input);
    }
}

/// Opaque shader source for kinds that defer to a GPU pass. The engine never
/// interprets this text; it hands it to the external render backend keyed by
/// the job's shader id.
pub fn shader_code(shader_id: &str) -> Option<&'static str> {
    match shader_id {
        "flip" => Some(distort::FLIP_GLSL),
        "box_blur" => Some(filter::BOX_BLUR_GLSL),
        "drop_shadow" => Some(filter::DROP_SHADOW_GLSL),
        _ => None,
    }
}
