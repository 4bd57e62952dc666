//! Generator nodes: produce values or textures from nothing upstream.

use crate::eval::globals::NodeGlobals;
use crate::job::{GenerateJob, Texture};
use crate::model::math::Color;
use crate::model::node::Node;
use crate::model::param::{InputFlags, NodeInput};
use crate::model::value::{NodeValue, NodeValueRow, NodeValueTable, ValueData, ValueKind};

pub const VALUE_INPUT: &str = "value";
pub const COLOR_INPUT: &str = "color";

pub(super) fn value_inputs() -> Vec<NodeInput> {
    vec![NodeInput::new(
        VALUE_INPUT,
        ValueKind::Float,
        ValueData::float(0.0),
        InputFlags::NORMAL,
    )]
}

pub(super) fn solid_inputs() -> Vec<NodeInput> {
    vec![NodeInput::new(
        COLOR_INPUT,
        ValueKind::Color,
        ValueData::Color(Color::new(1.0, 0.0, 0.0, 1.0)),
        InputFlags::NORMAL,
    )]
}

/// Passes its single input through, re-sourced to this node.
pub(super) fn value_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    if let Some(v) = row.get(VALUE_INPUT) {
        table.push(NodeValue::with_source(v.data().clone(), node.id()));
    }
}

pub(super) fn solid_value(
    node: &Node,
    row: &NodeValueRow,
    globals: &NodeGlobals,
    table: &mut NodeValueTable,
) {
    let mut job = GenerateJob::new("solid");
    if let Some(color) = row.get(COLOR_INPUT) {
        job.insert(COLOR_INPUT, color.clone());
    }
    let texture = Texture::from_generate(globals.video_params, job);
    table.push(NodeValue::with_source(
        ValueData::Texture(Box::new(texture)),
        node.id(),
    ));
}
