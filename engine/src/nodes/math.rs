//! Scalar math nodes.

use crate::model::node::Node;
use crate::model::param::{InputFlags, NodeInput};
use crate::model::value::{NodeValue, NodeValueRow, NodeValueTable, ValueData, ValueKind};

pub const LHS_INPUT: &str = "lhs";
pub const RHS_INPUT: &str = "rhs";
pub const VALUES_INPUT: &str = "values";

pub(super) fn add_inputs() -> Vec<NodeInput> {
    vec![
        NodeInput::new(
            LHS_INPUT,
            ValueKind::Float,
            ValueData::float(0.0),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            RHS_INPUT,
            ValueKind::Float,
            ValueData::float(0.0),
            InputFlags::NORMAL,
        ),
    ]
}

pub(super) fn sum_inputs() -> Vec<NodeInput> {
    vec![NodeInput::new(
        VALUES_INPUT,
        ValueKind::Float,
        ValueData::float(0.0),
        InputFlags::ARRAY,
    )]
}

pub(super) fn add_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    let lhs = row.get(LHS_INPUT).map_or(0.0, |v| v.as_float(0.0));
    let rhs = row.get(RHS_INPUT).map_or(0.0, |v| v.as_float(0.0));
    table.push(NodeValue::with_source(ValueData::float(lhs + rhs), node.id()));
}

/// Adds every element of the array input. Elements resolve independently, so
/// any mix of connections and immediate values sums correctly.
pub(super) fn sum_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    let total = match row.get(VALUES_INPUT).map(NodeValue::data) {
        Some(ValueData::Array(items)) => items.iter().map(scalar).sum(),
        Some(single) => scalar(single),
        None => 0.0,
    };
    table.push(NodeValue::with_source(ValueData::float(total), node.id()));
}

fn scalar(value: &ValueData) -> f64 {
    match value {
        ValueData::Float(v) => v.into_inner(),
        ValueData::Integer(v) => *v as f64,
        ValueData::Rational(v) => v.to_f64(),
        _ => 0.0,
    }
}
