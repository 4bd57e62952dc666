//! Time nodes: remap the time their upstream branch is evaluated at.

use crate::model::node::Node;
use crate::model::param::{InputFlags, NodeInput};
use crate::model::value::{NodeValueRow, NodeValueTable, ValueData, ValueKind};
use crate::time::{Rational, TimeRange};

pub const TIME_INPUT: &str = "time_in";
pub const INPUT_INPUT: &str = "input_in";

pub(super) fn offset_inputs() -> Vec<NodeInput> {
    let mut time = NodeInput::new(
        TIME_INPUT,
        ValueKind::Rational,
        ValueData::Rational(Rational::ZERO),
        InputFlags::NOT_CONNECTABLE,
    );
    time.properties
        .insert("view".to_string(), serde_json::json!("time"));

    let input = NodeInput::new(
        INPUT_INPUT,
        ValueKind::None,
        ValueData::None,
        InputFlags::NOT_KEYFRAMABLE,
    );
    vec![time, input]
}

/// The node itself is a pass-through; all the work happens in the time
/// adjustments below.
pub(super) fn offset_value(row: &NodeValueRow, table: &mut NodeValueTable) {
    if let Some(v) = row.get(INPUT_INPUT) {
        table.push(v.clone());
    }
}

/// A request at output time `t` samples the input at `t + offset`.
/// Each endpoint is remapped independently so a keyframed offset stretches
/// the range rather than merely shifting it.
pub(super) fn offset_input_time(node: &Node, input: &str, range: &TimeRange) -> TimeRange {
    if input != INPUT_INPUT {
        return *range;
    }
    TimeRange::new(remap(node, range.start()), remap(node, range.end()))
}

/// Inverse of [`offset_input_time`]: a change at input time `t` is visible at
/// output time `t - offset`. Exact for constant offsets; with a keyframed
/// offset the offset is sampled at the input time, which is an approximation
/// of the true inverse.
pub(super) fn offset_output_time(node: &Node, input: &str, range: &TimeRange) -> TimeRange {
    if input != INPUT_INPUT {
        return *range;
    }
    TimeRange::new(unmap(node, range.start()), unmap(node, range.end()))
}

fn remap(node: &Node, time: Rational) -> Rational {
    time + offset_at(node, time)
}

fn unmap(node: &Node, time: Rational) -> Rational {
    time - offset_at(node, time)
}

fn offset_at(node: &Node, time: Rational) -> Rational {
    match node.value_at(TIME_INPUT, 0, time) {
        ValueData::Rational(r) => r,
        ValueData::Integer(n) => Rational::from_int(n),
        ValueData::Float(f) => Rational::from_f64(f.into_inner()),
        _ => Rational::ZERO,
    }
}
