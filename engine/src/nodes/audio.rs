//! Audio nodes: sample-stream generation and processing.

use crate::eval::globals::NodeGlobals;
use crate::job::{SampleJob, SampleStream};
use crate::model::node::Node;
use crate::model::param::{InputFlags, NodeInput};
use crate::model::value::{NodeValue, NodeValueRow, NodeValueTable, ValueData, ValueKind};

pub const SAMPLES_INPUT: &str = "samples";
pub const GAIN_INPUT: &str = "gain";
pub const FREQUENCY_INPUT: &str = "frequency";
pub const LEVEL_INPUT: &str = "level";

pub(super) fn volume_inputs() -> Vec<NodeInput> {
    vec![
        NodeInput::new(
            SAMPLES_INPUT,
            ValueKind::Samples,
            ValueData::None,
            InputFlags::NOT_KEYFRAMABLE,
        ),
        NodeInput::new(
            GAIN_INPUT,
            ValueKind::Float,
            ValueData::float(1.0),
            InputFlags::NORMAL,
        ),
    ]
}

pub(super) fn tone_inputs() -> Vec<NodeInput> {
    vec![
        NodeInput::new(
            FREQUENCY_INPUT,
            ValueKind::Float,
            ValueData::float(440.0),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            LEVEL_INPUT,
            ValueKind::Float,
            ValueData::float(0.5),
            InputFlags::NORMAL,
        ),
    ]
}

/// Unity gain is a no-op, so the upstream stream value passes through and the
/// job is never built.
pub(super) fn volume_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    let Some(stream_value) = row.get(SAMPLES_INPUT) else {
        return;
    };
    let Some(stream) = stream_value.as_samples() else {
        return;
    };

    let gain = row.get(GAIN_INPUT).map_or(1.0, |v| v.as_float(1.0));
    if gain == 1.0 {
        table.push(stream_value.clone());
        return;
    }

    let mut job = SampleJob::new("volume");
    job.insert(SAMPLES_INPUT, stream_value.clone());
    job.insert(GAIN_INPUT, NodeValue::new(ValueData::float(gain)));

    let out = SampleStream::new(stream.params, job);
    table.push(NodeValue::with_source(
        ValueData::Samples(Box::new(out)),
        node.id(),
    ));
}

pub(super) fn tone_value(
    node: &Node,
    row: &NodeValueRow,
    globals: &NodeGlobals,
    table: &mut NodeValueTable,
) {
    let mut job = SampleJob::new("tone");
    if let Some(frequency) = row.get(FREQUENCY_INPUT) {
        job.insert(FREQUENCY_INPUT, frequency.clone());
    }
    if let Some(level) = row.get(LEVEL_INPUT) {
        job.insert(LEVEL_INPUT, level.clone());
    }

    let out = SampleStream::new(globals.audio_params, job);
    table.push(NodeValue::with_source(
        ValueData::Samples(Box::new(out)),
        node.id(),
    ));
}
