//! Ambient context threaded explicitly through every node evaluation.

use crate::model::params::{AudioParams, VideoParams};
use crate::time::TimeRange;

/// Everything a node's value function may consult besides its resolved
/// inputs. Passed by reference down the traversal; nodes never reach for
/// process-wide state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeGlobals {
    /// The time range being evaluated, already adjusted for this node.
    pub time: TimeRange,
    pub video_params: VideoParams,
    pub audio_params: AudioParams,
}

impl NodeGlobals {
    pub fn new(time: TimeRange, video_params: VideoParams, audio_params: AudioParams) -> Self {
        Self {
            time,
            video_params,
            audio_params,
        }
    }

    /// Same parameters, different time range.
    pub fn at(&self, time: TimeRange) -> Self {
        Self { time, ..*self }
    }
}
