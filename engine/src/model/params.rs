//! Ambient video/audio parameters for an evaluation.
//!
//! These describe the requested output format (resolution, frame rate, sample
//! rate), not any particular piece of media. They travel in the evaluation
//! globals and inside texture/sample values so the external backend knows how
//! to allocate buffers.

use serde::{Deserialize, Serialize};

use crate::time::Rational;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub pixel_aspect: Rational,
}

impl VideoParams {
    pub fn new(width: u32, height: u32, frame_rate: Rational) -> Self {
        Self {
            width,
            height,
            frame_rate,
            pixel_aspect: Rational::from_int(1),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.frame_rate.is_zero()
    }

    /// Duration of a single frame.
    pub fn frame_length(&self) -> Rational {
        self.frame_rate.flipped()
    }
}

impl Default for VideoParams {
    fn default() -> Self {
        Self::new(1920, 1080, Rational::from_int(30))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub channel_count: u32,
}

impl AudioParams {
    pub fn new(sample_rate: u32, channel_count: u32) -> Self {
        Self {
            sample_rate,
            channel_count,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channel_count > 0
    }

    /// Number of per-channel samples covering `length` of time, truncated.
    pub fn time_to_samples(&self, length: Rational) -> usize {
        let samples = length * Rational::from_int(self.sample_rate as i64);
        samples.to_f64().max(0.0) as usize
    }
}

impl Default for AudioParams {
    fn default() -> Self {
        Self::new(48000, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_to_samples() {
        let params = AudioParams::new(48000, 2);
        assert_eq!(params.time_to_samples(Rational::from_int(1)), 48000);
        assert_eq!(params.time_to_samples(Rational::new(1, 2)), 24000);
    }

    #[test]
    fn test_frame_length() {
        let params = VideoParams::new(1280, 720, Rational::new(30000, 1001));
        assert_eq!(params.frame_length(), Rational::new(1001, 30000));
    }
}
