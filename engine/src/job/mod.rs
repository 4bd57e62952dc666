//! Deferred job descriptions.
//!
//! Work that is proportional to texture or sample-buffer size is never
//! performed during traversal. Instead a node's value function builds a job: a
//! named map from parameter name to resolved value, plus an iteration count
//! and (implicitly, through nested texture/sample values in the map) the jobs
//! it depends on. The external renderer backend walks the job tree and
//! executes it; the engine only constructs and compares it.
//!
//! Jobs are plain data. Two traversals of an unchanged graph produce
//! structurally equal job trees, which is what lets an external cache
//! recognize identical work without running it.

use serde::{Deserialize, Serialize};

use crate::model::params::{AudioParams, VideoParams};
use crate::model::value::{NodeValue, NodeValueRow};

/// A GPU shader pass over one or more input textures.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ShaderJob {
    shader_id: String,
    values: NodeValueRow,
    iterations: u32,
    iterative_input: Option<String>,
}

impl ShaderJob {
    pub fn new(shader_id: &str) -> Self {
        Self {
            shader_id: shader_id.to_string(),
            values: NodeValueRow::new(),
            iterations: 1,
            iterative_input: None,
        }
    }

    pub fn with_values(shader_id: &str, values: NodeValueRow) -> Self {
        Self {
            values,
            ..Self::new(shader_id)
        }
    }

    pub fn shader_id(&self) -> &str {
        &self.shader_id
    }

    pub fn insert(&mut self, name: &str, value: NodeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&NodeValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &NodeValueRow {
        &self.values
    }

    /// Request the backend re-apply this job `iterations` times, feeding the
    /// previous pass's output back in through `iterative_input`. Used for
    /// separable multi-pass effects such as iterative box blur.
    pub fn set_iterations(&mut self, iterations: u32, iterative_input: &str) {
        self.iterations = iterations.max(1);
        self.iterative_input = Some(iterative_input.to_string());
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn iterative_input(&self) -> Option<&str> {
        self.iterative_input.as_deref()
    }
}

/// CPU generation of a texture from scratch (no input texture).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GenerateJob {
    generator_id: String,
    values: NodeValueRow,
}

impl GenerateJob {
    pub fn new(generator_id: &str) -> Self {
        Self {
            generator_id: generator_id.to_string(),
            values: NodeValueRow::new(),
        }
    }

    pub fn with_values(generator_id: &str, values: NodeValueRow) -> Self {
        Self {
            values,
            ..Self::new(generator_id)
        }
    }

    pub fn generator_id(&self) -> &str {
        &self.generator_id
    }

    pub fn insert(&mut self, name: &str, value: NodeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&NodeValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &NodeValueRow {
        &self.values
    }
}

/// Audio-sample processing or generation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SampleJob {
    processor_id: String,
    values: NodeValueRow,
}

impl SampleJob {
    pub fn new(processor_id: &str) -> Self {
        Self {
            processor_id: processor_id.to_string(),
            values: NodeValueRow::new(),
        }
    }

    pub fn with_values(processor_id: &str, values: NodeValueRow) -> Self {
        Self {
            values,
            ..Self::new(processor_id)
        }
    }

    pub fn processor_id(&self) -> &str {
        &self.processor_id
    }

    pub fn insert(&mut self, name: &str, value: NodeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&NodeValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &NodeValueRow {
        &self.values
    }
}

/// How a deferred texture is produced.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum TextureJob {
    Shader(ShaderJob),
    Generate(GenerateJob),
}

/// A texture value: output format plus the deferred job that produces the
/// pixels. Passed between nodes without ever touching pixel data.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub params: VideoParams,
    pub job: TextureJob,
}

impl Texture {
    pub fn from_shader(params: VideoParams, job: ShaderJob) -> Self {
        Self {
            params,
            job: TextureJob::Shader(job),
        }
    }

    pub fn from_generate(params: VideoParams, job: GenerateJob) -> Self {
        Self {
            params,
            job: TextureJob::Generate(job),
        }
    }
}

/// An audio stream value: format plus the deferred job producing the samples.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SampleStream {
    pub params: AudioParams,
    pub job: SampleJob,
}

impl SampleStream {
    pub fn new(params: AudioParams, job: SampleJob) -> Self {
        Self { params, job }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::{NodeValue, ValueData};

    #[test]
    fn test_structural_equality() {
        let mut a = ShaderJob::new("flip");
        a.insert("horizontal", NodeValue::new(ValueData::Boolean(true)));
        let mut b = ShaderJob::new("flip");
        b.insert("horizontal", NodeValue::new(ValueData::Boolean(true)));
        assert_eq!(a, b);

        b.insert("vertical", NodeValue::new(ValueData::Boolean(false)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_iterations_clamp_to_one() {
        let mut job = ShaderJob::new("box_blur");
        job.set_iterations(0, "tex_in");
        assert_eq!(job.iterations(), 1);
        assert_eq!(job.iterative_input(), Some("tex_in"));
    }
}
