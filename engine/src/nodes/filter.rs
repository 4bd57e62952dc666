//! Filter nodes: per-pixel effects over an input texture.

use crate::job::{ShaderJob, Texture};
use crate::model::math::{Color, Vec2};
use crate::model::node::Node;
use crate::model::param::{InputFlags, NodeInput};
use crate::model::value::{NodeValue, NodeValueRow, NodeValueTable, ValueData, ValueKind};

pub const TEXTURE_INPUT: &str = "texture";
pub const RADIUS_INPUT: &str = "radius";
pub const ITERATIONS_INPUT: &str = "iterations";

pub const COLOR_INPUT: &str = "color";
pub const DISTANCE_INPUT: &str = "distance";
pub const SOFTNESS_INPUT: &str = "softness";
pub const SHADOW_INPUT: &str = "shadow";

pub(super) const BOX_BLUR_GLSL: &str = r#"
uniform sampler2D texture;
uniform float radius;
uniform vec2 resolution;
in vec2 ove_texcoord;
out vec4 frag_color;

void main() {
    vec4 sum = vec4(0.0);
    float count = 0.0;
    for (float x = -radius; x <= radius; x += 1.0) {
        sum += texture2D(texture, ove_texcoord + vec2(x / resolution.x, 0.0));
        count += 1.0;
    }
    frag_color = sum / count;
}
"#;

pub(super) const DROP_SHADOW_GLSL: &str = r#"
uniform sampler2D texture;
uniform sampler2D shadow;
uniform vec4 color;
uniform vec2 distance;
uniform vec2 resolution;
in vec2 ove_texcoord;
out vec4 frag_color;

void main() {
    vec4 base = texture2D(texture, ove_texcoord);
    vec4 s = texture2D(shadow, ove_texcoord - distance / resolution);
    vec4 tinted = color * s.a;
    frag_color = base + tinted * (1.0 - base.a);
}
"#;

pub(super) fn box_blur_inputs() -> Vec<NodeInput> {
    vec![
        NodeInput::new(
            TEXTURE_INPUT,
            ValueKind::Texture,
            ValueData::None,
            InputFlags::NOT_KEYFRAMABLE,
        ),
        NodeInput::new(
            RADIUS_INPUT,
            ValueKind::Float,
            ValueData::float(10.0),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            ITERATIONS_INPUT,
            ValueKind::Integer,
            ValueData::Integer(3),
            InputFlags::NOT_CONNECTABLE,
        ),
    ]
}

pub(super) fn drop_shadow_inputs() -> Vec<NodeInput> {
    vec![
        NodeInput::new(
            TEXTURE_INPUT,
            ValueKind::Texture,
            ValueData::None,
            InputFlags::NOT_KEYFRAMABLE,
        ),
        NodeInput::new(
            COLOR_INPUT,
            ValueKind::Color,
            ValueData::Color(Color::new(0.0, 0.0, 0.0, 1.0)),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            DISTANCE_INPUT,
            ValueKind::Vec2,
            ValueData::Vec2(Vec2::new(10.0, 10.0)),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            SOFTNESS_INPUT,
            ValueKind::Float,
            ValueData::float(5.0),
            InputFlags::NORMAL,
        ),
    ]
}

/// A non-positive radius makes the blur a no-op, so the job is never built
/// and the upstream texture value passes through unchanged.
pub(super) fn box_blur_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    let Some(tex_value) = row.get(TEXTURE_INPUT) else {
        return;
    };
    let Some(texture) = tex_value.as_texture() else {
        return;
    };

    let radius = row.get(RADIUS_INPUT).map_or(0.0, |v| v.as_float(0.0));
    if radius <= 0.0 {
        table.push(tex_value.clone());
        return;
    }
    let iterations = row.get(ITERATIONS_INPUT).map_or(1, |v| v.as_int(1)).max(1) as u32;

    let out = Texture::from_shader(texture.params, blur_job(tex_value, radius, iterations));
    table.push(NodeValue::with_source(
        ValueData::Texture(Box::new(out)),
        node.id(),
    ));
}

fn blur_job(tex_value: &NodeValue, radius: f64, iterations: u32) -> ShaderJob {
    let mut job = ShaderJob::new("box_blur");
    job.insert(TEXTURE_INPUT, tex_value.clone());
    job.insert(RADIUS_INPUT, NodeValue::new(ValueData::float(radius)));
    if iterations > 1 {
        job.set_iterations(iterations, TEXTURE_INPUT);
    }
    job
}

/// Composites a blurred, tinted copy of the input under the input itself.
/// The blurred copy is a nested texture value inside this job's row.
pub(super) fn drop_shadow_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    let Some(tex_value) = row.get(TEXTURE_INPUT) else {
        return;
    };
    let Some(texture) = tex_value.as_texture() else {
        return;
    };

    let softness = row.get(SOFTNESS_INPUT).map_or(0.0, |v| v.as_float(0.0));
    let shadow_source = if softness > 0.0 {
        let blurred = Texture::from_shader(texture.params, blur_job(tex_value, softness, 1));
        NodeValue::new(ValueData::Texture(Box::new(blurred)))
    } else {
        tex_value.clone()
    };

    let mut job = ShaderJob::new("drop_shadow");
    job.insert(TEXTURE_INPUT, tex_value.clone());
    job.insert(SHADOW_INPUT, shadow_source);
    if let Some(color) = row.get(COLOR_INPUT) {
        job.insert(COLOR_INPUT, color.clone());
    }
    if let Some(distance) = row.get(DISTANCE_INPUT) {
        job.insert(DISTANCE_INPUT, distance.clone());
    }

    let out = Texture::from_shader(texture.params, job);
    table.push(NodeValue::with_source(
        ValueData::Texture(Box::new(out)),
        node.id(),
    ));
}
