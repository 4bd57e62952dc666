//! Distortion nodes: geometric operations on an input texture.

use crate::job::{ShaderJob, Texture};
use crate::model::math::{Mat4, Vec2};
use crate::model::node::Node;
use crate::model::param::{InputFlags, NodeInput};
use crate::model::value::{NodeValue, NodeValueRow, NodeValueTable, ValueData, ValueKind};

pub const TEXTURE_INPUT: &str = "texture";
pub const HORIZONTAL_INPUT: &str = "horizontal";
pub const VERTICAL_INPUT: &str = "vertical";

pub const POSITION_INPUT: &str = "position";
pub const ROTATION_INPUT: &str = "rotation";
pub const SCALE_X_INPUT: &str = "scale_x";
pub const SCALE_Y_INPUT: &str = "scale_y";
pub const UNIFORM_SCALE_INPUT: &str = "uniform_scale";

pub(super) const FLIP_GLSL: &str = r#"
uniform sampler2D texture;
uniform bool horizontal;
uniform bool vertical;
in vec2 ove_texcoord;
out vec4 frag_color;

void main() {
    vec2 coord = ove_texcoord;
    if (horizontal) coord.x = 1.0 - coord.x;
    if (vertical) coord.y = 1.0 - coord.y;
    frag_color = texture2D(texture, coord);
}
"#;

pub(super) fn flip_inputs() -> Vec<NodeInput> {
    vec![
        NodeInput::new(
            TEXTURE_INPUT,
            ValueKind::Texture,
            ValueData::None,
            InputFlags::NOT_KEYFRAMABLE,
        ),
        NodeInput::new(
            HORIZONTAL_INPUT,
            ValueKind::Boolean,
            ValueData::Boolean(false),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            VERTICAL_INPUT,
            ValueKind::Boolean,
            ValueData::Boolean(false),
            InputFlags::NORMAL,
        ),
    ]
}

pub(super) fn transform_inputs() -> Vec<NodeInput> {
    vec![
        NodeInput::new(
            POSITION_INPUT,
            ValueKind::Vec2,
            ValueData::Vec2(Vec2::new(0.0, 0.0)),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            ROTATION_INPUT,
            ValueKind::Float,
            ValueData::float(0.0),
            InputFlags::NORMAL,
        ),
        NodeInput::new(
            SCALE_X_INPUT,
            ValueKind::Float,
            ValueData::float(1.0),
            InputFlags::NORMAL,
        ),
        // Hidden while uniform scaling is on; see input_value_changed.
        NodeInput::new(
            SCALE_Y_INPUT,
            ValueKind::Float,
            ValueData::float(1.0),
            InputFlags::HIDDEN,
        ),
        NodeInput::new(
            UNIFORM_SCALE_INPUT,
            ValueKind::Boolean,
            ValueData::Boolean(true),
            InputFlags::NOT_KEYFRAMABLE,
        ),
    ]
}

/// With neither flag set, the input value passes through untouched so an
/// external cache sees the exact upstream texture. With no texture at all,
/// nothing is pushed.
pub(super) fn flip_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    let Some(tex_value) = row.get(TEXTURE_INPUT) else {
        return;
    };
    let Some(texture) = tex_value.as_texture() else {
        return;
    };

    let horizontal = row
        .get(HORIZONTAL_INPUT)
        .is_some_and(|v| v.as_bool(false));
    let vertical = row.get(VERTICAL_INPUT).is_some_and(|v| v.as_bool(false));

    if !horizontal && !vertical {
        table.push(tex_value.clone());
        return;
    }

    let mut job = ShaderJob::new("flip");
    job.insert(TEXTURE_INPUT, tex_value.clone());
    job.insert(
        HORIZONTAL_INPUT,
        NodeValue::new(ValueData::Boolean(horizontal)),
    );
    job.insert(VERTICAL_INPUT, NodeValue::new(ValueData::Boolean(vertical)));

    let out = Texture::from_shader(texture.params, job);
    table.push(NodeValue::with_source(
        ValueData::Texture(Box::new(out)),
        node.id(),
    ));
}

/// Translate * rotate * scale, in that order.
pub(super) fn transform_value(node: &Node, row: &NodeValueRow, table: &mut NodeValueTable) {
    let position = row
        .get(POSITION_INPUT)
        .map(|v| v.as_vec2(Vec2::default()))
        .unwrap_or_default();
    let rotation = row.get(ROTATION_INPUT).map_or(0.0, |v| v.as_float(0.0));
    let scale_x = row.get(SCALE_X_INPUT).map_or(1.0, |v| v.as_float(1.0));
    let uniform = row
        .get(UNIFORM_SCALE_INPUT)
        .is_some_and(|v| v.as_bool(true));
    let scale_y = if uniform {
        scale_x
    } else {
        row.get(SCALE_Y_INPUT).map_or(1.0, |v| v.as_float(1.0))
    };

    let matrix = Mat4::translation(position.x.into_inner(), position.y.into_inner())
        .multiply(&Mat4::rotation_z(rotation))
        .multiply(&Mat4::scaling(scale_x, scale_y));

    table.push(NodeValue::with_source(ValueData::Matrix(matrix), node.id()));
}

/// Toggling uniform scale hides or reveals the dependent Y axis input.
pub(super) fn transform_input_changed(node: &mut Node, input: &str) {
    if input != UNIFORM_SCALE_INPUT {
        return;
    }
    let uniform = matches!(
        node.input(UNIFORM_SCALE_INPUT)
            .and_then(|i| i.element(0))
            .map(|e| &e.standard),
        Some(ValueData::Boolean(true))
    );
    if let Some(scale_y) = node.input_mut(SCALE_Y_INPUT) {
        scale_y.flags.set(InputFlags::HIDDEN, uniform);
    }
}
