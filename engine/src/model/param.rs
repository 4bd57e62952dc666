//! Node input declarations and their immediate (non-connected) state.

use std::collections::HashMap;
use std::ops::BitOr;

use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyframe::{Keyframe, KeyframeTrack};
use super::math::{Color, Vec2, Vec3, Vec4};
use super::value::{ValueData, ValueKind};
use crate::time::Rational;

/// Behavior flags for an input. By default inputs are keyframable,
/// connectable, and not arrays.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct InputFlags(u32);

impl InputFlags {
    pub const NORMAL: InputFlags = InputFlags(0);
    pub const ARRAY: InputFlags = InputFlags(1 << 0);
    pub const NOT_KEYFRAMABLE: InputFlags = InputFlags(1 << 1);
    pub const NOT_CONNECTABLE: InputFlags = InputFlags(1 << 2);
    pub const HIDDEN: InputFlags = InputFlags(1 << 3);
    /// Edits to this input never affect rendered output, so invalidation
    /// propagation stops here.
    pub const IGNORE_INVALIDATIONS: InputFlags = InputFlags(1 << 4);
    /// Neither keyframable nor connectable.
    pub const STATIC: InputFlags = InputFlags(1 << 1 | 1 << 2);

    pub fn contains(&self, other: InputFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: InputFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: InputFlags) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: InputFlags, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for InputFlags {
    type Output = InputFlags;

    fn bitor(self, rhs: InputFlags) -> InputFlags {
        InputFlags(self.0 | rhs.0)
    }
}

/// Number of keyframe tracks a value kind splits into: one per component.
pub fn keyframe_track_count(kind: ValueKind) -> usize {
    match kind {
        ValueKind::Vec2 => 2,
        ValueKind::Vec3 => 3,
        ValueKind::Vec4 | ValueKind::Color => 4,
        _ => 1,
    }
}

/// Split a value into its per-track components.
pub fn split_value(kind: ValueKind, value: &ValueData) -> Vec<ValueData> {
    match (kind, value) {
        (ValueKind::Vec2, ValueData::Vec2(v)) => {
            vec![ValueData::Float(v.x), ValueData::Float(v.y)]
        }
        (ValueKind::Vec3, ValueData::Vec3(v)) => {
            vec![
                ValueData::Float(v.x),
                ValueData::Float(v.y),
                ValueData::Float(v.z),
            ]
        }
        (ValueKind::Vec4, ValueData::Vec4(v)) => {
            vec![
                ValueData::Float(v.x),
                ValueData::Float(v.y),
                ValueData::Float(v.z),
                ValueData::Float(v.w),
            ]
        }
        (ValueKind::Color, ValueData::Color(c)) => {
            vec![
                ValueData::Float(c.r),
                ValueData::Float(c.g),
                ValueData::Float(c.b),
                ValueData::Float(c.a),
            ]
        }
        _ => vec![value.clone()],
    }
}

/// Reassemble a value from its per-track components.
pub fn combine_tracks(kind: ValueKind, tracks: &[ValueData]) -> ValueData {
    let comp = |i: usize| -> f64 {
        tracks
            .get(i)
            .map(|v| match v {
                ValueData::Float(f) => f.into_inner(),
                ValueData::Integer(n) => *n as f64,
                _ => 0.0,
            })
            .unwrap_or(0.0)
    };
    match kind {
        ValueKind::Vec2 => ValueData::Vec2(Vec2::new(comp(0), comp(1))),
        ValueKind::Vec3 => ValueData::Vec3(Vec3::new(comp(0), comp(1), comp(2))),
        ValueKind::Vec4 => ValueData::Vec4(Vec4::new(comp(0), comp(1), comp(2), comp(3))),
        ValueKind::Color => ValueData::Color(Color::new(comp(0), comp(1), comp(2), comp(3))),
        _ => tracks.first().cloned().unwrap_or(ValueData::None),
    }
}

/// The immediate state of one element of an input: a standard (static) value
/// plus one keyframe track per component.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct InputElement {
    pub standard: ValueData,
    pub tracks: Vec<KeyframeTrack>,
}

impl InputElement {
    fn new(kind: ValueKind, standard: ValueData) -> Self {
        Self {
            standard,
            tracks: vec![KeyframeTrack::new(); keyframe_track_count(kind)],
        }
    }

    pub fn is_keyframing(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_empty())
    }
}

/// A declared input of a node, including its immediate values.
///
/// The declaration (name, kind, flags) comes from the node-kind factory; the
/// immediate state is owned by the document and mutated through graph edits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NodeInput {
    pub name: String,
    pub kind: ValueKind,
    pub flags: InputFlags,
    pub default: ValueData,
    /// Opaque UI hints (min/max, display names, combo strings). The engine
    /// stores but never interprets them.
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    elements: Vec<InputElement>,
}

impl NodeInput {
    pub fn new(name: &str, kind: ValueKind, default: ValueData, flags: InputFlags) -> Self {
        Self {
            name: name.to_string(),
            kind,
            flags,
            elements: vec![InputElement::new(kind, default.clone())],
            default,
            properties: HashMap::new(),
        }
    }

    pub fn is_array(&self) -> bool {
        self.flags.contains(InputFlags::ARRAY)
    }

    pub fn is_keyframable(&self) -> bool {
        !self.flags.contains(InputFlags::NOT_KEYFRAMABLE)
    }

    pub fn is_connectable(&self) -> bool {
        !self.flags.contains(InputFlags::NOT_CONNECTABLE)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, index: usize) -> Option<&InputElement> {
        self.elements.get(index)
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut InputElement> {
        self.elements.get_mut(index)
    }

    /// Grow or shrink an array input. New elements start at the default.
    pub fn resize(&mut self, count: usize) {
        let kind = self.kind;
        let default = self.default.clone();
        self.elements
            .resize_with(count.max(1), || InputElement::new(kind, default.clone()));
    }

    /// Effective local value at `time` (precedence steps 2 and 3; connections
    /// are the traverser's concern). Non-keyframable inputs skip keyframes
    /// entirely even if keys are present.
    pub fn value_at(&self, element: usize, time: Rational) -> ValueData {
        let Some(elem) = self.elements.get(element) else {
            return ValueData::None;
        };
        if !elem.is_keyframing() {
            return elem.standard.clone();
        }
        if !self.is_keyframable() {
            // Ill-formed document; surface it instead of coercing silently.
            warn!(
                "input '{}' has keyframes but is not keyframable; using standard value",
                self.name
            );
            return elem.standard.clone();
        }

        let standard_components = split_value(self.kind, &elem.standard);
        let components: Vec<ValueData> = elem
            .tracks
            .iter()
            .enumerate()
            .map(|(i, track)| {
                track.value_at(time).unwrap_or_else(|| {
                    standard_components
                        .get(i)
                        .cloned()
                        .unwrap_or(ValueData::None)
                })
            })
            .collect();
        combine_tracks(self.kind, &components)
    }

    pub fn set_standard_value(&mut self, element: usize, value: ValueData) {
        if let Some(elem) = self.elements.get_mut(element) {
            elem.standard = value;
        }
    }

    pub fn insert_keyframe(&mut self, element: usize, track: usize, key: Keyframe) {
        if let Some(t) = self
            .elements
            .get_mut(element)
            .and_then(|e| e.tracks.get_mut(track))
        {
            t.insert(key);
        }
    }

    pub fn remove_keyframe(&mut self, element: usize, track: usize, time: Rational) {
        if let Some(t) = self
            .elements
            .get_mut(element)
            .and_then(|e| e.tracks.get_mut(track))
        {
            t.remove_at(time);
        }
    }

    pub fn track(&self, element: usize, track: usize) -> Option<&KeyframeTrack> {
        self.elements.get(element).and_then(|e| e.tracks.get(track))
    }
}

/// Addresses one element of one input on one node — the unit of
/// dependency-tracking and the target of a connection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputRef {
    pub node: Uuid,
    pub input: String,
    #[serde(default)]
    pub element: usize,
}

impl InputRef {
    pub fn new(node: Uuid, input: &str) -> Self {
        Self {
            node,
            input: input.to_string(),
            element: 0,
        }
    }

    pub fn element(node: Uuid, input: &str, element: usize) -> Self {
        Self {
            node,
            input: input.to_string(),
            element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut flags = InputFlags::NORMAL;
        assert!(!flags.contains(InputFlags::ARRAY));
        flags.insert(InputFlags::ARRAY);
        flags.insert(InputFlags::HIDDEN);
        assert!(flags.contains(InputFlags::ARRAY));
        assert!(flags.contains(InputFlags::HIDDEN));
        flags.remove(InputFlags::ARRAY);
        assert!(!flags.contains(InputFlags::ARRAY));

        assert!(InputFlags::STATIC.contains(InputFlags::NOT_KEYFRAMABLE));
        assert!(InputFlags::STATIC.contains(InputFlags::NOT_CONNECTABLE));
    }

    #[test]
    fn test_split_combine_color() {
        let color = ValueData::Color(Color::new(0.1, 0.2, 0.3, 1.0));
        let parts = split_value(ValueKind::Color, &color);
        assert_eq!(parts.len(), 4);
        assert_eq!(combine_tracks(ValueKind::Color, &parts), color);
    }

    #[test]
    fn test_standard_value_without_keys() {
        let input = NodeInput::new(
            "radius",
            ValueKind::Float,
            ValueData::float(4.0),
            InputFlags::NORMAL,
        );
        assert_eq!(input.value_at(0, Rational::ZERO), ValueData::float(4.0));
    }

    #[test]
    fn test_keyframes_take_precedence_over_standard() {
        let mut input = NodeInput::new(
            "radius",
            ValueKind::Float,
            ValueData::float(4.0),
            InputFlags::NORMAL,
        );
        input.insert_keyframe(
            0,
            0,
            Keyframe::new(Rational::from_int(0), ValueData::float(1.0)),
        );
        assert_eq!(input.value_at(0, Rational::ZERO), ValueData::float(1.0));
    }

    #[test]
    fn test_not_keyframable_skips_keys() {
        let mut input = NodeInput::new(
            "offset",
            ValueKind::Float,
            ValueData::float(4.0),
            InputFlags::NOT_KEYFRAMABLE,
        );
        input.insert_keyframe(
            0,
            0,
            Keyframe::new(Rational::from_int(0), ValueData::float(1.0)),
        );
        assert_eq!(input.value_at(0, Rational::ZERO), ValueData::float(4.0));
    }

    #[test]
    fn test_per_track_keyframing_merges_with_standard() {
        // Keyframe only the x track of a vec2; y comes from the standard value.
        let mut input = NodeInput::new(
            "position",
            ValueKind::Vec2,
            ValueData::Vec2(Vec2::new(10.0, 20.0)),
            InputFlags::NORMAL,
        );
        input.insert_keyframe(
            0,
            0,
            Keyframe::new(Rational::from_int(0), ValueData::float(5.0)),
        );
        assert_eq!(
            input.value_at(0, Rational::ZERO),
            ValueData::Vec2(Vec2::new(5.0, 20.0))
        );
    }

    #[test]
    fn test_array_resize() {
        let mut input = NodeInput::new(
            "values",
            ValueKind::Float,
            ValueData::float(0.0),
            InputFlags::ARRAY,
        );
        input.resize(3);
        assert_eq!(input.element_count(), 3);
        input.set_standard_value(2, ValueData::float(7.0));
        assert_eq!(input.value_at(2, Rational::ZERO), ValueData::float(7.0));
        input.resize(1);
        assert_eq!(input.element_count(), 1);
    }
}
