//! Typed values passed between nodes, and the stack-like table they travel in.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::math::{Color, Mat4, Vec2, Vec3, Vec4};
use super::params::{AudioParams, VideoParams};
use crate::job::{SampleStream, Texture};
use crate::time::Rational;

/// The type tag of a value, used for table lookups and input declarations.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No declared type. Inputs declared `None` accept any value.
    None,
    Boolean,
    Integer,
    Float,
    Rational,
    Vec2,
    Vec3,
    Vec4,
    Color,
    Matrix,
    Text,
    Texture,
    Samples,
    VideoParams,
    AudioParams,
}

impl ValueKind {
    /// Whether values of this kind can be blended between two keyframes.
    /// Non-interpolatable kinds hold the earlier keyframe's value.
    pub fn can_interpolate(&self) -> bool {
        matches!(
            self,
            ValueKind::Float
                | ValueKind::Rational
                | ValueKind::Vec2
                | ValueKind::Vec3
                | ValueKind::Vec4
                | ValueKind::Color
        )
    }

    /// Whether this kind describes a pixel or sample buffer.
    pub fn is_buffer(&self) -> bool {
        matches!(self, ValueKind::Texture | ValueKind::Samples)
    }
}

/// The payload of a [`NodeValue`]: a closed sum over everything nodes can
/// exchange. Buffer kinds carry deferred jobs, never actual pixel/sample data.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub enum ValueData {
    #[default]
    None,
    Boolean(bool),
    Integer(i64),
    Float(OrderedFloat<f64>),
    Rational(Rational),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Color(Color),
    Matrix(Mat4),
    Text(String),
    Texture(Box<Texture>),
    Samples(Box<SampleStream>),
    VideoParams(VideoParams),
    AudioParams(AudioParams),
    /// Per-element values of an array input, resolved independently.
    Array(Vec<ValueData>),
}

impl ValueData {
    pub fn float(v: f64) -> Self {
        ValueData::Float(OrderedFloat(v))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ValueData::None => ValueKind::None,
            ValueData::Boolean(_) => ValueKind::Boolean,
            ValueData::Integer(_) => ValueKind::Integer,
            ValueData::Float(_) => ValueKind::Float,
            ValueData::Rational(_) => ValueKind::Rational,
            ValueData::Vec2(_) => ValueKind::Vec2,
            ValueData::Vec3(_) => ValueKind::Vec3,
            ValueData::Vec4(_) => ValueKind::Vec4,
            ValueData::Color(_) => ValueKind::Color,
            ValueData::Matrix(_) => ValueKind::Matrix,
            ValueData::Text(_) => ValueKind::Text,
            ValueData::Texture(_) => ValueKind::Texture,
            ValueData::Samples(_) => ValueKind::Samples,
            ValueData::VideoParams(_) => ValueKind::VideoParams,
            ValueData::AudioParams(_) => ValueKind::AudioParams,
            // An array has the kind of its elements for lookup purposes.
            ValueData::Array(items) => items
                .first()
                .map(ValueData::kind)
                .unwrap_or(ValueKind::None),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ValueData::None)
    }
}

/// A single value produced by evaluating a node.
///
/// Carries provenance (the id of the node that pushed it — a back-reference,
/// never ownership) and an optional tag for disambiguating multiple values of
/// the same kind. Immutable once constructed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NodeValue {
    data: ValueData,
    source: Option<Uuid>,
    tag: Option<String>,
}

impl NodeValue {
    pub fn new(data: ValueData) -> Self {
        Self {
            data,
            source: None,
            tag: None,
        }
    }

    pub fn with_source(data: ValueData, source: Uuid) -> Self {
        Self {
            data,
            source: Some(source),
            tag: None,
        }
    }

    pub fn tagged(data: ValueData, source: Uuid, tag: &str) -> Self {
        Self {
            data,
            source: Some(source),
            tag: Some(tag.to_string()),
        }
    }

    /// The "no value" sentinel.
    pub fn none() -> Self {
        Self::new(ValueData::None)
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    pub fn into_data(self) -> ValueData {
        self.data
    }

    pub fn kind(&self) -> ValueKind {
        self.data.kind()
    }

    pub fn source(&self) -> Option<Uuid> {
        self.source
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_none(&self) -> bool {
        self.data.is_none()
    }

    /// Extract as f64, returning `default` for non-numeric values.
    pub fn as_float(&self, default: f64) -> f64 {
        match &self.data {
            ValueData::Float(v) => v.into_inner(),
            ValueData::Integer(v) => *v as f64,
            ValueData::Rational(v) => v.to_f64(),
            _ => default,
        }
    }

    pub fn as_int(&self, default: i64) -> i64 {
        match &self.data {
            ValueData::Integer(v) => *v,
            ValueData::Float(v) => v.into_inner() as i64,
            _ => default,
        }
    }

    pub fn as_bool(&self, default: bool) -> bool {
        match &self.data {
            ValueData::Boolean(v) => *v,
            _ => default,
        }
    }

    pub fn as_rational(&self, default: Rational) -> Rational {
        match &self.data {
            ValueData::Rational(v) => *v,
            ValueData::Integer(v) => Rational::from_int(*v),
            ValueData::Float(v) => Rational::from_f64(v.into_inner()),
            _ => default,
        }
    }

    pub fn as_vec2(&self, default: Vec2) -> Vec2 {
        match &self.data {
            ValueData::Vec2(v) => *v,
            _ => default,
        }
    }

    pub fn as_color(&self, default: Color) -> Color {
        match &self.data {
            ValueData::Color(v) => *v,
            _ => default,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            ValueData::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Texture> {
        match &self.data {
            ValueData::Texture(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_samples(&self) -> Option<&SampleStream> {
        match &self.data {
            ValueData::Samples(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self, default: Mat4) -> Mat4 {
        match &self.data {
            ValueData::Matrix(v) => *v,
            _ => default,
        }
    }
}

/// Resolved input values for one node evaluation, keyed by input name.
pub type NodeValueRow = HashMap<String, NodeValue>;

/// An ordered sequence of values built by successive pushes.
///
/// Lookups scan from the most recently pushed entry backwards, so a node can
/// shadow an upstream value of the same kind simply by pushing its own, while
/// pass-through nodes contribute nothing and leave the upstream value visible.
/// Entries are never mutated after push.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct NodeValueTable {
    values: Vec<NodeValue>,
}

impl NodeValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: NodeValue) {
        self.values.push(value);
    }

    /// Most recently pushed value of `kind`, if any.
    pub fn get(&self, kind: ValueKind) -> Option<&NodeValue> {
        self.values.iter().rev().find(|v| v.kind() == kind)
    }

    /// Most recently pushed value of `kind` carrying `tag`.
    pub fn get_tagged(&self, kind: ValueKind, tag: &str) -> Option<&NodeValue> {
        self.values
            .iter()
            .rev()
            .find(|v| v.kind() == kind && v.tag() == Some(tag))
    }

    /// Most recently pushed value matching any of `kinds`.
    pub fn get_any(&self, kinds: &[ValueKind]) -> Option<&NodeValue> {
        self.values.iter().rev().find(|v| kinds.contains(&v.kind()))
    }

    /// Most recently pushed value of any kind.
    pub fn last(&self) -> Option<&NodeValue> {
        self.values.last()
    }

    pub fn has(&self, kind: ValueKind) -> bool {
        self.get(kind).is_some()
    }

    /// Positional access for consumers that enumerate all values.
    pub fn at(&self, index: usize) -> Option<&NodeValue> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeValue> {
        self.values.iter()
    }

    /// Concatenate tables in order; later tables shadow earlier ones.
    pub fn merge(tables: Vec<NodeValueTable>) -> NodeValueTable {
        let mut out = NodeValueTable::new();
        for table in tables {
            out.values.extend(table.values);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_discipline() {
        let mut table = NodeValueTable::new();
        table.push(NodeValue::new(ValueData::float(1.0)));
        table.push(NodeValue::new(ValueData::float(2.0)));
        assert_eq!(table.get(ValueKind::Float).unwrap().as_float(0.0), 2.0);

        // Pushing an unrelated kind must not change the float lookup.
        table.push(NodeValue::new(ValueData::Boolean(true)));
        assert_eq!(table.get(ValueKind::Float).unwrap().as_float(0.0), 2.0);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_get_tagged() {
        let source = Uuid::new_v4();
        let mut table = NodeValueTable::new();
        table.push(NodeValue::tagged(ValueData::float(1.0), source, "radius"));
        table.push(NodeValue::with_source(ValueData::float(2.0), source));
        assert_eq!(
            table
                .get_tagged(ValueKind::Float, "radius")
                .unwrap()
                .as_float(0.0),
            1.0
        );
        assert_eq!(table.get(ValueKind::Float).unwrap().as_float(0.0), 2.0);
    }

    #[test]
    fn test_missing_kind_is_absent() {
        let table = NodeValueTable::new();
        assert!(table.get(ValueKind::Texture).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_merge_order() {
        let mut a = NodeValueTable::new();
        a.push(NodeValue::new(ValueData::float(1.0)));
        let mut b = NodeValueTable::new();
        b.push(NodeValue::new(ValueData::float(2.0)));
        let merged = NodeValueTable::merge(vec![a, b]);
        assert_eq!(merged.get(ValueKind::Float).unwrap().as_float(0.0), 2.0);
    }
}
