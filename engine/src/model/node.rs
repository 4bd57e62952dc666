//! Graph vertices and the node authoring surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::param::{InputFlags, NodeInput};
use super::value::{ValueData, ValueKind};
use crate::nodes::{self, NodeKind};
use crate::time::Rational;

/// A vertex in the effect/generator graph.
///
/// The behavior of a node is determined by its [`NodeKind`]; its inputs are
/// declared by the kind's factory at construction and carry the document's
/// immediate values and keyframes. Connections live on the graph, not here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    id: Uuid,
    kind: NodeKind,
    pub label: String,
    inputs: Vec<NodeInput>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self::with_id(Uuid::new_v4(), kind)
    }

    /// Used by deserialization layers that must preserve identifiers.
    pub fn with_id(id: Uuid, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            label: kind.name().to_string(),
            inputs: nodes::create_inputs(kind),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn inputs(&self) -> &[NodeInput] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&NodeInput> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut NodeInput> {
        self.inputs.iter_mut().find(|i| i.name == name)
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.input(name).is_some()
    }

    /// Declare an input. Factories call this; custom node kinds may extend
    /// their input set the same way.
    pub fn add_input(&mut self, name: &str, kind: ValueKind, default: ValueData, flags: InputFlags) {
        debug_assert!(!self.has_input(name), "duplicate input name: {name}");
        self.inputs.push(NodeInput::new(name, kind, default, flags));
    }

    /// Attach an opaque UI hint to an input (min/max, combo strings, …).
    /// Stored and serialized, never interpreted by the engine.
    pub fn set_input_property(&mut self, name: &str, key: &str, value: serde_json::Value) {
        if let Some(input) = self.input_mut(name) {
            input.properties.insert(key.to_string(), value);
        }
    }

    pub fn input_property(&self, name: &str, key: &str) -> Option<&serde_json::Value> {
        self.input(name).and_then(|i| i.properties.get(key))
    }

    /// Local (non-connected) value of an input element at a time, following
    /// the keyframes-then-standard precedence.
    pub fn value_at(&self, input: &str, element: usize, time: Rational) -> ValueData {
        self.input(input)
            .map(|i| i.value_at(element, time))
            .unwrap_or(ValueData::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_declares_inputs() {
        let node = Node::new(NodeKind::Flip);
        assert!(node.has_input(nodes::distort::TEXTURE_INPUT));
        assert!(node.has_input(nodes::distort::HORIZONTAL_INPUT));
        assert!(node.has_input(nodes::distort::VERTICAL_INPUT));
    }

    #[test]
    fn test_input_properties_are_opaque() {
        let mut node = Node::new(NodeKind::BoxBlur);
        node.set_input_property(nodes::filter::RADIUS_INPUT, "min", serde_json::json!(0.0));
        assert_eq!(
            node.input_property(nodes::filter::RADIUS_INPUT, "min"),
            Some(&serde_json::json!(0.0))
        );
    }
}
