//! Pull-based graph traversal.
//!
//! Evaluation starts at a node and recurses upstream through its connected
//! inputs, producing a [`NodeValueTable`] per node. Traversal is read-only
//! over the graph; all mutable state (memoization, the recursion stack) is
//! owned by the traverser and scoped to its lifetime.

use std::collections::HashMap;

use uuid::Uuid;

use super::cancel::CancelAtom;
use super::globals::NodeGlobals;
use crate::error::EngineError;
use crate::model::graph::Graph;
use crate::model::node::Node;
use crate::model::param::{InputRef, NodeInput};
use crate::model::params::{AudioParams, VideoParams};
use crate::model::value::{NodeValue, NodeValueRow, NodeValueTable, ValueData, ValueKind};
use crate::nodes;
use crate::time::TimeRange;

pub struct NodeTraverser<'a> {
    graph: &'a Graph,
    video_params: VideoParams,
    audio_params: AudioParams,
    cancel: Option<&'a CancelAtom>,
    /// Memoization for the duration of this traverser, keyed on the exact
    /// requested range. Diamond-shaped fan-in evaluates each branch point
    /// once.
    value_cache: HashMap<(Uuid, TimeRange), NodeValueTable>,
    /// Recursion stack for cycle detection.
    stack: Vec<(Uuid, TimeRange)>,
}

impl<'a> NodeTraverser<'a> {
    pub fn new(graph: &'a Graph, video_params: VideoParams, audio_params: AudioParams) -> Self {
        Self {
            graph,
            video_params,
            audio_params,
            cancel: None,
            value_cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelAtom) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|c| c.is_cancelled())
    }

    /// Number of distinct `(node, range)` evaluations memoized so far.
    pub fn cached_tables(&self) -> usize {
        self.value_cache.len()
    }

    /// Evaluate a node over a time range.
    ///
    /// A cancelled traversal returns an empty table without caching anything,
    /// so no partial result can ever be mistaken for a real one.
    pub fn generate_table(
        &mut self,
        node_id: Uuid,
        range: &TimeRange,
    ) -> Result<NodeValueTable, EngineError> {
        if self.is_cancelled() {
            return Ok(NodeValueTable::new());
        }

        let key = (node_id, *range);
        if let Some(cached) = self.value_cache.get(&key) {
            return Ok(cached.clone());
        }
        if self
            .stack
            .iter()
            .any(|(id, r)| *id == node_id && r.overlaps(range))
        {
            return Err(EngineError::CycleDetected { node: node_id });
        }

        let graph = self.graph;
        let node = graph
            .node(node_id)
            .ok_or(EngineError::NodeNotFound(node_id))?;

        self.stack.push(key);
        let result = self.evaluate(node, range);
        self.stack.pop();
        let table = result?;

        // A flag raised mid-evaluation means the table was built from empty
        // upstream results; discard it rather than surface a partial value.
        if self.is_cancelled() {
            return Ok(NodeValueTable::new());
        }
        self.value_cache.insert(key, table.clone());
        Ok(table)
    }

    /// Convenience lookup: the most recent value of `kind` a node produces
    /// over `range`.
    pub fn generate_value(
        &mut self,
        node_id: Uuid,
        range: &TimeRange,
        kind: ValueKind,
    ) -> Result<Option<NodeValue>, EngineError> {
        Ok(self.generate_table(node_id, range)?.get(kind).cloned())
    }

    fn evaluate(&mut self, node: &Node, range: &TimeRange) -> Result<NodeValueTable, EngineError> {
        let row = self.generate_row(node, range)?;
        let globals = NodeGlobals::new(*range, self.video_params, self.audio_params);
        let mut table = NodeValueTable::new();
        nodes::process(node, &row, &globals, &mut table);
        Ok(table)
    }

    /// Resolve every declared input of a node into a row.
    fn generate_row(&mut self, node: &Node, range: &TimeRange) -> Result<NodeValueRow, EngineError> {
        let mut row = NodeValueRow::new();
        for input in node.inputs() {
            let value = self.process_input(node, input, range)?;
            row.insert(input.name.clone(), value);
        }
        Ok(row)
    }

    /// Array inputs resolve each element independently and bundle them; plain
    /// inputs resolve their single element. The node's time adjustment is
    /// applied per element, so an adjustment that varies across elements
    /// shifts each branch separately.
    fn process_input(
        &mut self,
        node: &Node,
        input: &NodeInput,
        range: &TimeRange,
    ) -> Result<NodeValue, EngineError> {
        if input.is_array() {
            let mut items = Vec::with_capacity(input.element_count());
            for element in 0..input.element_count() {
                let adjusted = nodes::input_time_adjustment(node, &input.name, element, range);
                items.push(
                    self.resolve_element(node, input, element, &adjusted)?
                        .into_data(),
                );
            }
            Ok(NodeValue::new(ValueData::Array(items)))
        } else {
            let adjusted = nodes::input_time_adjustment(node, &input.name, 0, range);
            self.resolve_element(node, input, 0, &adjusted)
        }
    }

    /// Resolution precedence: connection first, then the input's local value
    /// (keyframes over the standard value).
    fn resolve_element(
        &mut self,
        node: &Node,
        input: &NodeInput,
        element: usize,
        range: &TimeRange,
    ) -> Result<NodeValue, EngineError> {
        let graph = self.graph;
        let target = InputRef::element(node.id(), &input.name, element);

        if let Some(conn) = graph.connection_for(&target) {
            if graph.node(conn.from).is_none() {
                return Err(EngineError::MissingUpstream {
                    node: node.id(),
                    input: input.name.clone(),
                });
            }
            let table = self.generate_table(conn.from, range)?;
            let value = match input.kind {
                // Untyped inputs accept whatever the upstream produced last.
                ValueKind::None => table.last().cloned(),
                kind => table.get(kind).cloned(),
            };
            return Ok(value.unwrap_or_else(NodeValue::none));
        }

        Ok(NodeValue::with_source(
            input.value_at(element, range.start()),
            node.id(),
        ))
    }
}
