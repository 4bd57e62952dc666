//! The graph document: node ownership, connections, edits, invalidation.
//!
//! All mutation goes through methods here, and every mutation finishes its
//! invalidation walk before returning, so a traversal issued right after an
//! edit observes fully consistent dirty state. Traversal itself only needs
//! `&Graph`.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connection::Connection;
use super::keyframe::Keyframe;
use super::node::Node;
use super::param::{InputFlags, InputRef};
use super::value::ValueData;
use crate::cache::{InvalidateOptions, InvalidationObserver, PlaybackCacheState};
use crate::error::EngineError;
use crate::nodes;
use crate::time::{Rational, TimeRange, TimeRangeList};

/// The set of `(node, range)` pairs an invalidation walk marked stale.
pub type AffectedRanges = Vec<(Uuid, TimeRange)>;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Graph {
    nodes: HashMap<Uuid, Node>,
    connections: Vec<Connection>,
    /// Derived dirty-region state; rebuilt from scratch on load.
    #[serde(skip)]
    caches: HashMap<Uuid, PlaybackCacheState>,
}

impl Graph {
    /// Cap on invalidation-walk revisits of a single node. Distinct ranges
    /// beyond this collapse to [`TimeRange::ALL`] so the walk terminates even
    /// on a cyclic document.
    const MAX_NODE_VISITS: u32 = 32;

    pub fn new() -> Self {
        Self::default()
    }

    // ---- Node management -------------------------------------------------

    pub fn add_node(&mut self, node: Node) -> Uuid {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node along with every connection touching it. Downstream
    /// consumers are invalidated over all of time first.
    pub fn remove_node(&mut self, id: Uuid) -> Result<AffectedRanges, EngineError> {
        if !self.nodes.contains_key(&id) {
            return Err(EngineError::NodeNotFound(id));
        }

        let consumers: Vec<InputRef> = self
            .connections
            .iter()
            .filter(|c| c.from == id)
            .map(|c| c.to.clone())
            .collect();

        let mut affected = AffectedRanges::new();
        for to in consumers {
            affected.extend(self.invalidate_cache(
                TimeRange::ALL,
                &to,
                &InvalidateOptions::new(),
            ));
        }

        self.connections
            .retain(|c| c.from != id && c.to.node != id);
        self.nodes.remove(&id);
        self.caches.remove(&id);
        Ok(affected)
    }

    pub fn node(&self, id: Uuid) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: Uuid) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---- Connections -----------------------------------------------------

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The connection feeding an input element, if any.
    pub fn connection_for(&self, input: &InputRef) -> Option<&Connection> {
        self.connections.iter().find(|c| c.to == *input)
    }

    /// All connections consuming a node's output (fan-out).
    pub fn connections_from(&self, node: Uuid) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from == node)
    }

    /// Validate and add a connection, invalidating the consumer.
    pub fn connect(&mut self, from: Uuid, to: InputRef) -> Result<AffectedRanges, EngineError> {
        let conn = Connection::new(from, to);
        self.validate_connection(&conn)?;
        Ok(self.add_connection(conn))
    }

    /// Add a connection without validation. Exists for deserialization of
    /// documents that already satisfy the graph invariants; everything else
    /// should use [`Graph::connect`].
    pub fn add_connection(&mut self, conn: Connection) -> AffectedRanges {
        let to = conn.to.clone();
        self.connections.push(conn);
        self.invalidate_cache(TimeRange::ALL, &to, &InvalidateOptions::new())
    }

    pub fn disconnect(&mut self, to: &InputRef) -> Result<AffectedRanges, EngineError> {
        let idx = self
            .connections
            .iter()
            .position(|c| c.to == *to)
            .ok_or_else(|| {
                EngineError::InvalidConnection(format!(
                    "input {}.{} has no connection",
                    to.node, to.input
                ))
            })?;
        self.connections.remove(idx);
        Ok(self.invalidate_cache(TimeRange::ALL, to, &InvalidateOptions::new()))
    }

    /// Checks: both nodes exist, the destination input exists, is
    /// connectable and in range, accepts at most one connection, no
    /// self-connection, and the edge closes no cycle.
    pub fn validate_connection(&self, conn: &Connection) -> Result<(), EngineError> {
        if !self.nodes.contains_key(&conn.from) {
            return Err(EngineError::NodeNotFound(conn.from));
        }
        let consumer = self
            .nodes
            .get(&conn.to.node)
            .ok_or(EngineError::NodeNotFound(conn.to.node))?;
        let input = consumer
            .input(&conn.to.input)
            .ok_or_else(|| EngineError::UnknownInput {
                node: conn.to.node,
                input: conn.to.input.clone(),
            })?;

        if !input.is_connectable() {
            return Err(EngineError::InvalidConnection(format!(
                "input '{}' is not connectable",
                conn.to.input
            )));
        }
        if conn.to.element >= input.element_count() {
            return Err(EngineError::InvalidConnection(format!(
                "element {} out of range for input '{}'",
                conn.to.element, conn.to.input
            )));
        }
        if conn.from == conn.to.node {
            return Err(EngineError::InvalidConnection(
                "cannot connect a node to itself".to_string(),
            ));
        }
        if self.connections.iter().any(|c| c.to == conn.to) {
            return Err(EngineError::InvalidConnection(format!(
                "input '{}' already has a connection",
                conn.to.input
            )));
        }
        if self.would_create_cycle(conn.from, conn.to.node) {
            return Err(EngineError::CycleDetected { node: conn.from });
        }
        Ok(())
    }

    /// True if `to_node` can already reach `from_node` downstream, in which
    /// case adding `from_node → to_node` closes a loop.
    fn would_create_cycle(&self, from_node: Uuid, to_node: Uuid) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([to_node]);
        while let Some(current) = queue.pop_front() {
            if current == from_node {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for conn in self.connections.iter().filter(|c| c.from == current) {
                queue.push_back(conn.to.node);
            }
        }
        false
    }

    // ---- Edits -----------------------------------------------------------

    /// Set an input element's standard value.
    ///
    /// No invalidation happens while the element is keyframing — the standard
    /// value is invisible until the keyframes are removed.
    pub fn set_standard_value(
        &mut self,
        at: &InputRef,
        value: ValueData,
    ) -> Result<AffectedRanges, EngineError> {
        let node = self
            .nodes
            .get_mut(&at.node)
            .ok_or(EngineError::NodeNotFound(at.node))?;
        let input = node.input_mut(&at.input).ok_or_else(|| EngineError::UnknownInput {
            node: at.node,
            input: at.input.clone(),
        })?;

        input.set_standard_value(at.element, value);
        let keyframing = input
            .element(at.element)
            .is_some_and(|e| e.is_keyframing());
        nodes::input_value_changed(node, &at.input, at.element);

        if keyframing {
            Ok(AffectedRanges::new())
        } else {
            Ok(self.invalidate_cache(TimeRange::ALL, at, &InvalidateOptions::new()))
        }
    }

    /// Insert (or replace) a keyframe, invalidating the span between the
    /// surrounding keys.
    pub fn insert_keyframe(
        &mut self,
        at: &InputRef,
        track: usize,
        key: Keyframe,
    ) -> Result<AffectedRanges, EngineError> {
        let time = key.time;
        let node = self
            .nodes
            .get_mut(&at.node)
            .ok_or(EngineError::NodeNotFound(at.node))?;
        let input = node.input_mut(&at.input).ok_or_else(|| EngineError::UnknownInput {
            node: at.node,
            input: at.input.clone(),
        })?;
        if !input.is_keyframable() {
            return Err(EngineError::NotKeyframable {
                node: at.node,
                input: at.input.clone(),
            });
        }

        input.insert_keyframe(at.element, track, key);
        let range = input
            .track(at.element, track)
            .map(|t| t.range_around(time))
            .unwrap_or(TimeRange::ALL);
        nodes::input_value_changed(node, &at.input, at.element);
        Ok(self.invalidate_cache(range, at, &InvalidateOptions::new()))
    }

    pub fn remove_keyframe(
        &mut self,
        at: &InputRef,
        track: usize,
        time: Rational,
    ) -> Result<AffectedRanges, EngineError> {
        let node = self
            .nodes
            .get_mut(&at.node)
            .ok_or(EngineError::NodeNotFound(at.node))?;
        let input = node.input_mut(&at.input).ok_or_else(|| EngineError::UnknownInput {
            node: at.node,
            input: at.input.clone(),
        })?;

        let range = input
            .track(at.element, track)
            .map(|t| t.range_around(time))
            .unwrap_or(TimeRange::ALL);
        input.remove_keyframe(at.element, track, time);
        nodes::input_value_changed(node, &at.input, at.element);
        Ok(self.invalidate_cache(range, at, &InvalidateOptions::new()))
    }

    /// Resize an array input.
    pub fn resize_array(
        &mut self,
        node_id: Uuid,
        input_name: &str,
        count: usize,
    ) -> Result<AffectedRanges, EngineError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(EngineError::NodeNotFound(node_id))?;
        let input = node.input_mut(input_name).ok_or_else(|| EngineError::UnknownInput {
            node: node_id,
            input: input_name.to_string(),
        })?;
        if !input.is_array() {
            return Err(EngineError::InvalidArgument(format!(
                "input '{input_name}' is not an array"
            )));
        }

        // Drop connections into elements that no longer exist.
        input.resize(count);
        self.connections
            .retain(|c| {
                !(c.to.node == node_id && c.to.input == input_name && c.to.element >= count)
            });

        let at = InputRef::new(node_id, input_name);
        Ok(self.invalidate_cache(TimeRange::ALL, &at, &InvalidateOptions::new()))
    }

    // ---- Invalidation ----------------------------------------------------

    /// Mark `range` stale at the mutated node and walk the complete
    /// downstream fan-out, translating the range through each consumer's
    /// output time adjustment. Returns every `(node, range)` pair touched.
    pub fn invalidate_cache(
        &mut self,
        range: TimeRange,
        from: &InputRef,
        options: &InvalidateOptions,
    ) -> AffectedRanges {
        self.invalidate_cache_with_observer(range, from, options, None)
    }

    /// As [`Graph::invalidate_cache`], additionally reporting each touched
    /// pair to an observer. The observer is convenience wiring for UIs; the
    /// returned set is the source of truth.
    pub fn invalidate_cache_with_observer(
        &mut self,
        range: TimeRange,
        from: &InputRef,
        _options: &InvalidateOptions,
        mut observer: Option<&mut InvalidationObserver<'_>>,
    ) -> AffectedRanges {
        // Inputs flagged as cosmetic stop propagation before it starts.
        if let Some(input) = self.nodes.get(&from.node).and_then(|n| n.input(&from.input)) {
            if input.flags.contains(InputFlags::IGNORE_INVALIDATIONS) {
                return AffectedRanges::new();
            }
        }

        debug!(
            "invalidate {:?}..{:?} from {}.{}",
            range.start(),
            range.end(),
            from.node,
            from.input
        );

        let mut affected = AffectedRanges::new();
        let mut visited: HashSet<(Uuid, TimeRange)> = HashSet::new();
        let mut coverage: HashMap<Uuid, TimeRangeList> = HashMap::new();
        let mut visits: HashMap<Uuid, u32> = HashMap::new();
        let mut queue: VecDeque<(Uuid, TimeRange)> = VecDeque::from([(from.node, range)]);

        while let Some((id, range)) = queue.pop_front() {
            if !visited.insert((id, range)) {
                continue;
            }
            let covered = coverage.entry(id).or_default();
            if !range.is_empty() && covered.contains(&range) {
                continue;
            }

            // A cyclic document with a time node in the loop translates the
            // range on every lap, so neither the exact-pair set nor the
            // coverage list ever repeats. Past the visit cap the range
            // collapses to all of time, which the coverage check then
            // swallows on the next lap. Over-invalidates, never hangs.
            let count = visits.entry(id).or_insert(0);
            *count += 1;
            let range = if *count > Self::MAX_NODE_VISITS {
                TimeRange::ALL
            } else {
                range
            };
            covered.insert(range);

            self.caches.entry(id).or_default().invalidate(range);
            if let Some(obs) = observer.as_deref_mut() {
                obs(id, &range);
            }
            affected.push((id, range));

            for conn in self.connections.iter().filter(|c| c.from == id) {
                let Some(consumer) = self.nodes.get(&conn.to.node) else {
                    continue;
                };
                let Some(input) = consumer.input(&conn.to.input) else {
                    continue;
                };
                if input.flags.contains(InputFlags::IGNORE_INVALIDATIONS) {
                    continue;
                }
                let translated = nodes::output_time_adjustment(
                    consumer,
                    &conn.to.input,
                    conn.to.element,
                    &range,
                );
                queue.push_back((conn.to.node, translated));
            }
        }

        affected
    }

    /// Dirty-region state of a node's output, if it has ever been invalidated.
    pub fn cache_state(&self, node: Uuid) -> Option<&PlaybackCacheState> {
        self.caches.get(&node)
    }

    /// External renderers report a completed render here.
    pub fn mark_rendered(&mut self, node: Uuid, range: &TimeRange) {
        if let Some(state) = self.caches.get_mut(&node) {
            state.validate(range);
        }
    }

    // ---- Persistence -----------------------------------------------------

    pub fn save(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a document, rejecting one whose connections form a cycle.
    pub fn load(json: &str) -> Result<Self, EngineError> {
        let graph: Self = serde_json::from_str(json)?;
        if let Some(node) = graph.find_cycle() {
            return Err(EngineError::CycleDetected { node });
        }
        Ok(graph)
    }

    /// Kahn's algorithm over the whole connection set; returns a node on a
    /// cycle if one exists.
    fn find_cycle(&self) -> Option<Uuid> {
        let mut indegree: HashMap<Uuid, usize> =
            self.nodes.keys().map(|&id| (id, 0)).collect();
        // Edges from a missing node can never be walked, so they do not
        // participate (a dangling upstream is a traversal error, not a cycle).
        for conn in &self.connections {
            if !self.nodes.contains_key(&conn.from) {
                continue;
            }
            if let Some(d) = indegree.get_mut(&conn.to.node) {
                *d += 1;
            }
        }

        let mut queue: VecDeque<Uuid> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut remaining = self.nodes.len();
        while let Some(id) = queue.pop_front() {
            remaining -= 1;
            for conn in self.connections.iter().filter(|c| c.from == id) {
                if let Some(d) = indegree.get_mut(&conn.to.node) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(conn.to.node);
                    }
                }
            }
        }

        if remaining == 0 {
            None
        } else {
            indegree
                .iter()
                .find(|(_, d)| **d > 0)
                .map(|(id, _)| *id)
        }
    }
}
