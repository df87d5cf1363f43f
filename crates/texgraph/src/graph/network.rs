//! The owning node collection and its connection bookkeeping.
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use tracing::{debug, warn};

use super::connector::{ConnectorId, Direction};
use super::element::GraphElement;
use super::node::{Node, State};
use super::traversal::{DepthIterator, TraversalFlags};
use super::NodeId;
use crate::error::{Error, Result};
use crate::operator::OperatorRegistry;
use crate::persist::{read_version, write_version, ArchiveReader, ArchiveWriter};
use crate::render_set::{RenderSet, DEFAULT_LAYER};
use crate::scene::SceneSettings;
use crate::settings::SettingValue;

/// Insertion-ordered arena of nodes addressed by [`NodeId`].
pub struct Graph {
    nodes: Vec<Node>,
    next_id: u64,
    registry: Arc<OperatorRegistry>,
}

impl Graph {
    pub fn new(registry: Arc<OperatorRegistry>) -> Self {
        Self {
            nodes: Vec::new(),
            next_id: 1,
            registry,
        }
    }

    /// Empty graph over the built-in operators.
    pub fn with_builtins() -> Self {
        Self::new(Arc::new(OperatorRegistry::with_builtins()))
    }

    pub fn registry(&self) -> &Arc<OperatorRegistry> {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order. Reverse it for front-to-back hit testing.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Node> + ExactSizeIterator {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.nodes.iter().map(Node::id)
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_of(id).is_some()
    }

    /// Creates a node of the registered type `type_name`. Unknown names produce a
    /// null node that fails whenever it is processed.
    pub fn create_node(&mut self, type_name: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.insert_node(id, type_name);
        id
    }

    fn insert_node(&mut self, id: NodeId, type_name: &str) {
        let operator = self.registry.create(type_name);
        if operator.is_none() {
            warn!("Unknown operator type '{}'; creating a null node.", type_name);
        }
        self.next_id = self.next_id.max(id.0 + 1);
        self.nodes.push(Node::new(id, type_name, operator));
        debug!("Created {} node {}.", type_name, id);
    }

    /// Disconnects and removes a node.
    pub fn delete_node(&mut self, id: NodeId) -> Result<Node> {
        if !self.contains(id) {
            return Err(Error::UnknownNode { id });
        }
        self.disconnect_all(id);
        let index = self.index_of(id).ok_or(Error::UnknownNode { id })?;
        debug!("Deleted node {}.", id);
        Ok(self.nodes.remove(index))
    }

    /// Links an output to an input, in either argument order. Returns `false` and
    /// leaves the graph unchanged if the link is not allowed.
    pub fn connect(&mut self, a: ConnectorId, b: ConnectorId) -> bool {
        match self.try_connect(a, b) {
            Ok(()) => true,
            Err(e) => {
                debug!("Connection {} <-> {} rejected: {}.", a, b, e);
                false
            }
        }
    }

    /// [`Graph::connect`] with the reason for a rejection.
    pub fn try_connect(&mut self, a: ConnectorId, b: ConnectorId) -> Result<()> {
        if a.direction == b.direction {
            return Err(Error::InvalidConnection(format!(
                "{a} and {b} have the same direction"
            )));
        }
        let (output, input) = match a.direction {
            Direction::Output => (a, b),
            Direction::Input => (b, a),
        };
        if output.node == input.node {
            return Err(Error::InvalidConnection(format!(
                "{output} and {input} belong to the same node"
            )));
        }
        for id in [output, input] {
            let connector = self
                .node(id.node)
                .ok_or(Error::UnknownNode { id: id.node })?
                .connector(id)
                .ok_or_else(|| Error::InvalidConnection(format!("no connector {id}")))?;
            if connector.is_full() {
                return Err(Error::InvalidConnection(format!("{id} is full")));
            }
        }
        if self
            .downstream(input.node, TraversalFlags::NONE)
            .any(|n| n == output.node)
        {
            return Err(Error::InvalidConnection(format!(
                "{output} -> {input} would create a cycle"
            )));
        }

        self.attach(output, input);
        self.attach(input, output);
        self.mark_dirty(input.node);
        debug!("Connected {} -> {}.", output, input);
        Ok(())
    }

    fn attach(&mut self, at: ConnectorId, peer: ConnectorId) {
        if let Some(c) = self.node_mut(at.node).and_then(|n| n.connector_mut(at)) {
            c.attach(peer);
        }
    }

    fn detach(&mut self, at: ConnectorId, peer: ConnectorId) -> bool {
        self.node_mut(at.node)
            .and_then(|n| n.connector_mut(at))
            .is_some_and(|c| c.detach(peer))
    }

    /// Removes one link between `a` and `b`. Marks the input side dirty.
    pub fn disconnect(&mut self, a: ConnectorId, b: ConnectorId) -> bool {
        if a.direction == b.direction {
            return false;
        }
        let removed_a = self.detach(a, b);
        let removed_b = self.detach(b, a);
        if !(removed_a || removed_b) {
            return false;
        }
        let input = if a.direction == Direction::Input { a } else { b };
        self.mark_dirty(input.node);
        debug!("Disconnected {} <-> {}.", a, b);
        true
    }

    /// Removes every link of one connector. Returns the number removed.
    pub fn disconnect_connector(&mut self, id: ConnectorId) -> usize {
        let peers: Vec<ConnectorId> = self
            .node(id.node)
            .and_then(|n| n.connector(id))
            .map(|c| c.connections().to_vec())
            .unwrap_or_default();
        peers
            .into_iter()
            .rev()
            .filter(|peer| self.disconnect(id, *peer))
            .count()
    }

    /// Removes every link of every connector on `node`. Returns the number removed.
    pub fn disconnect_all(&mut self, node: NodeId) -> usize {
        let Some(n) = self.node(node) else {
            return 0;
        };
        let ids: Vec<ConnectorId> = n
            .inputs()
            .iter()
            .chain(n.outputs())
            .map(|c| c.id())
            .collect();
        ids.into_iter().map(|id| self.disconnect_connector(id)).sum()
    }

    /// Every link as an `(output, input)` pair, ordered by output node, connector
    /// and connection.
    pub fn connections(&self) -> Vec<(ConnectorId, ConnectorId)> {
        self.nodes
            .iter()
            .flat_map(|n| n.outputs())
            .flat_map(|c| c.connections().iter().map(move |peer| (c.id(), *peer)))
            .collect()
    }

    /// Nodes created from the operator type `type_name`.
    pub fn find_by_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.type_name() == type_name)
    }

    /// Topmost node whose bounds contain `p`. Later nodes are drawn on top.
    pub fn node_at(&self, p: Vec2) -> Option<NodeId> {
        self.nodes.iter().rev().find(|n| n.hit_test(p)).map(Node::id)
    }

    /// Sets a node's setting and marks it dirty.
    pub fn update_setting(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<SettingValue>,
    ) -> Result<()> {
        self.node_mut(id)
            .ok_or(Error::UnknownNode { id })?
            .update_setting(name, value)
    }

    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.mark_dirty();
        }
    }

    pub(crate) fn mark_all_dirty(&mut self) {
        for node in &mut self.nodes {
            node.mark_dirty();
        }
    }

    /// `true` if any node carries its dirty flag.
    pub fn has_dirty(&self) -> bool {
        self.nodes.iter().any(Node::is_dirty)
    }

    pub fn upstream(&self, id: NodeId, flags: TraversalFlags) -> DepthIterator<'_> {
        DepthIterator::new(self, id, Direction::Input, flags)
    }

    pub fn downstream(&self, id: NodeId, flags: TraversalFlags) -> DepthIterator<'_> {
        DepthIterator::new(self, id, Direction::Output, flags)
    }

    /// Collects the render sets feeding each input of `id`, by input index.
    ///
    /// Unconnected optional inputs, and optional inputs whose source is not yet
    /// processed, yield `None`. A required input that is unconnected or whose
    /// source is not processed is an error. When the link leaves a secondary
    /// output, that output's layer is presented under [`DEFAULT_LAYER`].
    pub fn evaluate_inputs(&self, id: NodeId) -> Result<Vec<Option<RenderSet>>> {
        let node = self.node(id).ok_or(Error::UnknownNode { id })?;
        let mut inputs = Vec::with_capacity(node.inputs().len());
        for input in node.inputs() {
            let Some(peer) = input.connections().first() else {
                if input.is_required() {
                    return Err(Error::MissingInput {
                        input: input.name().to_owned(),
                    });
                }
                inputs.push(None);
                continue;
            };
            let source = self
                .node(peer.node)
                .ok_or(Error::UnknownNode { id: peer.node })?;
            if source.state() != State::Processed {
                if input.is_required() {
                    return Err(Error::UpstreamNotReady {
                        input: input.name().to_owned(),
                        source_node: source.id(),
                    });
                }
                inputs.push(None);
                continue;
            }

            let mut set = source.render_set().clone();
            if peer.index > 0 {
                let layer = source
                    .connector(*peer)
                    .map(|c| c.name().to_owned())
                    .unwrap_or_default();
                let handle = set.get(&layer).cloned().ok_or_else(|| Error::MissingLayer {
                    input: input.name().to_owned(),
                    layer: layer.clone(),
                })?;
                set.insert(DEFAULT_LAYER, handle);
            }
            inputs.push(Some(set));
        }
        Ok(inputs)
    }

    /// Runs one processing step of `id` against its current inputs. Returns `true`
    /// once the node is processed.
    pub fn process_step(&mut self, id: NodeId, scene: &SceneSettings) -> Result<bool> {
        let index = self.index_of(id).ok_or(Error::UnknownNode { id })?;
        let inputs = self.evaluate_inputs(id);
        Ok(self.nodes[index].process_step(inputs, scene))
    }

    /// Writes `version`, `nodes` and `connections` into the current object.
    pub fn serialize(&self, w: &mut dyn ArchiveWriter) -> Result<()> {
        write_version(w)?;
        w.start_object("nodes")?;
        for node in &self.nodes {
            w.start_object(&node.id().0.to_string())?;
            node.serialize(w)?;
            w.finish_object()?;
        }
        w.finish_object()?;

        w.start_object("connections")?;
        for (i, (output, input)) in self.connections().into_iter().enumerate() {
            w.start_object(&i.to_string())?;
            w.write_uint("from", output.node.0)?;
            w.write_uint("output", output.index as u64)?;
            w.write_uint("to", input.node.0)?;
            w.write_uint("input", input.index as u64)?;
            w.finish_object()?;
        }
        w.finish_object()
    }

    /// Replaces this graph's contents with a document written by
    /// [`Graph::serialize`]. On error the graph is left unchanged.
    pub fn deserialize(&mut self, r: &mut dyn ArchiveReader) -> Result<()> {
        let mut fresh = Graph::new(Arc::clone(&self.registry));
        fresh.read_from(r)?;
        // Ids handed out before the load stay retired.
        fresh.next_id = fresh.next_id.max(self.next_id);
        *self = fresh;
        Ok(())
    }

    fn read_from(&mut self, r: &mut dyn ArchiveReader) -> Result<()> {
        read_version(r)?;

        r.enter_object("nodes")?;
        let result = self.read_nodes(r);
        r.leave_object()?;
        result?;

        if r.contains("connections") {
            r.enter_object("connections")?;
            let result = self.read_connections(r);
            r.leave_object()?;
            result?;
        }
        Ok(())
    }

    fn read_nodes(&mut self, r: &mut dyn ArchiveReader) -> Result<()> {
        for (id, key) in numeric_keys(r)? {
            r.enter_object(&key)?;
            let result = self.read_node(r, NodeId(id));
            r.leave_object()?;
            result?;
        }
        Ok(())
    }

    fn read_node(&mut self, r: &mut dyn ArchiveReader, id: NodeId) -> Result<()> {
        if r.contains("id") && r.read_uint("id")? != id.0 {
            return Err(Error::Persistence(format!("node {id} has a mismatched id")));
        }
        let type_name = r.read_str("type")?;
        self.insert_node(id, &type_name);
        let node = self.node_mut(id).ok_or(Error::UnknownNode { id })?;
        node.deserialize(r)
    }

    fn read_connections(&mut self, r: &mut dyn ArchiveReader) -> Result<()> {
        for (_, key) in numeric_keys(r)? {
            r.enter_object(&key)?;
            let link = read_link(r);
            r.leave_object()?;
            let (output, input) = link?;
            self.try_connect(output, input)
                .map_err(|e| Error::Persistence(format!("connection {key}: {e}")))?;
        }
        Ok(())
    }
}

fn read_link(r: &dyn ArchiveReader) -> Result<(ConnectorId, ConnectorId)> {
    let output = ConnectorId::output(NodeId(r.read_uint("from")?), r.read_uint("output")? as usize);
    let input = ConnectorId::input(NodeId(r.read_uint("to")?), r.read_uint("input")? as usize);
    Ok((output, input))
}

/// Child keys parsed as integers, in ascending numeric order.
fn numeric_keys(r: &dyn ArchiveReader) -> Result<Vec<(u64, String)>> {
    let mut keys = r
        .keys()?
        .into_iter()
        .map(|k| {
            k.parse::<u64>()
                .map(|n| (n, k.clone()))
                .map_err(|_| Error::Persistence(format!("'{k}' is not a numeric key")))
        })
        .collect::<Result<Vec<_>>>()?;
    keys.sort_unstable_by_key(|(n, _)| *n);
    Ok(keys)
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> SceneSettings {
        SceneSettings::default().with_size(8, 8)
    }

    fn chain() -> (Graph, NodeId, NodeId) {
        let mut g = Graph::with_builtins();
        let a = g.create_node("solid");
        let b = g.create_node("invert");
        assert!(g.connect(ConnectorId::output(a, 0), ConnectorId::input(b, 0)));
        (g, a, b)
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut g = Graph::with_builtins();
        let a = g.create_node("solid");
        let b = g.create_node("noise");
        g.delete_node(b).expect("exists");
        let c = g.create_node("noise");
        assert!(a < b && b < c);
        assert!(matches!(g.delete_node(b), Err(Error::UnknownNode { .. })));
    }

    #[test]
    fn unknown_types_become_null_nodes() {
        let mut g = Graph::with_builtins();
        let n = g.create_node("no-such-operator");
        assert!(g.node(n).unwrap().is_null());
        assert!(!g.process_step(n, &scene()).unwrap());
        assert_eq!(g.node(n).unwrap().state(), State::Error);
    }

    #[test]
    fn connect_is_bidirectional_and_marks_input_dirty() {
        let (g, a, b) = chain();
        let out = ConnectorId::output(a, 0);
        let inp = ConnectorId::input(b, 0);
        assert_eq!(g.node(a).unwrap().outputs()[0].connections(), &[inp]);
        assert_eq!(g.node(b).unwrap().inputs()[0].connections(), &[out]);
        assert!(g.node(b).unwrap().is_dirty());
        assert!(!g.node(a).unwrap().is_dirty());
        assert_eq!(g.connections(), vec![(out, inp)]);
    }

    #[test]
    fn full_inputs_reject_a_second_connection() {
        let (mut g, _, b) = chain();
        let other = g.create_node("noise");
        let inp = ConnectorId::input(b, 0);
        assert!(!g.connect(ConnectorId::output(other, 0), inp));
        assert_eq!(g.node(b).unwrap().inputs()[0].connections().len(), 1);
        assert!(!g.node(other).unwrap().outputs()[0].is_connected());
    }

    #[test]
    fn invalid_pairs_are_rejected() {
        let (mut g, a, b) = chain();
        let c = g.create_node("invert");
        // same direction
        assert!(!g.connect(ConnectorId::output(a, 0), ConnectorId::output(c, 0)));
        // same node
        assert!(!g.connect(ConnectorId::output(c, 0), ConnectorId::input(c, 0)));
        // missing connector
        assert!(!g.connect(ConnectorId::output(a, 3), ConnectorId::input(c, 0)));
        // cycle b -> c -> b
        assert!(g.connect(ConnectorId::output(b, 0), ConnectorId::input(c, 0)));
        let blend = g.create_node("blend");
        assert!(g.connect(ConnectorId::output(c, 0), ConnectorId::input(blend, 0)));
        let err = g
            .try_connect(ConnectorId::output(blend, 0), ConnectorId::input(b, 0))
            .expect_err("b already has an input");
        assert!(matches!(err, Error::InvalidConnection(_)));
        g.disconnect_connector(ConnectorId::input(b, 0));
        let err = g
            .try_connect(ConnectorId::output(blend, 0), ConnectorId::input(b, 0))
            .expect_err("cycle");
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn connect_accepts_either_argument_order() {
        let mut g = Graph::with_builtins();
        let a = g.create_node("solid");
        let b = g.create_node("invert");
        assert!(g.connect(ConnectorId::input(b, 0), ConnectorId::output(a, 0)));
        assert_eq!(
            g.connections(),
            vec![(ConnectorId::output(a, 0), ConnectorId::input(b, 0))]
        );
    }

    #[test]
    fn delete_disconnects_peers_and_dirties_consumers() {
        let (mut g, a, b) = chain();
        g.node_mut(b).unwrap().reset();
        let removed = g.delete_node(a).expect("exists");
        assert_eq!(removed.id(), a);
        let b_node = g.node(b).unwrap();
        assert!(!b_node.inputs()[0].is_connected());
        assert!(b_node.is_dirty());
        assert!(g.connections().is_empty());
    }

    #[test]
    fn fan_out_disconnects_every_peer_and_dirties_every_consumer() {
        let mut g = Graph::with_builtins();
        let a = g.create_node("solid");
        let consumers: Vec<NodeId> = (0..3).map(|_| g.create_node("invert")).collect();
        for &c in &consumers {
            assert!(g.connect(ConnectorId::output(a, 0), ConnectorId::input(c, 0)));
        }
        assert_eq!(g.node(a).unwrap().outputs()[0].connections().len(), 3);
        for &c in &consumers {
            g.node_mut(c).unwrap().reset();
        }

        assert_eq!(g.disconnect_connector(ConnectorId::output(a, 0)), 3);
        assert!(!g.node(a).unwrap().outputs()[0].is_connected());
        for &c in &consumers {
            let node = g.node(c).unwrap();
            assert!(!node.inputs()[0].is_connected());
            assert!(node.is_dirty());
        }
        assert!(g.connections().is_empty());

        for &c in &consumers {
            assert!(g.connect(ConnectorId::output(a, 0), ConnectorId::input(c, 0)));
            g.node_mut(c).unwrap().reset();
        }
        assert_eq!(g.disconnect_all(a), 3);
        assert!(consumers.iter().all(|c| g.node(*c).unwrap().is_dirty()));
        assert!(g.connections().is_empty());
    }

    #[test]
    fn disconnect_marks_input_side_and_leaves_source_alone() {
        let (mut g, a, b) = chain();
        let s = scene();
        assert!(g.process_step(a, &s).unwrap());
        assert!(g.process_step(b, &s).unwrap());
        g.node_mut(b).unwrap().reset();

        assert!(g.disconnect(ConnectorId::output(a, 0), ConnectorId::input(b, 0)));
        assert!(g.node(b).unwrap().is_dirty());
        assert_eq!(g.node(a).unwrap().state(), State::Processed);
        assert!(!g.node(a).unwrap().is_dirty());
        assert!(!g.disconnect(ConnectorId::output(a, 0), ConnectorId::input(b, 0)));
    }

    #[test]
    fn evaluate_inputs_reports_missing_and_unready_sources() {
        let (mut g, a, b) = chain();
        let err = g.evaluate_inputs(b).expect_err("source unprocessed");
        assert!(matches!(err, Error::UpstreamNotReady { source_node, .. } if source_node == a));

        assert!(g.process_step(a, &scene()).unwrap());
        let inputs = g.evaluate_inputs(b).expect("ready");
        assert!(inputs[0].as_ref().unwrap().contains(DEFAULT_LAYER));

        let lone = g.create_node("invert");
        let err = g.evaluate_inputs(lone).expect_err("unconnected");
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn optional_unconnected_inputs_yield_none() {
        let mut g = Graph::with_builtins();
        let base = g.create_node("solid");
        let blend = g.create_node("blend");
        assert!(g.connect(ConnectorId::output(base, 0), ConnectorId::input(blend, 0)));
        assert!(g.process_step(base, &scene()).unwrap());

        let inputs = g.evaluate_inputs(blend).expect("overlay is optional");
        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].is_some());
        assert!(inputs[1].is_none());
        assert!(g.process_step(blend, &scene()).unwrap());
    }

    #[test]
    fn render_set_aliases_upstream_layers() {
        let (mut g, a, b) = chain();
        assert!(g.process_step(a, &scene()).unwrap());
        assert!(g.process_step(b, &scene()).unwrap());
        let upstream = g.node(a).unwrap().image().unwrap().clone();
        let own = g.node(b).unwrap().image().unwrap().clone();
        assert!(!own.ptr_eq(&upstream));
        assert_eq!(own.size(), upstream.size());
    }

    #[test]
    fn hit_testing_prefers_the_topmost_node() {
        let mut g = Graph::with_builtins();
        let a = g.create_node("solid");
        let b = g.create_node("solid");
        g.node_mut(b).unwrap().set_position(Vec2::new(10.0, 10.0));
        assert_eq!(g.node_at(Vec2::new(15.0, 15.0)), Some(b));
        assert_eq!(g.node_at(Vec2::new(5.0, 5.0)), Some(a));
        assert_eq!(g.node_at(Vec2::new(-5.0, -5.0)), None);
        assert_eq!(g.find_by_type("solid").count(), 2);
        assert_eq!(g.iter().rev().next().map(Node::id), Some(b));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn save_and_load_preserve_ids_settings_and_links() {
        use crate::persist::{JsonReader, JsonWriter};

        let (mut g, a, b) = chain();
        g.update_setting(a, "color", glam::Vec4::new(0.2, 0.4, 0.6, 1.0))
            .unwrap();
        g.node_mut(b).unwrap().set_position(Vec2::new(30.0, 40.0));

        let mut w = JsonWriter::new();
        g.serialize(&mut w).unwrap();
        let text = w.into_pretty_string().unwrap();

        let mut loaded = Graph::with_builtins();
        let stale = loaded.create_node("noise");
        loaded
            .deserialize(&mut JsonReader::parse(&text).unwrap())
            .expect("valid document");

        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(loaded.connections(), g.connections());
        assert_eq!(
            loaded.node(a).unwrap().settings().value::<glam::Vec4>("color"),
            Some(glam::Vec4::new(0.2, 0.4, 0.6, 1.0))
        );
        assert_eq!(loaded.node(b).unwrap().position(), Vec2::new(30.0, 40.0));
        let next = loaded.create_node("noise");
        assert!(next > b && next > stale);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn failed_load_leaves_graph_untouched() {
        use crate::persist::JsonReader;

        let (mut g, a, b) = chain();
        let doc = serde_json::json!({
            "version": 1,
            "nodes": {
                "1": { "type": "solid", "pos": [0.0, 0.0], "flags": 0, "settings": {} },
                "2": { "type": "invert", "pos": [0.0, 0.0], "flags": 0,
                       "settings": { "bogus": { "Float": 1.0 } } }
            },
            "connections": {}
        });
        assert!(g.deserialize(&mut JsonReader::new(doc)).is_err());
        assert_eq!(g.ids().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(g.connections().len(), 1);

        let future = serde_json::json!({ "version": 99, "nodes": {} });
        let err = g
            .deserialize(&mut JsonReader::new(future))
            .expect_err("newer format");
        assert!(matches!(err, Error::UnsupportedVersion { found: 99, .. }));
    }
}
