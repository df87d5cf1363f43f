//! Single-tick scheduling: reconcile dirty state, pick the node to advance, step it.
//!
//! These functions are what the scene worker runs each time it wakes. They are
//! public so a caller that owns a [`Graph`] outright can drive evaluation without
//! a background thread.
use indexmap::IndexSet;
use tracing::{debug, warn};

use super::events::{EventSink, SceneEvent};
use super::SceneSettings;
use crate::graph::{Graph, Node, NodeId, State, TraversalFlags};

/// Outcome of one scheduler tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to advance: no view node, the view node is settled, or every
    /// remaining candidate is blocked by an error.
    Idle,
    /// `node` was stepped and is now in `state`.
    Stepped { node: NodeId, state: State },
}

impl Tick {
    pub fn is_idle(self) -> bool {
        matches!(self, Tick::Idle)
    }
}

/// Resets every dirty node and everything downstream of it. Returns the number
/// of distinct nodes reset.
pub fn reconcile(graph: &mut Graph, sink: &mut dyn EventSink) -> usize {
    let dirty: Vec<NodeId> = graph.iter().filter(|n| n.is_dirty()).map(Node::id).collect();
    if dirty.is_empty() {
        return 0;
    }

    let mut affected = IndexSet::new();
    for id in dirty {
        affected.extend(graph.downstream(id, TraversalFlags::NONE));
    }

    for &id in &affected {
        let Some(node) = graph.node_mut(id) else {
            continue;
        };
        let from = node.state();
        node.reset();
        if from != State::Unprocessed {
            sink.send(SceneEvent::NodeStateChanged {
                node: id,
                from,
                to: State::Unprocessed,
            });
        }
    }
    debug!("Reconciled {} node(s).", affected.len());
    sink.send(SceneEvent::Reconciled {
        reset: affected.len(),
    });
    affected.len()
}

/// `true` if every connected source of `node` is processed. An optional input
/// whose source can never run counts as unconnected.
fn is_ready(graph: &Graph, node: &Node) -> bool {
    if node.state() == State::Error {
        return false;
    }
    node.inputs().iter().all(|input| {
        let Some(peer) = input.connections().first() else {
            return true;
        };
        match graph.node(peer.node) {
            None => true,
            Some(source) if source.state() == State::Processed => true,
            Some(source) => !input.is_required() && !can_progress(graph, source),
        }
    })
}

/// `true` if some unprocessed node upstream of `node`, itself included, is
/// ready to step. A node stuck behind an error has no such candidate.
fn can_progress(graph: &Graph, node: &Node) -> bool {
    match node.state() {
        State::Processed => true,
        State::Error => false,
        _ => graph
            .upstream(node.id(), TraversalFlags::SKIP_PROCESSED)
            .any(|id| graph.node(id).is_some_and(|n| is_ready(graph, n))),
    }
}

/// The node the scheduler should step next to make progress on `view`.
///
/// Candidates are visited in upstream depth-first order from the view node,
/// skipping processed subgraphs: inputs in declaration order, then connections
/// in the order they were made. The first candidate whose sources are all
/// processed wins.
pub fn current_node(graph: &Graph, view: Option<NodeId>) -> Option<NodeId> {
    let view = view?;
    if graph.node(view)?.state().is_settled() {
        return None;
    }
    graph
        .upstream(view, TraversalFlags::SKIP_PROCESSED)
        .find(|id| graph.node(*id).is_some_and(|n| is_ready(graph, n)))
}

/// Steps the current node once, without reconciling first.
pub fn advance(
    graph: &mut Graph,
    view: Option<NodeId>,
    scene: &SceneSettings,
    sink: &mut dyn EventSink,
) -> Tick {
    let Some(id) = current_node(graph, view) else {
        return Tick::Idle;
    };
    let from = graph.node(id).map_or(State::Unprocessed, Node::state);
    if let Err(e) = graph.process_step(id, scene) {
        warn!("Scheduler lost node {}: {}.", id, e);
        return Tick::Idle;
    }
    let Some(node) = graph.node(id) else {
        return Tick::Idle;
    };
    let to = node.state();
    if from != to {
        sink.send(SceneEvent::NodeStateChanged { node: id, from, to });
    }
    if to == State::Error {
        sink.send(SceneEvent::NodeFailed {
            node: id,
            message: node.error().unwrap_or_default().to_owned(),
        });
    }
    Tick::Stepped { node: id, state: to }
}

/// One full tick: [`reconcile`] followed by [`advance`].
pub fn tick(
    graph: &mut Graph,
    view: Option<NodeId>,
    scene: &SceneSettings,
    sink: &mut dyn EventSink,
) -> Tick {
    reconcile(graph, sink);
    advance(graph, view, scene, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ConnectorId;
    use crate::scene::events::VecSink;

    fn scene() -> SceneSettings {
        SceneSettings::default().with_size(4, 4)
    }

    fn chain(types: &[&str]) -> (Graph, Vec<NodeId>) {
        let mut g = Graph::with_builtins();
        let ids: Vec<NodeId> = types.iter().map(|t| g.create_node(t)).collect();
        for pair in ids.windows(2) {
            assert!(g.connect(ConnectorId::output(pair[0], 0), ConnectorId::input(pair[1], 0)));
        }
        (g, ids)
    }

    fn settle(g: &mut Graph, view: NodeId) -> Vec<NodeId> {
        let mut stepped = Vec::new();
        while let Tick::Stepped { node, .. } = tick(g, Some(view), &scene(), &mut ()) {
            stepped.push(node);
            assert!(stepped.len() < 100, "scheduler did not settle");
        }
        stepped
    }

    #[test]
    fn upstream_nodes_are_stepped_first() {
        let (mut g, ids) = chain(&["solid", "blur", "invert"]);
        g.update_setting(ids[1], "passes", 2u32).unwrap();
        let stepped = settle(&mut g, ids[2]);
        assert_eq!(stepped, vec![ids[0], ids[1], ids[1], ids[2]]);
        assert!(g.iter().all(|n| n.state() == State::Processed));
    }

    #[test]
    fn dirty_propagates_downstream_only() {
        let (mut g, ids) = chain(&["solid", "invert", "invert"]);
        settle(&mut g, ids[2]);
        g.mark_dirty(ids[1]);

        let mut sink = VecSink::new();
        assert_eq!(reconcile(&mut g, &mut sink), 2);
        assert_eq!(g.node(ids[0]).unwrap().state(), State::Processed);
        assert_eq!(g.node(ids[1]).unwrap().state(), State::Unprocessed);
        assert_eq!(g.node(ids[2]).unwrap().state(), State::Unprocessed);
        assert!(!g.has_dirty());
        assert_eq!(sink.as_slice().last(), Some(&SceneEvent::Reconciled { reset: 2 }));
    }

    #[test]
    fn errors_block_consumers_and_idle_the_scheduler() {
        let (mut g, ids) = chain(&["invert", "invert"]);
        let mut sink = VecSink::new();
        let first = tick(&mut g, Some(ids[1]), &scene(), &mut sink);
        assert_eq!(
            first,
            Tick::Stepped {
                node: ids[0],
                state: State::Error
            }
        );
        assert!(sink
            .as_slice()
            .iter()
            .any(|e| matches!(e, SceneEvent::NodeFailed { node, .. } if *node == ids[0])));
        assert!(tick(&mut g, Some(ids[1]), &scene(), &mut sink).is_idle());
        assert_eq!(g.node(ids[1]).unwrap().state(), State::Unprocessed);
    }

    #[test]
    fn failed_optional_sources_are_treated_as_unconnected() {
        let mut g = Graph::with_builtins();
        let base = g.create_node("solid");
        let broken = g.create_node("invert");
        let blend = g.create_node("blend");
        assert!(g.connect(ConnectorId::output(base, 0), ConnectorId::input(blend, 0)));
        assert!(g.connect(ConnectorId::output(broken, 0), ConnectorId::input(blend, 1)));

        settle(&mut g, blend);
        assert_eq!(g.node(broken).unwrap().state(), State::Error);
        assert_eq!(g.node(blend).unwrap().state(), State::Processed);
    }

    #[test]
    fn optional_sources_blocked_behind_an_error_are_treated_as_unconnected() {
        let mut g = Graph::with_builtins();
        let base = g.create_node("solid");
        let broken = g.create_node("invert");
        let stuck = g.create_node("invert");
        let blend = g.create_node("blend");
        assert!(g.connect(ConnectorId::output(base, 0), ConnectorId::input(blend, 0)));
        assert!(g.connect(ConnectorId::output(broken, 0), ConnectorId::input(stuck, 0)));
        assert!(g.connect(ConnectorId::output(stuck, 0), ConnectorId::input(blend, 1)));

        let stepped = settle(&mut g, blend);
        assert_eq!(stepped, vec![base, broken, blend]);
        assert_eq!(g.node(broken).unwrap().state(), State::Error);
        assert_eq!(g.node(stuck).unwrap().state(), State::Unprocessed);
        assert_eq!(g.node(blend).unwrap().state(), State::Processed);
    }

    #[test]
    fn optional_sources_that_can_still_run_are_waited_for() {
        let mut g = Graph::with_builtins();
        let base = g.create_node("solid");
        let overlay = g.create_node("solid");
        let blend = g.create_node("blend");
        assert!(g.connect(ConnectorId::output(base, 0), ConnectorId::input(blend, 0)));
        assert!(g.connect(ConnectorId::output(overlay, 0), ConnectorId::input(blend, 1)));

        let stepped = settle(&mut g, blend);
        assert_eq!(stepped, vec![base, overlay, blend]);
    }

    #[test]
    fn no_view_or_settled_view_is_idle() {
        let (mut g, ids) = chain(&["solid"]);
        assert_eq!(current_node(&g, None), None);
        assert!(tick(&mut g, None, &scene(), &mut ()).is_idle());
        settle(&mut g, ids[0]);
        assert_eq!(current_node(&g, Some(ids[0])), None);
    }
}
