//! Lazy depth-first walks over a graph's connections.
use super::connector::Direction;
use super::network::Graph;
use super::node::State;
use super::NodeId;

/// Options controlling a [`DepthIterator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraversalFlags {
    /// Do not yield or expand nodes that are already processed.
    pub skip_processed: bool,
}

impl TraversalFlags {
    pub const NONE: TraversalFlags = TraversalFlags {
        skip_processed: false,
    };

    pub const SKIP_PROCESSED: TraversalFlags = TraversalFlags {
        skip_processed: true,
    };
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    node: NodeId,
    connector: usize,
    connection: usize,
}

/// Depth-first iterator starting at a node and following every connection on
/// one side of each node visited.
///
/// [`Direction::Input`] walks upstream (through inputs to their sources) and
/// [`Direction::Output`] walks downstream. The start node is yielded first,
/// then its peers in pre-order, connector by connector and connection by
/// connection. Nodes reachable through several paths are yielded once per
/// path; there is no visited set.
///
/// Two iterators compare equal when they point at the same current node. An
/// exhausted iterator equals [`DepthIterator::default`].
#[derive(Clone, Debug, Default)]
pub struct DepthIterator<'g> {
    graph: Option<&'g Graph>,
    direction: Option<Direction>,
    flags: TraversalFlags,
    current: Option<NodeId>,
    stack: Vec<Frame>,
}

impl<'g> DepthIterator<'g> {
    pub fn new(
        graph: &'g Graph,
        start: NodeId,
        direction: Direction,
        flags: TraversalFlags,
    ) -> Self {
        let mut iter = Self {
            graph: Some(graph),
            direction: Some(direction),
            flags,
            current: None,
            stack: Vec::new(),
        };
        if iter.admits(start) {
            iter.current = Some(start);
            iter.stack.push(Frame {
                node: start,
                connector: 0,
                connection: 0,
            });
        }
        iter
    }

    /// Node the iterator currently points at.
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    fn admits(&self, id: NodeId) -> bool {
        let Some(node) = self.graph.and_then(|g| g.node(id)) else {
            return false;
        };
        !(self.flags.skip_processed && node.state() == State::Processed)
    }

    fn advance(&mut self) {
        let (Some(graph), Some(direction)) = (self.graph, self.direction) else {
            self.current = None;
            return;
        };
        while let Some(frame) = self.stack.last_mut() {
            let Some(node) = graph.node(frame.node) else {
                self.stack.pop();
                continue;
            };
            let connectors = node.connectors(direction);
            let Some(connector) = connectors.get(frame.connector) else {
                self.stack.pop();
                continue;
            };
            let Some(peer) = connector.connections().get(frame.connection) else {
                frame.connector += 1;
                frame.connection = 0;
                continue;
            };
            frame.connection += 1;
            let next = peer.node;
            if self.admits(next) {
                self.stack.push(Frame {
                    node: next,
                    connector: 0,
                    connection: 0,
                });
                self.current = Some(next);
                return;
            }
        }
        self.current = None;
    }
}

impl Iterator for DepthIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.current?;
        self.advance();
        Some(current)
    }
}

impl PartialEq for DepthIterator<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::ConnectorId;
    use crate::operator::OperatorRegistry;
    use crate::scene::SceneSettings;

    fn graph() -> Graph {
        Graph::new(Arc::new(OperatorRegistry::with_builtins()))
    }

    fn link(g: &mut Graph, from: NodeId, to: NodeId, input: usize) {
        assert!(g.connect(ConnectorId::output(from, 0), ConnectorId::input(to, input)));
    }

    #[test]
    fn downstream_walk_is_preorder_and_revisits_shared_nodes() {
        // a -> b -> d, a -> c -> d (via blend base/overlay)
        let mut g = graph();
        let a = g.create_node("solid");
        let b = g.create_node("invert");
        let c = g.create_node("invert");
        let d = g.create_node("blend");
        link(&mut g, a, b, 0);
        link(&mut g, a, c, 0);
        link(&mut g, b, d, 0);
        link(&mut g, c, d, 1);

        let order: Vec<NodeId> = g.downstream(a, TraversalFlags::NONE).collect();
        assert_eq!(order, vec![a, b, d, c, d]);

        let up: Vec<NodeId> = g.upstream(d, TraversalFlags::NONE).collect();
        assert_eq!(up, vec![d, b, a, c, a]);
    }

    #[test]
    fn skip_processed_prunes_settled_subgraphs() {
        let mut g = graph();
        let a = g.create_node("solid");
        let b = g.create_node("invert");
        link(&mut g, a, b, 0);
        let scene = SceneSettings::default().with_size(4, 4);
        assert!(g.process_step(a, &scene).expect("node exists"));

        let up: Vec<NodeId> = g.upstream(b, TraversalFlags::SKIP_PROCESSED).collect();
        assert_eq!(up, vec![b]);
        assert_eq!(g.upstream(a, TraversalFlags::SKIP_PROCESSED).count(), 0);
    }

    #[test]
    fn exhausted_iterator_equals_end() {
        let mut g = graph();
        let a = g.create_node("solid");
        let mut it = g.downstream(a, TraversalFlags::NONE);
        assert_ne!(it, DepthIterator::default());
        assert_eq!(it.next(), Some(a));
        assert_eq!(it, DepthIterator::default());
        assert_eq!(it.next(), None);

        let missing = g.downstream(NodeId(999), TraversalFlags::NONE);
        assert_eq!(missing, DepthIterator::default());
    }
}
