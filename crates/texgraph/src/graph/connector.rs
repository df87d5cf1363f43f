//! Typed ports on a node and the connections between them.
//!
//! Connectors never point at their node directly. A [`ConnectorId`] names the
//! owning node by [`NodeId`], so graph mutation cannot leave a dangling
//! reference behind. Linking and unlinking goes through
//! [`crate::graph::Graph::connect`] and friends, which touch both ends.
use std::fmt;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::element::Bounds;
use super::NodeId;

/// Edge length of a connector's square hit area.
pub const CONNECTOR_SIZE: f32 = 12.0;

/// Port direction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// Stable address of a connector: owning node, direction and positional index.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorId {
    pub node: NodeId,
    pub direction: Direction,
    pub index: usize,
}

impl ConnectorId {
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: Direction::Input,
            index,
        }
    }

    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: Direction::Output,
            index,
        }
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Input => "in",
            Direction::Output => "out",
        };
        write!(f, "{}:{}{}", self.node, dir, self.index)
    }
}

/// A port on a node.
#[derive(Clone, Debug)]
pub struct Connector {
    id: ConnectorId,
    name: String,
    max_connections: Option<usize>,
    required: bool,
    connections: Vec<ConnectorId>,
}

impl Connector {
    /// Input port, capped at one connection.
    pub fn new_input(node: NodeId, index: usize, name: impl Into<String>, required: bool) -> Self {
        Self {
            id: ConnectorId::input(node, index),
            name: name.into(),
            max_connections: Some(1),
            required,
            connections: Vec::new(),
        }
    }

    /// Output port, uncapped.
    pub fn new_output(node: NodeId, index: usize, name: impl Into<String>) -> Self {
        Self {
            id: ConnectorId::output(node, index),
            name: name.into(),
            max_connections: None,
            required: false,
            connections: Vec::new(),
        }
    }

    /// Override the connection cap. `None` means unlimited.
    pub fn with_max_connections(mut self, max: Option<usize>) -> Self {
        self.max_connections = max;
        self
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.id.node
    }

    pub fn direction(&self) -> Direction {
        self.id.direction
    }

    pub fn index(&self) -> usize {
        self.id.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn max_connections(&self) -> Option<usize> {
        self.max_connections
    }

    /// Connected peers in connection order.
    pub fn connections(&self) -> &[ConnectorId] {
        &self.connections
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.max_connections
            .is_some_and(|max| self.connections.len() >= max)
    }

    pub(crate) fn attach(&mut self, peer: ConnectorId) {
        self.connections.push(peer);
    }

    /// Removes the last link to `peer`. Returns `true` if one was removed.
    pub(crate) fn detach(&mut self, peer: ConnectorId) -> bool {
        match self.connections.iter().rposition(|c| *c == peer) {
            Some(i) => {
                self.connections.remove(i);
                true
            }
            None => false,
        }
    }

    /// Layout rectangle derived from the owning node's bounds. Inputs sit on the
    /// top edge and outputs on the bottom edge, evenly spaced among the
    /// `siblings` connectors of the same direction.
    pub fn bounds(&self, node_bounds: Bounds, siblings: usize) -> Bounds {
        connector_bounds(node_bounds, self.id.direction, self.id.index, siblings)
    }
}

/// Pure layout function behind [`Connector::bounds`].
pub fn connector_bounds(
    node_bounds: Bounds,
    direction: Direction,
    index: usize,
    siblings: usize,
) -> Bounds {
    let siblings = siblings.max(index + 1);
    let width = node_bounds.size().x;
    let step = width / (siblings as f32 + 1.0);
    let x = node_bounds.min.x + step * (index as f32 + 1.0);
    let y = match direction {
        Direction::Input => node_bounds.min.y,
        Direction::Output => node_bounds.max.y,
    };
    Bounds::from_center_size(Vec2::new(x, y), Vec2::splat(CONNECTOR_SIZE))
}
