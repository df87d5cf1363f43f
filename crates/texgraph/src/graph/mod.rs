//! Graph data model: nodes, connectors, the owning graph and its traversal.
//!
//! Nodes live in an insertion-ordered arena inside [`Graph`] and are addressed by
//! [`NodeId`]. Connectors refer to each other through [`ConnectorId`], so inserting
//! or deleting nodes never invalidates a reference held elsewhere.
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod connector;
pub mod element;
pub mod network;
pub mod node;
pub mod traversal;

pub use connector::{Connector, ConnectorId, Direction};
pub use element::{Bounds, ElementFlags, GraphElement};
pub use network::Graph;
pub use node::{Node, State};
pub use traversal::{DepthIterator, TraversalFlags};

/// Process-unique node identity. Never reused for a different node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
