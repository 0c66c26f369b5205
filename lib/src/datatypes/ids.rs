use serde::{Deserialize, Serialize};
use std::{fmt::Display, ops::Deref};

/// Handle of a node inside one [Diagram][crate::diagram::Diagram].
/// Each handle is a position in the node arena of the diagram and is never reused,
/// even after the node has been removed.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl Deref for NodeId {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<usize> for NodeId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl NodeId {
    /// Get the arena position of the node.
    pub fn value(self) -> usize {
        self.0
    }
}

/// Handle of an edge inside one [Diagram][crate::diagram::Diagram].
/// Edges are identified by their handle, not by their endpoints or condition.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

impl Deref for EdgeId {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<usize> for EdgeId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl EdgeId {
    /// Get the arena position of the edge.
    pub fn value(self) -> usize {
        self.0
    }
}
