//! The graph model of a decision diagram.
//!
//! A [Diagram] owns its nodes and edges in two arenas, addressed by [NodeId] and [EdgeId].
//! Handles of removed elements are never reused, so a stale handle is reported as
//! [NotAMember][DiagramError::NotAMember] instead of silently pointing to another element.
//!
//! All mutations keep the following invariants:
//! - node labels are unique within a diagram,
//! - both endpoints of every edge are members of the diagram,
//! - the root, if set, is a member of the diagram,
//! - a node with incident edges is only removed on explicit request, together with its edges.
//!
//! Acyclicity and tree shape are not enforced; see the queries in [query].
pub mod query;

use std::collections::{BTreeSet, HashMap, HashSet};

use derivative::Derivative;

use crate::{
    datatypes::{Condition, EdgeId, NodeId},
    error::{DiagramError, Result},
};

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A test node, its out-edges carry the conditions.
    Inner,
    /// A classification.
    Leaf {
        /// The classification of the leaf, possibly with a distribution map.
        classification: String,
    },
}

/// A node of a [Diagram].
#[derive(Debug, Clone)]
pub struct Node {
    label: String,
    kind: NodeKind,
    in_edges: BTreeSet<EdgeId>,
    out_edges: BTreeSet<EdgeId>,
}

impl Node {
    fn new(label: String, kind: NodeKind) -> Self {
        Self {
            label,
            kind,
            in_edges: BTreeSet::new(),
            out_edges: BTreeSet::new(),
        }
    }

    /// The label of the node, unique within its diagram.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The payload of the node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns true if the node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// The classification of a leaf, [None] for inner nodes.
    pub fn classification(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { classification } => Some(classification),
            NodeKind::Inner => None,
        }
    }

    /// Incoming edges.
    pub fn in_edges(&self) -> &BTreeSet<EdgeId> {
        &self.in_edges
    }

    /// Outgoing edges.
    pub fn out_edges(&self) -> &BTreeSet<EdgeId> {
        &self.out_edges
    }
}

/// A directed, guarded edge of a [Diagram].
#[derive(Debug, Clone)]
pub struct Edge {
    from: NodeId,
    to: NodeId,
    condition: Condition,
}

impl Edge {
    /// Source of the edge.
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Target of the edge.
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Guard of the edge.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Returns true for the `else` branch of a node.
    pub fn is_else(&self) -> bool {
        self.condition.is_else()
    }
}

/// A rooted, labelled, directed graph of inner and leaf nodes.
///
/// Cloning a diagram yields a deep copy with the same handles.
#[derive(Derivative, Clone, Default)]
#[derivative(Debug)]
pub struct Diagram {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    root: Option<NodeId>,
    #[derivative(Debug = "ignore")]
    labels: HashMap<String, NodeId>,
}

impl Diagram {
    /// Creates an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_node(&mut self, label: String, kind: NodeKind) -> Result<NodeId> {
        if self.labels.contains_key(&label) {
            return Err(DiagramError::DuplicateLabel(label));
        }
        let id = NodeId(self.nodes.len());
        log::trace!("add node {} as {}", label, id);
        self.labels.insert(label.clone(), id);
        self.nodes.push(Some(Node::new(label, kind)));
        Ok(id)
    }

    /// Adds an inner node.
    pub fn add_node<S: Into<String>>(&mut self, label: S) -> Result<NodeId> {
        self.insert_node(label.into(), NodeKind::Inner)
    }

    /// Adds a leaf node with the given classification.
    pub fn add_leaf_node<S: Into<String>, T: Into<String>>(
        &mut self,
        label: S,
        classification: T,
    ) -> Result<NodeId> {
        self.insert_node(
            label.into(),
            NodeKind::Leaf {
                classification: classification.into(),
            },
        )
    }

    /// Adds an edge guarded by `condition`; an `else` condition makes it the else branch of `from`.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, condition: Condition) -> Result<EdgeId> {
        for node in [from, to] {
            if !self.contains_node(node) {
                return Err(DiagramError::UnknownNode(node.to_string()));
            }
        }
        let id = EdgeId(self.edges.len());
        log::trace!("add edge {} --({})--> {}", from, condition, to);
        self.edges.push(Some(Edge {
            from,
            to,
            condition,
        }));
        self.node_mut(from)?.out_edges.insert(id);
        self.node_mut(to)?.in_edges.insert(id);
        Ok(id)
    }

    /// Adds the else branch from `from` to `to`.
    pub fn add_else_edge(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId> {
        self.add_edge(from, to, Condition::else_branch())
    }

    /// Removes an edge and detaches it from both endpoints.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<()> {
        let removed = self
            .edges
            .get_mut(edge.value())
            .and_then(Option::take)
            .ok_or_else(|| DiagramError::NotAMember(edge.to_string()))?;
        log::trace!("remove edge {} --> {}", removed.from, removed.to);
        if let Ok(node) = self.node_mut(removed.from) {
            node.out_edges.remove(&edge);
        }
        if let Ok(node) = self.node_mut(removed.to) {
            node.in_edges.remove(&edge);
        }
        Ok(())
    }

    /// Removes a node.
    /// Fails if edges are attached to the node, unless `force_remove_edges` is set;
    /// in that case all incident edges are removed first.
    /// Removing the root leaves the diagram without a root.
    pub fn remove_node(&mut self, node: NodeId, force_remove_edges: bool) -> Result<()> {
        let incident: Vec<EdgeId> = {
            let entry = self.node(node)?;
            entry
                .in_edges
                .iter()
                .chain(entry.out_edges.iter())
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        if !incident.is_empty() {
            if !force_remove_edges {
                return Err(DiagramError::NodeHasIncidentEdges {
                    label: self.label(node)?.to_string(),
                    count: incident.len(),
                });
            }
            for edge in incident {
                self.remove_edge(edge)?;
            }
        }
        if let Some(removed) = self.nodes.get_mut(node.value()).and_then(Option::take) {
            log::trace!("remove node {}", removed.label);
            self.labels.remove(&removed.label);
        }
        if self.root == Some(node) {
            self.root = None;
        }
        Ok(())
    }

    /// Sets the root of the diagram.
    pub fn set_root(&mut self, node: NodeId) -> Result<()> {
        if !self.contains_node(node) {
            return Err(DiagramError::NotAMember(node.to_string()));
        }
        self.root = Some(node);
        Ok(())
    }

    /// The root of the diagram, [None] if the diagram is empty.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The root of the diagram, failing for an empty diagram.
    pub fn root_or_err(&self) -> Result<NodeId> {
        self.root.ok_or(DiagramError::EmptyDiagram)
    }

    /// Returns `proposal` if no node carries this label yet, otherwise
    /// `proposal_k` for the smallest free `k >= 1`.
    pub fn unique_label(&self, proposal: &str) -> String {
        if !self.labels.contains_key(proposal) {
            return proposal.to_string();
        }
        (1..)
            .map(|k| format!("{}_{}", proposal, k))
            .find(|candidate| !self.labels.contains_key(candidate))
            .unwrap_or_else(|| proposal.to_string())
    }

    /// Renames all nodes whose labels are used in `other`, such that afterwards
    /// the label sets of both diagrams are disjoint.
    pub fn use_unique_labels(&mut self, other: &Diagram) {
        let colliding: Vec<NodeId> = self
            .nodes()
            .filter(|&id| {
                self.label(id)
                    .map(|label| other.labels.contains_key(label))
                    .unwrap_or(false)
            })
            .collect();
        for id in colliding {
            let original = match self.label(id) {
                Ok(label) => label.to_string(),
                Err(_) => continue,
            };
            let renamed = (1..)
                .map(|k| format!("{}_{}", original, k))
                .find(|candidate| {
                    !other.labels.contains_key(candidate) && !self.labels.contains_key(candidate)
                })
                .unwrap_or_else(|| original.clone());
            log::trace!("rename node {} to {}", original, renamed);
            self.labels.remove(&original);
            self.labels.insert(renamed.clone(), id);
            if let Ok(node) = self.node_mut(id) {
                node.label = renamed;
            }
        }
    }

    /// Adds a copy of a single node of `other`, with the same label and payload but without edges.
    pub fn copy_node(&mut self, other: &Diagram, node: NodeId) -> Result<NodeId> {
        let entry = other.node(node)?;
        self.insert_node(entry.label.clone(), entry.kind.clone())
    }

    /// Copies all nodes and edges of `other` into this diagram and returns the copy of its root.
    /// Fails with [LabelCollision][DiagramError::LabelCollision] if both diagrams share a label,
    /// see [Diagram::use_unique_labels]. Nothing is modified on failure.
    pub fn add_diagram(&mut self, other: &Diagram) -> Result<NodeId> {
        let other_root = other.root_or_err()?;
        if let Some(label) = other.labels.keys().find(|l| self.labels.contains_key(*l)) {
            return Err(DiagramError::LabelCollision(label.clone()));
        }
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        for id in other.nodes() {
            let node = other.node(id)?;
            let copy = self.insert_node(node.label.clone(), node.kind.clone())?;
            mapping.insert(id, copy);
        }
        for id in other.edges() {
            let edge = other.edge(id)?;
            let (from, to) = match (mapping.get(&edge.from), mapping.get(&edge.to)) {
                (Some(&from), Some(&to)) => (from, to),
                _ => return Err(DiagramError::UnknownNode(edge.from.to_string())),
            };
            self.add_edge(from, to, edge.condition.clone())?;
        }
        mapping
            .get(&other_root)
            .copied()
            .ok_or_else(|| DiagramError::UnknownNode(other_root.to_string()))
    }

    /// Copies the part of `other` reachable from `node` into this diagram and makes
    /// the copy of `node` the root. Shared nodes are copied once.
    /// The copy is assembled separately, so a failure leaves this diagram unmodified.
    pub fn partial_add_diagram(&mut self, other: &Diagram, node: NodeId) -> Result<NodeId> {
        let reachable = other.reachable_from(node)?;
        let mut scratch = Diagram::new();
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        for &id in reachable.iter() {
            let entry = other.node(id)?;
            mapping.insert(
                id,
                scratch.insert_node(entry.label.clone(), entry.kind.clone())?,
            );
        }
        for &id in reachable.iter() {
            for &edge_id in other.node(id)?.out_edges.iter() {
                let edge = other.edge(edge_id)?;
                if let (Some(&from), Some(&to)) = (mapping.get(&edge.from), mapping.get(&edge.to))
                {
                    scratch.add_edge(from, to, edge.condition.clone())?;
                }
            }
        }
        if let Some(&root) = mapping.get(&node) {
            scratch.set_root(root)?;
        }
        let root = self.add_diagram(&scratch)?;
        self.set_root(root)?;
        Ok(root)
    }

    /// Looks a node up by its label.
    pub fn node_by_label(&self, label: &str) -> Result<NodeId> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| DiagramError::UnknownNode(label.to_string()))
    }

    /// Returns true if `node` is a live member of the diagram.
    pub fn contains_node(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(node.value()), Some(Some(_)))
    }

    /// Access to a member node.
    pub fn node(&self, node: NodeId) -> Result<&Node> {
        self.nodes
            .get(node.value())
            .and_then(Option::as_ref)
            .ok_or_else(|| DiagramError::NotAMember(node.to_string()))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(node.value())
            .and_then(Option::as_mut)
            .ok_or_else(|| DiagramError::NotAMember(node.to_string()))
    }

    /// Access to a member edge.
    pub fn edge(&self, edge: EdgeId) -> Result<&Edge> {
        self.edges
            .get(edge.value())
            .and_then(Option::as_ref)
            .ok_or_else(|| DiagramError::NotAMember(edge.to_string()))
    }

    /// Label of a member node.
    pub fn label(&self, node: NodeId) -> Result<&str> {
        self.node(node).map(Node::label)
    }

    /// Classification of a member leaf.
    pub fn classification(&self, node: NodeId) -> Result<&str> {
        let entry = self.node(node)?;
        entry
            .classification()
            .ok_or_else(|| DiagramError::NotALeaf(entry.label.clone()))
    }

    /// Replaces the classification of a member leaf.
    pub fn set_classification<S: Into<String>>(&mut self, node: NodeId, classification: S) -> Result<()> {
        let entry = self.node_mut(node)?;
        match &mut entry.kind {
            NodeKind::Leaf { classification: old } => {
                *old = classification.into();
                Ok(())
            }
            NodeKind::Inner => Err(DiagramError::NotALeaf(entry.label.clone())),
        }
    }

    /// Handles of all member nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_some())
            .map(|(pos, _)| NodeId(pos))
    }

    /// Handles of all member edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.is_some())
            .map(|(pos, _)| EdgeId(pos))
    }

    /// Handles of all leaves, in insertion order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|&id| self.node(id).map(Node::is_leaf).unwrap_or(false))
            .collect()
    }

    /// Outgoing edges of a member node, conditional edges ordered before the else edge.
    pub fn out_edges(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        let mut result: Vec<EdgeId> = self.node(node)?.out_edges.iter().copied().collect();
        result.sort_by_key(|&edge| self.edge(edge).map(Edge::is_else).unwrap_or(true));
        Ok(result)
    }

    /// Targets of the outgoing edges of a member node.
    pub fn children(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.node(node)?
            .out_edges
            .iter()
            .map(|&edge| self.edge(edge).map(Edge::to))
            .collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|edge| edge.is_some()).count()
    }

    /// Moves all incoming edges of `old` to `new`, keeping their conditions.
    /// If `old` is the root, `new` becomes the root.
    pub fn redirect(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if !self.contains_node(new) {
            return Err(DiagramError::NotAMember(new.to_string()));
        }
        let incoming: Vec<EdgeId> = self.node(old)?.in_edges.iter().copied().collect();
        for edge_id in incoming {
            let (from, condition) = {
                let edge = self.edge(edge_id)?;
                (edge.from, edge.condition.clone())
            };
            self.add_edge(from, new, condition)?;
            self.remove_edge(edge_id)?;
        }
        if self.root == Some(old) {
            self.root = Some(new);
        }
        Ok(())
    }

    /// Removes `start` and all of its descendants which are not reachable from the root any more.
    /// Nodes still reachable from the root are kept.
    pub fn prune_unreachable(&mut self, start: NodeId) -> Result<()> {
        let keep = match self.root {
            Some(root) => self.reachable_from(root)?,
            None => BTreeSet::new(),
        };
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut worklist = vec![start];
        while let Some(node) = worklist.pop() {
            if keep.contains(&node) || !visited.insert(node) || !self.contains_node(node) {
                continue;
            }
            worklist.extend(self.children(node)?);
            log::debug!("collect unreachable node {}", self.label(node)?);
            self.remove_node(node, true)?;
        }
        Ok(())
    }
}
