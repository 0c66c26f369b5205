//! Structural queries on a [Diagram]: cycles, tree shape, reachability,
//! structural equality, and evaluation of an instance.
use std::collections::{BTreeSet, HashMap, HashSet};

use super::{Diagram, Edge, NodeKind};
use crate::{
    datatypes::NodeId,
    error::{DiagramError, Result},
};

impl Diagram {
    /// Searches a cycle among the nodes reachable from the root.
    ///
    /// Returns the nodes of one cycle in edge direction; the last node has an edge back to the first one.
    /// DAG sharing is not reported, as a node leaves the active path once all of its children are expanded.
    pub fn contains_cycles(&self) -> Option<Vec<NodeId>> {
        let root = self.root?;
        // parent of every node on the active path
        let mut active: HashMap<NodeId, Option<NodeId>> = HashMap::new();
        let mut finished: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> =
            vec![(root, self.children(root).unwrap_or_default(), 0)];
        active.insert(root, None);

        while let Some((current, children, pos)) = stack.last_mut() {
            let current = *current;
            if *pos < children.len() {
                let child = children[*pos];
                *pos += 1;
                if active.contains_key(&child) {
                    let mut cycle = vec![current];
                    let mut walk = current;
                    while walk != child {
                        match active.get(&walk).copied().flatten() {
                            Some(parent) => {
                                cycle.push(parent);
                                walk = parent;
                            }
                            None => break,
                        }
                    }
                    cycle.reverse();
                    log::debug!("found cycle through {} nodes", cycle.len());
                    return Some(cycle);
                }
                if !finished.contains(&child) {
                    active.insert(child, Some(current));
                    stack.push((child, self.children(child).unwrap_or_default(), 0));
                }
            } else {
                stack.pop();
                active.remove(&current);
                finished.insert(current);
            }
        }
        None
    }

    /// Fails with [CycleDetected][DiagramError::CycleDetected] if the diagram contains a cycle.
    pub fn ensure_acyclic(&self) -> Result<()> {
        match self.contains_cycles() {
            None => Ok(()),
            Some(cycle) => {
                let mut labels = cycle
                    .iter()
                    .map(|&node| self.label(node).map(str::to_string))
                    .collect::<Result<Vec<_>>>()?;
                if let Some(first) = labels.first().cloned() {
                    labels.push(first);
                }
                Err(DiagramError::CycleDetected(labels))
            }
        }
    }

    /// Returns true if no node has more than one incoming edge.
    pub fn is_tree(&self) -> bool {
        self.ensure_tree().is_ok()
    }

    /// Fails with [NotATree][DiagramError::NotATree] naming the first node with more than one parent.
    pub fn ensure_tree(&self) -> Result<()> {
        for node in self.nodes() {
            let entry = self.node(node)?;
            if entry.in_edges.len() > 1 {
                return Err(DiagramError::NotATree(entry.label.clone()));
            }
        }
        Ok(())
    }

    /// Returns true if `to` can be reached from `from` by following out-edges.
    /// Every node reaches itself.
    pub fn contains_path(&self, from: NodeId, to: NodeId) -> bool {
        self.reachable_from(from)
            .map(|reachable| reachable.contains(&to))
            .unwrap_or(false)
    }

    /// All nodes reachable from `from`, including `from` itself.
    pub fn reachable_from(&self, from: NodeId) -> Result<BTreeSet<NodeId>> {
        self.node(from)?;
        let mut reachable = BTreeSet::new();
        let mut worklist = vec![from];
        while let Some(node) = worklist.pop() {
            if reachable.insert(node) {
                worklist.extend(self.children(node)?);
            }
        }
        Ok(reachable)
    }

    /// Structural equality of the sub-diagram at `node` with the sub-diagram of `other` at `other_node`,
    /// i.e. both encode the same classifier regardless of their labels.
    pub fn node_equals(&self, node: NodeId, other: &Diagram, other_node: NodeId) -> bool {
        let mut assumed = HashSet::new();
        let mut memo = HashMap::new();
        self.node_equals_with(node, other, other_node, &mut assumed, &mut memo)
    }

    fn node_equals_with(
        &self,
        node: NodeId,
        other: &Diagram,
        other_node: NodeId,
        assumed: &mut HashSet<(NodeId, NodeId)>,
        memo: &mut HashMap<(NodeId, NodeId), bool>,
    ) -> bool {
        let key = (node, other_node);
        if let Some(&known) = memo.get(&key) {
            return known;
        }
        // a pair which is compared further up the recursion is assumed equal
        if !assumed.insert(key) {
            return true;
        }
        let result = match (self.node(node), other.node(other_node)) {
            (Ok(lhs), Ok(rhs)) => match (&lhs.kind, &rhs.kind) {
                (
                    NodeKind::Leaf { classification: c1 },
                    NodeKind::Leaf { classification: c2 },
                ) => c1 == c2,
                (NodeKind::Inner, NodeKind::Inner) => {
                    lhs.out_edges.len() == rhs.out_edges.len()
                        && lhs.out_edges.iter().all(|&edge| {
                            let edge = match self.edge(edge) {
                                Ok(edge) => edge,
                                Err(_) => return false,
                            };
                            rhs.out_edges.iter().any(|&other_edge| {
                                other.edge(other_edge).map_or(false, |other_edge: &Edge| {
                                    edge.condition == other_edge.condition
                                        && self.node_equals_with(
                                            edge.to,
                                            other,
                                            other_edge.to,
                                            assumed,
                                            memo,
                                        )
                                })
                            })
                        })
                }
                _ => false,
            },
            _ => false,
        };
        assumed.remove(&key);
        memo.insert(key, result);
        result
    }

    /// Structural equality of two diagrams, comparing the sub-diagrams at their roots.
    /// Two empty diagrams are equal.
    pub fn equivalent(&self, other: &Diagram) -> bool {
        match (self.root, other.root) {
            (None, None) => true,
            (Some(lhs), Some(rhs)) => self.node_equals(lhs, other, rhs),
            _ => false,
        }
    }

    /// Classifies an instance, mapping attribute names to values.
    ///
    /// Starting at the root, the first conditional edge which holds is followed,
    /// and the else edge if none holds, until a leaf is reached.
    pub fn classify(&self, instance: &HashMap<String, String>) -> Result<&str> {
        let mut current = self.root_or_err()?;
        let mut visited = vec![current];
        loop {
            let entry = self.node(current)?;
            if let Some(classification) = entry.classification() {
                return Ok(classification);
            }
            let mut next = None;
            for edge in self.out_edges(current)? {
                let edge = self.edge(edge)?;
                if edge.condition.holds(instance) {
                    next = Some(edge.to);
                    break;
                }
            }
            current = next.ok_or_else(|| DiagramError::NoMatchingBranch(entry.label.clone()))?;
            if visited.contains(&current) {
                let labels = visited
                    .iter()
                    .skip_while(|&&node| node != current)
                    .chain(std::iter::once(&current))
                    .map(|&node| self.label(node).map(str::to_string))
                    .collect::<Result<Vec<_>>>()?;
                return Err(DiagramError::CycleDetected(labels));
            }
            visited.push(current);
        }
    }
}

impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl std::fmt::Display for Diagram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nodes: ")?;
        for (pos, node) in self.nodes.iter().flatten().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            match &node.kind {
                NodeKind::Inner => write!(f, "{}", node.label)?,
                NodeKind::Leaf { classification } => {
                    write!(f, "{} [{}]", node.label, classification)?
                }
            }
        }
        writeln!(f)?;
        writeln!(f, "Edges:")?;
        for edge in self.edges.iter().flatten() {
            let from = self.label(edge.from).unwrap_or("?");
            let to = self.label(edge.to).unwrap_or("?");
            if edge.is_else() {
                writeln!(f, "     {} --> {}", from, to)?;
            } else {
                writeln!(f, "     {} --({})--> {}", from, edge.condition, to)?;
            }
        }
        Ok(())
    }
}
