use std::collections::HashSet;

use crate::{datatypes::NodeId, diagram::Diagram, error::Result};

/// Simplifies an acyclic diagram until neither of the following rewrites applies:
/// - an inner node whose branches all lead to equal sub-diagrams is replaced by that sub-diagram,
/// - one of two equal sub-diagrams is replaced by the other one.
///
/// Sub-diagrams which are no longer reachable from the root are removed.
/// Fails with [CycleDetected][crate::error::DiagramError::CycleDetected] on cyclic input.
pub fn simplify(diagram: &Diagram) -> Result<Diagram> {
    diagram.ensure_acyclic()?;
    let mut result = diagram.clone();
    if result.root().is_none() {
        return Ok(result);
    }
    log::info!("[Start] simplify");
    let mut rounds = 0usize;
    while reduce(&mut result)? || fuse(&mut result)? {
        rounds += 1;
    }
    log::info!(
        "[Done] simplify: {} rewrites, {} nodes became {}",
        rounds,
        diagram.node_count(),
        result.node_count()
    );
    Ok(result)
}

/// Root-reachable nodes, children before their parents.
fn post_order(diagram: &Diagram) -> Result<Vec<NodeId>> {
    let mut order = Vec::new();
    let root = match diagram.root() {
        Some(root) => root,
        None => return Ok(order),
    };
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut stack = vec![(root, false)];
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
        } else if seen.insert(node) {
            stack.push((node, true));
            for child in diagram.children(node)? {
                if !seen.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
    }
    Ok(order)
}

/// Replaces the first inner node whose children are all equal by its first child.
/// Returns true if the diagram changed.
fn reduce(diagram: &mut Diagram) -> Result<bool> {
    for node in post_order(diagram)? {
        if diagram.node(node)?.is_leaf() {
            continue;
        }
        let children = diagram.children(node)?;
        let common = match children.first() {
            Some(&common) => common,
            None => continue,
        };
        if children
            .iter()
            .all(|&child| diagram.node_equals(child, diagram, common))
        {
            log::debug!(
                "reduce {}: all branches lead to {}",
                diagram.label(node)?,
                diagram.label(common)?
            );
            diagram.redirect(node, common)?;
            diagram.prune_unreachable(node)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Merges the first pair of distinct but equal nodes.
/// Returns true if the diagram changed.
fn fuse(diagram: &mut Diagram) -> Result<bool> {
    let nodes = post_order(diagram)?;
    for (pos, &keep) in nodes.iter().enumerate() {
        for &other in nodes.iter().skip(pos + 1) {
            if diagram.node_equals(keep, diagram, other) {
                log::debug!(
                    "fuse {} into {}",
                    diagram.label(other)?,
                    diagram.label(keep)?
                );
                diagram.redirect(other, keep)?;
                diagram.prune_unreachable(other)?;
                return Ok(true);
            }
        }
    }
    Ok(false)
}
