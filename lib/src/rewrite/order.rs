use crate::{
    datatypes::{EdgeId, NodeId},
    diagram::Diagram,
    error::{DiagramError, Result},
};

/// The conditional and the else edge of a binary node.
pub(crate) fn binary_edges(diagram: &Diagram, node: NodeId) -> Result<(EdgeId, EdgeId)> {
    let edges = diagram.out_edges(node)?;
    match edges.as_slice() {
        [conditional, otherwise]
            if !diagram.edge(*conditional)?.is_else() && diagram.edge(*otherwise)?.is_else() =>
        {
            Ok((*conditional, *otherwise))
        }
        _ => Err(DiagramError::NotBinary(diagram.label(node)?.to_string())),
    }
}

/// The attribute tested by a binary node.
/// If no operand is numeric, the first operand is taken as the attribute.
pub fn tested_attribute(diagram: &Diagram, node: NodeId) -> Result<String> {
    let (conditional, _) = binary_edges(diagram, node)?;
    let condition = diagram.edge(conditional)?.condition();
    Ok(condition
        .attribute()
        .unwrap_or_else(|_| condition.operand1())
        .to_string())
}

/// Reorders a binary tree such that the attributes along every path from the root to a leaf
/// are tested in lexicographic order. The classifier does not change.
///
/// Every inner node needs exactly one conditional and one else branch, otherwise the call fails
/// with [NotBinary][DiagramError::NotBinary]. Subtrees are duplicated where tests are swapped,
/// so the result may be larger than the input.
pub fn order(diagram: &Diagram) -> Result<Diagram> {
    diagram.ensure_tree()?;
    let mut result = diagram.clone();
    let root = match result.root() {
        Some(root) => root,
        None => return Ok(result),
    };
    for node in result.reachable_from(root)? {
        if !result.node(node)?.is_leaf() {
            binary_edges(&result, node)?;
        }
    }
    log::info!("[Start] order");
    let new_root = order_node(&mut result, root)?;
    result.set_root(new_root)?;
    log::info!(
        "[Done] order: {} nodes became {}",
        diagram.node_count(),
        result.node_count()
    );
    Ok(result)
}

/// Orders the subtree of a node without incoming edges and returns the new subtree root.
fn order_node(diagram: &mut Diagram, node: NodeId) -> Result<NodeId> {
    if diagram.node(node)?.is_leaf() {
        return Ok(node);
    }
    for edge_id in diagram.out_edges(node)? {
        let (child, condition) = {
            let edge = diagram.edge(edge_id)?;
            (edge.to(), edge.condition().clone())
        };
        diagram.remove_edge(edge_id)?;
        let subtree = order_node(diagram, child)?;
        diagram.add_edge(node, subtree, condition)?;
    }
    sink(diagram, node)
}

/// Swaps a node with its child testing the smallest attribute, as long as that attribute
/// is smaller than the one of the node. Both children have to be ordered already.
/// Returns the new subtree root.
///
/// ```text
///          node                                 child
///    (c1)/      \(c2)        ===>        (c3)/          \(c4)
///  sibling      child                    node            node'
///          (c3)/     \(c4)          (c1)/   \(c2)   (c1)/     \(c2)
///          rest1     rest2         sibling  rest1  sibling'   rest2
/// ```
fn sink(diagram: &mut Diagram, node: NodeId) -> Result<NodeId> {
    if diagram.node(node)?.is_leaf() {
        return Ok(node);
    }
    let attribute = tested_attribute(diagram, node)?;
    let (conditional, otherwise) = binary_edges(diagram, node)?;

    let mut exchange: Option<(EdgeId, String)> = None;
    for edge_id in [conditional, otherwise] {
        let child = diagram.edge(edge_id)?.to();
        if diagram.node(child)?.is_leaf() {
            continue;
        }
        let child_attribute = tested_attribute(diagram, child)?;
        if child_attribute < attribute
            && exchange
                .as_ref()
                .map_or(true, |(_, best)| child_attribute < *best)
        {
            exchange = Some((edge_id, child_attribute));
        }
    }
    let (child_edge, sibling_edge) = match exchange {
        Some((edge, _)) if edge == conditional => (conditional, otherwise),
        Some(_) => (otherwise, conditional),
        None => return Ok(node),
    };

    let (child, child_condition) = {
        let edge = diagram.edge(child_edge)?;
        (edge.to(), edge.condition().clone())
    };
    let (sibling, sibling_condition) = {
        let edge = diagram.edge(sibling_edge)?;
        (edge.to(), edge.condition().clone())
    };
    log::debug!(
        "swap {} ({}) with {}",
        diagram.label(node)?,
        attribute,
        diagram.label(child)?
    );

    let mut sibling_copy = Diagram::new();
    sibling_copy.partial_add_diagram(diagram, sibling)?;
    sibling_copy.use_unique_labels(diagram);
    let sibling_twin = diagram.add_diagram(&sibling_copy)?;
    let twin_label = diagram.unique_label(diagram.label(node)?);
    let twin = diagram.add_node(twin_label)?;

    let (rest_edge1, rest_edge2) = binary_edges(diagram, child)?;
    let (rest1, rest_condition1) = {
        let edge = diagram.edge(rest_edge1)?;
        (edge.to(), edge.condition().clone())
    };
    let (rest2, rest_condition2) = {
        let edge = diagram.edge(rest_edge2)?;
        (edge.to(), edge.condition().clone())
    };
    for edge in [conditional, otherwise, rest_edge1, rest_edge2] {
        diagram.remove_edge(edge)?;
    }

    diagram.add_edge(node, sibling, sibling_condition.clone())?;
    diagram.add_edge(node, rest1, child_condition.clone())?;
    diagram.add_edge(twin, sibling_twin, sibling_condition)?;
    diagram.add_edge(twin, rest2, child_condition)?;

    let subtree1 = sink(diagram, node)?;
    let subtree2 = sink(diagram, twin)?;
    diagram.add_edge(child, subtree1, rest_condition1)?;
    diagram.add_edge(child, subtree2, rest_condition2)?;
    Ok(child)
}
