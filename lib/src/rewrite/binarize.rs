use crate::{
    datatypes::NodeId,
    diagram::Diagram,
    error::{DiagramError, Result},
};

/// Turns a tree into a binary tree.
///
/// A node with more than two branches keeps the branch with the smallest condition;
/// all other branches move to a new intermediate node, which becomes the else branch of the node
/// and is processed in the same way.
/// Fails with [NotATree][DiagramError::NotATree] on shared nodes and with
/// [NotBinary][DiagramError::NotBinary] if an inner node has less than two branches.
pub fn binarize(diagram: &Diagram) -> Result<Diagram> {
    diagram.ensure_tree()?;
    let mut result = diagram.clone();
    if let Some(root) = result.root() {
        log::info!("[Start] binarize");
        binarize_node(&mut result, root)?;
        log::info!(
            "[Done] binarize: {} nodes became {}",
            diagram.node_count(),
            result.node_count()
        );
    }
    Ok(result)
}

fn binarize_node(diagram: &mut Diagram, node: NodeId) -> Result<()> {
    if diagram.node(node)?.is_leaf() {
        return Ok(());
    }
    let mut edges = diagram.out_edges(node)?;
    if edges.len() < 2 {
        return Err(DiagramError::NotBinary(diagram.label(node)?.to_string()));
    }
    if edges.len() > 2 {
        edges.sort_by_cached_key(|&edge| {
            diagram
                .edge(edge)
                .map(|edge| edge.condition().sort_key())
                .unwrap_or((true, String::new()))
        });
        let label = diagram.unique_label(diagram.label(node)?);
        log::debug!(
            "split {} branches of {} at {}",
            edges.len(),
            diagram.label(node)?,
            label
        );
        let intermediate = diagram.add_node(label)?;
        for &edge_id in edges.iter().skip(1) {
            let (to, condition) = {
                let edge = diagram.edge(edge_id)?;
                (edge.to(), edge.condition().clone())
            };
            diagram.remove_edge(edge_id)?;
            diagram.add_edge(intermediate, to, condition)?;
        }
        diagram.add_else_edge(node, intermediate)?;
    }
    for child in diagram.children(node)? {
        binarize_node(diagram, child)?;
    }
    Ok(())
}
