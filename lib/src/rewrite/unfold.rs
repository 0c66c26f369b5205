use crate::{
    datatypes::NodeId,
    diagram::Diagram,
    error::Result,
};

/// Unfolds an acyclic diagram into a tree.
///
/// Every sub-diagram reachable on more than one path is duplicated once per path,
/// so the result may grow exponentially in the amount of sharing.
/// Fails with [CycleDetected][crate::error::DiagramError::CycleDetected] on cyclic input.
pub fn unfold(diagram: &Diagram) -> Result<Diagram> {
    diagram.ensure_acyclic()?;
    let root = match diagram.root() {
        Some(root) => root,
        None => return Ok(diagram.clone()),
    };
    log::info!("[Start] unfold");
    let result = unfold_node(diagram, root)?;
    log::info!(
        "[Done] unfold: {} nodes became {}",
        diagram.node_count(),
        result.node_count()
    );
    Ok(result)
}

fn unfold_node(diagram: &Diagram, node: NodeId) -> Result<Diagram> {
    let mut result = Diagram::new();
    let root = result.copy_node(diagram, node)?;
    result.set_root(root)?;
    for edge in diagram.out_edges(node)? {
        let edge = diagram.edge(edge)?;
        let mut child = unfold_node(diagram, edge.to())?;
        child.use_unique_labels(&result);
        let child_root = result.add_diagram(&child)?;
        result.add_edge(root, child_root, edge.condition().clone())?;
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        datatypes::{CmpOp, Condition},
        error::DiagramError,
    };
    use test_log::test;

    fn diamond() -> Diagram {
        let mut dd = Diagram::new();
        let r = dd.add_node("r").unwrap();
        let a = dd.add_node("a").unwrap();
        let b = dd.add_node("b").unwrap();
        let s = dd.add_node("s").unwrap();
        let yes = dd.add_leaf_node("yes", "y").unwrap();
        let no = dd.add_leaf_node("no", "n").unwrap();
        dd.add_edge(r, a, Condition::new("x", CmpOp::Lt, "1")).unwrap();
        dd.add_else_edge(r, b).unwrap();
        dd.add_edge(a, s, Condition::new("y", CmpOp::Lt, "1")).unwrap();
        dd.add_else_edge(a, no).unwrap();
        dd.add_edge(b, s, Condition::new("y", CmpOp::Lt, "2")).unwrap();
        dd.add_else_edge(b, no).unwrap();
        dd.add_edge(s, yes, Condition::new("z", CmpOp::Lt, "1")).unwrap();
        dd.add_else_edge(s, no).unwrap();
        dd.set_root(r).unwrap();
        dd
    }

    #[test]
    fn unfold_dag() {
        let dd = diamond();
        let tree = unfold(&dd).unwrap();
        assert!(tree.is_tree());
        assert!(tree == dd);
        // r, a, b, two copies of s, two leaves below each copy of s, and one leaf below a and b each
        assert_eq!(tree.node_count(), 11);
        assert_eq!(tree.edge_count(), 10);
        assert_eq!(dd.node_count(), 6);
    }

    #[test]
    fn unfold_tree_is_identity() {
        let tree = unfold(&diamond()).unwrap();
        let again = unfold(&tree).unwrap();
        assert!(again == tree);
        assert_eq!(again.node_count(), tree.node_count());
        assert_eq!(again.edge_count(), tree.edge_count());
    }

    #[test]
    fn unfold_rejects_cycles() {
        let mut dd = diamond();
        let s = dd.node_by_label("s").unwrap();
        let r = dd.node_by_label("r").unwrap();
        dd.add_edge(s, r, Condition::new("z", CmpOp::Gt, "5")).unwrap();
        let before = dd.edge_count();
        assert!(matches!(unfold(&dd), Err(DiagramError::CycleDetected(_))));
        assert_eq!(dd.edge_count(), before);
    }

    #[test]
    fn unfold_empty() {
        assert_eq!(unfold(&Diagram::new()).unwrap().node_count(), 0);
    }
}
