use crate::{
    datatypes::{Condition, NodeId},
    diagram::Diagram,
    error::{DiagramError, Result},
    rewrite::{binary_edges, tested_attribute},
};

use super::{ensure_trees, UNKNOWN};

/// Merges two ordered binary trees into one, averaging the thresholds of tests on the same attribute.
///
/// The trees are walked in parallel:
/// - two leaves become one leaf, classified `unknown` if the classifications differ,
/// - a leaf against an inner node is pushed down into every branch of the inner node,
/// - two nodes testing the same attribute become one node whose threshold is the mean of both,
///   with the conditional and the else branches merged pairwise,
/// - otherwise the node testing the smaller attribute is kept, and the other node is merged
///   into each of its branches. As both trees are ordered, the smaller attribute is not tested
///   anywhere in the other tree.
///
/// Both inputs have to be binary trees with one conditional and one else branch per inner node.
pub fn average(first: &Diagram, second: &Diagram) -> Result<Diagram> {
    ensure_trees(&[first, second])?;
    let (root1, root2) = (first.root_or_err()?, second.root_or_err()?);
    for (diagram, root) in [(first, root1), (second, root2)] {
        for node in diagram.reachable_from(root)? {
            if !diagram.node(node)?.is_leaf() {
                binary_edges(diagram, node)?;
            }
        }
    }
    log::info!("[Start] average");
    let mut result = Diagram::new();
    let root = average_nodes(&mut result, first, root1, second, root2)?;
    result.set_root(root)?;
    log::info!(
        "[Done] average: {} and {} nodes became {}",
        first.node_count(),
        second.node_count(),
        result.node_count()
    );
    Ok(result)
}

fn average_nodes(
    result: &mut Diagram,
    dd1: &Diagram,
    node1: NodeId,
    dd2: &Diagram,
    node2: NodeId,
) -> Result<NodeId> {
    match (dd1.node(node1)?.classification(), dd2.node(node2)?.classification()) {
        (Some(class1), Some(class2)) => {
            let label = result.unique_label(dd1.label(node1)?);
            let classification = if class1 == class2 { class1 } else { UNKNOWN };
            result.add_leaf_node(label, classification)
        }
        (None, Some(_)) => push_down(result, dd1, node1, dd2, node2),
        (Some(_), None) => push_down(result, dd2, node2, dd1, node1),
        (None, None) => average_inner(result, dd1, node1, dd2, node2),
    }
}

/// Keeps the structure of `inner` and merges `other` into each of its branches.
fn push_down(
    result: &mut Diagram,
    inner_dd: &Diagram,
    inner: NodeId,
    other_dd: &Diagram,
    other: NodeId,
) -> Result<NodeId> {
    let label = result.unique_label(inner_dd.label(inner)?);
    let root = result.add_node(label)?;
    for edge_id in inner_dd.out_edges(inner)? {
        let edge = inner_dd.edge(edge_id)?;
        let subtree = average_nodes(result, inner_dd, edge.to(), other_dd, other)?;
        result.add_edge(root, subtree, edge.condition().clone())?;
    }
    Ok(root)
}

fn average_inner(
    result: &mut Diagram,
    dd1: &Diagram,
    node1: NodeId,
    dd2: &Diagram,
    node2: NodeId,
) -> Result<NodeId> {
    let attribute1 = tested_attribute(dd1, node1)?;
    let attribute2 = tested_attribute(dd2, node2)?;
    if attribute1 < attribute2 {
        return push_down(result, dd1, node1, dd2, node2);
    }
    if attribute2 < attribute1 {
        return push_down(result, dd2, node2, dd1, node1);
    }

    let (conditional1, otherwise1) = binary_edges(dd1, node1)?;
    let (conditional2, otherwise2) = binary_edges(dd2, node2)?;
    let (conditional1, otherwise1) = (dd1.edge(conditional1)?, dd1.edge(otherwise1)?);
    let (conditional2, otherwise2) = (dd2.edge(conditional2)?, dd2.edge(otherwise2)?);
    let condition = mean_condition(conditional1.condition(), conditional2.condition())?;
    log::debug!(
        "average {} and {} to {}",
        conditional1.condition(),
        conditional2.condition(),
        condition
    );

    let label = result.unique_label(dd1.label(node1)?);
    let root = result.add_node(label)?;
    let conditional = average_nodes(result, dd1, conditional1.to(), dd2, conditional2.to())?;
    let otherwise = average_nodes(result, dd1, otherwise1.to(), dd2, otherwise2.to())?;
    result.add_edge(root, conditional, condition)?;
    result.add_else_edge(root, otherwise)?;
    Ok(root)
}

/// The condition `c1` with the threshold set to the mean of both thresholds.
/// Conditions without a numeric operand can only be merged if they are equal.
fn mean_condition(c1: &Condition, c2: &Condition) -> Result<Condition> {
    if c1 == c2 {
        return Ok(c1.clone());
    }
    match (c1.compare_value(), c2.compare_value()) {
        (Ok(v1), Ok(v2)) => c1.with_compare_value((v1 + v2) / 2.0),
        _ => Err(DiagramError::MalformedCondition(format!(
            "{} and {} can not be averaged",
            c1, c2
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datatypes::CmpOp;
    use std::collections::HashMap;
    use test_log::test;

    fn stump(attribute: &str, op: CmpOp, value: &str, yes: &str, no: &str) -> Diagram {
        let mut dd = Diagram::new();
        let r = dd.add_node("r").unwrap();
        let y = dd.add_leaf_node("y", yes).unwrap();
        let n = dd.add_leaf_node("n", no).unwrap();
        dd.add_edge(r, y, Condition::new(attribute, op, value))
            .unwrap();
        dd.add_else_edge(r, n).unwrap();
        dd.set_root(r).unwrap();
        dd
    }

    fn leaf(class: &str) -> Diagram {
        let mut dd = Diagram::new();
        let only = dd.add_leaf_node("l", class).unwrap();
        dd.set_root(only).unwrap();
        dd
    }

    fn root_condition(diagram: &Diagram) -> String {
        let (conditional, _) = binary_edges(diagram, diagram.root().unwrap()).unwrap();
        diagram.edge(conditional).unwrap().condition().to_string()
    }

    #[test]
    fn average_thresholds() {
        let merged = average(
            &stump("X", CmpOp::Le, "10", "low", "high"),
            &stump("X", CmpOp::Le, "20", "low", "high"),
        )
        .unwrap();
        assert_eq!(root_condition(&merged), "X<=15");
        assert_eq!(merged.node_count(), 3);

        let merged = average(
            &stump("X", CmpOp::Le, "1", "low", "high"),
            &stump("X", CmpOp::Le, "2", "low", "high"),
        )
        .unwrap();
        assert_eq!(root_condition(&merged), "X<=1.5");

        // orientation and operator of the first tree are kept
        let merged = average(
            &stump("X", CmpOp::Gt, "10", "high", "low"),
            &stump("20", CmpOp::Lt, "X", "high", "low"),
        )
        .unwrap();
        assert_eq!(root_condition(&merged), "X>15");
    }

    #[test]
    fn disagreeing_leaves_become_unknown() {
        let merged = average(
            &stump("X", CmpOp::Le, "10", "low", "high"),
            &stump("X", CmpOp::Le, "20", "low", "mid"),
        )
        .unwrap();
        let mut classes: Vec<&str> = merged
            .leaves()
            .into_iter()
            .map(|leaf| merged.classification(leaf).unwrap())
            .collect();
        classes.sort_unstable();
        assert_eq!(classes, vec!["low", "unknown"]);
    }

    #[test]
    fn leaf_is_pushed_down() {
        let merged = average(&leaf("low"), &stump("X", CmpOp::Le, "10", "low", "high")).unwrap();
        assert_eq!(merged.node_count(), 3);
        assert_eq!(root_condition(&merged), "X<=10");
        let instance: HashMap<String, String> =
            [("X".to_string(), "3".to_string())].into_iter().collect();
        assert_eq!(merged.classify(&instance), Ok("low"));
        let instance: HashMap<String, String> =
            [("X".to_string(), "30".to_string())].into_iter().collect();
        assert_eq!(merged.classify(&instance), Ok(UNKNOWN));
    }

    #[test]
    fn smaller_attribute_goes_first() {
        let merged = average(
            &stump("Y", CmpOp::Le, "5", "a", "b"),
            &stump("X", CmpOp::Le, "10", "a", "b"),
        )
        .unwrap();
        assert_eq!(root_condition(&merged), "X<=10");
        // X node, two Y nodes below it, two leaves below each Y node
        assert_eq!(merged.node_count(), 7);
        assert!(merged.is_tree());
        let labels: Vec<&str> = merged.nodes().map(|n| merged.label(n).unwrap()).collect();
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), labels.len());
    }

    #[test]
    fn average_needs_binary_trees() {
        let mut wide = stump("X", CmpOp::Le, "10", "low", "high");
        let r = wide.root().unwrap();
        let mid = wide.add_leaf_node("m", "mid").unwrap();
        wide.add_edge(r, mid, Condition::new("X", CmpOp::Le, "5"))
            .unwrap();
        assert_eq!(
            average(&wide, &leaf("low")),
            Err(DiagramError::NotBinary("r".into()))
        );
        assert!(matches!(
            average(
                &stump("X", CmpOp::Eq, "red", "low", "high"),
                &stump("X", CmpOp::Eq, "blue", "low", "high")
            ),
            Err(DiagramError::MalformedCondition(_))
        ));
    }
}
