use crate::{
    datatypes::Tally,
    diagram::Diagram,
    error::{DiagramError, Result},
};

use super::{ensure_trees, Accumulator, UNKNOWN};

pub(super) fn vote(former: &Tally, classification: &str) -> Result<Tally> {
    let mut tally = former.clone();
    tally.increment(classification);
    Ok(tally)
}

/// Merges the trees into one tree which classifies an instance by the majority of the inputs.
///
/// Every leaf of the result is classified with the class most of the inputs agree on;
/// ties are resolved in favour of the lexicographically smallest class.
pub fn majority_vote(diagrams: &[Diagram]) -> Result<Diagram> {
    log::info!("[Start] majority vote of {} diagrams", diagrams.len());
    let accumulator = accumulate("majorityvoting", diagrams)?;
    let result = accumulator.finish(|tally| Ok(tally.winner().unwrap_or(UNKNOWN).to_string()))?;
    log::info!(
        "[Done] majority vote: {} nodes, {} leaves",
        result.node_count(),
        result.leaf_count()
    );
    Ok(result)
}

/// Grafts all diagrams into each other, counting one vote per diagram and leaf.
pub(super) fn accumulate(operator: &str, diagrams: &[Diagram]) -> Result<Accumulator> {
    let (first, rest) = diagrams
        .split_first()
        .ok_or_else(|| DiagramError::ArityMismatch {
            operator: operator.to_string(),
            expected: "at least 1".to_string(),
            got: 0,
        })?;
    ensure_trees(&diagrams.iter().collect::<Vec<_>>())?;
    let mut accumulator = Accumulator::new(first, |class| Ok(Tally::single(class)))?;
    for diagram in rest {
        accumulator.graft(diagram, vote)?;
    }
    Ok(accumulator)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datatypes::{CmpOp, Condition};
    use std::collections::HashMap;
    use test_log::test;

    fn leaf(class: &str) -> Diagram {
        let mut dd = Diagram::new();
        let only = dd.add_leaf_node("only", class).unwrap();
        dd.set_root(only).unwrap();
        dd
    }

    fn threshold(value: &str) -> Diagram {
        let mut dd = Diagram::new();
        let r = dd.add_node("r").unwrap();
        let small = dd.add_leaf_node("small", "cat").unwrap();
        let large = dd.add_leaf_node("large", "dog").unwrap();
        dd.add_edge(r, small, Condition::new("size", CmpOp::Le, value))
            .unwrap();
        dd.add_else_edge(r, large).unwrap();
        dd.set_root(r).unwrap();
        dd
    }

    fn classify(diagram: &Diagram, size: &str) -> String {
        let instance: HashMap<String, String> = [("size".to_string(), size.to_string())]
            .into_iter()
            .collect();
        diagram.classify(&instance).unwrap().to_string()
    }

    #[test]
    fn tie_goes_to_smallest_class() {
        let merged = majority_vote(&[leaf("cat"), leaf("dog")]).unwrap();
        assert_eq!(merged.node_count(), 1);
        let root = merged.root().unwrap();
        assert_eq!(merged.classification(root), Ok("cat"));

        let merged = majority_vote(&[leaf("b"), leaf("a")]).unwrap();
        assert_eq!(merged.classification(merged.root().unwrap()), Ok("a"));
    }

    #[test]
    fn majority_of_three() {
        let merged = majority_vote(&[threshold("10"), threshold("20"), threshold("30")]).unwrap();
        assert!(merged.is_tree());
        assert_eq!(merged.leaf_count(), 8);
        assert_eq!(classify(&merged, "5"), "cat");
        assert_eq!(classify(&merged, "15"), "cat");
        assert_eq!(classify(&merged, "25"), "dog");
        assert_eq!(classify(&merged, "35"), "dog");

        let merged = majority_vote(&[threshold("10"), threshold("20"), leaf("cat")]).unwrap();
        assert_eq!(classify(&merged, "15"), "cat");
        assert_eq!(classify(&merged, "25"), "dog");
    }

    #[test]
    fn single_input_is_copied() {
        let input = threshold("10");
        let merged = majority_vote(std::slice::from_ref(&input)).unwrap();
        assert!(merged == input);
    }

    #[test]
    fn majority_vote_arity() {
        assert_eq!(
            majority_vote(&[]),
            Err(DiagramError::ArityMismatch {
                operator: "majorityvoting".into(),
                expected: "at least 1".into(),
                got: 0
            })
        );
    }
}
