use crate::{
    datatypes::{CmpOp, Condition, NodeId},
    diagram::Diagram,
    facts,
    merge::{self, PreferenceRule},
    operator::{Operator, Parameters},
    parser::parse_facts,
    rewrite::{binarize, order, simplify, tested_attribute, unfold},
};
use quickcheck_macros::quickcheck;
use std::collections::HashMap;
use test_log::test;

fn read(text: &str) -> Diagram {
    facts::decode_atoms(&parse_facts(text).unwrap()).unwrap()
}

fn instance(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn grid() -> Vec<HashMap<String, String>> {
    let mut result = Vec::new();
    for a in 0..5 {
        for b in 0..5 {
            for c in 0..5 {
                result.push(instance(&[
                    ("a", &a.to_string()),
                    ("b", &b.to_string()),
                    ("c", &c.to_string()),
                ]));
            }
        }
    }
    result
}

/// A binary tree over the attributes `a`, `b`, `c`, shaped by the given bytes.
fn grow(dd: &mut Diagram, shape: &mut impl Iterator<Item = u8>, depth: usize) -> NodeId {
    let byte = shape.next().unwrap_or(0);
    if depth >= 4 || byte % 4 == 0 {
        let label = dd.unique_label("leaf");
        return dd.add_leaf_node(label, format!("c{}", byte % 3)).unwrap();
    }
    let label = dd.unique_label("node");
    let node = dd.add_node(label).unwrap();
    let attribute = ["a", "b", "c"][usize::from(byte % 3)];
    let threshold = (byte / 4 % 5).to_string();
    let yes = grow(dd, shape, depth + 1);
    let no = grow(dd, shape, depth + 1);
    dd.add_edge(node, yes, Condition::new(attribute, CmpOp::Le, threshold))
        .unwrap();
    dd.add_else_edge(node, no).unwrap();
    node
}

fn random_tree(shape: Vec<u8>) -> Diagram {
    let mut dd = Diagram::new();
    let root = grow(&mut dd, &mut shape.into_iter(), 0);
    dd.set_root(root).unwrap();
    dd
}

fn same_classifier(lhs: &Diagram, rhs: &Diagram) -> bool {
    grid()
        .iter()
        .all(|instance| lhs.classify(instance) == rhs.classify(instance))
}

fn sorted_paths(diagram: &Diagram, node: NodeId, bound: &str) -> bool {
    if diagram.node(node).unwrap().is_leaf() {
        return true;
    }
    let attribute = tested_attribute(diagram, node).unwrap();
    attribute.as_str() >= bound
        && diagram
            .children(node)
            .unwrap()
            .into_iter()
            .all(|child| sorted_paths(diagram, child, &attribute))
}

const WEATHER: &str = r#"
% shared sub-diagram below "wind"
root(sky).
innernode(sky).
innernode(wind).
leafnode(play,"yes").
leafnode(stay,"no").
conditionaledge(sky,wind,"outlook","=","sunny").
conditionaledge(sky,play,"outlook","=","overcast").
elseedge(sky,wind).
conditionaledge(wind,stay,"windspeed",">","20").
elseedge(wind,play).
"#;

#[test]
fn facts_round_trip() {
    let dd = read(WEATHER);
    assert_eq!(dd.node_count(), 4);
    assert_eq!(dd.edge_count(), 5);
    let text: String = facts::encode(&dd)
        .unwrap()
        .iter()
        .map(|fact| format!("{}\n", fact))
        .collect();
    let again = read(&text);
    assert!(again == dd);
    assert_eq!(again.node_count(), dd.node_count());
    assert_eq!(again.label(again.root().unwrap()), Ok("sky"));
}

#[test]
fn unfold_and_simplify() {
    let dag = read(WEATHER);
    assert!(!dag.is_tree());
    let tree = unfold(&dag).unwrap();
    assert!(tree.is_tree());
    assert!(tree.node_count() > dag.node_count());
    assert!(unfold(&tree).unwrap() == tree);

    let cases = [
        instance(&[("outlook", "sunny"), ("windspeed", "30")]),
        instance(&[("outlook", "sunny"), ("windspeed", "10")]),
        instance(&[("outlook", "overcast"), ("windspeed", "30")]),
        instance(&[("outlook", "rain"), ("windspeed", "30")]),
    ];
    let simple = simplify(&tree).unwrap();
    assert!(simple.node_count() <= dag.node_count());
    for case in cases.iter() {
        assert_eq!(tree.classify(case), dag.classify(case));
        assert_eq!(simple.classify(case), dag.classify(case));
    }
    let again = simplify(&simple).unwrap();
    assert!(again == simple);
    assert_eq!(again.node_count(), simple.node_count());
}

#[test]
fn binarize_then_order() {
    let dd = read(
        r#"root(r). innernode(r). innernode(s).
        leafnode(x,"x"). leafnode(y,"y"). leafnode(z,"z"). leafnode(w,"w").
        conditionaledge(r,x,"b","<","1").
        conditionaledge(r,y,"b","<","3").
        elseedge(r,s).
        conditionaledge(s,z,"a","<=","2").
        elseedge(s,w)."#,
    );
    let binary = binarize(&dd).unwrap();
    let ordered = order(&binary).unwrap();
    assert!(ordered.is_tree());
    let root = ordered.root().unwrap();
    assert_eq!(tested_attribute(&ordered, root), Ok("a".to_string()));
    assert!(sorted_paths(&ordered, root, ""));
    assert!(same_classifier(&ordered, &dd));
}

#[test]
fn merge_three_by_majority() {
    let trees: Vec<Diagram> = ["10", "20", "30"]
        .iter()
        .map(|threshold| {
            read(&format!(
                r#"root(r). innernode(r). leafnode(s,"cat"). leafnode(l,"dog").
                conditionaledge(r,s,"size","<=","{}"). elseedge(r,l)."#,
                threshold
            ))
        })
        .collect();
    let merged = Operator::from_name("majorityvoting")
        .and_then(|op| op.apply(&trees, &Parameters::default()))
        .unwrap();
    assert_eq!(merged.len(), 1);
    let merged = &merged[0];
    for (size, expected) in [("5", "cat"), ("15", "cat"), ("25", "dog"), ("35", "dog")] {
        assert_eq!(merged.classify(&instance(&[("size", size)])), Ok(expected));
    }

    // two votes for cat at size 15 are overruled by a single one for dog
    let rules: Vec<PreferenceRule> = vec!["dog > cat".parse().unwrap()];
    let preferred = merge::user_preference(&trees, &rules).unwrap();
    assert_eq!(
        preferred.classify(&instance(&[("size", "15")])),
        Ok("dog")
    );
    assert_eq!(preferred.classify(&instance(&[("size", "5")])), Ok("cat"));
}

#[test]
fn merge_distributions() {
    let first = read(r#"root(l). leafnode(l,"a {a:3,b:1}")."#);
    let second = read(r#"root(l). leafnode(l,"b {a:1,b:4}")."#);
    let params: Parameters = [("eps", "1")].into_iter().collect();
    let merged = Operator::DistributionMapVoting
        .apply(&[first.clone(), second.clone()], &params)
        .unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(
        merged[0].classification(merged[0].root().unwrap()),
        Ok("b {a:4,b:5}")
    );

    let params: Parameters = [("eps", "0.5")].into_iter().collect();
    let alternatives = Operator::DistributionMapVoting
        .apply(&[first, second], &params)
        .unwrap();
    let mut classes: Vec<&str> = alternatives
        .iter()
        .map(|dd| dd.classification(dd.root().unwrap()).unwrap())
        .collect();
    classes.sort_unstable();
    assert_eq!(classes, vec!["a {a:4,b:5}", "b {a:4,b:5}"]);
}

#[test]
fn average_two_stumps() {
    let stump = |threshold: &str| {
        read(&format!(
            r#"root(r). innernode(r). leafnode(y,"low"). leafnode(n,"high").
            conditionaledge(r,y,"X","<=","{}"). elseedge(r,n)."#,
            threshold
        ))
    };
    let merged = Operator::Avg
        .apply(&[stump("10"), stump("20")], &Parameters::default())
        .unwrap();
    let encoded: Vec<String> = facts::encode(&merged[0])
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert!(encoded.contains(&"conditionaledge(r,y,\"X\",\"<=\",\"15\").".to_string()));
    assert_eq!(
        merged[0].classify(&instance(&[("X", "12")])),
        Ok("low")
    );
}

#[quickcheck]
fn order_keeps_the_classifier(shape: Vec<u8>) -> bool {
    let tree = random_tree(shape);
    let ordered = match order(&tree) {
        Ok(ordered) => ordered,
        Err(_) => return false,
    };
    let root = match ordered.root() {
        Some(root) => root,
        None => return false,
    };
    ordered.is_tree() && sorted_paths(&ordered, root, "") && same_classifier(&tree, &ordered)
}

#[quickcheck]
fn majority_of_copies_is_the_tree(shape: Vec<u8>) -> bool {
    let tree = random_tree(shape);
    match merge::majority_vote(&[tree.clone(), tree.clone(), tree.clone()]) {
        Ok(merged) => same_classifier(&tree, &merged),
        Err(_) => false,
    }
}

#[quickcheck]
fn simplify_is_a_fixed_point(shape: Vec<u8>) -> bool {
    let tree = random_tree(shape);
    let simple = match simplify(&tree) {
        Ok(simple) => simple,
        Err(_) => return false,
    };
    match simplify(&simple) {
        Ok(again) => {
            again == simple
                && again.node_count() == simple.node_count()
                && simple.node_count() <= tree.node_count()
                && same_classifier(&tree, &simple)
        }
        Err(_) => false,
    }
}
