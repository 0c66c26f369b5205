//! The fact vocabulary in which diagrams are exchanged.
//!
//! ```prolog
//! root(N).
//! innernode(N).
//! leafnode(N, C).
//! conditionaledge(N1, N2, Operand1, Operator, Operand2).
//! elseedge(N1, N2).
//! ```
//! The indexed vocabulary suffixes every predicate with `In` and adds the index of the diagram
//! as first argument, e.g. `leafnodeIn(I,N,C)`; it packs several diagrams into one fact set
//! together with `ddcountIn(C)`, the number of diagrams.
use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::{
    datatypes::{CmpOp, Condition},
    diagram::{Diagram, NodeKind},
    error::{DiagramError, Result},
};

/// A parsed atom `predicate(arg1,...,argn)` with unquoted arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    /// Name of the predicate.
    pub predicate: String,
    /// Arguments, without surrounding quotes.
    pub args: Vec<String>,
}

impl Atom {
    /// Creates a new atom.
    pub fn new<S: Into<String>>(predicate: S, args: Vec<String>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    fn fact_with(predicate: &str, args: &[String]) -> Result<Option<Fact>> {
        let atom = |count: usize| arity(predicate, args, count);
        let fact = match predicate {
            "root" => Fact::Root {
                node: atom(1)?[0].clone(),
            },
            "innernode" => Fact::InnerNode {
                node: atom(1)?[0].clone(),
            },
            "leafnode" => {
                let args = atom(2)?;
                Fact::LeafNode {
                    node: args[0].clone(),
                    classification: args[1].clone(),
                }
            }
            "conditionaledge" => {
                let args = atom(5)?;
                Fact::ConditionalEdge {
                    from: args[0].clone(),
                    to: args[1].clone(),
                    operand1: args[2].clone(),
                    operator: CmpOp::comparator(&args[3])?,
                    operand2: args[4].clone(),
                }
            }
            "elseedge" => {
                let args = atom(2)?;
                Fact::ElseEdge {
                    from: args[0].clone(),
                    to: args[1].clone(),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(fact))
    }

    /// Interprets the atom in the plain vocabulary.
    /// Atoms of other predicates yield [None].
    pub fn to_fact(&self) -> Result<Option<Fact>> {
        Self::fact_with(&self.predicate, &self.args)
    }

    /// Interprets the atom in the indexed vocabulary.
    /// Atoms of other predicates yield [None].
    pub fn to_indexed_fact(&self) -> Result<Option<IndexedFact>> {
        if self.predicate == "ddcountIn" {
            let count = arity(&self.predicate, &self.args, 1)?[0].parse::<usize>().map_err(|_| {
                DiagramError::MalformedFact(format!("ddcountIn({})", self.args[0]))
            })?;
            return Ok(Some(IndexedFact::DiagramCount(count)));
        }
        let predicate = match self.predicate.strip_suffix("In") {
            Some(predicate) => predicate,
            None => return Ok(None),
        };
        let (index, rest) = match self.args.split_first() {
            Some((index, rest)) => (index, rest),
            None => return Ok(None),
        };
        match Self::fact_with(predicate, rest)? {
            Some(fact) => {
                let index = index.parse::<usize>().map_err(|_| {
                    DiagramError::MalformedFact(format!(
                        "{}: '{}' is not a diagram index",
                        self.predicate, index
                    ))
                })?;
                Ok(Some(IndexedFact::Fact { index, fact }))
            }
            None => Ok(None),
        }
    }
}

fn arity<'a>(predicate: &str, args: &'a [String], count: usize) -> Result<&'a [String]> {
    if args.len() == count {
        Ok(args)
    } else {
        Err(DiagramError::MalformedFact(format!(
            "{} expects {} argument(s), got {}",
            predicate,
            count,
            args.len()
        )))
    }
}

/// One fact of the plain vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "predicate", rename_all = "lowercase")]
pub enum Fact {
    /// `root(N)`
    Root {
        /// Label of the root.
        node: String,
    },
    /// `innernode(N)`
    InnerNode {
        /// Label of the node.
        node: String,
    },
    /// `leafnode(N, C)`
    LeafNode {
        /// Label of the node.
        node: String,
        /// Classification of the leaf.
        classification: String,
    },
    /// `conditionaledge(N1, N2, Operand1, Operator, Operand2)`
    ConditionalEdge {
        /// Label of the source.
        from: String,
        /// Label of the target.
        to: String,
        /// First operand.
        operand1: String,
        /// Comparison operator.
        operator: CmpOp,
        /// Second operand.
        operand2: String,
    },
    /// `elseedge(N1, N2)`
    ElseEdge {
        /// Label of the source.
        from: String,
        /// Label of the target.
        to: String,
    },
}

/// One fact of the indexed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexedFact {
    /// A fact of the diagram with the given index.
    Fact {
        /// Index of the diagram.
        index: usize,
        /// The fact.
        fact: Fact,
    },
    /// `ddcountIn(C)`
    DiagramCount(usize),
}

fn is_plain_label(label: &str) -> bool {
    let mut chars = label.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn label_term(label: &str) -> String {
    if is_plain_label(label) {
        label.to_string()
    } else {
        quoted(label)
    }
}

/// Quotes `text`, escaping `\` and `"` with a backslash.
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Fact {
    fn predicate(&self) -> &'static str {
        match self {
            Fact::Root { .. } => "root",
            Fact::InnerNode { .. } => "innernode",
            Fact::LeafNode { .. } => "leafnode",
            Fact::ConditionalEdge { .. } => "conditionaledge",
            Fact::ElseEdge { .. } => "elseedge",
        }
    }

    fn terms(&self) -> Vec<String> {
        match self {
            Fact::Root { node } | Fact::InnerNode { node } => vec![label_term(node)],
            Fact::LeafNode {
                node,
                classification,
            } => vec![label_term(node), quoted(classification)],
            Fact::ConditionalEdge {
                from,
                to,
                operand1,
                operator,
                operand2,
            } => vec![
                label_term(from),
                label_term(to),
                quoted(operand1),
                quoted(operator.symbol()),
                quoted(operand2),
            ],
            Fact::ElseEdge { from, to } => vec![label_term(from), label_term(to)],
        }
    }

    /// Renders the fact as an atom without the terminating dot.
    pub fn atom(&self) -> String {
        format!("{}({})", self.predicate(), self.terms().join(","))
    }
}

impl Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.", self.atom())
    }
}

impl IndexedFact {
    /// Renders the fact as an atom without the terminating dot.
    pub fn atom(&self) -> String {
        match self {
            IndexedFact::Fact { index, fact } => {
                let mut terms = vec![index.to_string()];
                terms.extend(fact.terms());
                format!("{}In({})", fact.predicate(), terms.join(","))
            }
            IndexedFact::DiagramCount(count) => format!("ddcountIn({})", count),
        }
    }
}

impl Display for IndexedFact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.", self.atom())
    }
}

/// Encodes a diagram: all nodes, then all edges, then the root.
pub fn encode(diagram: &Diagram) -> Result<Vec<Fact>> {
    let mut facts = Vec::with_capacity(diagram.node_count() + diagram.edge_count() + 1);
    for id in diagram.nodes() {
        let node = diagram.node(id)?;
        facts.push(match node.kind() {
            NodeKind::Inner => Fact::InnerNode {
                node: node.label().to_string(),
            },
            NodeKind::Leaf { classification } => Fact::LeafNode {
                node: node.label().to_string(),
                classification: classification.clone(),
            },
        });
    }
    for id in diagram.edges() {
        let edge = diagram.edge(id)?;
        let from = diagram.label(edge.from())?.to_string();
        let to = diagram.label(edge.to())?.to_string();
        let condition = edge.condition();
        facts.push(if condition.is_else() {
            Fact::ElseEdge { from, to }
        } else {
            Fact::ConditionalEdge {
                from,
                to,
                operand1: condition.operand1().to_string(),
                operator: condition.op(),
                operand2: condition.operand2().to_string(),
            }
        });
    }
    if let Some(root) = diagram.root() {
        facts.push(Fact::Root {
            node: diagram.label(root)?.to_string(),
        });
    }
    Ok(facts)
}

/// Decodes a fact set into a diagram.
///
/// Nodes are created first, so the order of the facts does not matter.
/// Fails with [MultipleRoots][DiagramError::MultipleRoots] if more than one root is declared and
/// with [UnknownNode][DiagramError::UnknownNode] if an edge refers to an undeclared node.
/// Without a `root` fact the diagram has no root.
pub fn decode<'a, I: IntoIterator<Item = &'a Fact>>(facts: I) -> Result<Diagram> {
    let facts: Vec<&Fact> = facts.into_iter().collect();
    let mut diagram = Diagram::new();
    for fact in facts.iter() {
        match fact {
            Fact::InnerNode { node } => {
                diagram.add_node(node.as_str())?;
            }
            Fact::LeafNode {
                node,
                classification,
            } => {
                diagram.add_leaf_node(node.as_str(), classification.as_str())?;
            }
            _ => {}
        }
    }
    for fact in facts.iter() {
        match fact {
            Fact::ConditionalEdge {
                from,
                to,
                operand1,
                operator,
                operand2,
            } => {
                let from = diagram.node_by_label(from)?;
                let to = diagram.node_by_label(to)?;
                diagram.add_edge(
                    from,
                    to,
                    Condition::new(operand1.as_str(), *operator, operand2.as_str()),
                )?;
            }
            Fact::ElseEdge { from, to } => {
                let from = diagram.node_by_label(from)?;
                let to = diagram.node_by_label(to)?;
                diagram.add_else_edge(from, to)?;
            }
            _ => {}
        }
    }
    let roots: Vec<&String> = facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::Root { node } => Some(node),
            _ => None,
        })
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    match roots.as_slice() {
        [] => {}
        [root] => {
            let root = diagram.node_by_label(root)?;
            diagram.set_root(root)?;
        }
        _ => return Err(DiagramError::MultipleRoots(roots.len())),
    }
    Ok(diagram)
}

/// Decodes the plain facts among the atoms, ignoring atoms of other predicates.
pub fn decode_atoms(atoms: &[Atom]) -> Result<Diagram> {
    let facts = atoms
        .iter()
        .filter_map(|atom| atom.to_fact().transpose())
        .collect::<Result<Vec<_>>>()?;
    decode(facts.iter())
}

/// Encodes several diagrams in the indexed vocabulary, followed by `ddcountIn`.
pub fn encode_indexed(diagrams: &[Diagram]) -> Result<Vec<IndexedFact>> {
    let mut facts = Vec::new();
    for (index, diagram) in diagrams.iter().enumerate() {
        facts.extend(
            encode(diagram)?
                .into_iter()
                .map(|fact| IndexedFact::Fact { index, fact }),
        );
    }
    facts.push(IndexedFact::DiagramCount(diagrams.len()));
    Ok(facts)
}

/// Largest number of diagrams [decode_indexed] accepts from `ddcountIn`.
pub const MAX_DIAGRAM_COUNT: usize = 1 << 16;

/// Decodes the indexed facts among the atoms into one diagram per index.
/// The number of diagrams is taken from `ddcountIn`, or from the largest index if it is absent.
///
/// The atoms usually come from an external solver, so a count above [MAX_DIAGRAM_COUNT]
/// is rejected as [MalformedFact][DiagramError::MalformedFact] instead of being allocated.
pub fn decode_indexed(atoms: &[Atom]) -> Result<Vec<Diagram>> {
    let mut count: Option<usize> = None;
    let mut grouped: BTreeMap<usize, Vec<Fact>> = BTreeMap::new();
    for atom in atoms {
        match atom.to_indexed_fact()? {
            Some(IndexedFact::DiagramCount(c)) => count = Some(c),
            Some(IndexedFact::Fact { index, fact }) => grouped.entry(index).or_default().push(fact),
            None => {}
        }
    }
    let count = count.unwrap_or_else(|| grouped.keys().next_back().map_or(0, |max| max + 1));
    if count > MAX_DIAGRAM_COUNT {
        return Err(DiagramError::MalformedFact(format!(
            "ddcountIn({}) exceeds the limit of {} diagrams",
            count, MAX_DIAGRAM_COUNT
        )));
    }
    if let Some(index) = grouped.keys().find(|&&index| index >= count) {
        return Err(DiagramError::MalformedFact(format!(
            "diagram index {} exceeds ddcountIn({})",
            index, count
        )));
    }
    (0..count)
        .map(|index| decode(grouped.get(&index).into_iter().flatten()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    fn atom(predicate: &str, args: &[&str]) -> Atom {
        Atom::new(predicate, args.iter().map(|a| a.to_string()).collect())
    }

    fn sample() -> Diagram {
        let mut dd = Diagram::new();
        let r = dd.add_node("r").unwrap();
        let l = dd.add_leaf_node("Leaf 1", "yes").unwrap();
        let m = dd.add_leaf_node("m", "no {no:2}").unwrap();
        dd.add_edge(r, l, Condition::new("x", CmpOp::Le, "4")).unwrap();
        dd.add_else_edge(r, m).unwrap();
        dd.set_root(r).unwrap();
        dd
    }

    #[test]
    fn encode_facts() {
        let rendered: Vec<String> = encode(&sample())
            .unwrap()
            .iter()
            .map(|fact| fact.to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "innernode(r).",
                "leafnode(\"Leaf 1\",\"yes\").",
                "leafnode(m,\"no {no:2}\").",
                "conditionaledge(r,\"Leaf 1\",\"x\",\"<=\",\"4\").",
                "elseedge(r,m).",
                "root(r).",
            ]
        );
        assert_eq!(encode(&Diagram::new()), Ok(vec![]));
    }

    #[test]
    fn round_trip() {
        let dd = sample();
        let decoded = decode(encode(&dd).unwrap().iter()).unwrap();
        assert!(decoded == dd);
        assert_eq!(decoded.node_count(), 3);
        assert_eq!(decoded.edge_count(), 2);
        assert_eq!(
            decoded.root().map(|r| decoded.label(r).unwrap().to_string()),
            Some("r".to_string())
        );
    }

    #[test]
    fn quotes_survive_the_text_form() {
        let mut dd = Diagram::new();
        let r = dd.add_node("say \"what\"").unwrap();
        let l = dd.add_leaf_node("l", "say \"hi\"").unwrap();
        let m = dd.add_leaf_node("m", "C:\\temp").unwrap();
        dd.add_edge(r, l, Condition::new("\"x\"", CmpOp::Le, "4")).unwrap();
        dd.add_else_edge(r, m).unwrap();
        dd.set_root(r).unwrap();

        let text: String = encode(&dd)
            .unwrap()
            .iter()
            .map(|fact| format!("{}\n", fact))
            .collect();
        assert!(text.contains(r#"leafnode(l,"say \"hi\"")."#));
        assert!(text.contains(r#"leafnode(m,"C:\\temp")."#));
        let decoded = decode_atoms(&crate::parser::parse_facts(&text).unwrap()).unwrap();
        assert!(decoded == dd);
        let leaf = decoded.node_by_label("l").unwrap();
        assert_eq!(decoded.classification(leaf), Ok("say \"hi\""));
        assert!(decoded.node_by_label("say \"what\"").is_ok());
    }

    #[test]
    fn decode_validates() {
        let facts = vec![
            Fact::InnerNode { node: "a".into() },
            Fact::InnerNode { node: "b".into() },
            Fact::Root { node: "a".into() },
            Fact::Root { node: "b".into() },
        ];
        assert_eq!(decode(facts.iter()), Err(DiagramError::MultipleRoots(2)));

        let facts = vec![
            Fact::InnerNode { node: "a".into() },
            Fact::ElseEdge {
                from: "a".into(),
                to: "z".into(),
            },
        ];
        assert_eq!(
            decode(facts.iter()),
            Err(DiagramError::UnknownNode("z".into()))
        );

        let rootless = decode([Fact::InnerNode { node: "a".into() }].iter()).unwrap();
        assert_eq!(rootless.root(), None);

        let facts = vec![
            Fact::InnerNode { node: "a".into() },
            Fact::InnerNode { node: "a".into() },
        ];
        assert_eq!(
            decode(facts.iter()),
            Err(DiagramError::DuplicateLabel("a".into()))
        );
    }

    #[test]
    fn atoms_to_facts() {
        assert_eq!(
            atom("conditionaledge", &["a", "b", "x", "<", "3"]).to_fact(),
            Ok(Some(Fact::ConditionalEdge {
                from: "a".into(),
                to: "b".into(),
                operand1: "x".into(),
                operator: CmpOp::Lt,
                operand2: "3".into(),
            }))
        );
        assert_eq!(
            atom("conditionaledge", &["a", "b", "x", "~", "3"]).to_fact(),
            Err(DiagramError::UnrecognizedOperator("~".into()))
        );
        assert!(matches!(
            atom("leafnode", &["a"]).to_fact(),
            Err(DiagramError::MalformedFact(_))
        ));
        assert_eq!(atom("auxiliary", &["a"]).to_fact(), Ok(None));
        assert_eq!(atom("leafnodeIn", &["0", "a", "c"]).to_fact(), Ok(None));
    }

    #[test]
    fn indexed() {
        let first = sample();
        let mut second = Diagram::new();
        let leaf = second.add_leaf_node("only", "c").unwrap();
        second.set_root(leaf).unwrap();

        let facts = encode_indexed(&[first.clone(), second.clone()]).unwrap();
        let rendered: Vec<String> = facts.iter().map(|f| f.to_string()).collect();
        assert_eq!(rendered[0], "innernodeIn(0,r).");
        assert!(rendered.contains(&"leafnodeIn(1,only,\"c\").".to_string()));
        assert!(rendered.contains(&"rootIn(1,only).".to_string()));
        assert_eq!(rendered.last().unwrap(), "ddcountIn(2).");

        let atoms: Vec<Atom> = facts
            .iter()
            .map(|fact| match fact {
                IndexedFact::Fact { index, fact } => match fact {
                        Fact::Root { node } => atom("rootIn", &[&index.to_string(), node]),
                        Fact::InnerNode { node } => {
                            atom("innernodeIn", &[&index.to_string(), node])
                        }
                        Fact::LeafNode {
                            node,
                            classification,
                        } => atom("leafnodeIn", &[&index.to_string(), node, classification]),
                        Fact::ConditionalEdge {
                            from,
                            to,
                            operand1,
                            operator,
                            operand2,
                        } => atom(
                            "conditionaledgeIn",
                            &[
                                &index.to_string(),
                                from,
                                to,
                                operand1,
                                operator.symbol(),
                                operand2,
                            ],
                        ),
                        Fact::ElseEdge { from, to } => {
                            atom("elseedgeIn", &[&index.to_string(), from, to])
                        }
                },
                IndexedFact::DiagramCount(count) => atom("ddcountIn", &[&count.to_string()]),
            })
            .collect();
        let decoded = decode_indexed(&atoms).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded[0] == first);
        assert!(decoded[1] == second);

        let overflow = vec![atom("ddcountIn", &["1"]), atom("rootIn", &["3", "a"])];
        assert!(matches!(
            decode_indexed(&overflow),
            Err(DiagramError::MalformedFact(_))
        ));
        let empty_slot = decode_indexed(&[atom("ddcountIn", &["2"])]).unwrap();
        assert_eq!(empty_slot.len(), 2);
        assert_eq!(empty_slot[1].root(), None);
        assert!(matches!(
            decode_indexed(&[atom("ddcountIn", &["1000000000"]), atom("rootIn", &["0", "a"])]),
            Err(DiagramError::MalformedFact(_))
        ));
        let largest = MAX_DIAGRAM_COUNT.to_string();
        assert_eq!(
            decode_indexed(&[atom("ddcountIn", &[largest.as_str()])]).map(|dds| dds.len()),
            Ok(MAX_DIAGRAM_COUNT)
        );
    }

    #[test]
    fn json() {
        let fact = Fact::ElseEdge {
            from: "a".into(),
            to: "b".into(),
        };
        let json = serde_json::to_string(&fact).unwrap();
        assert_eq!(json, r#"{"predicate":"elseedge","from":"a","to":"b"}"#);
        assert_eq!(serde_json::from_str::<Fact>(&json).unwrap(), fact);
    }
}
