//! Error kinds which may occur while building, rewriting, merging, or exchanging decision diagrams.
//!
//! Every fallible operation of the crate returns a [Result] with a [DiagramError].
//! None of the errors are retried internally; they are handed to the immediate caller.
use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, DiagramError>;

/// All error kinds of the crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagramError {
    /// A node with the given label already exists.
    #[error("a node labelled '{0}' already exists in the diagram")]
    DuplicateLabel(String),
    /// No node with the given label or handle exists.
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    /// A handle does not refer to a live member of the diagram.
    #[error("{0} is not a member of the diagram")]
    NotAMember(String),
    /// A node can not be removed, as edges are still attached to it.
    #[error("node '{label}' still has {count} incident edge(s)")]
    NodeHasIncidentEdges {
        /// Label of the node.
        label: String,
        /// Number of incident edges.
        count: usize,
    },
    /// Two diagrams share a label and can not be united.
    #[error("label '{0}' is used in both diagrams")]
    LabelCollision(String),
    /// The diagram contains a cycle, given as the labels along the cycle.
    #[error("the diagram contains the cycle {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),
    /// The node has more than one incoming edge.
    #[error("the diagram is not a tree, node '{0}' has more than one parent")]
    NotATree(String),
    /// The node does not have exactly one conditional and one else branch.
    #[error("node '{0}' is not binary")]
    NotBinary(String),
    /// Neither or both operands of a condition are numeric.
    #[error("condition '{0}' does not compare an attribute with a number")]
    MalformedCondition(String),
    /// An operator symbol outside of `<`, `<=`, `=`, `>=`, `>`.
    #[error("operator '{0}' is not recognized")]
    UnrecognizedOperator(String),
    /// More than one root has been declared.
    #[error("{0} roots have been declared, at most one is allowed")]
    MultipleRoots(usize),
    /// A leaf classification lacks the `{class:count,...}` distribution map.
    #[error("classification '{0}' does not carry a distribution map")]
    MissingDistributionMap(String),
    /// Summing up the votes for a class exceeds the representable range.
    #[error("the votes for class '{0}' overflow")]
    VoteOverflow(String),
    /// A user preference rule is not of the shape `A > B` or `A >N> B`.
    #[error("'{0}' is not a valid preference rule")]
    InvalidUserPreferenceRule(String),
    /// The operator got the wrong number of diagrams.
    #[error("operator '{operator}' expects {expected} diagram(s), got {got}")]
    ArityMismatch {
        /// Name of the operator.
        operator: String,
        /// Human readable description of the expected arity.
        expected: String,
        /// Number of given diagrams.
        got: usize,
    },
    /// The external solver could not be run or returned garbage.
    #[error("external solver failed: {0}")]
    ExternalSolverFailure(String),
    /// The operation needs a root, but the diagram is empty.
    #[error("the diagram has no root")]
    EmptyDiagram,
    /// A classification has been requested from an inner node.
    #[error("node '{0}' is not a leaf")]
    NotALeaf(String),
    /// Evaluation got stuck at an inner node.
    #[error("no branch of node '{0}' applies to the instance")]
    NoMatchingBranch(String),
    /// A fact with an unexpected shape.
    #[error("malformed fact: {0}")]
    MalformedFact(String),
    /// The textual input could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
    /// An operator parameter has an unusable value or is unknown.
    #[error("invalid parameter '{key}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
    /// No operator with this name is registered.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    /// Reading a program file failed.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DiagramError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn messages() {
        assert_eq!(
            DiagramError::CycleDetected(vec!["a".into(), "b".into(), "a".into()]).to_string(),
            "the diagram contains the cycle a -> b -> a"
        );
        assert_eq!(
            DiagramError::ArityMismatch {
                operator: "avg".into(),
                expected: "exactly 2".into(),
                got: 3
            }
            .to_string(),
            "operator 'avg' expects exactly 2 diagram(s), got 3"
        );
        let io: DiagramError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io, DiagramError::Io("gone".into()));
    }
}
