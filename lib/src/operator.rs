/*!
Named operators on decision diagrams.

Every operator maps a list of diagrams to a list of diagrams and accepts a bag of
`key=value` parameters. The names are the ones the operators are registered with,
e.g. `majorityvoting`; [Operator::all] lists all of them.

```
use dd_merge::diagram::Diagram;
use dd_merge::operator::{Operator, Parameters};

let mut leaf = Diagram::new();
let root = leaf.add_leaf_node("l", "cat").unwrap();
leaf.set_root(root).unwrap();

let operator: Operator = Operator::from_name("majorityvoting").unwrap();
let result = operator.apply(&[leaf.clone(), leaf], &Parameters::default()).unwrap();
assert_eq!(result.len(), 1);
```
 */
use std::fmt::Display;

use strum::{EnumString, EnumVariantNames, VariantNames};

use crate::{
    diagram::Diagram,
    error::{DiagramError, Result},
    merge::{self, PreferenceRule},
    rewrite,
    solver::{self, AspParams, CommandSolver, Solver},
};

/// All registered operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    /// [rewrite::unfold]
    Unfold,
    /// [rewrite::simplify]
    Simplify,
    /// [rewrite::binarize]
    ToBinaryDecisionTree,
    /// [rewrite::order]
    OrderBinaryDecisionTree,
    /// [merge::majority_vote]
    MajorityVoting,
    /// [merge::distribution_vote]
    DistributionMapVoting,
    /// [merge::user_preference]
    UserPreferences,
    /// [merge::average]
    Avg,
    /// Returns all inputs unchanged.
    Union,
    /// [solver::asp]
    Asp,
}

/// Number of diagrams an operator accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many diagrams.
    Exactly(usize),
    /// This many diagrams or more.
    AtLeast(usize),
}

impl Arity {
    /// Returns true if `count` diagrams are acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Ordered `key=value` parameters of an operator call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    /// Appends a parameter.
    pub fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.push((key.into(), value.into()));
    }

    /// Parses `key=value`; the value may contain further `=`.
    pub fn parse_pair(text: &str) -> Result<(String, String)> {
        match text.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(DiagramError::InvalidParameter {
                key: text.to_string(),
                reason: "expected key=value".to_string(),
            }),
        }
    }

    /// The last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All parameters in the order they were given.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if no parameter was given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn invalid(key: &str, reason: String) -> DiagramError {
    DiagramError::InvalidParameter {
        key: key.to_string(),
        reason,
    }
}

impl Operator {
    /// Looks an operator up by its registered name.
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| DiagramError::UnknownOperator(name.to_string()))
    }

    /// All operators, in registration order.
    pub fn all() -> Vec<Self> {
        Self::VARIANTS
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }

    /// Number of diagrams the operator accepts.
    pub fn arity(&self) -> Arity {
        match self {
            Operator::DistributionMapVoting | Operator::Avg => Arity::Exactly(2),
            Operator::Union | Operator::Asp => Arity::AtLeast(0),
            _ => Arity::AtLeast(1),
        }
    }

    /// Returns true if `key` is a parameter of the operator.
    /// Every parameter of `userpreferences` is a preference rule, whatever its key.
    pub fn accepts_parameter(&self, key: &str) -> bool {
        match self {
            Operator::DistributionMapVoting => key == "eps",
            Operator::UserPreferences => true,
            Operator::Asp => matches!(key, "program" | "file" | "maxint"),
            _ => false,
        }
    }

    /// A short description of the operator.
    pub fn usage(&self) -> &'static str {
        match self {
            Operator::Unfold => "Unfolds every input DAG into a tree by duplicating shared sub-diagrams.",
            Operator::Simplify => "Removes redundant tests and shares equal sub-diagrams of every input.",
            Operator::ToBinaryDecisionTree => "Turns every input tree into a binary tree with one conditional and one else branch per inner node.",
            Operator::OrderBinaryDecisionTree => "Reorders every binary input tree such that attributes are tested in lexicographic order on every path.",
            Operator::MajorityVoting => "Merges all input trees; every leaf is classified by the majority of the inputs.",
            Operator::DistributionMapVoting => "Merges two trees whose leaves carry distribution maps \"class {c1:n1,...}\" by adding up the maps. Parameter eps in (0,1] (default 1): with eps < 1 one result per combination of classes reaching eps times the maximum.",
            Operator::UserPreferences => "Merges all input trees by majority, then applies the preference rules given as parameters, \"A > B\" or \"A >N> B\", in order.",
            Operator::Avg => "Merges two ordered binary trees, averaging the thresholds of tests on the same attribute.",
            Operator::Union => "Returns all inputs unchanged.",
            Operator::Asp => "Hands the indexed encoding of all inputs and a logic program to an external solver; every answer set is one result. Parameters program, file, maxint.",
        }
    }

    fn check(&self, diagrams: &[Diagram], params: &Parameters) -> Result<()> {
        let arity = self.arity();
        if !arity.accepts(diagrams.len()) {
            return Err(DiagramError::ArityMismatch {
                operator: self.to_string(),
                expected: arity.to_string(),
                got: diagrams.len(),
            });
        }
        if let Some((key, _)) = params.iter().find(|(key, _)| !self.accepts_parameter(key)) {
            return Err(invalid(key, format!("not recognized by {}", self)));
        }
        Ok(())
    }

    /// Applies the operator, running `asp` with the default [CommandSolver].
    pub fn apply(&self, diagrams: &[Diagram], params: &Parameters) -> Result<Vec<Diagram>> {
        self.apply_with(diagrams, params, &CommandSolver::default())
    }

    /// Applies the operator, running `asp` with the given solver.
    pub fn apply_with(
        &self,
        diagrams: &[Diagram],
        params: &Parameters,
        solver: &dyn Solver,
    ) -> Result<Vec<Diagram>> {
        self.check(diagrams, params)?;
        log::debug!("apply {} to {} diagram(s)", self, diagrams.len());
        match self {
            Operator::Unfold => diagrams.iter().map(rewrite::unfold).collect(),
            Operator::Simplify => diagrams.iter().map(rewrite::simplify).collect(),
            Operator::ToBinaryDecisionTree => diagrams.iter().map(rewrite::binarize).collect(),
            Operator::OrderBinaryDecisionTree => diagrams.iter().map(rewrite::order).collect(),
            Operator::MajorityVoting => Ok(vec![merge::majority_vote(diagrams)?]),
            Operator::DistributionMapVoting => {
                let eps = match params.get("eps") {
                    Some(value) => value
                        .trim()
                        .parse::<f64>()
                        .map_err(|err| invalid("eps", err.to_string()))?,
                    None => 1.0,
                };
                merge::distribution_vote(&diagrams[0], &diagrams[1], eps)
            }
            Operator::UserPreferences => {
                let rules = params
                    .iter()
                    .map(|(_, rule)| rule.parse::<PreferenceRule>())
                    .collect::<Result<Vec<_>>>()?;
                Ok(vec![merge::user_preference(diagrams, &rules)?])
            }
            Operator::Avg => Ok(vec![merge::average(&diagrams[0], &diagrams[1])?]),
            Operator::Union => Ok(diagrams.to_vec()),
            Operator::Asp => {
                let maxint = match params.get("maxint") {
                    Some(value) => Some(
                        value
                            .trim()
                            .parse::<u64>()
                            .ok()
                            .filter(|&n| n > 0)
                            .ok_or_else(|| {
                                invalid("maxint", format!("'{}' is not a positive integer", value))
                            })?,
                    ),
                    None => None,
                };
                let asp_params = AspParams {
                    program: params.get("program").map(str::to_string),
                    file: params.get("file").map(Into::into),
                    maxint,
                };
                solver::asp(solver, diagrams, &asp_params)
            }
        }
    }
}
