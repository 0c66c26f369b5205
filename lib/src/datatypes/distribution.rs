//! Vote tallies of the voting operators.
//!
//! A leaf classification may carry a distribution map, e.g. `a {a:3,b:1}`,
//! which tells how many training examples ended in the leaf per class.
use std::{collections::BTreeMap, fmt::Display};

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, multispace0},
    combinator::{all_consuming, map, map_res},
    multi::separated_list0,
    sequence::{delimited, separated_pair},
    IResult,
};

use crate::error::{DiagramError, Result};

/// Mapping from a classification to its accumulated votes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally(BTreeMap<String, u64>);

impl Tally {
    /// Tally with a single vote for `class`.
    pub fn single<S: Into<String>>(class: S) -> Self {
        let mut tally = Self::default();
        tally.increment(class);
        tally
    }

    /// Adds one vote for `class`.
    pub fn increment<S: Into<String>>(&mut self, class: S) {
        let votes = self.0.entry(class.into()).or_insert(0);
        *votes = votes.saturating_add(1);
    }

    /// Adds all votes of `other`, class by class.
    ///
    /// Returns [VoteOverflow][DiagramError::VoteOverflow] if a sum does not fit into a `u64`;
    /// `self` is left unchanged in that case.
    pub fn add(&mut self, other: &Tally) -> Result<()> {
        let sums = other
            .0
            .iter()
            .map(|(class, &votes)| {
                self.votes(class)
                    .checked_add(votes)
                    .map(|sum| (class.clone(), sum))
                    .ok_or_else(|| DiagramError::VoteOverflow(class.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.0.extend(sums);
        Ok(())
    }

    /// Votes for `class`.
    pub fn votes(&self, class: &str) -> u64 {
        self.0.get(class).copied().unwrap_or(0)
    }

    /// Returns true if no class has been voted for.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Class with the most votes; ties are resolved in favour of the lexicographically smallest class.
    pub fn winner(&self) -> Option<&str> {
        self.0
            .iter()
            .fold(None, |best: Option<(&String, u64)>, (class, &votes)| match best {
                Some((_, best_votes)) if best_votes >= votes => best,
                _ => Some((class, votes)),
            })
            .map(|(class, _)| class.as_str())
    }

    /// All classes whose votes reach `eps` times the maximal votes, in lexicographic order.
    pub fn candidates(&self, eps: f64) -> Vec<&str> {
        let max = self.0.values().copied().max().unwrap_or(0);
        let bound = eps * max as f64;
        self.0
            .iter()
            .filter(|(_, &votes)| votes as f64 >= bound)
            .map(|(class, _)| class.as_str())
            .collect()
    }

    /// Extracts the distribution map of a classification string like `a {a:3,b:1}`.
    pub fn from_classification(classification: &str) -> Result<Self> {
        let missing = || DiagramError::MissingDistributionMap(classification.to_string());
        let open = classification.find('{').ok_or_else(missing)?;
        let close = classification.rfind('}').ok_or_else(missing)?;
        if close < open {
            return Err(missing());
        }
        all_consuming(Self::entries)(&classification[open + 1..close])
            .map(|(_, entries)| Self(entries.into_iter().collect()))
            .map_err(|_| missing())
    }

    /// The class part of a classification string, i.e. everything before the distribution map.
    pub fn class_of(classification: &str) -> &str {
        classification
            .find('{')
            .map(|pos| classification[..pos].trim())
            .unwrap_or(classification)
    }

    /// Classification string `class {c1:n1,...}` for this tally.
    pub fn classification(&self, class: &str) -> String {
        format!("{} {}", class, self)
    }

    fn entries(input: &str) -> IResult<&str, Vec<(String, u64)>> {
        delimited(
            multispace0,
            separated_list0(
                delimited(multispace0, tag(","), multispace0),
                separated_pair(
                    map(take_while1(|c: char| c != ':' && c != ','), |key: &str| {
                        key.trim().to_string()
                    }),
                    delimited(multispace0, tag(":"), multispace0),
                    map_res(digit1, str::parse::<u64>),
                ),
            ),
            multispace0,
        )(input)
    }
}

impl Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (pos, (class, votes)) in self.0.iter().enumerate() {
            if pos > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", class, votes)?;
        }
        write!(f, "}}")
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
