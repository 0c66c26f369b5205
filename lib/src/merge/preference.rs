use std::{fmt::Display, str::FromStr};

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt},
    sequence::{delimited, terminated, tuple},
    IResult,
};

use crate::{
    datatypes::Tally,
    diagram::Diagram,
    error::{DiagramError, Result},
};

use super::{majority::accumulate, UNKNOWN};

/// A user preference between two classes.
///
/// Written `A > B` (prefer `A` over `B` whenever `A` got any vote) or `A >N> B`
/// (prefer `A` over `B` if `A` got at least `N` votes more than `B`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceRule {
    preferred: String,
    over: String,
    min_diff: Option<u64>,
}

impl PreferenceRule {
    /// The preferred class.
    pub fn preferred(&self) -> &str {
        &self.preferred
    }

    /// The class which is overruled.
    pub fn over(&self) -> &str {
        &self.over
    }

    /// The required lead in votes, if any.
    pub fn min_diff(&self) -> Option<u64> {
        self.min_diff
    }

    /// Returns true if the rule replaces `current` by the preferred class, given the votes.
    fn applies(&self, current: &str, tally: &Tally) -> bool {
        let preferred = tally.votes(&self.preferred);
        current == self.over
            && preferred > 0
            && self.min_diff.map_or(true, |diff| {
                preferred >= tally.votes(&self.over).saturating_add(diff)
            })
    }

    /// Starts with the majority winner and applies all rules in order.
    pub fn choose<'a>(rules: &'a [PreferenceRule], tally: &'a Tally) -> &'a str {
        let mut current = tally.winner().unwrap_or(UNKNOWN);
        for rule in rules {
            if rule.applies(current, tally) {
                log::trace!("{} overrules {}", rule, current);
                current = &rule.preferred;
            }
        }
        current
    }

    fn class_name(input: &str) -> IResult<&str, String> {
        map(take_while1(|c: char| c != '>'), |name: &str| {
            name.trim().to_string()
        })(input)
    }

    fn rule(input: &str) -> IResult<&str, (String, Option<u64>, String)> {
        tuple((
            terminated(Self::class_name, tag(">")),
            opt(terminated(
                delimited(
                    multispace0,
                    map_res(digit1, str::parse::<u64>),
                    multispace0,
                ),
                tag(">"),
            )),
            Self::class_name,
        ))(input)
    }
}

impl FromStr for PreferenceRule {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DiagramError::InvalidUserPreferenceRule(s.to_string());
        let (_, (preferred, min_diff, over)) = all_consuming(Self::rule)(s).map_err(|_| invalid())?;
        if preferred.is_empty() || over.is_empty() || min_diff == Some(0) {
            return Err(invalid());
        }
        Ok(Self {
            preferred,
            over,
            min_diff,
        })
    }
}

impl Display for PreferenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.min_diff {
            Some(diff) => write!(f, "{} >{}> {}", self.preferred, diff, self.over),
            None => write!(f, "{} > {}", self.preferred, self.over),
        }
    }
}

/// Merges the trees like [majority_vote][super::majority_vote], but lets the rules overrule the
/// winner of a leaf. Later rules are applied to the outcome of earlier ones.
pub fn user_preference(diagrams: &[Diagram], rules: &[PreferenceRule]) -> Result<Diagram> {
    log::info!(
        "[Start] user preferences on {} diagrams with {} rules",
        diagrams.len(),
        rules.len()
    );
    let accumulator = accumulate("userpreferences", diagrams)?;
    let result =
        accumulator.finish(|tally| Ok(PreferenceRule::choose(rules, tally).to_string()))?;
    log::info!("[Done] user preferences: {} leaves", result.leaf_count());
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    fn leaf(class: &str) -> Diagram {
        let mut dd = Diagram::new();
        let only = dd.add_leaf_node("only", class).unwrap();
        dd.set_root(only).unwrap();
        dd
    }

    fn rules(texts: &[&str]) -> Vec<PreferenceRule> {
        texts.iter().map(|text| text.parse().unwrap()).collect()
    }

    #[test]
    fn parse_rules() {
        let rule: PreferenceRule = "sick > healthy".parse().unwrap();
        assert_eq!(rule.preferred(), "sick");
        assert_eq!(rule.over(), "healthy");
        assert_eq!(rule.min_diff(), None);
        let rule: PreferenceRule = "a >2> b".parse().unwrap();
        assert_eq!(rule.min_diff(), Some(2));
        assert_eq!(rule.to_string(), "a >2> b");
        let rule: PreferenceRule = " a > 3 > b ".parse().unwrap();
        assert_eq!((rule.preferred(), rule.min_diff(), rule.over()), ("a", Some(3), "b"));

        for broken in ["a", "a > ", "> b", "a >0> b", "a >> b", "a > b > c", "a >x> b"] {
            assert_eq!(
                broken.parse::<PreferenceRule>(),
                Err(DiagramError::InvalidUserPreferenceRule(broken.into())),
                "{}",
                broken
            );
        }
    }

    #[test]
    fn rules_apply_in_order() {
        let tally: Tally = [("a", 2), ("b", 3), ("c", 1)].into_iter().collect();
        assert_eq!(PreferenceRule::choose(&[], &tally), "b");
        assert_eq!(PreferenceRule::choose(&rules(&["c > b"]), &tally), "c");
        assert_eq!(
            PreferenceRule::choose(&rules(&["c > b", "a >1> c"]), &tally),
            "a"
        );
        assert_eq!(
            PreferenceRule::choose(&rules(&["a >1> c", "c > b"]), &tally),
            "c"
        );
        assert_eq!(PreferenceRule::choose(&rules(&["a >2> b"]), &tally), "b");
        // a class without votes is never chosen
        assert_eq!(PreferenceRule::choose(&rules(&["d > b"]), &tally), "b");
    }

    #[test]
    fn merge_with_preferences() {
        let inputs = [leaf("healthy"), leaf("healthy"), leaf("sick")];
        let merged = user_preference(&inputs, &[]).unwrap();
        assert_eq!(merged.classification(merged.root().unwrap()), Ok("healthy"));
        let merged = user_preference(&inputs, &rules(&["sick > healthy"])).unwrap();
        assert_eq!(merged.classification(merged.root().unwrap()), Ok("sick"));
        let merged = user_preference(&inputs, &rules(&["sick >1> healthy"])).unwrap();
        assert_eq!(merged.classification(merged.root().unwrap()), Ok("healthy"));
        assert!(matches!(
            user_preference(&[], &[]),
            Err(DiagramError::ArityMismatch { .. })
        ));
    }
}
