use crate::{
    datatypes::{NodeId, Tally},
    diagram::Diagram,
    error::{DiagramError, Result},
};

use super::{ensure_trees, Accumulator, UNKNOWN};

/// Merges two trees whose leaf classifications carry distribution maps, e.g. `a {a:3,b:1}`.
///
/// The distribution maps met on the way to a leaf of the result are added up class by class;
/// the leaf is classified with the class of most votes (ties go to the lexicographically smallest
/// class), followed by the summed distribution map.
///
/// With `eps < 1`, every class reaching `eps` times the maximal votes of a leaf is a candidate
/// for that leaf, and one diagram is returned per combination of candidates.
/// `eps` has to be in `(0, 1]`, otherwise [InvalidParameter][DiagramError::InvalidParameter] is returned.
pub fn distribution_vote(first: &Diagram, second: &Diagram, eps: f64) -> Result<Vec<Diagram>> {
    if !(eps > 0.0 && eps <= 1.0) {
        return Err(DiagramError::InvalidParameter {
            key: "eps".to_string(),
            reason: format!("{} is not in (0,1]", eps),
        });
    }
    ensure_trees(&[first, second])?;
    log::info!("[Start] distribution map vote, eps = {}", eps);
    let mut accumulator = Accumulator::new(first, Tally::from_classification)?;
    accumulator.graft(second, |former, classification| {
        let mut tally = former.clone();
        tally.add(&Tally::from_classification(classification)?)?;
        Ok(tally)
    })?;

    let result = if eps < 1.0 {
        let leaves: Vec<(NodeId, Vec<String>)> = accumulator
            .leaves()
            .into_iter()
            .map(|(leaf, tally)| {
                let mut candidates: Vec<String> = tally
                    .candidates(eps)
                    .into_iter()
                    .map(|class| tally.classification(class))
                    .collect();
                if candidates.is_empty() {
                    candidates.push(tally.classification(UNKNOWN));
                }
                (leaf, candidates)
            })
            .collect();
        let mut working = accumulator.diagram().clone();
        let mut result = Vec::new();
        enumerate(&mut working, &leaves, &mut result)?;
        result
    } else {
        vec![accumulator.finish(|tally| {
            Ok(tally.classification(tally.winner().unwrap_or(UNKNOWN)))
        })?]
    };
    log::info!("[Done] distribution map vote: {} diagram(s)", result.len());
    Ok(result)
}

/// Picks each candidate of the first leaf in turn and recurses on the remaining leaves.
fn enumerate(
    working: &mut Diagram,
    leaves: &[(NodeId, Vec<String>)],
    result: &mut Vec<Diagram>,
) -> Result<()> {
    match leaves.split_first() {
        None => {
            result.push(working.clone());
            Ok(())
        }
        Some(((leaf, candidates), rest)) => {
            for candidate in candidates {
                working.set_classification(*leaf, candidate.as_str())?;
                enumerate(working, rest, result)?;
            }
            Ok(())
        }
    }
}
