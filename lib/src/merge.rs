/*!
Merging of several decision trees into one.

The voting operators share one primitive, grafting at the leaves: the first input is copied,
and every further input is copied once into each current leaf of the result.
While grafting, every leaf carries a [Tally] of the classifications seen on its way,
which finally decides the classification of the leaf.

- [majority_vote] counts one vote per tree,
- [distribution_vote] adds up the distribution maps stored in the leaf classifications,
- [user_preference] counts like [majority_vote], but lets user rules overrule the winner,
- [average] merges two ordered binary trees structurally, averaging the thresholds of equal tests.

All inputs have to be trees; they are never modified.
 */
mod average;
mod distribution;
mod majority;
mod preference;

pub use average::average;
pub use distribution::distribution_vote;
pub use majority::majority_vote;
pub use preference::{user_preference, PreferenceRule};

use std::collections::HashMap;

use crate::{
    datatypes::{NodeId, Tally},
    diagram::Diagram,
    error::Result,
};

/// Classification used whenever the inputs give no reason to prefer any class.
pub const UNKNOWN: &str = "unknown";

/// A diagram under construction together with the tallies of its leaves.
#[derive(Debug)]
pub(crate) struct Accumulator {
    diagram: Diagram,
    tallies: HashMap<NodeId, Tally>,
}

impl Accumulator {
    /// Starts with the part of `first` reachable from its root;
    /// `initial` computes the tally of a leaf from its classification.
    pub(crate) fn new<F>(first: &Diagram, initial: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Tally>,
    {
        let mut diagram = Diagram::new();
        diagram.partial_add_diagram(first, first.root_or_err()?)?;
        let tallies = diagram
            .leaves()
            .into_iter()
            .map(|leaf| Ok((leaf, initial(diagram.classification(leaf)?)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { diagram, tallies })
    }

    /// Replaces every leaf of the accumulated diagram by a copy of `input`.
    /// `update` computes the tally of a new leaf from the tally of the replaced leaf
    /// and the classification of the new leaf.
    pub(crate) fn graft<F>(&mut self, input: &Diagram, update: F) -> Result<()>
    where
        F: Fn(&Tally, &str) -> Result<Tally>,
    {
        let mut template = Diagram::new();
        template.partial_add_diagram(input, input.root_or_err()?)?;
        for leaf in self.diagram.leaves() {
            let former = self.tallies.remove(&leaf).unwrap_or_default();
            let mut copy = template.clone();
            copy.use_unique_labels(&self.diagram);
            let root = self.diagram.add_diagram(&copy)?;
            log::trace!(
                "graft copy at {} onto leaf {}",
                self.diagram.label(root)?,
                self.diagram.label(leaf)?
            );
            for node in self.diagram.reachable_from(root)? {
                if let Ok(classification) = self.diagram.classification(node) {
                    let tally = update(&former, classification)?;
                    self.tallies.insert(node, tally);
                }
            }
            self.diagram.redirect(leaf, root)?;
            self.diagram.remove_node(leaf, false)?;
        }
        Ok(())
    }

    /// Leaves of the accumulated diagram with their tallies, in insertion order.
    pub(crate) fn leaves(&self) -> Vec<(NodeId, Tally)> {
        self.diagram
            .leaves()
            .into_iter()
            .map(|leaf| (leaf, self.tallies.get(&leaf).cloned().unwrap_or_default()))
            .collect()
    }

    /// Sets the classification of every leaf to the result of `decide` on its tally.
    pub(crate) fn finish<F>(mut self, decide: F) -> Result<Diagram>
    where
        F: Fn(&Tally) -> Result<String>,
    {
        for (leaf, tally) in self.leaves() {
            let classification = decide(&tally)?;
            self.diagram.set_classification(leaf, classification)?;
        }
        Ok(self.diagram)
    }

    /// The accumulated diagram, classifications untouched.
    pub(crate) fn diagram(&self) -> &Diagram {
        &self.diagram
    }
}

/// Fails with [NotATree][crate::error::DiagramError::NotATree] or
/// [EmptyDiagram][crate::error::DiagramError::EmptyDiagram] unless every input is a non-empty tree.
pub(crate) fn ensure_trees(diagrams: &[&Diagram]) -> Result<()> {
    for diagram in diagrams {
        diagram.root_or_err()?;
        diagram.ensure_tree()?;
    }
    Ok(())
}
