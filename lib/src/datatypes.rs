//! Value types shared by the graph model, the rewrite and merge engines, and the exchange codec.
//! This module consists of the node and edge handles [NodeId] and [EdgeId], edge guards ([Condition]),
//! and the vote tallies ([Tally]) used by the voting operators.
pub mod condition;
pub mod distribution;
mod ids;

pub use condition::{CmpOp, Condition};
pub use distribution::Tally;
pub use ids::{EdgeId, NodeId};
