/*!
Single-diagram rewrites.

- [unfold] turns a DAG into a tree by duplicating shared sub-diagrams,
- [simplify] removes redundant tests and shares equal sub-diagrams,
- [binarize] turns a tree into a binary tree with one conditional and one else branch per node,
- [order] reorders a binary tree such that attributes are tested in lexicographic order on every path.

Every rewrite works on a copy and returns it; the given diagram is never modified.
An empty diagram is returned unchanged.
 */
mod binarize;
mod order;
mod simplify;
mod unfold;

pub use binarize::binarize;
pub(crate) use order::binary_edges;
pub use order::{order, tested_attribute};
pub use simplify::simplify;
pub use unfold::unfold;
