/*!
This library builds, rewrites, and merges `decision diagrams`.

# Decision diagrams
A `decision diagram` is a rooted, directed graph. Inner nodes test attributes of an instance;
each of their outgoing edges is guarded by a condition like `age<=30`, or is the `else` branch
which is taken if no other branch applies. Leaves carry a classification.
A decision tree is a decision diagram in which every node has at most one parent.

Several diagrams, e.g. decision trees learned from different data sets, can be merged into one:
- by majority voting, where every leaf of the result is classified like most of the inputs,
- by adding up the distribution maps `class {c1:n1,...}` stored in the leaves,
- by majority voting, overruled by user preferences like `sick >2> healthy`,
- by averaging the thresholds of two ordered binary trees,
- by an external logic-program solver, which gets all diagrams as facts.

To bring diagrams into the shape these merges expect, they can be unfolded into trees,
simplified, turned into binary trees, and ordered by the tested attributes.

# Input-file format
A diagram is given as a set of facts:
- `root(N)`: the node `N` is the root,
- `innernode(N)`: `N` is an inner node,
- `leafnode(N,C)`: `N` is a leaf with classification `C`,
- `conditionaledge(N1,N2,O1,Op,O2)`: an edge from `N1` to `N2`, guarded by `O1 Op O2` with `Op` one of `<`, `<=`, `=`, `>=`, `>`,
- `elseedge(N1,N2)`: the else branch from `N1` to `N2`.

Arguments are plain tokens or double-quoted strings, in which `\"` and `\\` stand for a quote and a
backslash; `%` starts a line comment.
*/

/*!
## Example input file:
```prolog
% is it warm enough to go swimming?
root(temp).
innernode(temp).
leafnode(yes,"swim").
leafnode(no,"stay").
conditionaledge(temp,yes,"temperature",">=","25").
elseedge(temp,no).
```
*/

/*!
## Usage examples
Parse two diagrams and merge them by majority voting.
```rust
use dd_merge::facts;
use dd_merge::merge::majority_vote;
use dd_merge::parser::parse_facts;
use std::collections::HashMap;

let first = "root(t). innernode(t). leafnode(y,\"swim\"). leafnode(n,\"stay\").
conditionaledge(t,y,\"temperature\",\">=\",\"25\"). elseedge(t,n).";
let second = "root(t). innernode(t). leafnode(y,\"swim\"). leafnode(n,\"stay\").
conditionaledge(t,y,\"temperature\",\">=\",\"20\"). elseedge(t,n).";
let first = facts::decode_atoms(&parse_facts(first).expect("valid facts")).expect("valid diagram");
let second = facts::decode_atoms(&parse_facts(second).expect("valid facts")).expect("valid diagram");

let merged = majority_vote(&[first, second]).expect("both are trees");
let instance: HashMap<String, String> =
    [("temperature".to_string(), "22".to_string())].into_iter().collect();
// one vote each, "stay" wins the tie
assert_eq!(merged.classify(&instance), Ok("stay"));
for fact in facts::encode(&merged).expect("encodable") {
    println!("{}", fact);
}
```

### Rewrite a diagram
```rust
use dd_merge::datatypes::{CmpOp, Condition};
use dd_merge::diagram::Diagram;
use dd_merge::rewrite::{binarize, order};
use std::collections::HashMap;

let mut dd = Diagram::new();
let root = dd.add_node("colour").unwrap();
let red = dd.add_leaf_node("red", "stop").unwrap();
let green = dd.add_leaf_node("green", "go").unwrap();
let other = dd.add_leaf_node("other", "wait").unwrap();
dd.add_edge(root, red, Condition::new("light", CmpOp::Eq, "red")).unwrap();
dd.add_edge(root, green, Condition::new("light", CmpOp::Eq, "green")).unwrap();
dd.add_else_edge(root, other).unwrap();
dd.set_root(root).unwrap();

let binary = binarize(&dd).expect("a tree");
let ordered = order(&binary).expect("a binary tree");
// one intermediate node takes the branches "red" and "else"
assert_eq!(ordered.node_count(), 5);
let instance: HashMap<String, String> =
    [("light".to_string(), "red".to_string())].into_iter().collect();
assert_eq!(ordered.classify(&instance), dd.classify(&instance));
```

### Use a named operator
```rust
use dd_merge::diagram::Diagram;
use dd_merge::operator::{Operator, Parameters};

let mut leaf = Diagram::new();
let root = leaf.add_leaf_node("l", "a {a:3,b:1}").unwrap();
leaf.set_root(root).unwrap();
let mut other = Diagram::new();
let root = other.add_leaf_node("l", "a {a:1,b:4}").unwrap();
other.set_root(root).unwrap();

let params: Parameters = [("eps", "1.0")].into_iter().collect();
let result = Operator::from_name("distributionmapvoting")
    .and_then(|op| op.apply(&[leaf, other], &params))
    .expect("valid call");
assert_eq!(result[0].classification(result[0].root().unwrap()), Ok("b {a:4,b:5}"));
```
*/
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

pub mod datatypes;
pub mod diagram;
pub mod dot;
pub mod error;
pub mod facts;
pub mod merge;
pub mod operator;
pub mod parser;
pub mod rewrite;
pub mod solver;
#[cfg(test)]
mod test;
