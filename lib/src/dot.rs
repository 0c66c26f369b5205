//! Decision diagram to DOT (Graphviz) conversion.
//!
//! The output follows these conventions:
//! - inner nodes are ellipses labelled with their label,
//! - leaves are boxes labelled `label [classification]`,
//! - the root is drawn with a double border,
//! - conditional edges are solid and labelled with their condition, else edges are dashed.
//!
//! ```
//! use dd_merge::datatypes::{CmpOp, Condition};
//! use dd_merge::diagram::Diagram;
//!
//! let mut dd = Diagram::new();
//! let root = dd.add_node("age").unwrap();
//! let young = dd.add_leaf_node("young", "no").unwrap();
//! let old = dd.add_leaf_node("old", "yes").unwrap();
//! dd.add_edge(root, young, Condition::new("age", CmpOp::Lt, "30")).unwrap();
//! dd.add_else_edge(root, old).unwrap();
//! dd.set_root(root).unwrap();
//!
//! let dot = dd.to_dot().unwrap();
//! assert!(dot.starts_with("digraph {"));
//! // Render with: dot -Tpng output.dot -o output.png
//! ```
use std::fmt::Write as _;

use crate::diagram::Diagram;

/// Visual settings of the DOT output.
#[derive(Debug, Copy, Clone)]
pub struct DotConfig {
    /// Shape of inner nodes (default: "ellipse")
    pub node_shape: &'static str,
    /// Shape of leaves (default: "box")
    pub leaf_shape: &'static str,
    /// Peripheries of the root node (default: 2)
    pub root_peripheries: u8,
    /// Style of conditional edges (default: "solid")
    pub conditional_edge_style: &'static str,
    /// Style of else edges (default: "dashed")
    pub else_edge_style: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "ellipse",
            leaf_shape: "box",
            root_peripheries: 2,
            conditional_edge_style: "solid",
            else_edge_style: "dashed",
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Diagram {
    /// Converts the diagram to DOT with the default settings.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the diagram to DOT.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        for node in self.nodes() {
            let entry = match self.node(node) {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let peripheries = if self.root() == Some(node) {
                config.root_peripheries
            } else {
                1
            };
            match entry.classification() {
                Some(classification) => writeln!(
                    dot,
                    "  \"{}\" [shape={}, peripheries={}, label=\"{} [{}]\"];",
                    escape(entry.label()),
                    config.leaf_shape,
                    peripheries,
                    escape(entry.label()),
                    escape(classification)
                )?,
                None => writeln!(
                    dot,
                    "  \"{}\" [shape={}, peripheries={}];",
                    escape(entry.label()),
                    config.node_shape,
                    peripheries
                )?,
            }
        }
        for edge in self.edges() {
            let edge = match self.edge(edge) {
                Ok(edge) => edge,
                Err(_) => continue,
            };
            let (from, to) = match (self.label(edge.from()), self.label(edge.to())) {
                (Ok(from), Ok(to)) => (escape(from), escape(to)),
                _ => continue,
            };
            let style = if edge.is_else() {
                config.else_edge_style
            } else {
                config.conditional_edge_style
            };
            writeln!(
                dot,
                "  \"{}\" -> \"{}\" [style={}, label=\"{}\"];",
                from,
                to,
                style,
                escape(&edge.condition().to_string())
            )?;
        }
        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
