//! Edge guards of a decision diagram.
//!
//! A [Condition] compares two operands with a [CmpOp], or is the `else` fallback of a node.
//! One of the operands is usually the name of an attribute, the other one a number.
use std::{cmp::Ordering, collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};
use strum::{EnumString, EnumVariantNames};

use crate::error::{DiagramError, Result};

/// Comparison operators of a [Condition].
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumVariantNames,
)]
pub enum CmpOp {
    /// `<`
    #[strum(serialize = "<")]
    Lt,
    /// `<=`
    #[strum(serialize = "<=")]
    Le,
    /// `=`
    #[strum(serialize = "=")]
    Eq,
    /// `>=`
    #[strum(serialize = ">=")]
    Ge,
    /// `>`
    #[strum(serialize = ">")]
    Gt,
    /// The "otherwise" branch of a node.
    #[strum(disabled)]
    Else,
}

impl CmpOp {
    /// Parses one of the five comparison symbols; `else` is not a comparator.
    pub fn comparator(symbol: &str) -> Result<Self> {
        symbol
            .parse()
            .map_err(|_| DiagramError::UnrecognizedOperator(symbol.to_string()))
    }

    /// The comparator which holds, if the operands are swapped.
    pub fn inverse(self) -> Self {
        match self {
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
            op => op,
        }
    }

    /// The textual symbol of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Eq => "=",
            CmpOp::Ge => ">=",
            CmpOp::Gt => ">",
            CmpOp::Else => "else",
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ge => ord != Ordering::Less,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Else => true,
        }
    }
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Interprets a textual operand as a number.
/// Surrounding quotes and whitespace are ignored; only finite values count as numbers.
pub fn as_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|val| val.is_finite())
}

/// Guard of an edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    operand1: String,
    operand2: String,
    op: CmpOp,
}

impl Condition {
    /// Creates a new condition `operand1 op operand2`.
    pub fn new<S: Into<String>, T: Into<String>>(operand1: S, op: CmpOp, operand2: T) -> Self {
        Self {
            operand1: operand1.into(),
            operand2: operand2.into(),
            op,
        }
    }

    /// The `else` condition.
    pub fn else_branch() -> Self {
        Self::new("", CmpOp::Else, "")
    }

    /// Returns true if this is the `else` condition.
    pub fn is_else(&self) -> bool {
        self.op == CmpOp::Else
    }

    /// First operand.
    pub fn operand1(&self) -> &str {
        &self.operand1
    }

    /// Second operand.
    pub fn operand2(&self) -> &str {
        &self.operand2
    }

    /// Comparison operator.
    pub fn op(&self) -> CmpOp {
        self.op
    }

    fn operands_as_numbers(&self) -> Result<(Option<f64>, Option<f64>)> {
        let lhs = as_number(&self.operand1);
        let rhs = as_number(&self.operand2);
        if lhs.is_some() == rhs.is_some() {
            Err(DiagramError::MalformedCondition(self.to_string()))
        } else {
            Ok((lhs, rhs))
        }
    }

    /// The non-numeric operand, i.e. the tested attribute.
    pub fn attribute(&self) -> Result<&str> {
        match self.operands_as_numbers()? {
            (Some(_), _) => Ok(&self.operand2),
            _ => Ok(&self.operand1),
        }
    }

    /// The numeric operand, i.e. the threshold the attribute is compared with.
    pub fn compare_value(&self) -> Result<f64> {
        match self.operands_as_numbers()? {
            (Some(val), _) | (None, Some(val)) => Ok(val),
            (None, None) => Err(DiagramError::MalformedCondition(self.to_string())),
        }
    }

    /// Copy of the condition with the numeric operand replaced by `value`.
    /// Orientation and operator are kept.
    pub fn with_compare_value(&self, value: f64) -> Result<Self> {
        let mut result = self.clone();
        match self.operands_as_numbers()? {
            (Some(_), _) => result.operand1 = value.to_string(),
            _ => result.operand2 = value.to_string(),
        }
        Ok(result)
    }

    /// Evaluates the condition for an instance, mapping attribute names to values.
    /// Operands which are not attributes of the instance are taken literally.
    /// Two numbers are compared numerically, everything else as strings.
    pub fn holds(&self, instance: &HashMap<String, String>) -> bool {
        if self.is_else() {
            return true;
        }
        let lhs = instance
            .get(&self.operand1)
            .map(String::as_str)
            .unwrap_or(&self.operand1);
        let rhs = instance
            .get(&self.operand2)
            .map(String::as_str)
            .unwrap_or(&self.operand2);
        let ord = match (as_number(lhs), as_number(rhs)) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => Some(lhs.cmp(rhs)),
        };
        ord.map(|ord| self.op.accepts(ord)).unwrap_or(false)
    }

    /// Key used whenever sibling conditions need a deterministic order;
    /// conditional edges sort before the `else` edge.
    pub fn sort_key(&self) -> (bool, String) {
        (self.is_else(), self.to_string())
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self.op, other.op) {
            (CmpOp::Else, CmpOp::Else) => true,
            (CmpOp::Else, _) | (_, CmpOp::Else) => false,
            (CmpOp::Eq, CmpOp::Eq) => {
                (self.operand1 == other.operand1 && self.operand2 == other.operand2)
                    || (self.operand1 == other.operand2 && self.operand2 == other.operand1)
            }
            (lhs, rhs) => {
                (lhs == rhs
                    && self.operand1 == other.operand1
                    && self.operand2 == other.operand2)
                    || (lhs.inverse() == rhs
                        && lhs != CmpOp::Eq
                        && self.operand1 == other.operand2
                        && self.operand2 == other.operand1)
            }
        }
    }
}

impl Eq for Condition {}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_else() {
            write!(f, "else")
        } else {
            write!(f, "{}{}{}", self.operand1, self.op, self.operand2)
        }
    }
}
