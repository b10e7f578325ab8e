//! Tree-walking evaluator for filter expressions
//!
//! Property values are coerced per evaluation: strings that parse as
//! floats compare as numbers, because the same key may hold `"12"` in one
//! feature and `12` in the next.

use std::borrow::Cow;
use std::cmp::Ordering;
use thiserror::Error;

use super::ast::{CompareOp, Expr, Literal};
use crate::models::{Properties, PropertyValue};

/// Per-feature evaluation failure; the feature is excluded from results
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("cannot apply '{op}' to {left} and {right}")]
    Incomparable {
        op: CompareOp,
        left: &'static str,
        right: &'static str,
    },
}

/// Evaluate an expression as a boolean against one feature's properties
pub fn evaluate(expr: &Expr, properties: &Properties) -> Result<bool, EvalError> {
    match expr {
        Expr::Literal(_) | Expr::PropertyRef(_) => Ok(operand(expr, properties)?.truthy()),
        Expr::Compare { left, op, right } => {
            let left = operand(left, properties)?;
            let right = operand(right, properties)?;
            compare(&left, *op, &right)
        }
        Expr::And(left, right) => {
            Ok(evaluate(left, properties)? && evaluate(right, properties)?)
        }
        Expr::Or(left, right) => Ok(evaluate(left, properties)? || evaluate(right, properties)?),
        Expr::Not(inner) => Ok(!evaluate(inner, properties)?),
    }
}

/// Runtime value of one side of a comparison
#[derive(Debug, Clone, PartialEq)]
enum Operand<'a> {
    /// Key missing from the feature
    Absent,
    Null,
    Bool(bool),
    Number(f64),
    Text(Cow<'a, str>),
    Composite(&'a serde_json::Value),
}

impl<'a> Operand<'a> {
    fn from_property(value: &'a PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Operand::Null,
            PropertyValue::Bool(b) => Operand::Bool(*b),
            PropertyValue::Int(i) => Operand::Number(*i as f64),
            PropertyValue::Float(f) => Operand::Number(*f),
            PropertyValue::Str(s) => Operand::from_text(Cow::Borrowed(s)),
            PropertyValue::Json(v) => Operand::Composite(v),
        }
    }

    /// Quoted literals are coerced like property text, so `'3'` equals `3`
    fn from_literal(literal: &'a Literal) -> Self {
        match literal {
            Literal::Null => Operand::Null,
            Literal::Bool(b) => Operand::Bool(*b),
            Literal::Number(n) => Operand::Number(*n),
            Literal::String(s) => Operand::from_text(Cow::Borrowed(s)),
        }
    }

    fn from_text(text: Cow<'a, str>) -> Self {
        match text.trim().parse::<f64>() {
            Ok(n) => Operand::Number(n),
            Err(_) => Operand::Text(text),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Operand::Absent => "missing value",
            Operand::Null => "NULL",
            Operand::Bool(_) => "boolean",
            Operand::Number(_) => "number",
            Operand::Text(_) => "string",
            Operand::Composite(_) => "object",
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Operand::Absent | Operand::Null => false,
            Operand::Bool(b) => *b,
            Operand::Number(n) => *n != 0.0,
            Operand::Text(s) => !s.is_empty(),
            Operand::Composite(v) => match v {
                serde_json::Value::Array(items) => !items.is_empty(),
                serde_json::Value::Object(map) => !map.is_empty(),
                other => !other.is_null(),
            },
        }
    }
}

fn operand<'a>(expr: &'a Expr, properties: &'a Properties) -> Result<Operand<'a>, EvalError> {
    match expr {
        Expr::Literal(literal) => Ok(Operand::from_literal(literal)),
        Expr::PropertyRef(key) => {
            Ok(properties.get(key).map_or(Operand::Absent, Operand::from_property))
        }
        // A boolean sub-expression used as a comparison operand
        _ => evaluate(expr, properties).map(Operand::Bool),
    }
}

fn compare(left: &Operand<'_>, op: CompareOp, right: &Operand<'_>) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (Operand::Absent, _) | (_, Operand::Absent) => return Ok(false),
        (Operand::Number(a), Operand::Number(b)) => a.partial_cmp(b),
        (Operand::Bool(a), Operand::Bool(b)) => Some(a.cmp(b)),
        (Operand::Bool(a), Operand::Number(b)) => bool_number(*a).partial_cmp(b),
        (Operand::Number(a), Operand::Bool(b)) => a.partial_cmp(&bool_number(*b)),
        (Operand::Text(a), Operand::Text(b)) => Some(a.cmp(b)),
        (Operand::Null, Operand::Null) => return equality_only(op, true, left, right),
        (Operand::Composite(a), Operand::Composite(b)) => {
            return equality_only(op, a == b, left, right)
        }
        _ => return equality_only(op, false, left, right),
    };

    Ok(match ordering {
        Some(ordering) => apply(op, ordering),
        // NaN: unequal to everything, unordered
        None => op == CompareOp::NotEq,
    })
}

fn bool_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Operands that only support `=` and `!=`
fn equality_only(
    op: CompareOp,
    equal: bool,
    left: &Operand<'_>,
    right: &Operand<'_>,
) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(equal),
        CompareOp::NotEq => Ok(!equal),
        _ => Err(EvalError::Incomparable { op, left: left.kind(), right: right.kind() }),
    }
}

fn apply(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::LtEq => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::GtEq => ordering != Ordering::Less,
    }
}
