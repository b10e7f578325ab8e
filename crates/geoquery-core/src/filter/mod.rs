//! SQL-like attribute filters.
//!
//! A filter string such as `cat = 'A' AND NOT (height >= 20)` is tokenized,
//! parsed into an [`Expr`] tree and evaluated against one feature's
//! properties at a time. The evaluator can only look up properties and
//! apply the fixed operator set.
//!
//! Grammar (keywords are case-insensitive):
//!
//! ```text
//! expr       := or
//! or         := and ( OR and )*
//! and        := not ( AND not )*
//! not        := NOT not | comparison
//! comparison := primary ( ( = | != | <> | < | <= | > | >= ) primary )?
//! primary    := number | -number | 'string' | "string" | TRUE | FALSE | NULL
//!             | identifier | ( expr )
//! ```

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{CompareOp, Expr, Literal};
pub use eval::EvalError;

use crate::error::GeoqueryError;
use crate::models::Properties;
use thiserror::Error;

/// Filter string could not be tokenized or parsed
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message} (at position {position})")]
pub struct FilterSyntaxError {
    /// Byte offset in the filter string
    pub position: usize,
    pub message: String,
}

impl FilterSyntaxError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self { position, message: message.into() }
    }

    /// Attach the offending filter string for reporting to the caller
    pub fn into_query_error(self, filter: &str) -> GeoqueryError {
        GeoqueryError::InvalidFilterSyntax {
            filter: filter.to_string(),
            position: self.position,
            reason: self.message,
        }
    }
}

/// A compiled filter, built once and evaluated per feature
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    /// Compile a filter string into an expression tree
    pub fn compile(filter: &str) -> Result<Self, FilterSyntaxError> {
        let tokens = lexer::tokenize(filter)?;
        let expr = parser::parse(tokens, filter.len())?;

        Ok(Self { source: filter.to_string(), expr })
    }

    /// The filter string this predicate was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against one feature's properties
    pub fn evaluate(&self, properties: &Properties) -> Result<bool, EvalError> {
        eval::evaluate(&self.expr, properties)
    }

    /// Evaluate, treating an evaluation failure as "no match"
    pub fn matches(&self, properties: &Properties) -> bool {
        match self.evaluate(properties) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::trace!(filter = %self.source, error = %e, "Feature excluded by evaluation error");
                false
            }
        }
    }
}

impl std::str::FromStr for Predicate {
    type Err = FilterSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predicate::compile(s)
    }
}
