//! Recursive-descent parser producing an [`Expr`] tree

use super::ast::{CompareOp, Expr, Literal};
use super::lexer::{Token, TokenKind};
use super::FilterSyntaxError;

/// Deepest expression tree the parser builds
///
/// Every `NOT`, `(` and chained `AND`/`OR` adds a level, so evaluation
/// never recurses further than this.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse a token stream; `input_len` positions end-of-input errors
pub fn parse(tokens: Vec<Token>, input_len: usize) -> Result<Expr, FilterSyntaxError> {
    let mut parser = Parser { tokens, pos: 0, depth: 0, input_len };

    if parser.tokens.is_empty() {
        return Err(FilterSyntaxError::new(0, "empty filter expression"));
    }

    let expr = parser.parse_or()?;

    if let Some(token) = parser.peek() {
        return Err(FilterSyntaxError::new(
            token.position,
            format!("unexpected {}", describe(&token.kind)),
        ));
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self, position: usize) -> Result<(), FilterSyntaxError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(FilterSyntaxError::new(
                position,
                format!("expression nests deeper than {} levels", MAX_NESTING_DEPTH),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Position of the next token if it is of the given kind
    fn peek_position(&self, kind: &TokenKind) -> Option<usize> {
        self.peek().filter(|t| &t.kind == kind).map(|t| t.position)
    }

    fn error_here(&self, message: impl Into<String>) -> FilterSyntaxError {
        let position = self.peek().map_or(self.input_len, |t| t.position);
        FilterSyntaxError::new(position, message)
    }

    /// Parse OR expressions (lowest precedence)
    fn parse_or(&mut self) -> Result<Expr, FilterSyntaxError> {
        let start = self.depth;
        let mut left = self.parse_and()?;

        while let Some(position) = self.peek_position(&TokenKind::Or) {
            self.descend(position)?;
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }

        self.depth = start;
        Ok(left)
    }

    /// Parse AND expressions
    fn parse_and(&mut self) -> Result<Expr, FilterSyntaxError> {
        let start = self.depth;
        let mut left = self.parse_not()?;

        while let Some(position) = self.peek_position(&TokenKind::And) {
            self.descend(position)?;
            self.pos += 1;
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }

        self.depth = start;
        Ok(left)
    }

    /// Parse NOT prefixes
    fn parse_not(&mut self) -> Result<Expr, FilterSyntaxError> {
        if let Some(position) = self.peek_position(&TokenKind::Not) {
            self.descend(position)?;
            self.pos += 1;
            let inner = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }

        self.parse_comparison()
    }

    /// Parse a single optional comparison between two primaries
    fn parse_comparison(&mut self) -> Result<Expr, FilterSyntaxError> {
        let left = self.parse_primary()?;

        let Some(op) = self.peek_kind().and_then(compare_op) else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.parse_primary()?;

        if self.peek_kind().and_then(compare_op).is_some() {
            return Err(self.error_here("chained comparisons are not supported; combine with AND"));
        }

        Ok(Expr::compare(left, op, right))
    }

    /// Parse literals, property references and parenthesized groups
    fn parse_primary(&mut self) -> Result<Expr, FilterSyntaxError> {
        let Some(token) = self.advance() else {
            return Err(self.error_here("unexpected end of expression"));
        };

        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(Literal::Number(n))),
            TokenKind::Minus => match self.advance() {
                Some(Token { kind: TokenKind::Number(n), .. }) => {
                    Ok(Expr::Literal(Literal::Number(-n)))
                }
                _ => Err(FilterSyntaxError::new(token.position, "expected a number after '-'")),
            },
            TokenKind::String(s) => Ok(Expr::Literal(Literal::String(s))),
            TokenKind::True => Ok(Expr::Literal(Literal::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Literal::Bool(false))),
            TokenKind::Null => Ok(Expr::Literal(Literal::Null)),
            TokenKind::Identifier(name) => Ok(Expr::PropertyRef(name)),
            TokenKind::LeftParen => {
                self.descend(token.position)?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token { kind: TokenKind::RightParen, .. }) => Ok(inner),
                    Some(other) => Err(FilterSyntaxError::new(
                        other.position,
                        format!("expected ')' but found {}", describe(&other.kind)),
                    )),
                    None => Err(FilterSyntaxError::new(
                        self.input_len,
                        format!("unclosed '(' opened at position {}", token.position),
                    )),
                }
            }
            other => Err(FilterSyntaxError::new(
                token.position,
                format!("expected a value, property or '(' but found {}", describe(&other)),
            )),
        }
    }
}

fn compare_op(kind: &TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::Equal => Some(CompareOp::Eq),
        TokenKind::NotEqual => Some(CompareOp::NotEq),
        TokenKind::LessThan => Some(CompareOp::Lt),
        TokenKind::LessThanOrEqual => Some(CompareOp::LtEq),
        TokenKind::GreaterThan => Some(CompareOp::Gt),
        TokenKind::GreaterThanOrEqual => Some(CompareOp::GtEq),
        _ => None,
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::String(s) => format!("string '{}'", s),
        TokenKind::Identifier(name) => format!("identifier '{}'", name),
        TokenKind::True => "TRUE".to_string(),
        TokenKind::False => "FALSE".to_string(),
        TokenKind::Null => "NULL".to_string(),
        TokenKind::And => "AND".to_string(),
        TokenKind::Or => "OR".to_string(),
        TokenKind::Not => "NOT".to_string(),
        TokenKind::LeftParen => "'('".to_string(),
        TokenKind::RightParen => "')'".to_string(),
        TokenKind::Minus => "'-'".to_string(),
        op => match compare_op(op) {
            Some(op) => format!("operator '{}'", op),
            None => format!("{:?}", op),
        },
    }
}
