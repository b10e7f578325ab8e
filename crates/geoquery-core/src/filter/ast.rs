use std::fmt;

/// Literal value written in a filter
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(symbol)
    }
}

/// Filter expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Reference to a feature property by key
    PropertyRef(String),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Expr::Compare { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn property(key: impl Into<String>) -> Self {
        Expr::PropertyRef(key.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Expr::Literal(Literal::Number(value))
    }

    /// Property keys referenced anywhere in the expression
    pub fn referenced_properties(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_properties(&mut keys);
        keys
    }

    fn collect_properties<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::PropertyRef(key) => {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
            Expr::Compare { left, right, .. } | Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_properties(keys);
                right.collect_properties(keys);
            }
            Expr::Not(inner) => inner.collect_properties(keys),
        }
    }
}
