//! Tokenizer for filter strings

use std::iter::Peekable;
use std::str::CharIndices;

use super::FilterSyntaxError;

/// Token types in a filter string
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(String),
    True,
    False,
    Null,

    // Identifiers
    Identifier(String),

    // Keywords
    And,
    Or,
    Not,

    // Operators
    Equal,              // =
    NotEqual,           // !=, <>
    LessThan,           // <
    LessThanOrEqual,    // <=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
    Minus,              // unary -

    // Punctuation
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token start
    pub position: usize,
}

/// Split a filter string into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, FilterSyntaxError> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, chars: input.char_indices().peekable() }
    }

    fn run(mut self) -> Result<Vec<Token>, FilterSyntaxError> {
        let mut tokens = Vec::new();

        while let Some(&(position, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }

            let kind = match c {
                '(' => self.single(TokenKind::LeftParen),
                ')' => self.single(TokenKind::RightParen),
                '-' => self.single(TokenKind::Minus),
                '=' => {
                    self.chars.next();
                    // Tolerate the C-style spelling
                    self.eat('=');
                    TokenKind::Equal
                }
                '!' => {
                    self.chars.next();
                    if !self.eat('=') {
                        return Err(FilterSyntaxError::new(position, "expected '=' after '!'"));
                    }
                    TokenKind::NotEqual
                }
                '<' => {
                    self.chars.next();
                    if self.eat('=') {
                        TokenKind::LessThanOrEqual
                    } else if self.eat('>') {
                        TokenKind::NotEqual
                    } else {
                        TokenKind::LessThan
                    }
                }
                '>' => {
                    self.chars.next();
                    if self.eat('=') {
                        TokenKind::GreaterThanOrEqual
                    } else {
                        TokenKind::GreaterThan
                    }
                }
                '\'' | '"' => self.string(position, c)?,
                c if c.is_ascii_digit() || c == '.' => self.number(position)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.word(position),
                other => {
                    return Err(FilterSyntaxError::new(
                        position,
                        format!("unexpected character '{}'", other),
                    ))
                }
            };

            tokens.push(Token { kind, position });
        }

        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.chars.next();
        kind
    }

    fn eat(&mut self, expected: char) -> bool {
        match self.chars.peek() {
            Some(&(_, c)) if c == expected => {
                self.chars.next();
                true
            }
            _ => false,
        }
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(&(_, c)) = self.chars.peek() {
            if !predicate(c) {
                break;
            }
            self.chars.next();
        }
    }

    fn string(&mut self, start: usize, quote: char) -> Result<TokenKind, FilterSyntaxError> {
        self.chars.next();
        let mut value = String::new();

        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => {
                    // A doubled quote stands for one literal quote
                    if self.eat(quote) {
                        value.push(quote);
                    } else {
                        return Ok(TokenKind::String(value));
                    }
                }
                Some((_, c)) => value.push(c),
                None => return Err(FilterSyntaxError::new(start, "unterminated string literal")),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, FilterSyntaxError> {
        self.take_while(|c| c.is_ascii_digit());
        if self.eat('.') {
            self.take_while(|c| c.is_ascii_digit());
        }
        if self.eat('e') || self.eat('E') {
            if !self.eat('+') {
                self.eat('-');
            }
            self.take_while(|c| c.is_ascii_digit());
        }

        let end = self.offset();
        let text = &self.input[start..end];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| FilterSyntaxError::new(start, format!("invalid number '{}'", text)))
    }

    fn word(&mut self, start: usize) -> TokenKind {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let end = self.offset();
        let text = &self.input[start..end];

        match text.to_ascii_uppercase().as_str() {
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            "TRUE" => TokenKind::True,
            "FALSE" => TokenKind::False,
            "NULL" => TokenKind::Null,
            _ => TokenKind::Identifier(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_comparison_tokens() {
        assert_eq!(
            kinds("a>=1 AND b<=2 or c<>3 Not d!=4"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::GreaterThanOrEqual,
                TokenKind::Number(1.0),
                TokenKind::And,
                TokenKind::Identifier("b".into()),
                TokenKind::LessThanOrEqual,
                TokenKind::Number(2.0),
                TokenKind::Or,
                TokenKind::Identifier("c".into()),
                TokenKind::NotEqual,
                TokenKind::Number(3.0),
                TokenKind::Not,
                TokenKind::Identifier("d".into()),
                TokenKind::NotEqual,
                TokenKind::Number(4.0),
            ]
        );
    }

    #[test]
    fn test_bare_equals_is_comparison() {
        assert_eq!(
            kinds("cat = 'A'"),
            vec![
                TokenKind::Identifier("cat".into()),
                TokenKind::Equal,
                TokenKind::String("A".into())
            ]
        );
        assert_eq!(kinds("cat == 'A'")[1], TokenKind::Equal);
    }

    #[test]
    fn test_keywords_case_insensitive_and_identifiers_kept() {
        assert_eq!(
            kinds("true False NULL android order_2"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Identifier("android".into()),
                TokenKind::Identifier("order_2".into()),
            ]
        );
    }

    #[test]
    fn test_string_quotes_and_escapes() {
        assert_eq!(kinds(r#""O'Brien""#), vec![TokenKind::String("O'Brien".into())]);
        assert_eq!(kinds("'it''s'"), vec![TokenKind::String("it's".into())]);
        assert_eq!(kinds("'a b'"), vec![TokenKind::String("a b".into())]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("12.5"), vec![TokenKind::Number(12.5)]);
        assert_eq!(kinds("1e3"), vec![TokenKind::Number(1000.0)]);
        assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5)]);
        assert_eq!(kinds("-4"), vec![TokenKind::Minus, TokenKind::Number(4.0)]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("  cat = 'A'").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![2, 6, 8]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(tokenize("'open").unwrap_err().position, 0);
        assert_eq!(tokenize("a ! b").unwrap_err().position, 2);
        assert_eq!(tokenize("a; DROP").unwrap_err().position, 1);
        assert!(tokenize(".").is_err());
    }
}
