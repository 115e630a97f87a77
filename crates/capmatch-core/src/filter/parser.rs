//! LDAP-style filter text parser.
//!
//! Grammar:
//!
//! ```text
//! filter     := '(' filtercomp ')'
//! filtercomp := '&' filter* | '|' filter* | '!' filter | item
//! item       := attr ('=' | '~=' | '>=' | '<=') value
//! ```
//!
//! Values may escape `(`, `)`, `*` and `\` with a backslash. An unescaped
//! `*` in an equality value turns it into a substring match, and a value of
//! exactly `*` into a presence test.

use super::expr::FilterExpr;
use crate::error::FilterSyntaxError;

/// Parse filter text into an expression tree.
pub fn parse(text: &str) -> Result<FilterExpr, FilterSyntaxError> {
    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    if parser.at_end() {
        return Err(parser.error("empty expression"));
    }

    let expr = parser.parse_filter()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("unexpected input after filter"));
    }
    Ok(expr)
}

#[derive(Debug, Clone, Copy)]
enum Operator {
    Equal,
    Approx,
    GreaterOrEqual,
    LessOrEqual,
}

/// Deepest `(` nesting accepted before parsing gives up.
pub const MAX_DEPTH: usize = 256;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> FilterSyntaxError {
        FilterSyntaxError::new(self.pos, message)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_filter(&mut self) -> Result<FilterExpr, FilterSyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("filter nested too deeply"));
        }
        self.depth += 1;
        let expr = self.parse_group();
        self.depth -= 1;
        expr
    }

    fn parse_group(&mut self) -> Result<FilterExpr, FilterSyntaxError> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => self.pos += 1,
            Some(c) => return Err(self.error(format!("expected '(' but found '{}'", c))),
            None => return Err(self.error("expected '(' but reached end of input")),
        }
        self.skip_whitespace();

        let expr = match self.peek() {
            Some('&') => {
                self.pos += 1;
                FilterExpr::And(self.parse_list()?)
            }
            Some('|') => {
                self.pos += 1;
                FilterExpr::Or(self.parse_list()?)
            }
            Some('!') => {
                self.pos += 1;
                FilterExpr::negate(self.parse_filter()?)
            }
            Some(')') => return Err(self.error("empty expression")),
            None => return Err(self.error("unbalanced parentheses: missing ')'")),
            Some(_) => self.parse_item()?,
        };

        self.skip_whitespace();
        match self.peek() {
            Some(')') => {
                self.pos += 1;
                Ok(expr)
            }
            None => Err(self.error("unbalanced parentheses: missing ')'")),
            Some(c) => Err(self.error(format!("expected ')' but found '{}'", c))),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<FilterExpr>, FilterSyntaxError> {
        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() != Some('(') {
                return Ok(children);
            }
            children.push(self.parse_filter()?);
        }
    }

    fn parse_item(&mut self) -> Result<FilterExpr, FilterSyntaxError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let attr: String = self.chars[start..self.pos].iter().collect();
        let attr = attr.trim().to_string();
        if attr.is_empty() {
            return Err(FilterSyntaxError::new(start, "missing attribute name"));
        }

        let operator = match (self.peek(), self.peek_second()) {
            (Some('='), _) => {
                self.pos += 1;
                Operator::Equal
            }
            (Some('~'), Some('=')) => {
                self.pos += 2;
                Operator::Approx
            }
            (Some('>'), Some('=')) => {
                self.pos += 2;
                Operator::GreaterOrEqual
            }
            (Some('<'), Some('=')) => {
                self.pos += 2;
                Operator::LessOrEqual
            }
            (None, _) => return Err(self.error("unbalanced parentheses: missing ')'")),
            _ => return Err(self.error(format!("unknown operator after '{}'", attr))),
        };

        let parts = self.parse_value()?;
        Ok(match operator {
            Operator::Equal => FilterExpr::substring(attr, parts),
            Operator::Approx => FilterExpr::Approx {
                attr,
                value: parts.join("*"),
            },
            Operator::GreaterOrEqual => FilterExpr::Gte {
                attr,
                value: parts.join("*"),
            },
            Operator::LessOrEqual => FilterExpr::Lte {
                attr,
                value: parts.join("*"),
            },
        })
    }

    /// Read a value up to the closing parenthesis, split on unescaped `*`.
    fn parse_value(&mut self) -> Result<Vec<String>, FilterSyntaxError> {
        let mut parts = Vec::new();
        let mut current = String::new();
        while let Some(c) = self.peek() {
            match c {
                ')' => break,
                '(' => return Err(self.error("unescaped '(' in value")),
                '*' => {
                    parts.push(std::mem::take(&mut current));
                    self.pos += 1;
                }
                '\\' => {
                    self.pos += 1;
                    let Some(escaped) = self.peek() else {
                        return Err(self.error("dangling escape at end of input"));
                    };
                    current.push(escaped);
                    self.pos += 1;
                }
                _ => {
                    current.push(c);
                    self.pos += 1;
                }
            }
        }
        parts.push(current);
        Ok(parts)
    }
}
