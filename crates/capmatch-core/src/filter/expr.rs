//! Filter expression tree, evaluation and text rendering.

use std::fmt;

use crate::model::{AttrValue, Attributes};
use crate::version::{VersionRange, parse_version};

/// A parsed LDAP-style filter.
///
/// `And(vec![])` is the absolute-true filter `(&)` and `Or(vec![])` the
/// absolute-false filter `(|)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterExpr {
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
    Eq { attr: String, value: String },
    Approx { attr: String, value: String },
    Gte { attr: String, value: String },
    Lte { attr: String, value: String },
    Present { attr: String },
    /// Glob match; `parts` are the literal pieces between `*` wildcards,
    /// the first anchored at the start and the last at the end.
    Substring { attr: String, parts: Vec<String> },
}

impl FilterExpr {
    pub fn equals(attr: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Eq {
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn gte(attr: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Gte {
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn lte(attr: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Lte {
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn present(attr: impl Into<String>) -> Self {
        FilterExpr::Present { attr: attr.into() }
    }

    /// Equality with wildcards, in the form its text parses back to.
    ///
    /// A single piece is plain equality and `["", ""]` is a presence test.
    pub fn substring(attr: impl Into<String>, mut parts: Vec<String>) -> Self {
        let attr = attr.into();
        match parts.len() {
            0 => FilterExpr::Eq {
                attr,
                value: String::new(),
            },
            1 => FilterExpr::Eq {
                attr,
                value: parts.remove(0),
            },
            2 if parts.iter().all(String::is_empty) => FilterExpr::Present { attr },
            _ => FilterExpr::Substring { attr, parts },
        }
    }

    pub fn negate(child: FilterExpr) -> Self {
        FilterExpr::Not(Box::new(child))
    }

    /// Filter that matches every attribute map.
    pub fn match_all() -> Self {
        FilterExpr::And(Vec::new())
    }

    /// Conjunction that collapses single-clause lists.
    pub fn all_of(mut clauses: Vec<FilterExpr>) -> Self {
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            FilterExpr::And(clauses)
        }
    }

    /// Evaluate this filter against an attribute map.
    pub fn evaluate(&self, attributes: &Attributes) -> bool {
        match self {
            FilterExpr::And(children) => children.iter().all(|c| c.evaluate(attributes)),
            FilterExpr::Or(children) => children.iter().any(|c| c.evaluate(attributes)),
            FilterExpr::Not(child) => !child.evaluate(attributes),
            FilterExpr::Present { attr } => attributes.contains_key(attr),
            FilterExpr::Eq { attr, value } => {
                attributes.get(attr).is_some_and(|a| equal(a, value))
            }
            FilterExpr::Approx { attr, value } => {
                attributes.get(attr).is_some_and(|a| approx(a, value))
            }
            FilterExpr::Gte { attr, value } => attributes
                .get(attr)
                .is_some_and(|a| compare(a, value).is_some_and(|o| o.is_ge())),
            FilterExpr::Lte { attr, value } => attributes
                .get(attr)
                .is_some_and(|a| compare(a, value).is_some_and(|o| o.is_le())),
            FilterExpr::Substring { attr, parts } => {
                attributes.get(attr).is_some_and(|a| substring(a, parts))
            }
        }
    }

    /// Check whether any node of this filter constrains `attr`.
    pub fn has_filter_on(&self, attr: &str) -> bool {
        match self {
            FilterExpr::And(children) | FilterExpr::Or(children) => {
                children.iter().any(|c| c.has_filter_on(attr))
            }
            FilterExpr::Not(child) => child.has_filter_on(attr),
            _ => self.attr() == Some(attr),
        }
    }

    /// Attribute named by a leaf node.
    pub fn attr(&self) -> Option<&str> {
        match self {
            FilterExpr::Eq { attr, .. }
            | FilterExpr::Approx { attr, .. }
            | FilterExpr::Gte { attr, .. }
            | FilterExpr::Lte { attr, .. }
            | FilterExpr::Present { attr }
            | FilterExpr::Substring { attr, .. } => Some(attr),
            FilterExpr::And(_) | FilterExpr::Or(_) | FilterExpr::Not(_) => None,
        }
    }

    /// Equality clauses that must all hold for the filter to match.
    ///
    /// A top-level `Eq` yields itself; a top-level `And` yields its direct
    /// `Eq` children. Anything else yields nothing.
    pub fn equality_clauses(&self) -> Vec<(&str, &str)> {
        match self {
            FilterExpr::Eq { attr, value } => vec![(attr, value)],
            FilterExpr::And(children) => children
                .iter()
                .filter_map(|c| match c {
                    FilterExpr::Eq { attr, value } => Some((attr.as_str(), value.as_str())),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn equal(attribute: &AttrValue, value: &str) -> bool {
    match attribute {
        AttrValue::String(s) => s == value,
        AttrValue::List(items) => items.iter().any(|item| item == value),
        AttrValue::Long(n) => value.trim().parse::<i64>().is_ok_and(|v| v == *n),
        AttrValue::Version(version) => {
            if let Ok(wanted) = parse_version(value) {
                return version == &wanted;
            }
            is_interval(value)
                && VersionRange::parse(value).is_ok_and(|range| range.includes(version))
        }
        AttrValue::VersionRange(range) => {
            if let Ok(candidate) = parse_version(value) {
                return range.includes(&candidate);
            }
            VersionRange::parse(value).is_ok_and(|other| &other == range)
        }
    }
}

fn is_interval(value: &str) -> bool {
    value.trim_start().starts_with(['[', '('])
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn approx(attribute: &AttrValue, value: &str) -> bool {
    let wanted = normalize(value);
    match attribute {
        AttrValue::List(items) => items.iter().any(|item| normalize(item) == wanted),
        other => normalize(&other.to_string()) == wanted,
    }
}

/// Ordering of the attribute relative to the filter value.
///
/// Only versions and numbers are ordered; everything else compares as
/// `None`, which fails the match.
fn compare(attribute: &AttrValue, value: &str) -> Option<std::cmp::Ordering> {
    match attribute {
        AttrValue::Version(version) => parse_version(value).ok().map(|v| version.cmp(&v)),
        AttrValue::Long(n) => value.trim().parse::<i64>().ok().map(|v| n.cmp(&v)),
        AttrValue::String(_) | AttrValue::VersionRange(_) | AttrValue::List(_) => None,
    }
}

/// Glob match against the attribute's text form.
///
/// Degenerate piece lists evaluate like the filter their text parses to.
fn substring(attribute: &AttrValue, parts: &[String]) -> bool {
    match parts {
        [] => equal(attribute, ""),
        [only] => equal(attribute, only),
        [a, b] if a.is_empty() && b.is_empty() => true,
        _ => match attribute {
            AttrValue::String(s) => glob_matches(parts, s),
            AttrValue::List(items) => items.iter().any(|item| glob_matches(parts, item)),
            other => glob_matches(parts, &other.to_string()),
        },
    }
}

fn glob_matches(parts: &[String], text: &str) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return text.is_empty();
    };
    if !text.starts_with(first.as_str()) {
        return false;
    }
    let Some((last, middle)) = rest.split_last() else {
        return text == first;
    };

    let mut pos = first.len();
    for piece in middle.iter().filter(|p| !p.is_empty()) {
        match text[pos..].find(piece.as_str()) {
            Some(offset) => pos += offset + piece.len(),
            None => return false,
        }
    }
    text[pos..].ends_with(last.as_str())
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '(' | ')' | '*' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::And(children) => {
                f.write_str("(&")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            FilterExpr::Or(children) => {
                f.write_str("(|")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            FilterExpr::Not(child) => write!(f, "(!{})", child),
            FilterExpr::Eq { attr, value } => write!(f, "({}={})", attr, escape(value)),
            FilterExpr::Approx { attr, value } => write!(f, "({}~={})", attr, escape(value)),
            FilterExpr::Gte { attr, value } => write!(f, "({}>={})", attr, escape(value)),
            FilterExpr::Lte { attr, value } => write!(f, "({}<={})", attr, escape(value)),
            FilterExpr::Present { attr } => write!(f, "({}=*)", attr),
            FilterExpr::Substring { attr, parts } => {
                let pattern: Vec<String> = parts.iter().map(|p| escape(p)).collect();
                write!(f, "({}={})", attr, pattern.join("*"))
            }
        }
    }
}
