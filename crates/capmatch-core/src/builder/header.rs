//! Manifest header clause parsing.
//!
//! A header is a comma-separated list of clauses; each clause is a
//! semicolon-separated list of paths, `name[:Type]=value` attributes and
//! `name:=value` directives. Values may be double-quoted to protect `,` and `;`.

use crate::error::{BuildError, BuildResult};
use crate::model::{AttrValue, Directives};
use crate::version::{VersionRange, parse_version};

/// One clause of a header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    pub paths: Vec<String>,
    /// `(name, declared type, raw value)` in declaration order
    pub attributes: Vec<(String, Option<String>, String)>,
    pub directives: Directives,
}

impl Clause {
    /// Raw value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, v)| v.as_str())
    }
}

/// Parse a full header value.
pub fn parse_header(header: &str) -> BuildResult<Vec<Clause>> {
    let mut clauses = Vec::new();
    for raw_clause in split_unquoted(header, ',')? {
        if raw_clause.trim().is_empty() {
            continue;
        }
        clauses.push(parse_clause(raw_clause)?);
    }
    Ok(clauses)
}

fn parse_clause(raw: &str) -> BuildResult<Clause> {
    let mut clause = Clause::default();
    for part in split_unquoted(raw, ';')? {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let Some(eq) = part.find('=') else {
            clause.paths.push(part.to_string());
            continue;
        };

        let (key, value) = (&part[..eq], unquote(part[eq + 1..].trim()));
        if let Some(name) = key.strip_suffix(':') {
            clause
                .directives
                .insert(name.trim().to_string(), value.to_string());
        } else {
            let (name, declared) = match key.split_once(':') {
                Some((name, ty)) => (name.trim(), Some(ty.trim().to_string())),
                None => (key.trim(), None),
            };
            clause
                .attributes
                .push((name.to_string(), declared, value.to_string()));
        }
    }
    Ok(clause)
}

/// Split on `separator` outside double quotes.
fn split_unquoted(text: &str, separator: char) -> BuildResult<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c == separator && !quoted => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if quoted {
        return Err(BuildError::malformed("header", text, "unterminated quote"));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Convert a raw attribute into its typed value.
pub fn typed_value(name: &str, declared: Option<&str>, raw: &str) -> BuildResult<AttrValue> {
    match declared.unwrap_or("String") {
        "String" => Ok(AttrValue::String(raw.to_string())),
        "Version" => parse_version(raw)
            .map(AttrValue::Version)
            .map_err(|e| BuildError::malformed(name, raw, e)),
        "VersionRange" => VersionRange::parse(raw)
            .map(AttrValue::VersionRange)
            .map_err(|e| BuildError::malformed(name, raw, e)),
        "Long" => raw
            .trim()
            .parse::<i64>()
            .map(AttrValue::Long)
            .map_err(|e| BuildError::malformed(name, raw, e)),
        "List" | "List<String>" => Ok(AttrValue::List(
            raw.split(',').map(|item| item.trim().to_string()).collect(),
        )),
        other => Err(BuildError::malformed(
            name,
            raw,
            format!("unsupported attribute type '{}'", other),
        )),
    }
}
