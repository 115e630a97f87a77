//! Attribute filter language.
//!
//! A small LDAP-style boolean language: equality, approximate match,
//! ordering, presence and substring tests combined with `&`, `|` and `!`.

mod expr;
mod parser;

pub use expr::FilterExpr;
pub use parser::parse;
