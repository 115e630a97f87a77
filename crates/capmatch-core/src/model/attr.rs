//! Typed attribute values.

use std::collections::BTreeMap;
use std::fmt;

use crate::version::{Version, VersionRange};

/// Attribute map of a capability, ordered by attribute name.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Directive map of a capability or requirement.
pub type Directives = BTreeMap<String, String>;

/// The closed set of attribute value types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    String(String),
    Version(Version),
    VersionRange(VersionRange),
    Long(i64),
    List(Vec<String>),
}

impl AttrValue {
    /// Type name as written in typed manifest attributes.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::String(_) => "String",
            AttrValue::Version(_) => "Version",
            AttrValue::VersionRange(_) => "VersionRange",
            AttrValue::Long(_) => "Long",
            AttrValue::List(_) => "List<String>",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_version(&self) -> Option<&Version> {
        match self {
            AttrValue::Version(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(s) => f.write_str(s),
            AttrValue::Version(v) => write!(f, "{}", v),
            AttrValue::VersionRange(r) => write!(f, "{}", r),
            AttrValue::Long(n) => write!(f, "{}", n),
            AttrValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<Version> for AttrValue {
    fn from(value: Version) -> Self {
        AttrValue::Version(value)
    }
}

impl From<VersionRange> for AttrValue {
    fn from(value: VersionRange) -> Self {
        AttrValue::VersionRange(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Long(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}
