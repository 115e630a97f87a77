//! Requirements declared by resources.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::attr::Directives;
use super::namespace;
use super::resource::ResourceId;
use crate::error::FilterSyntaxError;
use crate::filter::{self, FilterExpr};

/// A need a resource has, expressed as a filter over capability attributes.
///
/// Equality and hashing cover the namespace, the canonical filter text, the
/// directives and the owner. Two structurally identical requirements from
/// different resources are therefore distinct cache keys.
#[derive(Debug, Clone)]
pub struct Requirement {
    namespace: String,
    filter: FilterExpr,
    filter_text: String,
    directives: Directives,
    optional: bool,
    owner: ResourceId,
}

impl Requirement {
    pub fn new(
        namespace: impl Into<String>,
        filter: FilterExpr,
        directives: Directives,
        owner: ResourceId,
    ) -> Self {
        let optional = directives
            .get(namespace::DIRECTIVE_RESOLUTION)
            .is_some_and(|r| r == namespace::RESOLUTION_OPTIONAL);
        Self {
            namespace: namespace.into(),
            filter_text: filter.to_string(),
            filter,
            directives,
            optional,
            owner,
        }
    }

    /// Build a requirement from filter text.
    pub fn parse(
        namespace: impl Into<String>,
        filter_text: &str,
        owner: ResourceId,
    ) -> Result<Self, FilterSyntaxError> {
        let filter = filter::parse(filter_text)?;
        Ok(Self::new(namespace, filter, Directives::new(), owner))
    }

    /// Return a copy with one more directive set.
    pub fn with_directive(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut directives = self.directives;
        directives.insert(name.into(), value.into());
        Self::new(self.namespace, self.filter, directives, self.owner)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn filter(&self) -> &FilterExpr {
        &self.filter
    }

    /// Canonical text of the filter.
    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// Derived from `resolution:=optional`.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn owner(&self) -> &ResourceId {
        &self.owner
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.filter_text == other.filter_text
            && self.directives == other.directives
            && self.owner == other.owner
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.filter_text.hash(state);
        self.directives.hash(state);
        self.owner.hash(state);
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.namespace, self.filter_text)?;
        if self.optional {
            f.write_str(" (optional)")?;
        }
        Ok(())
    }
}
