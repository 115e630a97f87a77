//! Capabilities offered by resources.

use std::fmt;

use super::attr::{AttrValue, Attributes, Directives};
use super::namespace;
use super::requirement::Requirement;
use super::resource::ResourceId;

/// A typed fact a resource offers in one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    namespace: String,
    attributes: Attributes,
    directives: Directives,
    owner: ResourceId,
}

impl Capability {
    pub fn new(
        namespace: impl Into<String>,
        attributes: Attributes,
        directives: Directives,
        owner: ResourceId,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            attributes,
            directives,
            owner,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    pub fn directive(&self, name: &str) -> Option<&str> {
        self.directives.get(name).map(String::as_str)
    }

    pub fn owner(&self) -> &ResourceId {
        &self.owner
    }

    /// Attributes a requirement must explicitly filter on to match this capability.
    ///
    /// The union of the namespace rule and the `mandatory` directive.
    pub fn mandatory_attributes(&self) -> Vec<&str> {
        let mut attrs: Vec<&str> = namespace::mandatory_attributes(&self.namespace).to_vec();
        if let Some(listed) = self.directive(namespace::DIRECTIVE_MANDATORY) {
            for attr in listed.split(',').map(str::trim).filter(|a| !a.is_empty()) {
                if !attrs.contains(&attr) {
                    attrs.push(attr);
                }
            }
        }
        attrs
    }

    /// True when the capability carries `preferred:=true`.
    pub fn is_preferred(&self) -> bool {
        self.directive(namespace::DIRECTIVE_PREFERRED)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Full match check: namespace, filter and mandatory attribute coverage.
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        self.namespace == requirement.namespace()
            && requirement.filter().evaluate(&self.attributes)
            && self
                .mandatory_attributes()
                .iter()
                .all(|attr| requirement.filter().has_filter_on(attr))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)?;
        for (name, value) in &self.attributes {
            write!(f, "; {}={}", name, value)?;
        }
        write!(f, " [{}]", self.owner)
    }
}
