//! Resources: identity plus the capabilities and requirements they declare.

use std::fmt;
use std::sync::Arc;

use super::attr::{AttrValue, Attributes, Directives};
use super::capability::Capability;
use super::requirement::Requirement;
use crate::filter::FilterExpr;
use crate::version::Version;

/// What kind of module a resource describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Bundle,
    Feature,
    Other,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Bundle => "bundle",
            ResourceKind::Feature => "feature",
            ResourceKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Identity of a resource.
///
/// Capabilities and requirements carry this as their back-reference to the
/// owning resource; it does not keep the resource alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub name: String,
    pub version: Version,
    pub kind: ResourceKind,
}

impl ResourceId {
    pub fn new(name: impl Into<String>, version: Version, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            version,
            kind,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// An immutable module description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResourceId,
    capabilities: Vec<Arc<Capability>>,
    requirements: Vec<Requirement>,
}

impl Resource {
    /// Start building a resource with the given identity.
    pub fn builder(name: impl Into<String>, version: Version, kind: ResourceKind) -> ResourceBuilder {
        ResourceBuilder {
            id: ResourceId::new(name, version, kind),
            capabilities: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn version(&self) -> &Version {
        &self.id.version
    }

    pub fn kind(&self) -> ResourceKind {
        self.id.kind
    }

    pub fn capabilities(&self) -> &[Arc<Capability>] {
        &self.capabilities
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Capabilities in one namespace, in declaration order.
    pub fn capabilities_in<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Arc<Capability>> + 'a {
        self.capabilities
            .iter()
            .filter(move |c| c.namespace() == namespace)
    }

    /// Requirements in one namespace, in declaration order.
    pub fn requirements_in<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Requirement> + 'a {
        self.requirements
            .iter()
            .filter(move |r| r.namespace() == namespace)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.id.kind)
    }
}

/// Accumulates capabilities and requirements for a resource.
///
/// Everything added here is owned by the identity given to
/// [`Resource::builder`].
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    id: ResourceId,
    capabilities: Vec<Capability>,
    requirements: Vec<Requirement>,
}

impl ResourceBuilder {
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Add a capability without directives.
    pub fn capability<K, A>(self, namespace: impl Into<String>, attributes: A) -> Self
    where
        K: Into<String>,
        A: IntoIterator<Item = (K, AttrValue)>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        self.capability_with(namespace, attributes, Directives::new())
    }

    pub fn capability_with(
        mut self,
        namespace: impl Into<String>,
        attributes: Attributes,
        directives: Directives,
    ) -> Self {
        self.push_capability(namespace, attributes, directives);
        self
    }

    pub fn push_capability(
        &mut self,
        namespace: impl Into<String>,
        attributes: Attributes,
        directives: Directives,
    ) {
        self.capabilities.push(Capability::new(
            namespace,
            attributes,
            directives,
            self.id.clone(),
        ));
    }

    /// Add a requirement without directives.
    pub fn requirement(self, namespace: impl Into<String>, filter: FilterExpr) -> Self {
        self.requirement_with(namespace, filter, Directives::new())
    }

    pub fn requirement_with(
        mut self,
        namespace: impl Into<String>,
        filter: FilterExpr,
        directives: Directives,
    ) -> Self {
        self.push_requirement(namespace, filter, directives);
        self
    }

    pub fn push_requirement(
        &mut self,
        namespace: impl Into<String>,
        filter: FilterExpr,
        directives: Directives,
    ) {
        self.requirements.push(Requirement::new(
            namespace,
            filter,
            directives,
            self.id.clone(),
        ));
    }

    pub fn build(self) -> Resource {
        Resource {
            id: self.id,
            capabilities: self.capabilities.into_iter().map(Arc::new).collect(),
            requirements: self.requirements,
        }
    }
}
