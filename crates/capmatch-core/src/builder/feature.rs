//! Resources from feature descriptors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::DescriptorBuilder;
use crate::error::{BuildError, BuildResult};
use crate::filter::FilterExpr;
use crate::model::{AttrValue, Attributes, Directives, Resource, ResourceKind, namespace};
use crate::version::{VersionRange, empty_version, parse_version};

/// A provisioning feature: a named, versioned group of bundles and features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub name: String,

    /// Feature version; defaults to 0.0.0
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub bundles: Vec<BundleRef>,

    #[serde(default)]
    pub dependencies: Vec<FeatureDependency>,
}

/// Reference from a feature to a bundle by location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRef {
    pub location: String,

    #[serde(default)]
    pub optional: bool,
}

/// Dependency of a feature on another feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDependency {
    pub name: String,

    /// Version range, e.g. "[1.0,2.0)"; any version when absent
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub optional: bool,
}

impl FeatureDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            bundles: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_bundle(mut self, location: impl Into<String>, optional: bool) -> Self {
        self.bundles.push(BundleRef {
            location: location.into(),
            optional,
        });
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>, version: Option<&str>) -> Self {
        self.dependencies.push(FeatureDependency {
            name: name.into(),
            version: version.map(str::to_string),
            optional: false,
        });
        self
    }
}

/// Builds feature resources, resolving bundle references against
/// already-built bundle resources keyed by location.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder<'a> {
    bundles: &'a BTreeMap<String, Arc<Resource>>,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(bundles: &'a BTreeMap<String, Arc<Resource>>) -> Self {
        Self { bundles }
    }
}

fn resolution(optional: bool) -> Directives {
    let mut directives = Directives::new();
    if optional {
        directives.insert(
            namespace::DIRECTIVE_RESOLUTION.to_string(),
            namespace::RESOLUTION_OPTIONAL.to_string(),
        );
    }
    directives
}

impl DescriptorBuilder for FeatureBuilder<'_> {
    type Descriptor = FeatureDescriptor;

    fn build(&self, feature: &FeatureDescriptor) -> BuildResult<Resource> {
        let version = match &feature.version {
            Some(raw) => parse_version(raw).map_err(|e| BuildError::malformed("version", raw, e))?,
            None => empty_version(),
        };

        let mut builder = Resource::builder(&feature.name, version.clone(), ResourceKind::Feature);

        let mut attributes = Attributes::new();
        attributes.insert(namespace::ATTR_NAME.to_string(), AttrValue::from(feature.name.as_str()));
        attributes.insert(namespace::ATTR_VERSION.to_string(), AttrValue::Version(version.clone()));
        builder.push_capability(namespace::FEATURE, attributes, Directives::new());

        let mut identity = Attributes::new();
        identity.insert(namespace::IDENTITY.to_string(), AttrValue::from(feature.name.as_str()));
        identity.insert(namespace::ATTR_TYPE.to_string(), AttrValue::from(namespace::TYPE_FEATURE));
        identity.insert(namespace::ATTR_VERSION.to_string(), AttrValue::Version(version));
        builder.push_capability(namespace::IDENTITY, identity, Directives::new());

        for dependency in &feature.dependencies {
            let mut clauses = vec![FilterExpr::equals(namespace::ATTR_NAME, dependency.name.as_str())];
            if let Some(raw) = &dependency.version {
                let range = VersionRange::parse(raw)
                    .map_err(|e| BuildError::malformed(&dependency.name, raw, e))?;
                match range.to_filter(namespace::ATTR_VERSION) {
                    FilterExpr::And(bounds) => clauses.extend(bounds),
                    bound => clauses.push(bound),
                }
            }
            builder.push_requirement(
                namespace::FEATURE,
                FilterExpr::all_of(clauses),
                resolution(dependency.optional),
            );
        }

        for bundle in &feature.bundles {
            let filter = self.identity_filter(&bundle.location)?;
            builder.push_requirement(namespace::IDENTITY, filter, resolution(bundle.optional));
        }

        Ok(builder.build())
    }
}

impl FeatureBuilder<'_> {
    /// Filter pinning the identity of the bundle at `location`.
    fn identity_filter(&self, location: &str) -> BuildResult<FilterExpr> {
        let resource = self
            .bundles
            .get(location)
            .ok_or_else(|| BuildError::MissingDependency(location.to_string()))?;

        let mut identities = resource.capabilities_in(namespace::IDENTITY);
        let identity = identities
            .next()
            .ok_or_else(|| BuildError::MissingIdentity(location.to_string()))?;
        if identities.next().is_some() {
            return Err(BuildError::MultipleIdentities(location.to_string()));
        }

        let mut clauses = Vec::new();
        for attr in [namespace::IDENTITY, namespace::ATTR_TYPE, namespace::ATTR_VERSION] {
            if let Some(value) = identity.attribute(attr) {
                clauses.push(FilterExpr::equals(attr, value.to_string()));
            }
        }
        if !identity.attributes().contains_key(namespace::IDENTITY) {
            clauses.insert(0, FilterExpr::equals(namespace::IDENTITY, resource.name()));
        }
        Ok(FilterExpr::all_of(clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Manifest, ManifestBuilder};
    use crate::version::Version;

    fn bundle(name: &str, version: &str) -> Arc<Resource> {
        let headers: Manifest = [
            ("Bundle-SymbolicName".to_string(), name.to_string()),
            ("Bundle-Version".to_string(), version.to_string()),
        ]
        .into_iter()
        .collect();
        Arc::new(ManifestBuilder.build(&headers).unwrap())
    }

    #[test]
    fn test_feature_capabilities_and_requirements() {
        let mut bundles = BTreeMap::new();
        bundles.insert("mvn:org.example/core/1.0.0".to_string(), bundle("org.example.core", "1.0.0"));

        let descriptor = FeatureDescriptor::new("web", "2.0.0")
            .with_bundle("mvn:org.example/core/1.0.0", false)
            .with_dependency("http", Some("[1.0,2.0)"));
        let resource = FeatureBuilder::new(&bundles).build(&descriptor).unwrap();

        assert_eq!(resource.kind(), ResourceKind::Feature);
        assert_eq!(resource.version(), &Version::new(2, 0, 0));

        let features: Vec<_> = resource.capabilities_in(namespace::FEATURE).collect();
        assert_eq!(features[0].attribute("name"), Some(&AttrValue::from("web")));

        let deps: Vec<_> = resource.requirements_in(namespace::FEATURE).collect();
        assert_eq!(
            deps[0].filter_text(),
            "(&(name=http)(version>=1.0.0)(!(version>=2.0.0)))"
        );

        let bundle_reqs: Vec<_> = resource.requirements_in(namespace::IDENTITY).collect();
        assert_eq!(
            bundle_reqs[0].filter_text(),
            "(&(osgi.identity=org.example.core)(type=osgi.bundle)(version=1.0.0))"
        );
        assert!(bundles["mvn:org.example/core/1.0.0"].capabilities()[0].satisfies(bundle_reqs[0]));
    }

    #[test]
    fn test_optional_bundle_reference() {
        let mut bundles = BTreeMap::new();
        bundles.insert("loc".to_string(), bundle("x", "1.0.0"));
        let descriptor = FeatureDescriptor::new("f", "1.0.0").with_bundle("loc", true);
        let resource = FeatureBuilder::new(&bundles).build(&descriptor).unwrap();
        assert!(resource.requirements()[0].is_optional());
    }

    #[test]
    fn test_missing_bundle_reference() {
        let bundles = BTreeMap::new();
        let descriptor = FeatureDescriptor::new("f", "1.0.0").with_bundle("mvn:missing/1.0", false);
        let err = FeatureBuilder::new(&bundles).build(&descriptor).unwrap_err();
        assert_eq!(err, BuildError::MissingDependency("mvn:missing/1.0".to_string()));
    }

    #[test]
    fn test_multiple_identities() {
        let twin = Resource::builder("twin", Version::new(1, 0, 0), ResourceKind::Bundle)
            .capability(namespace::IDENTITY, [(namespace::IDENTITY, AttrValue::from("twin"))])
            .capability(namespace::IDENTITY, [(namespace::IDENTITY, AttrValue::from("twin-alias"))])
            .build();
        let mut bundles = BTreeMap::new();
        bundles.insert("loc".to_string(), Arc::new(twin));

        let descriptor = FeatureDescriptor::new("f", "1.0.0").with_bundle("loc", false);
        let err = FeatureBuilder::new(&bundles).build(&descriptor).unwrap_err();
        assert_eq!(err, BuildError::MultipleIdentities("loc".to_string()));
    }

    #[test]
    fn test_missing_identity() {
        let bare = Resource::builder("bare", Version::new(1, 0, 0), ResourceKind::Other).build();
        let mut bundles = BTreeMap::new();
        bundles.insert("loc".to_string(), Arc::new(bare));

        let descriptor = FeatureDescriptor::new("f", "1.0.0").with_bundle("loc", false);
        let err = FeatureBuilder::new(&bundles).build(&descriptor).unwrap_err();
        assert_eq!(err, BuildError::MissingIdentity("loc".to_string()));
    }

    #[test]
    fn test_malformed_feature_version() {
        let bundles = BTreeMap::new();
        let descriptor = FeatureDescriptor::new("f", "one");
        let err = FeatureBuilder::new(&bundles).build(&descriptor).unwrap_err();
        assert!(matches!(err, BuildError::MalformedAttribute { .. }));
    }
}
