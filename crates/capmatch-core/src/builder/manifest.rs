//! Resources from manifest-style header maps.

use std::collections::BTreeMap;

use super::DescriptorBuilder;
use super::header::{Clause, parse_header, typed_value};
use crate::error::{BuildError, BuildResult};
use crate::filter::{self, FilterExpr};
use crate::model::{
    AttrValue, Attributes, Directives, Resource, ResourceBuilder, ResourceKind, namespace,
};
use crate::version::{Version, VersionRange, empty_version, parse_version};

pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
pub const BUNDLE_VERSION: &str = "Bundle-Version";
pub const EXPORT_PACKAGE: &str = "Export-Package";
pub const IMPORT_PACKAGE: &str = "Import-Package";
pub const REQUIRE_BUNDLE: &str = "Require-Bundle";
pub const PROVIDE_CAPABILITY: &str = "Provide-Capability";
pub const REQUIRE_CAPABILITY: &str = "Require-Capability";

/// Header map of one bundle.
pub type Manifest = BTreeMap<String, String>;

/// Builds bundle resources from manifest headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestBuilder;

impl DescriptorBuilder for ManifestBuilder {
    type Descriptor = Manifest;

    fn build(&self, headers: &Manifest) -> BuildResult<Resource> {
        let missing = || BuildError::MissingHeader(BUNDLE_SYMBOLIC_NAME.to_string());
        let symbolic_name = parse_header(headers.get(BUNDLE_SYMBOLIC_NAME).ok_or_else(missing)?)?
            .into_iter()
            .next()
            .and_then(|clause| clause.paths.into_iter().next())
            .ok_or_else(missing)?;

        let version = match headers.get(BUNDLE_VERSION) {
            Some(raw) => {
                parse_version(raw).map_err(|e| BuildError::malformed(BUNDLE_VERSION, raw, e))?
            }
            None => empty_version(),
        };

        let mut builder = Resource::builder(&symbolic_name, version.clone(), ResourceKind::Bundle);
        add_bundle_identity(&mut builder, &symbolic_name, &version);

        if let Some(header) = headers.get(EXPORT_PACKAGE) {
            add_exports(&mut builder, &parse_header(header)?, &symbolic_name, &version)?;
        }
        if let Some(header) = headers.get(IMPORT_PACKAGE) {
            add_imports(&mut builder, &parse_header(header)?)?;
        }
        if let Some(header) = headers.get(REQUIRE_BUNDLE) {
            add_required_bundles(&mut builder, &parse_header(header)?)?;
        }
        if let Some(header) = headers.get(PROVIDE_CAPABILITY) {
            add_provided_capabilities(&mut builder, &parse_header(header)?)?;
        }
        if let Some(header) = headers.get(REQUIRE_CAPABILITY) {
            add_required_capabilities(&mut builder, &parse_header(header)?)?;
        }

        Ok(builder.build())
    }
}

fn add_bundle_identity(builder: &mut ResourceBuilder, symbolic_name: &str, version: &Version) {
    let mut identity = Attributes::new();
    identity.insert(namespace::IDENTITY.to_string(), AttrValue::from(symbolic_name));
    identity.insert(namespace::ATTR_TYPE.to_string(), AttrValue::from(namespace::TYPE_BUNDLE));
    identity.insert(namespace::ATTR_VERSION.to_string(), AttrValue::Version(version.clone()));
    builder.push_capability(namespace::IDENTITY, identity, Directives::new());

    let mut wiring = Attributes::new();
    wiring.insert(namespace::BUNDLE.to_string(), AttrValue::from(symbolic_name));
    wiring.insert(
        namespace::ATTR_BUNDLE_VERSION.to_string(),
        AttrValue::Version(version.clone()),
    );
    builder.push_capability(namespace::BUNDLE, wiring, Directives::new());
}

fn add_exports(
    builder: &mut ResourceBuilder,
    clauses: &[Clause],
    symbolic_name: &str,
    bundle_version: &Version,
) -> BuildResult<()> {
    for clause in clauses {
        let mut shared = Attributes::new();
        shared.insert(
            namespace::ATTR_VERSION.to_string(),
            AttrValue::Version(empty_version()),
        );
        for (name, declared, raw) in &clause.attributes {
            let value = if name == namespace::ATTR_VERSION && declared.is_none() {
                typed_value(name, Some("Version"), raw)?
            } else {
                typed_value(name, declared.as_deref(), raw)?
            };
            shared.insert(name.clone(), value);
        }
        shared.insert(
            namespace::ATTR_BUNDLE_SYMBOLIC_NAME.to_string(),
            AttrValue::from(symbolic_name),
        );
        shared.insert(
            namespace::ATTR_BUNDLE_VERSION.to_string(),
            AttrValue::Version(bundle_version.clone()),
        );

        for package in &clause.paths {
            let mut attributes = shared.clone();
            attributes.insert(namespace::PACKAGE.to_string(), AttrValue::from(package.as_str()));
            builder.push_capability(namespace::PACKAGE, attributes, clause.directives.clone());
        }
    }
    Ok(())
}

/// Filter for `name` constrained by a range attribute and plain equality attributes.
fn clause_filter(
    name_attr: &str,
    name: &str,
    clause: &Clause,
    range_attr: &str,
    range_target: &str,
) -> BuildResult<FilterExpr> {
    let mut clauses = vec![FilterExpr::equals(name_attr, name)];
    for (attr, _, raw) in &clause.attributes {
        if attr == range_attr {
            let range = VersionRange::parse(raw).map_err(|e| BuildError::malformed(attr, raw, e))?;
            match range.to_filter(range_target) {
                FilterExpr::And(bounds) => clauses.extend(bounds),
                bound => clauses.push(bound),
            }
        } else {
            clauses.push(FilterExpr::equals(attr.as_str(), raw.as_str()));
        }
    }
    Ok(FilterExpr::all_of(clauses))
}

fn add_imports(builder: &mut ResourceBuilder, clauses: &[Clause]) -> BuildResult<()> {
    for clause in clauses {
        for package in &clause.paths {
            let filter = clause_filter(
                namespace::PACKAGE,
                package,
                clause,
                namespace::ATTR_VERSION,
                namespace::ATTR_VERSION,
            )?;
            builder.push_requirement(namespace::PACKAGE, filter, clause.directives.clone());
        }
    }
    Ok(())
}

fn add_required_bundles(builder: &mut ResourceBuilder, clauses: &[Clause]) -> BuildResult<()> {
    for clause in clauses {
        for bundle in &clause.paths {
            let filter = clause_filter(
                namespace::BUNDLE,
                bundle,
                clause,
                namespace::ATTR_BUNDLE_VERSION,
                namespace::ATTR_BUNDLE_VERSION,
            )?;
            builder.push_requirement(namespace::BUNDLE, filter, clause.directives.clone());
        }
    }
    Ok(())
}

fn add_provided_capabilities(builder: &mut ResourceBuilder, clauses: &[Clause]) -> BuildResult<()> {
    for clause in clauses {
        let mut attributes = Attributes::new();
        for (name, declared, raw) in &clause.attributes {
            attributes.insert(name.clone(), typed_value(name, declared.as_deref(), raw)?);
        }
        for ns in &clause.paths {
            builder.push_capability(ns.as_str(), attributes.clone(), clause.directives.clone());
        }
    }
    Ok(())
}

fn add_required_capabilities(builder: &mut ResourceBuilder, clauses: &[Clause]) -> BuildResult<()> {
    for clause in clauses {
        let mut directives = clause.directives.clone();
        let filter = match directives.remove(namespace::DIRECTIVE_FILTER) {
            Some(text) => filter::parse(&text)?,
            None => FilterExpr::match_all(),
        };
        for ns in &clause.paths {
            builder.push_requirement(ns.as_str(), filter.clone(), directives.clone());
        }
    }
    Ok(())
}
