//! Namespace, attribute and directive names.

/// Identity of a resource; every bundle and feature exposes exactly one.
pub const IDENTITY: &str = "osgi.identity";
/// Exported and imported packages.
pub const PACKAGE: &str = "osgi.wiring.package";
/// Whole-bundle wiring (`Require-Bundle`).
pub const BUNDLE: &str = "osgi.wiring.bundle";
/// Provisioning features.
pub const FEATURE: &str = "feature";

pub const ATTR_VERSION: &str = "version";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_NAME: &str = "name";
pub const ATTR_BUNDLE_VERSION: &str = "bundle-version";
pub const ATTR_BUNDLE_SYMBOLIC_NAME: &str = "bundle-symbolic-name";

pub const TYPE_BUNDLE: &str = "osgi.bundle";
pub const TYPE_FEATURE: &str = "karaf.feature";

pub const DIRECTIVE_RESOLUTION: &str = "resolution";
pub const DIRECTIVE_MANDATORY: &str = "mandatory";
pub const DIRECTIVE_FILTER: &str = "filter";
pub const DIRECTIVE_PREFERRED: &str = "preferred";

pub const RESOLUTION_OPTIONAL: &str = "optional";

/// Attributes any requirement must filter on to match a capability in `namespace`.
pub fn mandatory_attributes(namespace: &str) -> &'static [&'static str] {
    match namespace {
        IDENTITY => &[IDENTITY],
        _ => &[],
    }
}

/// Attributes a capability set indexes for `namespace`.
pub fn indexed_attributes(namespace: &str) -> Vec<String> {
    let mut attrs = vec![namespace.to_string()];
    for attr in [ATTR_NAME, ATTR_TYPE] {
        if attr != namespace {
            attrs.push(attr.to_string());
        }
    }
    attrs
}
