//! Per-namespace capability index.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::trace;

use crate::error::{RepositoryError, RepositoryResult};
use crate::filter::FilterExpr;
use crate::model::{AttrValue, Capability, namespace};

/// Capabilities of one namespace, indexed by selected attributes.
///
/// The index maps attribute name -> string value -> positions in insertion
/// order. Capabilities whose indexed attribute is not string-typed cannot be
/// keyed by value and are kept aside per attribute; they always survive
/// narrowing and are decided by full evaluation.
#[derive(Debug, Clone)]
pub struct CapabilitySet {
    namespace: String,
    capabilities: Vec<Arc<Capability>>,
    index: HashMap<String, HashMap<String, BTreeSet<usize>>>,
    unkeyed: HashMap<String, BTreeSet<usize>>,
}

impl CapabilitySet {
    /// Create a set indexing the default attributes for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let indexed = namespace::indexed_attributes(&namespace);
        Self::with_indexed(namespace, indexed)
    }

    /// Create a set indexing the given attributes.
    pub fn with_indexed<I, S>(namespace: impl Into<String>, indexed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            capabilities: Vec::new(),
            index: indexed
                .into_iter()
                .map(|attr| (attr.into(), HashMap::new()))
                .collect(),
            unkeyed: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn capabilities(&self) -> &[Arc<Capability>] {
        &self.capabilities
    }

    /// Add a capability; it must belong to this set's namespace.
    pub fn add_capability(&mut self, capability: Arc<Capability>) -> RepositoryResult<()> {
        if capability.namespace() != self.namespace {
            return Err(RepositoryError::NamespaceMismatch {
                expected: self.namespace.clone(),
                found: capability.namespace().to_string(),
            });
        }

        let position = self.capabilities.len();
        for (attr, values) in self.index.iter_mut() {
            match capability.attribute(attr) {
                None => {}
                Some(AttrValue::String(value)) => {
                    values.entry(value.clone()).or_default().insert(position);
                }
                Some(AttrValue::List(items)) => {
                    for item in items {
                        values.entry(item.clone()).or_default().insert(position);
                    }
                }
                Some(_) => {
                    self.unkeyed.entry(attr.clone()).or_default().insert(position);
                }
            }
        }
        self.capabilities.push(capability);
        Ok(())
    }

    /// Capabilities matching `filter`, in insertion order.
    ///
    /// With `obey_mandatory`, a capability is dropped unless the filter
    /// references every one of its mandatory attributes.
    pub fn match_filter(&self, filter: &FilterExpr, obey_mandatory: bool) -> Vec<Arc<Capability>> {
        let positions: Vec<usize> = match self.narrow(filter) {
            Some(candidates) => candidates.into_iter().collect(),
            None => {
                trace!(namespace = %self.namespace, filter = %filter, "Scanning capability set");
                (0..self.capabilities.len()).collect()
            }
        };

        positions
            .into_iter()
            .map(|position| &self.capabilities[position])
            .filter(|capability| filter.evaluate(capability.attributes()))
            .filter(|capability| {
                !obey_mandatory
                    || capability
                        .mandatory_attributes()
                        .iter()
                        .all(|attr| filter.has_filter_on(attr))
            })
            .cloned()
            .collect()
    }

    /// Candidate positions from indexed equality clauses, if any apply.
    fn narrow(&self, filter: &FilterExpr) -> Option<BTreeSet<usize>> {
        let mut sets: Vec<BTreeSet<usize>> = filter
            .equality_clauses()
            .into_iter()
            .filter_map(|(attr, value)| self.lookup(attr, value))
            .collect();
        if sets.is_empty() {
            return None;
        }

        sets.sort_by_key(BTreeSet::len);
        let mut sets = sets.into_iter();
        let mut candidates = sets.next()?;
        for set in sets {
            if candidates.is_empty() {
                break;
            }
            candidates = candidates.intersection(&set).copied().collect();
        }
        Some(candidates)
    }

    fn lookup(&self, attr: &str, value: &str) -> Option<BTreeSet<usize>> {
        let values = self.index.get(attr)?;
        let mut positions = values.get(value).cloned().unwrap_or_default();
        if let Some(unkeyed) = self.unkeyed.get(attr) {
            positions.extend(unkeyed.iter().copied());
        }
        Some(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter;
    use crate::model::{Attributes, Directives, ResourceId, ResourceKind};
    use crate::version::Version;

    fn capability(namespace: &str, pairs: &[(&str, AttrValue)]) -> Arc<Capability> {
        let attributes: Attributes = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Arc::new(Capability::new(
            namespace,
            attributes,
            Directives::new(),
            ResourceId::new("owner", Version::new(1, 0, 0), ResourceKind::Bundle),
        ))
    }

    fn feature_set() -> CapabilitySet {
        let mut set = CapabilitySet::new("feature");
        for (name, version) in [("foo", "1.0.0"), ("bar", "1.0.0"), ("foo", "2.0.0")] {
            set.add_capability(capability(
                "feature",
                &[
                    ("name", AttrValue::from(name)),
                    ("version", AttrValue::Version(Version::parse(version).unwrap())),
                ],
            ))
            .unwrap();
        }
        set
    }

    #[test]
    fn test_indexed_equality_preserves_insertion_order() {
        let set = feature_set();
        let found = set.match_filter(&filter::parse("(name=foo)").unwrap(), true);
        let versions: Vec<String> = found
            .iter()
            .map(|c| c.attribute("version").unwrap().to_string())
            .collect();
        assert_eq!(versions, vec!["1.0.0", "2.0.0"]);
    }

    #[test]
    fn test_conjunction_with_range_clause() {
        let set = feature_set();
        let found = set.match_filter(&filter::parse("(&(name=foo)(version>=1.5))").unwrap(), true);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_fallback_scan_for_disjunction() {
        let set = feature_set();
        let found = set.match_filter(&filter::parse("(|(name=bar)(version>=2.0))").unwrap(), true);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_unknown_value_yields_nothing() {
        let set = feature_set();
        assert!(set.match_filter(&filter::parse("(name=baz)").unwrap(), true).is_empty());
    }

    #[test]
    fn test_unkeyed_values_are_evaluated() {
        let mut set = CapabilitySet::with_indexed("ranked", ["name"]);
        set.add_capability(capability("ranked", &[("name", AttrValue::Long(7))]))
            .unwrap();
        let found = set.match_filter(&filter::parse("(name=7)").unwrap(), false);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_mandatory_attribute_enforced() {
        let mut set = CapabilitySet::new(namespace::IDENTITY);
        set.add_capability(capability(
            namespace::IDENTITY,
            &[
                ("osgi.identity", AttrValue::from("alpha")),
                ("type", AttrValue::from("osgi.bundle")),
            ],
        ))
        .unwrap();

        let by_type = filter::parse("(type=osgi.bundle)").unwrap();
        assert!(set.match_filter(&by_type, true).is_empty());
        assert_eq!(set.match_filter(&by_type, false).len(), 1);
    }

    #[test]
    fn test_rejects_foreign_namespace() {
        let mut set = CapabilitySet::new("feature");
        let err = set
            .add_capability(capability("other", &[]))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NamespaceMismatch { .. }));
        assert!(set.is_empty());
    }
}
