//! Repository over an in-memory set of resources.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, warn};

use super::metadata::{MetadataProvider, MetadataSnapshot};
use super::{Providers, Repository};
use crate::builder::{DescriptorBuilder, ManifestBuilder};
use crate::capset::CapabilitySet;
use crate::error::RepositoryResult;
use crate::model::{Requirement, Resource, ResourceId};

/// Indexes the capabilities of its resources into one set per namespace.
///
/// Built once, then only read; `find_providers` takes `&self` and never
/// mutates, so concurrent lookups need no locking.
#[derive(Debug, Default, Clone)]
pub struct BaseRepository {
    resources: Vec<Arc<Resource>>,
    sets: HashMap<String, CapabilitySet>,
}

impl BaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from resources in one pass.
    pub fn with_resources<I>(resources: I) -> Self
    where
        I: IntoIterator<Item = Arc<Resource>>,
    {
        let mut repository = Self::new();
        for resource in resources {
            repository.add_resource(resource);
        }
        repository
    }

    /// Build a repository from a metadata snapshot of manifest header maps.
    ///
    /// Entries that fail to build are logged and skipped.
    pub fn from_metadata(provider: &dyn MetadataProvider) -> anyhow::Result<Self> {
        let snapshot = provider
            .snapshot()
            .context("Failed to read metadata snapshot")?;
        Ok(Self::with_resources(load_manifests(&snapshot).into_values()))
    }

    /// Append a resource and index its capabilities.
    pub fn add_resource(&mut self, resource: impl Into<Arc<Resource>>) {
        let resource = resource.into();
        for capability in resource.capabilities() {
            let set = self
                .sets
                .entry(capability.namespace().to_string())
                .or_insert_with(|| CapabilitySet::new(capability.namespace()));
            if let Err(err) = set.add_capability(Arc::clone(capability)) {
                warn!(resource = %resource.id(), error = %err, "Capability not indexed");
            }
        }
        debug!(resource = %resource.id(), capabilities = resource.capabilities().len(), "Indexed resource");
        self.resources.push(resource);
    }

    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Arc<Resource>> {
        self.resources.iter().find(|r| r.id() == id)
    }

    /// Namespaces with at least one indexed capability, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        namespaces.sort_unstable();
        namespaces
    }
}

impl Repository for BaseRepository {
    fn find_providers(&self, requirements: &[Requirement]) -> RepositoryResult<Providers> {
        let mut by_namespace: BTreeMap<&str, Vec<&Requirement>> = BTreeMap::new();
        for requirement in requirements {
            by_namespace
                .entry(requirement.namespace())
                .or_default()
                .push(requirement);
        }

        let mut providers = Providers::new();
        for (namespace, group) in by_namespace {
            let set = self.sets.get(namespace);
            for requirement in group {
                let found = set
                    .map(|s| s.match_filter(requirement.filter(), true))
                    .unwrap_or_default();
                providers.insert(requirement.clone(), found);
            }
        }
        Ok(providers)
    }
}

/// Build bundle resources from a snapshot, keyed by location.
///
/// Entries that fail to build are logged and skipped so the rest still load.
pub fn load_manifests(snapshot: &MetadataSnapshot) -> BTreeMap<String, Arc<Resource>> {
    let mut resources = BTreeMap::new();
    for (location, headers) in snapshot {
        match ManifestBuilder.build(headers) {
            Ok(resource) => {
                resources.insert(location.clone(), Arc::new(resource));
            }
            Err(err) => {
                warn!(location = %location, error = %err, "Skipping resource with invalid metadata");
            }
        }
    }
    resources
}
