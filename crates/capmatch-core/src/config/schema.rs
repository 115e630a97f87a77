//! Configuration schema for capmatch.toml
//!
//! ```toml
//! [resolve]
//! optional = false
//!
//! [repository.local]
//! cache = true
//!
//! [repository.local.manifests."file:/bundles/web.jar"]
//! Bundle-SymbolicName = "web"
//! Bundle-Version = "1.0.0"
//!
//! [[repository.local.features]]
//! name = "web-feature"
//! version = "1.0.0"
//! bundles = [{ location = "file:/bundles/web.jar" }]
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::builder::{DescriptorBuilder, FeatureBuilder, FeatureDescriptor, manifest};
use crate::repository::{
    AggregateRepository, BaseRepository, CacheRepository, Repository, load_manifests,
};
use crate::version::parse_version;

/// Root configuration structure for capmatch.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub resolve: ResolveSettings,

    /// Named repositories, queried in name order
    #[serde(default)]
    pub repository: BTreeMap<String, RepositoryEntry>,
}

/// Defaults for resolve sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSettings {
    /// Treat `resolution:=optional` requirements as effective
    #[serde(default)]
    pub optional: bool,
}

/// One repository built from inline metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    /// Memoize lookups against this repository
    #[serde(default = "default_cache")]
    pub cache: bool,

    /// Manifest header maps keyed by bundle location
    #[serde(default)]
    pub manifests: BTreeMap<String, BTreeMap<String, String>>,

    #[serde(default)]
    pub features: Vec<FeatureDescriptor>,
}

fn default_cache() -> bool {
    true
}

impl Default for RepositoryEntry {
    fn default() -> Self {
        Self {
            cache: default_cache(),
            manifests: BTreeMap::new(),
            features: Vec::new(),
        }
    }
}

impl RepositoryEntry {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (location, headers) in &self.manifests {
            if !headers.contains_key(manifest::BUNDLE_SYMBOLIC_NAME) {
                anyhow::bail!(
                    "Manifest '{}' is missing {}",
                    location,
                    manifest::BUNDLE_SYMBOLIC_NAME
                );
            }
        }

        for feature in &self.features {
            if feature.name.trim().is_empty() {
                anyhow::bail!("Feature name cannot be empty");
            }
            if let Some(version) = &feature.version {
                parse_version(version)
                    .with_context(|| format!("Invalid version for feature '{}'", feature.name))?;
            }
            for bundle in &feature.bundles {
                if bundle.location.trim().is_empty() {
                    anyhow::bail!("Feature '{}' has a bundle with an empty location", feature.name);
                }
            }
        }

        Ok(())
    }

    /// Build the base repository: manifests first, then features over them.
    ///
    /// Entries that fail to build are logged and skipped.
    pub fn build(&self) -> BaseRepository {
        let bundles = load_manifests(&self.manifests);
        let builder = FeatureBuilder::new(&bundles);

        let mut repository = BaseRepository::with_resources(bundles.values().cloned());
        for feature in &self.features {
            match builder.build(feature) {
                Ok(resource) => repository.add_resource(resource),
                Err(err) => {
                    warn!(feature = %feature.name, error = %err, "Skipping feature that failed to build");
                }
            }
        }
        repository
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, entry) in &self.repository {
            if name.trim().is_empty() {
                anyhow::bail!("Repository name cannot be empty");
            }
            entry
                .validate()
                .with_context(|| format!("Invalid repository configuration: '{}'", name))?;
        }
        Ok(())
    }

    /// Compose every configured repository into one aggregate.
    pub fn build_repository(&self) -> AggregateRepository {
        let mut aggregate = AggregateRepository::default();
        for (name, entry) in &self.repository {
            let base = entry.build();
            debug!(repository = %name, resources = base.resources().len(), cache = entry.cache, "Built repository");

            let child: Arc<dyn Repository> = if entry.cache {
                Arc::new(CacheRepository::new(Arc::new(base)))
            } else {
                Arc::new(base)
            };
            aggregate.push(child);
        }
        aggregate
    }
}
