//! Capmatch Core Library
//!
//! Capability/requirement matching for modular resources: an LDAP-style
//! filter language, per-namespace capability indexes, composable
//! repositories and the session context handed to a resolver.

pub mod builder;
pub mod capset;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod repository;
pub mod resolve;
pub mod version;

/// Re-exports of commonly used types
pub mod prelude {
    // Model
    pub use crate::model::{
        AttrValue, Attributes, Capability, Directives, Requirement, Resource, ResourceId,
        ResourceKind, namespace,
    };

    // Filters
    pub use crate::filter::FilterExpr;

    // Builders
    pub use crate::builder::{DescriptorBuilder, FeatureBuilder, FeatureDescriptor, ManifestBuilder};

    // Repositories
    pub use crate::capset::CapabilitySet;
    pub use crate::repository::{
        AggregateRepository, BaseRepository, CacheRepository, MetadataProvider, Repository,
        StaticMetadata,
    };

    // Resolution
    pub use crate::resolve::{CandidateComparator, ResolutionContext, ResolveContext, Wiring};

    // Configuration
    pub use crate::config::{ConfigStore, EngineConfig};

    // Errors
    pub use crate::error::{BuildError, FilterSyntaxError, RepositoryError, ResolveError};

    // Version
    pub use crate::version::{Version, VersionRange};
}
