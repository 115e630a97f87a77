//! Capability sources.
//!
//! Every source answers the same question through [`Repository`]: which
//! capabilities satisfy each of these requirements. Implementations compose
//! by wrapping:
//! - [`BaseRepository`] indexes a fixed set of resources
//! - [`CacheRepository`] memoizes another repository's answers
//! - [`AggregateRepository`] unions the answers of several repositories

mod aggregate;
mod base;
mod cache;
mod metadata;

pub use aggregate::AggregateRepository;
pub use base::{BaseRepository, load_manifests};
pub use cache::CacheRepository;
pub use metadata::{MetadataProvider, MetadataSnapshot, StaticMetadata};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RepositoryResult;
use crate::model::{Capability, Requirement};

/// Capabilities found per requirement.
pub type Providers = HashMap<Requirement, Vec<Arc<Capability>>>;

/// A source of capabilities.
pub trait Repository: Send + Sync + fmt::Debug {
    /// Find the capabilities satisfying each requirement.
    ///
    /// The result has an entry for every distinct input requirement; a
    /// requirement nothing satisfies maps to an empty list.
    fn find_providers(&self, requirements: &[Requirement]) -> RepositoryResult<Providers>;
}

impl<R: Repository + ?Sized> Repository for Arc<R> {
    fn find_providers(&self, requirements: &[Requirement]) -> RepositoryResult<Providers> {
        (**self).find_providers(requirements)
    }
}
