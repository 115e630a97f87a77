//! Memoizing repository decorator.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::{Providers, Repository};
use crate::error::RepositoryResult;
use crate::model::{Capability, Requirement};

/// Remembers the answers of a wrapped repository, per requirement.
///
/// Entries are never evicted. The memo is a sharded concurrent map, so
/// sessions on different threads read and insert without a global lock.
#[derive(Debug)]
pub struct CacheRepository {
    inner: Arc<dyn Repository>,
    memo: DashMap<Requirement, Vec<Arc<Capability>>>,
}

impl CacheRepository {
    pub fn new(inner: Arc<dyn Repository>) -> Self {
        Self {
            inner,
            memo: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Repository> {
        &self.inner
    }

    /// Number of memoized requirements.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

impl Repository for CacheRepository {
    fn find_providers(&self, requirements: &[Requirement]) -> RepositoryResult<Providers> {
        let mut providers = Providers::new();
        let mut missing: Vec<Requirement> = Vec::new();
        let mut queued: HashSet<&Requirement> = HashSet::new();

        for requirement in requirements {
            let cached = self.memo.get(requirement).map(|hit| hit.value().clone());
            match cached {
                Some(capabilities) => {
                    providers.insert(requirement.clone(), capabilities);
                }
                None if queued.insert(requirement) => missing.push(requirement.clone()),
                None => {}
            }
        }

        if missing.is_empty() {
            return Ok(providers);
        }

        debug!(
            hits = providers.len(),
            misses = missing.len(),
            "Delegating uncached requirements"
        );
        let mut fetched = self.inner.find_providers(&missing)?;
        for requirement in missing {
            let capabilities = fetched.remove(&requirement).unwrap_or_default();
            let stored = self
                .memo
                .entry(requirement.clone())
                .or_insert(capabilities)
                .value()
                .clone();
            providers.insert(requirement, stored);
        }
        Ok(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::model::{ResourceId, ResourceKind};
    use crate::version::Version;

    #[derive(Debug, Default)]
    struct Recording {
        batches: Mutex<Vec<usize>>,
    }

    impl Repository for Recording {
        fn find_providers(&self, requirements: &[Requirement]) -> RepositoryResult<Providers> {
            if let Ok(mut batches) = self.batches.lock() {
                batches.push(requirements.len());
            }
            Ok(requirements.iter().map(|r| (r.clone(), Vec::new())).collect())
        }
    }

    fn requirement(name: &str) -> Requirement {
        let owner = ResourceId::new("owner", Version::new(1, 0, 0), ResourceKind::Bundle);
        Requirement::parse("feature", &format!("(name={})", name), owner).unwrap()
    }

    #[test]
    fn test_duplicate_misses_are_delegated_once() {
        let inner = Arc::new(Recording::default());
        let cache = CacheRepository::new(inner.clone());

        let batch: Vec<Requirement> = (0..500)
            .map(|i| requirement(&format!("r{}", i % 50)))
            .collect();
        let providers = cache.find_providers(&batch).unwrap();

        assert_eq!(providers.len(), 50);
        assert_eq!(*inner.batches.lock().unwrap(), vec![50]);

        cache.find_providers(&batch).unwrap();
        assert_eq!(inner.batches.lock().unwrap().len(), 1);
        assert_eq!(cache.len(), 50);
    }
}
