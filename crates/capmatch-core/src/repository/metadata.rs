//! Metadata snapshots consumed when a repository is (re)built.

use std::collections::BTreeMap;

/// Header maps keyed by resource location.
pub type MetadataSnapshot = BTreeMap<String, BTreeMap<String, String>>;

/// Supplies resource metadata at repository build time.
///
/// Never consulted during a lookup.
pub trait MetadataProvider {
    fn snapshot(&self) -> anyhow::Result<MetadataSnapshot>;
}

/// Metadata held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    entries: MetadataSnapshot,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the headers for `location`.
    pub fn insert<I, K, V>(&mut self, location: impl Into<String>, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.entries.insert(location.into(), headers);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<MetadataSnapshot> for StaticMetadata {
    fn from(entries: MetadataSnapshot) -> Self {
        Self { entries }
    }
}

impl MetadataProvider for StaticMetadata {
    fn snapshot(&self) -> anyhow::Result<MetadataSnapshot> {
        Ok(self.entries.clone())
    }
}
