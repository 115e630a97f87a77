//! Union of several repositories.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use super::{Providers, Repository};
use crate::error::RepositoryResult;
use crate::model::{Capability, Requirement};

/// Queries every child for every requirement and unions the answers.
///
/// A child failing on one requirement contributes nothing for that
/// requirement; the remaining children and requirements are still queried.
#[derive(Debug, Default, Clone)]
pub struct AggregateRepository {
    children: Vec<Arc<dyn Repository>>,
}

impl AggregateRepository {
    pub fn new(children: Vec<Arc<dyn Repository>>) -> Self {
        Self { children }
    }

    pub fn push(&mut self, child: Arc<dyn Repository>) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Arc<dyn Repository>] {
        &self.children
    }
}

impl Repository for AggregateRepository {
    fn find_providers(&self, requirements: &[Requirement]) -> RepositoryResult<Providers> {
        let mut providers = Providers::new();
        for requirement in requirements {
            if providers.contains_key(requirement) {
                continue;
            }

            let mut seen: HashSet<Arc<Capability>> = HashSet::new();
            let mut merged: Vec<Arc<Capability>> = Vec::new();
            for (index, child) in self.children.iter().enumerate() {
                match child.find_providers(std::slice::from_ref(requirement)) {
                    Ok(mut found) => {
                        for capability in found.remove(requirement).unwrap_or_default() {
                            if seen.insert(Arc::clone(&capability)) {
                                merged.push(capability);
                            }
                        }
                    }
                    Err(err) => {
                        warn!(
                            child = index,
                            requirement = %requirement,
                            error = %err,
                            "Repository lookup failed; treating as no providers"
                        );
                    }
                }
            }
            providers.insert(requirement.clone(), merged);
        }
        Ok(providers)
    }
}
