//! Candidate ordering.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Capability, ResourceId};

use super::wiring::Wiring;

/// Orders candidate capabilities for a requirement.
///
/// Keys, in order:
/// 1. preference: `preferred:=true` first, then capabilities of resources
///    that are already wired, then the rest
/// 2. owner version, highest first
/// 3. owner name, lexicographic
#[derive(Debug, Clone, Copy)]
pub struct CandidateComparator<'a> {
    wirings: Option<&'a HashMap<ResourceId, Wiring>>,
}

impl<'a> CandidateComparator<'a> {
    /// Comparator without wiring context.
    pub fn new() -> Self {
        Self { wirings: None }
    }

    /// Comparator that favours resources already present in `wirings`.
    pub fn with_wirings(wirings: &'a HashMap<ResourceId, Wiring>) -> Self {
        Self {
            wirings: Some(wirings),
        }
    }

    fn preference(&self, capability: &Capability) -> u8 {
        if capability.is_preferred() {
            0
        } else if self
            .wirings
            .is_some_and(|w| w.contains_key(capability.owner()))
        {
            1
        } else {
            2
        }
    }

    pub fn compare(&self, a: &Capability, b: &Capability) -> Ordering {
        self.preference(a)
            .cmp(&self.preference(b))
            .then_with(|| b.owner().version.cmp(&a.owner().version))
            .then_with(|| a.owner().name.cmp(&b.owner().name))
    }

    /// Stable sort, so capabilities equal on every key keep their input order.
    pub fn sort(&self, candidates: &mut [Arc<Capability>]) {
        candidates.sort_by(|a, b| self.compare(a, b));
    }
}

impl Default for CandidateComparator<'_> {
    fn default() -> Self {
        Self::new()
    }
}
