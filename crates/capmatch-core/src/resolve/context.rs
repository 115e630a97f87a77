//! Per-session view handed to the external resolution algorithm.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::comparator::CandidateComparator;
use super::wiring::Wiring;
use crate::config::ResolveSettings;
use crate::error::{ResolveError, ResolveResult};
use crate::model::{Capability, Requirement, Resource, ResourceId};
use crate::repository::Repository;

/// Lifecycle of a resolve session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Populated,
    Querying,
    Done,
    Failed,
}

impl SessionState {
    pub fn is_closed(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed)
    }
}

/// What the external resolution algorithm may ask of a session.
pub trait ResolutionContext {
    fn mandatory_resources(&self) -> &[Arc<Resource>];

    fn optional_resources(&self) -> &[Arc<Resource>];

    /// Candidates for one requirement, best first.
    fn find_providers(&mut self, requirement: &Requirement) -> ResolveResult<Vec<Arc<Capability>>>;

    /// Whether the algorithm should try to satisfy `requirement` at all.
    fn is_effective(&self, requirement: &Requirement) -> bool;

    fn wirings(&self) -> &HashMap<ResourceId, Wiring>;

    fn wirings_mut(&mut self) -> &mut HashMap<ResourceId, Wiring>;

    /// Substitute a hosted capability into a candidate list.
    fn insert_hosted_capability(
        &mut self,
        candidates: &mut Vec<Arc<Capability>>,
        hosted: Arc<Capability>,
    ) -> ResolveResult<usize>;
}

/// State of one resolution attempt.
///
/// Candidates for a requirement come from the session's ad hoc resource
/// pool, plus an optional backing repository. Results are ordered with the
/// [`CandidateComparator`] and memoized for the life of the session.
#[derive(Debug)]
pub struct ResolveContext {
    state: SessionState,
    mandatory: Vec<Arc<Resource>>,
    optional: Vec<Arc<Resource>>,
    pool: Vec<Arc<Resource>>,
    repository: Option<Arc<dyn Repository>>,
    resolve_optional: bool,
    wirings: HashMap<ResourceId, Wiring>,
    provider_cache: HashMap<Requirement, Vec<Arc<Capability>>>,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_by_id(target: &mut Vec<Arc<Resource>>, resources: impl IntoIterator<Item = Arc<Resource>>) {
    for resource in resources {
        if !target.iter().any(|r| r.id() == resource.id()) {
            target.push(resource);
        }
    }
}

impl ResolveContext {
    pub fn new() -> Self {
        Self {
            state: SessionState::Created,
            mandatory: Vec::new(),
            optional: Vec::new(),
            pool: Vec::new(),
            repository: None,
            resolve_optional: false,
            wirings: HashMap::new(),
            provider_cache: HashMap::new(),
        }
    }

    /// Create a session configured from settings.
    pub fn from_settings(settings: &ResolveSettings) -> Self {
        Self::new().resolve_optional(settings.optional)
    }

    pub fn with_mandatory(mut self, resources: impl IntoIterator<Item = Arc<Resource>>) -> Self {
        dedup_by_id(&mut self.mandatory, resources);
        self.state = SessionState::Populated;
        self
    }

    pub fn with_optional(mut self, resources: impl IntoIterator<Item = Arc<Resource>>) -> Self {
        dedup_by_id(&mut self.optional, resources);
        self.state = SessionState::Populated;
        self
    }

    pub fn with_candidate_pool(mut self, resources: impl IntoIterator<Item = Arc<Resource>>) -> Self {
        dedup_by_id(&mut self.pool, resources);
        self.state = SessionState::Populated;
        self
    }

    /// Also ask `repository` for candidates.
    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Treat optional requirements as effective.
    pub fn resolve_optional(mut self, enabled: bool) -> Self {
        self.resolve_optional = enabled;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn candidate_pool(&self) -> &[Arc<Resource>] {
        &self.pool
    }

    /// Mark the session as successfully finished.
    pub fn complete(&mut self) {
        self.state = SessionState::Done;
    }

    /// Mark the session as failed.
    pub fn fail(&mut self) {
        self.state = SessionState::Failed;
    }

    fn collect_candidates(&self, requirement: &Requirement) -> Vec<Arc<Capability>> {
        let mut seen: HashSet<Arc<Capability>> = HashSet::new();
        let mut candidates: Vec<Arc<Capability>> = Vec::new();

        let from_pool = self
            .pool
            .iter()
            .flat_map(|resource| resource.capabilities_in(requirement.namespace()))
            .filter(|capability| capability.satisfies(requirement))
            .cloned();
        for capability in from_pool {
            if seen.insert(Arc::clone(&capability)) {
                candidates.push(capability);
            }
        }

        if let Some(repository) = &self.repository {
            match repository.find_providers(std::slice::from_ref(requirement)) {
                Ok(mut found) => {
                    for capability in found.remove(requirement).unwrap_or_default() {
                        if seen.insert(Arc::clone(&capability)) {
                            candidates.push(capability);
                        }
                    }
                }
                Err(err) => {
                    warn!(requirement = %requirement, error = %err, "Repository lookup failed during resolve");
                }
            }
        }

        candidates
    }
}

impl ResolutionContext for ResolveContext {
    fn mandatory_resources(&self) -> &[Arc<Resource>] {
        &self.mandatory
    }

    fn optional_resources(&self) -> &[Arc<Resource>] {
        &self.optional
    }

    fn find_providers(&mut self, requirement: &Requirement) -> ResolveResult<Vec<Arc<Capability>>> {
        if self.state.is_closed() {
            return Err(ResolveError::SessionClosed(self.state));
        }
        self.state = SessionState::Querying;

        if let Some(cached) = self.provider_cache.get(requirement) {
            return Ok(cached.clone());
        }

        let mut candidates = self.collect_candidates(requirement);
        CandidateComparator::with_wirings(&self.wirings).sort(&mut candidates);
        debug!(requirement = %requirement, candidates = candidates.len(), "Computed providers");

        self.provider_cache
            .insert(requirement.clone(), candidates.clone());
        Ok(candidates)
    }

    fn is_effective(&self, requirement: &Requirement) -> bool {
        !requirement.is_optional() || self.resolve_optional
    }

    fn wirings(&self) -> &HashMap<ResourceId, Wiring> {
        &self.wirings
    }

    fn wirings_mut(&mut self) -> &mut HashMap<ResourceId, Wiring> {
        &mut self.wirings
    }

    fn insert_hosted_capability(
        &mut self,
        _candidates: &mut Vec<Arc<Capability>>,
        _hosted: Arc<Capability>,
    ) -> ResolveResult<usize> {
        Err(ResolveError::HostedCapabilityUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrValue, ResourceKind};
    use crate::version::Version;

    fn feature(name: &str, version: u64) -> Arc<Resource> {
        Arc::new(
            Resource::builder(name, Version::new(version, 0, 0), ResourceKind::Feature)
                .capability(
                    "feature",
                    [
                        ("name", AttrValue::from("shared")),
                        ("version", AttrValue::Version(Version::new(version, 0, 0))),
                    ],
                )
                .build(),
        )
    }

    fn requirement(text: &str) -> Requirement {
        let owner = ResourceId::new("consumer", Version::new(1, 0, 0), ResourceKind::Bundle);
        Requirement::parse("feature", text, owner).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let mut context = ResolveContext::new();
        assert_eq!(context.state(), SessionState::Created);

        context = context.with_candidate_pool([feature("a", 1)]);
        assert_eq!(context.state(), SessionState::Populated);

        context.find_providers(&requirement("(name=shared)")).unwrap();
        assert_eq!(context.state(), SessionState::Querying);

        context.complete();
        assert_eq!(
            context.find_providers(&requirement("(name=shared)")),
            Err(ResolveError::SessionClosed(SessionState::Done))
        );
    }

    #[test]
    fn test_pool_candidates_sorted_and_memoized() {
        let mut context = ResolveContext::new()
            .with_candidate_pool([feature("a", 1), feature("b", 3), feature("c", 2)]);
        let req = requirement("(name=shared)");

        let first = context.find_providers(&req).unwrap();
        let owners: Vec<String> = first.iter().map(|c| c.owner().name.clone()).collect();
        assert_eq!(owners, vec!["b", "c", "a"]);

        context.wirings_mut().insert(
            first[2].owner().clone(),
            Wiring::new(first[2].owner().clone()),
        );
        let second = context.find_providers(&req).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_is_effective() {
        let mandatory = requirement("(name=x)");
        let optional = requirement("(name=x)").with_directive("resolution", "optional");

        let strict = ResolveContext::new();
        assert!(strict.is_effective(&mandatory));
        assert!(!strict.is_effective(&optional));

        let lenient = ResolveContext::new().resolve_optional(true);
        assert!(lenient.is_effective(&optional));
    }

    #[test]
    fn test_hosted_capability_unsupported() {
        let mut context = ResolveContext::new();
        let hosted = Arc::clone(&feature("a", 1).capabilities()[0]);
        let mut candidates = Vec::new();
        assert_eq!(
            context.insert_hosted_capability(&mut candidates, hosted),
            Err(ResolveError::HostedCapabilityUnsupported)
        );
    }

    #[test]
    fn test_empty_pool_yields_empty_candidates() {
        let mut context = ResolveContext::new().with_mandatory([feature("root", 1)]);
        assert!(context.find_providers(&requirement("(name=missing)")).unwrap().is_empty());
        assert_eq!(context.mandatory_resources().len(), 1);
        assert!(context.optional_resources().is_empty());
    }
}
