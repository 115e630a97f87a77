use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use capmatch_core::error::{RepositoryError, RepositoryResult};
use capmatch_core::model::{AttrValue, Requirement, Resource, ResourceId, ResourceKind, namespace};
use capmatch_core::repository::{
    AggregateRepository, BaseRepository, CacheRepository, Providers, Repository,
};
use capmatch_core::version::Version;

fn feature(name: &str, version: u64) -> Resource {
    Resource::builder(name, Version::new(version, 0, 0), ResourceKind::Feature)
        .capability(
            namespace::FEATURE,
            [
                ("name", AttrValue::from(name)),
                ("version", AttrValue::Version(Version::new(version, 0, 0))),
            ],
        )
        .build()
}

fn requirement(filter: &str) -> Requirement {
    let owner = ResourceId::new("consumer", Version::new(1, 0, 0), ResourceKind::Bundle);
    Requirement::parse(namespace::FEATURE, filter, owner).unwrap()
}

/// Counts how many times each requirement reaches the wrapped repository.
#[derive(Debug)]
struct CountingRepository {
    inner: BaseRepository,
    calls: AtomicUsize,
    seen: AtomicUsize,
}

impl CountingRepository {
    fn new(inner: BaseRepository) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            seen: AtomicUsize::new(0),
        }
    }
}

impl Repository for CountingRepository {
    fn find_providers(&self, requirements: &[Requirement]) -> RepositoryResult<Providers> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.fetch_add(requirements.len(), Ordering::SeqCst);
        self.inner.find_providers(requirements)
    }
}

#[derive(Debug)]
struct FailingRepository;

impl Repository for FailingRepository {
    fn find_providers(&self, _requirements: &[Requirement]) -> RepositoryResult<Providers> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

#[test]
fn base_repository_finds_single_feature() {
    let repository = BaseRepository::with_resources([Arc::new(feature("foo", 1))]);
    let req = requirement("(name=foo)");

    let providers = repository.find_providers(std::slice::from_ref(&req)).unwrap();
    let found = &providers[&req];

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].attribute("name"), Some(&AttrValue::from("foo")));
}

#[test]
fn base_repository_unknown_namespace_is_empty() {
    let repository = BaseRepository::with_resources([Arc::new(feature("foo", 1))]);
    let owner = ResourceId::new("consumer", Version::new(1, 0, 0), ResourceKind::Bundle);
    let req = Requirement::parse("osgi.wiring.package", "(osgi.wiring.package=org.x)", owner)
        .unwrap();

    let providers = repository.find_providers(std::slice::from_ref(&req)).unwrap();
    assert!(providers[&req].is_empty());
}

#[test]
fn input_order_does_not_change_results() {
    let repository = BaseRepository::with_resources([
        Arc::new(feature("foo", 1)),
        Arc::new(feature("bar", 2)),
    ]);
    let foo = requirement("(name=foo)");
    let bar = requirement("(version>=2.0.0)");

    let forward = repository.find_providers(&[foo.clone(), bar.clone()]).unwrap();
    let backward = repository.find_providers(&[bar.clone(), foo.clone()]).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn cache_delegates_each_requirement_at_most_once() {
    let counting = Arc::new(CountingRepository::new(BaseRepository::with_resources([
        Arc::new(feature("foo", 1)),
    ])));
    let cache = CacheRepository::new(counting.clone());
    let req = requirement("(name=foo)");

    let first = cache.find_providers(std::slice::from_ref(&req)).unwrap();
    let second = cache.find_providers(std::slice::from_ref(&req)).unwrap();

    assert_eq!(first, second);
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_only_forwards_missing_requirements() {
    let counting = Arc::new(CountingRepository::new(BaseRepository::with_resources([
        Arc::new(feature("foo", 1)),
        Arc::new(feature("bar", 1)),
    ])));
    let cache = CacheRepository::new(counting.clone());
    let foo = requirement("(name=foo)");
    let bar = requirement("(name=bar)");

    cache.find_providers(std::slice::from_ref(&foo)).unwrap();
    let both = cache.find_providers(&[foo.clone(), bar.clone(), bar.clone()]).unwrap();

    assert_eq!(both.len(), 2);
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    assert_eq!(counting.seen.load(Ordering::SeqCst), 2);
}

#[test]
fn cache_is_shared_across_threads() {
    let cache = Arc::new(CacheRepository::new(Arc::new(BaseRepository::with_resources([
        Arc::new(feature("foo", 1)),
    ]))));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                let req = requirement("(name=foo)");
                cache.find_providers(std::slice::from_ref(&req)).unwrap()[&req].len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn aggregate_unions_without_duplicates() {
    let shared = Arc::new(feature("foo", 1));
    let a = BaseRepository::with_resources([Arc::clone(&shared), Arc::new(feature("foo", 2))]);
    let b = BaseRepository::with_resources([shared, Arc::new(feature("foo", 3))]);
    let req = requirement("(name=foo)");

    let expected: HashSet<_> = a.find_providers(std::slice::from_ref(&req)).unwrap()[&req]
        .iter()
        .chain(b.find_providers(std::slice::from_ref(&req)).unwrap()[&req].iter())
        .cloned()
        .collect();

    let aggregate = AggregateRepository::new(vec![Arc::new(a), Arc::new(b)]);
    let found = aggregate.find_providers(std::slice::from_ref(&req)).unwrap()[&req].clone();

    assert_eq!(found.len(), 3);
    assert_eq!(found.iter().cloned().collect::<HashSet<_>>(), expected);
}

#[test]
fn aggregate_over_empty_children_is_empty() {
    let aggregate = AggregateRepository::new(vec![
        Arc::new(BaseRepository::new()),
        Arc::new(BaseRepository::new()),
    ]);
    let req = requirement("(name=anything)");

    let providers = aggregate.find_providers(std::slice::from_ref(&req)).unwrap();
    assert!(providers[&req].is_empty());
}

#[test]
fn aggregate_contains_failing_child() {
    let aggregate = AggregateRepository::new(vec![
        Arc::new(FailingRepository),
        Arc::new(BaseRepository::with_resources([Arc::new(feature("foo", 1))])),
    ]);
    let req = requirement("(name=foo)");

    let providers = aggregate.find_providers(std::slice::from_ref(&req)).unwrap();
    assert_eq!(providers[&req].len(), 1);
}

#[test]
fn mandatory_identity_is_never_matched_by_accident() {
    let bundle = Resource::builder("web", Version::new(1, 0, 0), ResourceKind::Bundle)
        .capability(
            namespace::IDENTITY,
            [
                (namespace::IDENTITY, AttrValue::from("web")),
                (namespace::ATTR_TYPE, AttrValue::from(namespace::TYPE_BUNDLE)),
            ],
        )
        .build();
    let repository = BaseRepository::with_resources([Arc::new(bundle)]);
    let owner = ResourceId::new("consumer", Version::new(1, 0, 0), ResourceKind::Bundle);

    let by_type = Requirement::parse(namespace::IDENTITY, "(type=osgi.bundle)", owner.clone())
        .unwrap();
    let by_identity = Requirement::parse(
        namespace::IDENTITY,
        "(&(osgi.identity=web)(type=osgi.bundle))",
        owner,
    )
    .unwrap();

    let providers = repository
        .find_providers(&[by_type.clone(), by_identity.clone()])
        .unwrap();
    assert!(providers[&by_type].is_empty());
    assert_eq!(providers[&by_identity].len(), 1);
}
