use std::sync::Arc;

use tempfile::TempDir;

use capmatch_core::builder::{DescriptorBuilder, FeatureBuilder, FeatureDescriptor};
use capmatch_core::config::{CONFIG_FILE_NAME, ConfigStore, EngineConfig, parse_config_str};
use capmatch_core::model::namespace;
use capmatch_core::repository::{
    BaseRepository, MetadataProvider, Repository, StaticMetadata, load_manifests,
};
use capmatch_core::resolve::{ResolutionContext, ResolveContext};

const CONFIG: &str = r#"
[resolve]
optional = false

[repository.local.manifests."file:/web.jar"]
Bundle-SymbolicName = "org.example.web"
Bundle-Version = "1.0.0"
Export-Package = "org.example.web;version=1.0"

[repository.local.manifests."file:/log.jar"]
Bundle-SymbolicName = "org.example.log"
Bundle-Version = "2.3.0"

[[repository.local.features]]
name = "web"
version = "1.0.0"
bundles = [
    { location = "file:/web.jar" },
    { location = "file:/log.jar", optional = true },
]

[[repository.local.features]]
name = "app"
version = "1.0.0"
dependencies = [{ name = "web", version = "[1.0,2.0)" }]
"#;

#[test]
fn load_missing_returns_empty_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_path(temp.path().join("config").join(CONFIG_FILE_NAME));

    let config = store.load().unwrap();

    assert!(config.repository.is_empty());
    assert!(!config.resolve.optional);
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_path(temp.path().join(CONFIG_FILE_NAME));

    let config = parse_config_str(CONFIG).unwrap();
    store.save(&config).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn configured_features_resolve_against_bundles() {
    let config = parse_config_str(CONFIG).unwrap();
    let local = config.repository["local"].build();
    assert_eq!(local.resources().len(), 4);

    let app = local
        .resources()
        .iter()
        .find(|r| r.name() == "app")
        .cloned()
        .unwrap();
    let web = local
        .resources()
        .iter()
        .find(|r| r.name() == "web")
        .cloned()
        .unwrap();

    let mut context = ResolveContext::from_settings(&config.resolve)
        .with_mandatory([Arc::clone(&app)])
        .with_repository(Arc::new(config.build_repository()));

    let dependency = &app.requirements()[0];
    let features = context.find_providers(dependency).unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].owner(), web.id());

    let bundle_requirements: Vec<_> = web.requirements_in(namespace::IDENTITY).collect();
    assert_eq!(bundle_requirements.len(), 2);
    for requirement in &bundle_requirements {
        let bundles = context.find_providers(requirement).unwrap();
        assert_eq!(bundles.len(), 1, "{}", requirement);
    }
    assert!(context.is_effective(bundle_requirements[0]));
    assert!(!context.is_effective(bundle_requirements[1]));
}

#[test]
fn metadata_loading_skips_invalid_entries() {
    let mut metadata = StaticMetadata::new();
    metadata.insert(
        "file:/ok.jar",
        [("Bundle-SymbolicName", "ok"), ("Bundle-Version", "1.0.0")],
    );
    metadata.insert("file:/broken.jar", [("Bundle-Version", "not-a-version")]);

    let snapshot = metadata.snapshot().unwrap();
    let bundles = load_manifests(&snapshot);
    assert_eq!(bundles.len(), 1);
    assert!(bundles.contains_key("file:/ok.jar"));

    let repository = BaseRepository::from_metadata(&metadata).unwrap();
    assert_eq!(repository.resources().len(), 1);
}

#[test]
fn feature_with_unknown_bundle_fails_to_build() {
    let snapshot = StaticMetadata::new().snapshot().unwrap();
    let bundles = load_manifests(&snapshot);
    let feature = FeatureDescriptor::new("web", "1.0.0").with_bundle("file:/missing.jar", false);

    let err = FeatureBuilder::new(&bundles).build(&feature).unwrap_err();
    assert!(err.to_string().contains("file:/missing.jar"), "{}", err);
}

#[test]
fn aggregate_from_config_answers_package_imports() {
    let config = parse_config_str(CONFIG).unwrap();
    let repository = config.build_repository();

    let owner = capmatch_core::model::ResourceId::new(
        "consumer",
        capmatch_core::version::Version::new(1, 0, 0),
        capmatch_core::model::ResourceKind::Bundle,
    );
    let import = capmatch_core::model::Requirement::parse(
        namespace::PACKAGE,
        "(&(osgi.wiring.package=org.example.web)(version>=1.0.0))",
        owner,
    )
    .unwrap();

    let providers = repository.find_providers(std::slice::from_ref(&import)).unwrap();
    assert_eq!(providers[&import].len(), 1);

    let empty = EngineConfig::new().build_repository();
    assert!(empty.find_providers(std::slice::from_ref(&import)).unwrap()[&import].is_empty());
}
