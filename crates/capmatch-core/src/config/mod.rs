//! Engine configuration
//!
//! A single TOML file declares resolve defaults and the repositories to
//! compose, each built from inline manifests and feature descriptors.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_config, parse_config_str, to_toml};
pub use schema::{EngineConfig, RepositoryEntry, ResolveSettings};
pub use store::{CONFIG_FILE_NAME, ConfigStore};
