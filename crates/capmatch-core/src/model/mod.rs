//! Resource model: resources, capabilities, requirements and attribute values.
//!
//! Everything here is immutable once built. Capabilities are shared as
//! `Arc<Capability>` so repositories and sessions can hand them out cheaply.

mod attr;
mod capability;
pub mod namespace;
mod requirement;
mod resource;

pub use attr::{AttrValue, Attributes, Directives};
pub use capability::Capability;
pub use requirement::Requirement;
pub use resource::{Resource, ResourceBuilder, ResourceId, ResourceKind};
