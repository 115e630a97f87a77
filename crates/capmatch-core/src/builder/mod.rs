//! Resource builders.
//!
//! Turn raw module metadata into [`Resource`]s:
//! - manifest-style header maps (bundles)
//! - feature descriptors, whose bundle references resolve against
//!   bundles that were already built

mod feature;
mod header;
pub mod manifest;

pub use feature::{BundleRef, FeatureBuilder, FeatureDependency, FeatureDescriptor};
pub use header::{Clause, parse_header, typed_value};
pub use manifest::{Manifest, ManifestBuilder};

use crate::error::BuildResult;
use crate::model::Resource;

/// Builds a resource from one kind of descriptor.
pub trait DescriptorBuilder {
    type Descriptor;

    fn build(&self, descriptor: &Self::Descriptor) -> BuildResult<Resource>;
}
