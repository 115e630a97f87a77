//! Error types for the matching engine.
//!
//! Parsing and construction errors are returned to the immediate caller.
//! Lookup failures inside composite repositories are contained and logged
//! where they happen.

use thiserror::Error;

use crate::resolve::SessionState;

/// Malformed filter text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid filter at position {position}: {message}")]
pub struct FilterSyntaxError {
    /// Character offset into the filter text
    pub position: usize,
    pub message: String,
}

impl FilterSyntaxError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Malformed version or version range text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,

    #[error("Invalid version '{text}': {reason}")]
    Malformed { text: String, reason: String },

    #[error("Invalid version range '{text}': {reason}")]
    MalformedRange { text: String, reason: String },
}

/// Failure to turn a descriptor into a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A referenced bundle location is not among the already-built resources
    #[error("Referenced resource not found: {0}")]
    MissingDependency(String),

    /// A referenced bundle exposes more than one identity capability
    #[error("Resource at {0} exposes more than one identity capability")]
    MultipleIdentities(String),

    /// A referenced bundle exposes no identity capability at all
    #[error("Resource at {0} exposes no identity capability")]
    MissingIdentity(String),

    #[error("Malformed attribute '{name}' = '{value}': {reason}")]
    MalformedAttribute {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error(transparent)]
    InvalidFilter(#[from] FilterSyntaxError),
}

impl BuildError {
    pub(crate) fn malformed(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::MalformedAttribute {
            name: name.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Repository lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Raised by repositories backed by an external source
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Capability namespace '{found}' does not belong in set '{expected}'")]
    NamespaceMismatch { expected: String, found: String },
}

/// Failure reported to the external resolution algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Hosted capability insertion is not supported")]
    HostedCapabilityUnsupported,

    #[error("Resolve session is closed ({0:?})")]
    SessionClosed(SessionState),
}

pub type BuildResult<T> = Result<T, BuildError>;
pub type RepositoryResult<T> = Result<T, RepositoryError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
