//! Bridge between the repositories and an external resolution algorithm.
//!
//! The algorithm that computes a consistent wiring lives elsewhere; this
//! module supplies it with ordered candidates per requirement and holds the
//! session state it reads and writes.

mod comparator;
mod context;
mod wiring;

pub use comparator::CandidateComparator;
pub use context::{ResolutionContext, ResolveContext, SessionState};
pub use wiring::{Wire, Wiring};
