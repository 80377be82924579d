//! Domain logic - pure business rules independent of git operations

pub mod change;
pub mod commit;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use change::{Category, Change};
pub use commit::{CommitType, ParsedCommit};
pub use prerelease::{next_prerelease, Counter};
pub use tag::{release_ref_names, strip_release_prefix, ReleaseRef};
pub use version::{bump, parse_tolerant, Increment};
