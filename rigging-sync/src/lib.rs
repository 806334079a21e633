//! # rigging-sync
//!
//! Keeps Conan profiles, dependency declarations and build wiring in step with
//! a project's build configurations.
//!
//! Call [`pipeline::run`] to sync a whole solution, or use the per-component
//! modules ([`profiles`], [`requirements`], [`injector`]) for targeted work
//! such as reacting to a single configuration build.

pub mod diff;
pub mod error;
pub mod guard;
pub mod injector;
pub mod pipeline;
pub mod profiles;
pub mod requirements;
pub mod scaffold;
pub mod translator;

#[cfg(test)]
mod test_support;

pub use error::SyncError;
pub use guard::WriteResult;
pub use injector::{ensure_wired, InjectionOutcome, InjectionReport};
pub use pipeline::{run, ProjectRun, ProjectSyncResult, SyncScope};
pub use profiles::{regenerate_configuration, regenerate_project, ProfileReport, ProfileState};
pub use requirements::RequirementChange;
pub use translator::{translate, ProfileSettings};
