//! Rigging core library: build configuration model, host traits, manifests.
//!
//! Public API surface:
//! - [`types`]: configuration identity and manifest structs
//! - [`toolchain`]: [`ToolchainReader`], the typed view of a configuration
//! - [`model`]: [`ProjectModel`] / [`ProjectHost`] seams over the host IDE
//! - [`manifest`]: YAML-backed host implementation
//! - [`settings`]: user settings (`~/.rigging/config.yaml`)
//! - [`error`]: [`ModelError`]

pub mod error;
pub mod manifest;
pub mod model;
pub mod settings;
pub mod toolchain;
pub mod types;

pub use error::ModelError;
pub use manifest::{ManifestProject, ManifestSolution};
pub use model::{ProjectHost, ProjectModel};
pub use settings::Settings;
pub use toolchain::ToolchainReader;
pub use types::{BuildConfiguration, ConfigurationId, ProjectManifest, SolutionManifest};
