//! Host project model seams.
//!
//! [`ProjectHost`] enumerates and opens projects; [`ProjectModel`] exposes the
//! per-configuration state the engine reads and mutates. Implementations are
//! not required to be `Send`: all access happens on a single owner thread.

use std::path::Path;

use crate::error::ModelError;
use crate::toolchain::ToolchainReader;
use crate::types::ConfigurationId;

/// One project in the host's object model.
pub trait ProjectModel {
    /// Host-unique project name, as used in build lifecycle events.
    fn unique_name(&self) -> &str;

    /// Directory containing the project file.
    fn directory(&self) -> &Path;

    /// Enumerate configuration identities in host order.
    fn configuration_ids(&self) -> Vec<ConfigurationId>;

    /// Toolchain view of one configuration.
    fn toolchain(&self, id: &ConfigurationId) -> Option<&dyn ToolchainReader>;

    /// Imported property sheet paths of one configuration.
    fn property_sheets(&self, id: &ConfigurationId) -> Option<&[String]>;

    /// Append a property sheet import. In-memory only until [`ProjectModel::save`].
    fn add_property_sheet(&mut self, id: &ConfigurationId, path: &str) -> Result<(), ModelError>;

    /// Pre-build command text of one configuration.
    fn pre_build_command(&self, id: &ConfigurationId) -> Option<&str>;

    /// Replace the pre-build command text. In-memory only until [`ProjectModel::save`].
    fn set_pre_build_command(&mut self, id: &ConfigurationId, text: &str)
        -> Result<(), ModelError>;

    /// Persist pending changes.
    fn save(&mut self) -> Result<(), ModelError>;

    /// Whether `id` names a configuration of this project.
    fn has_configuration(&self, id: &ConfigurationId) -> bool {
        self.toolchain(id).is_some()
    }
}

/// The host's solution: the set of projects events can refer to.
pub trait ProjectHost {
    type Project: ProjectModel;

    /// Unique names of every project, in solution order.
    fn project_names(&self) -> Result<Vec<String>, ModelError>;

    /// Open a project by unique name. Each call reads the current state;
    /// nothing is cached between calls.
    fn open_project(&self, unique_name: &str) -> Result<Self::Project, ModelError>;
}
