//! In-memory [`ProjectModel`] for unit tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rigging_core::{
    BuildConfiguration, ConfigurationId, ModelError, ProjectModel, ToolchainReader,
};

pub(crate) fn config(
    configuration: &str,
    platform: &str,
    toolset: &str,
    runtime_library: &str,
) -> BuildConfiguration {
    let mut macros = BTreeMap::new();
    macros.insert("PlatformToolset".to_string(), toolset.to_string());
    macros.insert("MSBuildVersion".to_string(), "17.9".to_string());
    BuildConfiguration {
        configuration: configuration.to_string(),
        platform: platform.to_string(),
        macros,
        runtime_library: Some(runtime_library.to_string()),
        language_standard: Some("stdcpp17".to_string()),
        property_sheets: Vec::new(),
        pre_build_command: String::new(),
    }
}

#[derive(Debug)]
pub(crate) struct MockProject {
    pub name: String,
    pub dir: PathBuf,
    pub configurations: Vec<BuildConfiguration>,
    pub saves: usize,
}

impl MockProject {
    pub fn new(dir: &Path, configurations: Vec<BuildConfiguration>) -> Self {
        Self {
            name: "App/App.project.yaml".to_string(),
            dir: dir.to_path_buf(),
            configurations,
            saves: 0,
        }
    }

    fn find_mut(&mut self, id: &ConfigurationId) -> Result<&mut BuildConfiguration, ModelError> {
        let project = self.name.clone();
        self.configurations
            .iter_mut()
            .find(|c| c.id() == *id)
            .ok_or_else(|| ModelError::ConfigurationNotFound {
                project,
                configuration: id.to_string(),
            })
    }

    fn find(&self, id: &ConfigurationId) -> Option<&BuildConfiguration> {
        self.configurations.iter().find(|c| c.id() == *id)
    }
}

impl ProjectModel for MockProject {
    fn unique_name(&self) -> &str {
        &self.name
    }

    fn directory(&self) -> &Path {
        &self.dir
    }

    fn configuration_ids(&self) -> Vec<ConfigurationId> {
        self.configurations.iter().map(BuildConfiguration::id).collect()
    }

    fn toolchain(&self, id: &ConfigurationId) -> Option<&dyn ToolchainReader> {
        self.find(id).map(|c| c as &dyn ToolchainReader)
    }

    fn property_sheets(&self, id: &ConfigurationId) -> Option<&[String]> {
        self.find(id).map(|c| c.property_sheets.as_slice())
    }

    fn add_property_sheet(&mut self, id: &ConfigurationId, path: &str) -> Result<(), ModelError> {
        self.find_mut(id)?.property_sheets.push(path.to_string());
        Ok(())
    }

    fn pre_build_command(&self, id: &ConfigurationId) -> Option<&str> {
        self.find(id).map(|c| c.pre_build_command.as_str())
    }

    fn set_pre_build_command(
        &mut self,
        id: &ConfigurationId,
        text: &str,
    ) -> Result<(), ModelError> {
        self.find_mut(id)?.pre_build_command = text.to_string();
        Ok(())
    }

    fn save(&mut self) -> Result<(), ModelError> {
        self.saves += 1;
        Ok(())
    }
}
