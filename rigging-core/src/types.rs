//! Domain types for the build project model.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Manifest structs are serializable/deserializable via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identity of one buildable variant of a project: `(configuration, platform)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigurationId {
    pub configuration: String,
    pub platform: String,
}

impl ConfigurationId {
    pub fn new(configuration: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            platform: platform.into(),
        }
    }

    /// Filesystem-safe name used for the profile file: `Debug|x64` → `Debug_x64`.
    pub fn profile_name(&self) -> String {
        self.to_string().replace('|', "_")
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.configuration, self.platform)
    }
}

// ---------------------------------------------------------------------------
// Manifest structs
// ---------------------------------------------------------------------------

/// A single build configuration as recorded in a project manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    /// Configuration name, e.g. `Debug`.
    pub configuration: String,
    /// Platform name, e.g. `x64`.
    pub platform: String,
    /// Evaluated property macros (`PlatformToolset`, `MSBuildVersion`, ...).
    #[serde(default)]
    pub macros: BTreeMap<String, String>,
    /// Raw runtime library value as the host reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_library: Option<String>,
    /// Raw language standard value, e.g. `stdcpp17`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_standard: Option<String>,
    /// Imported property sheets, in import order.
    #[serde(default)]
    pub property_sheets: Vec<String>,
    /// Pre-build event command text.
    #[serde(default)]
    pub pre_build_command: String,
}

impl BuildConfiguration {
    pub fn id(&self) -> ConfigurationId {
        ConfigurationId::new(&self.configuration, &self.platform)
    }
}

/// Root of a project manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    #[serde(default)]
    pub configurations: Vec<BuildConfiguration>,
}

/// Root of a solution manifest: the list of project manifests, relative to
/// the solution file's directory. The listed string is the project's unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SolutionManifest {
    #[serde(default)]
    pub projects: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_id_display_and_profile_name() {
        let id = ConfigurationId::new("Debug", "x64");
        assert_eq!(id.to_string(), "Debug|x64");
        assert_eq!(id.profile_name(), "Debug_x64");
    }

    #[test]
    fn manifest_defaults_missing_collections() {
        let yaml = "name: App\nconfigurations:\n  - configuration: Release\n    platform: Win32\n";
        let manifest: ProjectManifest = serde_yaml::from_str(yaml).expect("parse");
        let config = &manifest.configurations[0];
        assert!(config.macros.is_empty());
        assert!(config.property_sheets.is_empty());
        assert_eq!(config.pre_build_command, "");
        assert_eq!(config.runtime_library, None);
        assert_eq!(config.id(), ConfigurationId::new("Release", "Win32"));
    }

    #[test]
    fn manifest_serde_roundtrip() {
        let manifest = ProjectManifest {
            name: "App".to_string(),
            configurations: vec![BuildConfiguration {
                configuration: "Debug".to_string(),
                platform: "x64".to_string(),
                macros: [("PlatformToolset".to_string(), "v143".to_string())]
                    .into_iter()
                    .collect(),
                runtime_library: Some("MultiThreadedDebugDLL".to_string()),
                language_standard: Some("stdcpp17".to_string()),
                property_sheets: vec![],
                pre_build_command: String::new(),
            }],
        };
        let yaml = serde_yaml::to_string(&manifest).expect("serialize");
        let back: ProjectManifest = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, manifest);
    }
}
