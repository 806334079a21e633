//! Typed accessors over a build configuration's toolchain values.
//!
//! The host exposes configuration properties through string-keyed lookups
//! (`$(PlatformToolset)`, rule properties, tool settings). Everything the sync
//! engine needs goes through [`ToolchainReader`] so that only the adapter knows
//! about the host's schema.

use std::collections::BTreeMap;

use crate::types::{BuildConfiguration, ConfigurationId};

/// Macro holding the platform toolset identifier (`v143`).
pub const TOOLSET_MACRO: &str = "PlatformToolset";
/// Macro holding the host build tool version (`17.9.34607.119`).
pub const HOST_VERSION_MACRO: &str = "MSBuildVersion";

/// Read-only toolchain view of one build configuration.
pub trait ToolchainReader {
    /// Configuration name (`Debug`, `Release`, ...).
    fn configuration_name(&self) -> &str;

    /// Platform name (`x64`, `Win32`, `ARM64`, ...).
    fn platform_name(&self) -> &str;

    /// Platform toolset identifier, `None` when the host does not define one.
    fn toolset(&self) -> Option<String>;

    /// Host build tool version string, `None` when unavailable.
    fn host_version(&self) -> Option<String>;

    /// Raw runtime library value, `None` when the configuration leaves it unset.
    fn runtime_library(&self) -> Option<&str>;

    /// Raw language standard value, `None` when unset.
    fn language_standard(&self) -> Option<&str>;

    fn id(&self) -> ConfigurationId {
        ConfigurationId::new(self.configuration_name(), self.platform_name())
    }
}

impl ToolchainReader for BuildConfiguration {
    fn configuration_name(&self) -> &str {
        &self.configuration
    }

    fn platform_name(&self) -> &str {
        &self.platform
    }

    fn toolset(&self) -> Option<String> {
        non_empty(evaluate(&format!("$({TOOLSET_MACRO})"), &self.macros))
    }

    fn host_version(&self) -> Option<String> {
        non_empty(evaluate(&format!("$({HOST_VERSION_MACRO})"), &self.macros))
    }

    fn runtime_library(&self) -> Option<&str> {
        self.runtime_library.as_deref()
    }

    fn language_standard(&self) -> Option<&str> {
        self.language_standard.as_deref()
    }
}

/// Expand `$(Var)` references using `macros`.
///
/// Single pass; unknown variables expand to the empty string. An unterminated
/// `$(` swallows the remainder of the input.
pub fn evaluate(expr: &str, macros: &BTreeMap<String, String>) -> String {
    let mut result = String::with_capacity(expr.len());
    let mut chars = expr.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'(') {
            chars.next();
            let name: String = chars.by_ref().take_while(|&ch| ch != ')').collect();
            if let Some(value) = macros.get(name.trim()) {
                result.push_str(value);
            }
        } else {
            result.push(c);
        }
    }

    result
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
