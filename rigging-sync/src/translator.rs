//! Toolchain configuration → Conan profile settings.
//!
//! [`translate`] is pure: the same [`ToolchainReader`] values always produce
//! the same [`ProfileSettings`], and [`ProfileSettings::entries`] has a fixed
//! order so rendered profiles are byte-stable.
//!
//! Unknown platforms, toolsets and runtime library values are rejected with
//! [`SyncError::UnsupportedValue`]. An unmatched language standard is not an
//! error; it maps to [`CppStd::Unset`].

use std::fmt;

use rigging_core::ToolchainReader;

use crate::error::{unsupported, SyncError};

pub const COMPILER: &str = "msvc";
pub const OS: &str = "Windows";

/// Toolset that picks up the 17.10 compiler bump.
const QUIRK_TOOLSET: &str = "v143";
const QUIRK_HOST_MAJOR: u32 = 17;
const QUIRK_HOST_MIN_MINOR: u32 = 10;
const QUIRK_COMPILER_VERSION: &str = "194";

// ---------------------------------------------------------------------------
// Setting values
// ---------------------------------------------------------------------------

/// `compiler.cppstd` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CppStd {
    Cpp14,
    Cpp17,
    Cpp20,
    Cpp23,
    /// The language standard names none of the known versions.
    Unset,
}

impl CppStd {
    /// Candidates in scan order; the first contained in the token wins.
    const CANDIDATES: [CppStd; 4] = [CppStd::Cpp14, CppStd::Cpp17, CppStd::Cpp20, CppStd::Cpp23];

    pub fn as_str(self) -> &'static str {
        match self {
            CppStd::Cpp14 => "14",
            CppStd::Cpp17 => "17",
            CppStd::Cpp20 => "20",
            CppStd::Cpp23 => "23",
            CppStd::Unset => "null",
        }
    }
}

/// `compiler.runtime` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Static,
    Dynamic,
}

impl Runtime {
    pub fn as_str(self) -> &'static str {
        match self {
            Runtime::Static => "static",
            Runtime::Dynamic => "dynamic",
        }
    }
}

/// The host's four-way runtime library setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeLibrary {
    MultiThreaded,
    MultiThreadedDebug,
    MultiThreadedDll,
    MultiThreadedDebugDll,
}

impl RuntimeLibrary {
    /// Parse a host value. Case, separators and the order of the `debug` /
    /// `dll` words are ignored; `/MT`-style switches are accepted too.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let normalized = normalized
            .strip_prefix("rt")
            .filter(|rest| rest.starts_with("multithreaded"))
            .unwrap_or(normalized.as_str());

        match normalized {
            "multithreaded" | "mt" => Some(Self::MultiThreaded),
            "multithreadeddebug" | "mtd" => Some(Self::MultiThreadedDebug),
            "multithreadeddll" | "md" => Some(Self::MultiThreadedDll),
            "multithreadeddebugdll" | "multithreadeddlldebug" | "mdd" => {
                Some(Self::MultiThreadedDebugDll)
            }
            _ => None,
        }
    }

    pub fn runtime(self) -> Runtime {
        match self {
            Self::MultiThreaded | Self::MultiThreadedDebug => Runtime::Static,
            Self::MultiThreadedDll | Self::MultiThreadedDebugDll => Runtime::Dynamic,
        }
    }
}

// ---------------------------------------------------------------------------
// ProfileSettings
// ---------------------------------------------------------------------------

/// Settings of one Conan profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSettings {
    pub arch: &'static str,
    pub build_type: String,
    pub cppstd: CppStd,
    pub runtime: Runtime,
    pub runtime_type: String,
    pub compiler_version: &'static str,
}

impl ProfileSettings {
    /// Setting name → value in profile order.
    pub fn entries(&self) -> [(&'static str, String); 8] {
        [
            ("arch", self.arch.to_string()),
            ("build_type", self.build_type.clone()),
            ("compiler", COMPILER.to_string()),
            ("compiler.cppstd", self.cppstd.as_str().to_string()),
            ("compiler.runtime", self.runtime.as_str().to_string()),
            ("compiler.runtime_type", self.runtime_type.clone()),
            ("compiler.version", self.compiler_version.to_string()),
            ("os", OS.to_string()),
        ]
    }

    /// Value of a setting by profile key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for ProfileSettings {
    /// Profile file body: `[settings]` followed by `key=value` lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[settings]")?;
        for (key, value) in self.entries() {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// translate
// ---------------------------------------------------------------------------

/// Translate a configuration's toolchain values into profile settings.
pub fn translate(config: &dyn ToolchainReader) -> Result<ProfileSettings, SyncError> {
    let arch = arch(config.platform_name())?;
    let compiler_version = compiler_version(
        config.toolset().as_deref(),
        config.host_version().as_deref(),
    )?;
    let cppstd = cppstd(config.language_standard());
    let runtime = runtime(config.runtime_library())?;
    let build_type = config.configuration_name().to_string();

    Ok(ProfileSettings {
        arch,
        runtime_type: build_type.clone(),
        build_type,
        cppstd,
        runtime,
        compiler_version,
    })
}

/// Platform name → Conan `arch`.
pub fn arch(platform: &str) -> Result<&'static str, SyncError> {
    const ARCHES: [(&str, &str); 3] = [("x64", "x86_64"), ("Win32", "x86"), ("ARM64", "armv8")];
    ARCHES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(platform.trim()))
        .map(|(_, arch)| *arch)
        .ok_or_else(|| unsupported("platform", platform))
}

/// Toolset (+ host tool version) → Conan `compiler.version`.
pub fn compiler_version(
    toolset: Option<&str>,
    host_version: Option<&str>,
) -> Result<&'static str, SyncError> {
    let toolset = toolset.unwrap_or_default().trim();
    let version = match toolset {
        "v140" => "190",
        "v141" => "191",
        "v142" => "192",
        "v143" => "193",
        other => return Err(unsupported("toolset", other)),
    };

    if toolset == QUIRK_TOOLSET && host_version.is_some_and(has_compiler_bump) {
        return Ok(QUIRK_COMPILER_VERSION);
    }
    Ok(version)
}

/// Host tool 17.10 and later ship compiler 19.40+.
fn has_compiler_bump(host_version: &str) -> bool {
    let mut parts = host_version.trim().split('.');
    let major = parts.next().and_then(|p| p.parse::<u32>().ok());
    let minor = parts.next().and_then(|p| p.parse::<u32>().ok());
    matches!(
        (major, minor),
        (Some(QUIRK_HOST_MAJOR), Some(minor)) if minor >= QUIRK_HOST_MIN_MINOR
    )
}

/// Language standard token → Conan `compiler.cppstd`.
pub fn cppstd(language_standard: Option<&str>) -> CppStd {
    let token = language_standard.unwrap_or_default().trim();
    if token.is_empty() || token.to_ascii_lowercase().contains("default") {
        return CppStd::Cpp14;
    }
    CppStd::CANDIDATES
        .into_iter()
        .find(|candidate| token.contains(candidate.as_str()))
        .unwrap_or(CppStd::Unset)
}

/// Runtime library → Conan `compiler.runtime`. Unset means the host default (DLL).
pub fn runtime(runtime_library: Option<&str>) -> Result<Runtime, SyncError> {
    match runtime_library.map(str::trim) {
        None | Some("") => Ok(Runtime::Dynamic),
        Some(raw) => RuntimeLibrary::parse(raw)
            .map(RuntimeLibrary::runtime)
            .ok_or_else(|| unsupported("runtime library", raw)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
