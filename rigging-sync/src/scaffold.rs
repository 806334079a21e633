//! Project opt-in scaffolding: `conandata.yml`, `conanfile.py` and the
//! placeholder property sheet the injected import points at.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::guard::{self, WriteResult};
use crate::requirements;

/// Recipe file name, relative to the project directory.
pub const CONANFILE: &str = "conanfile.py";

/// Property sheet imported by every wired configuration, relative to the
/// project directory. The package manager overwrites it on install.
pub const PROPS_IMPORT_PATH: &str = "conan/conandeps.props";

const CONANFILE_BODY: &str = r#"
from conan import ConanFile
from conan.tools.microsoft import vs_layout, MSBuildDeps
class ConanApplication(ConanFile):
    package_type = "application"
    settings = "os", "compiler", "build_type", "arch"

    def layout(self):
        vs_layout(self)

    def generate(self):
        deps = MSBuildDeps(self)
        deps.generate()

    def requirements(self):
        requirements = self.conan_data.get('requirements', [])
        for requirement in requirements:
            self.requires(requirement)
"#;

const PROPS_PLACEHOLDER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ImportGroup Label="PropertySheets" />
  <PropertyGroup />
</Project>
"#;

/// Create a guarded, empty `conandata.yml` if the project has none.
///
/// An existing file is left alone so declared requirements survive.
pub fn ensure_conandata(project_dir: &Path) -> Result<Option<WriteResult>, SyncError> {
    let path = requirements::declaration_path(project_dir);
    if path.exists() {
        return Ok(None);
    }
    let body = requirements::render_body(&[])?;
    guard::write_if_permitted(&path, &body, false).map(Some)
}

/// Write the guarded recipe, refreshing it when the template changed.
pub fn ensure_conanfile(project_dir: &Path) -> Result<WriteResult, SyncError> {
    guard::write_if_permitted(&project_dir.join(CONANFILE), CONANFILE_BODY, false)
}

/// `<project_dir>/conan/conandeps.props`
pub fn props_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROPS_IMPORT_PATH)
}

/// Create an empty MSBuild property sheet at [`PROPS_IMPORT_PATH`] if absent.
///
/// Returns `true` when a file was created.
pub fn ensure_props_placeholder(project_dir: &Path, dry_run: bool) -> Result<bool, SyncError> {
    let path = props_path(project_dir);
    match std::fs::metadata(&path) {
        Ok(_) => return Ok(false),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(&path, err)),
    }
    if dry_run {
        tracing::info!("[dry-run] would create: {}", path.display());
        return Ok(false);
    }
    let tmp = PathBuf::from(format!("{}.rigging.tmp", path.display()));
    guard::write_atomic(&path, PROPS_PLACEHOLDER, &tmp)?;
    tracing::info!("created placeholder: {}", path.display());
    Ok(true)
}
