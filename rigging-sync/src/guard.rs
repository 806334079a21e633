//! Guarded file store.
//!
//! A file is *tool-managed* iff its first two lines equal [`GUARD_BANNER`]. A
//! file that exists without the banner belongs to the user and is never
//! written. A missing file may be created.
//!
//! ## `write_if_permitted` protocol
//!
//! 1. Read the current content (missing → eligible for creation).
//! 2. No banner → [`WriteResult::NotGuarded`], nothing touched.
//! 3. Banner + body equal to what is on disk → [`WriteResult::Unchanged`].
//! 4. Write to `<path>.rigging.tmp`, then rename over the final path.

use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Leading lines that mark a file as managed by rigging.
pub const GUARD_BANNER: [&str; 2] = [
    "# This file is managed by the Conan Visual Studio Extension, contents will be overwritten.",
    "# To keep your changes, remove these comment lines, but the plugin won't be able to modify your requirements",
];

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual guarded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; content on disk already matches.
    Unchanged { path: PathBuf },
    /// File exists without the guard banner; left as the user wrote it.
    NotGuarded { path: PathBuf },
    /// Dry-run mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::NotGuarded { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }
}

// ---------------------------------------------------------------------------
// Guard checks
// ---------------------------------------------------------------------------

/// True iff `path` exists and starts with the guard banner.
///
/// Unreadable-as-text files count as user-owned.
pub fn is_guarded(path: &Path) -> Result<bool, SyncError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(io_err(path, err)),
    };

    let mut lines = BufReader::new(file).lines();
    for expected in GUARD_BANNER {
        match lines.next() {
            Some(Ok(line)) if line.trim_end_matches('\r') == expected => {}
            Some(Err(err)) if err.kind() != ErrorKind::InvalidData => {
                return Err(io_err(path, err));
            }
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// True iff `content` starts with the guard banner.
pub fn has_banner(content: &str) -> bool {
    let mut lines = content.lines();
    GUARD_BANNER
        .iter()
        .all(|expected| lines.next().map(|l| l.trim_end_matches('\r')) == Some(*expected))
}

/// Full file content for `body`: banner lines, then the body.
pub fn compose(body: &str) -> String {
    let mut content = GUARD_BANNER.join("\n");
    content.push('\n');
    content.push_str(&normalize_line_endings(body));
    content
}

/// Content of a guarded file after the banner, `None` if the file is missing.
pub fn read_body(path: &Path) -> Result<Option<String>, SyncError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => normalize_line_endings(&content),
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    if !has_banner(&content) {
        return Ok(Some(content));
    }
    let body = content
        .splitn(GUARD_BANNER.len() + 1, '\n')
        .nth(GUARD_BANNER.len())
        .unwrap_or_default()
        .to_string();
    Ok(Some(body))
}

// ---------------------------------------------------------------------------
// write_if_permitted
// ---------------------------------------------------------------------------

/// Write banner + `body` to `path` unless the file is user-owned or already
/// up to date.
pub fn write_if_permitted(path: &Path, body: &str, dry_run: bool) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.rigging.tmp", path.display()));
    write_if_permitted_with_tmp(path, body, dry_run, &tmp)
}

fn write_if_permitted_with_tmp(
    path: &Path,
    body: &str,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    let content = compose(body);

    match std::fs::read_to_string(path) {
        Ok(existing) => {
            let existing = normalize_line_endings(&existing);
            if !has_banner(&existing) {
                tracing::debug!("user-owned, left untouched: {}", path.display());
                return Ok(WriteResult::NotGuarded {
                    path: path.to_path_buf(),
                });
            }
            if existing == content {
                tracing::debug!("unchanged: {}", path.display());
                return Ok(WriteResult::Unchanged {
                    path: path.to_path_buf(),
                });
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            return Ok(WriteResult::NotGuarded {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(io_err(path, err)),
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    write_atomic(path, &content, tmp)?;
    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Write `content` through a temporary sibling and rename it into place.
pub(crate) fn write_atomic(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

pub(crate) fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
