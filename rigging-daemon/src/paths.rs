use std::path::{Path, PathBuf};

pub const RUNTIME_DIR: &str = ".rigging";
pub const DAEMON_SOCKET: &str = "daemon.sock";

/// `<solution_dir>/.rigging`
pub fn runtime_dir(solution_root: &Path) -> PathBuf {
    solution_root.join(RUNTIME_DIR)
}

/// `<solution_dir>/.rigging/daemon.sock`
pub fn socket_path(solution_root: &Path) -> PathBuf {
    runtime_dir(solution_root).join(DAEMON_SOCKET)
}

/// Directory a solution manifest lives in; the daemon socket is keyed by it.
pub fn solution_root(solution_path: &Path) -> PathBuf {
    match solution_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_lives_next_to_the_solution() {
        let root = solution_root(Path::new("/work/app/solution.yaml"));
        assert_eq!(root, PathBuf::from("/work/app"));
        assert_eq!(
            socket_path(&root),
            PathBuf::from("/work/app/.rigging/daemon.sock")
        );
    }

    #[test]
    fn bare_file_name_resolves_to_current_dir() {
        assert_eq!(solution_root(Path::new("solution.yaml")), PathBuf::from("."));
    }
}
