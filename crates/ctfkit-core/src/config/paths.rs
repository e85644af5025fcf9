//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".ctf";
pub const CONFIG_FILE: &str = "config.toml";

pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Walk up from `start` to the first directory holding `.ctf/config.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| config_path(dir).is_file())
        .map(Path::to_path_buf)
}
