use std::path::{Path, PathBuf};
use anyhow::Result;
use walkdir::WalkDir;
use crate::paths::normalize;
use crate::shims::CMD_EXTENSION;

pub const CONFIG_FILE: &str = "repotools.toml";
pub const LOCK_FILE: &str = "repotools.lock";

/// Returns the project root: the current working directory, made absolute.
pub fn get_project_root() -> Result<PathBuf> {
    Ok(normalize(std::env::current_dir()?))
}

/// Returns the path to the `repotools.toml` file under `root`.
pub fn get_config_file(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Returns the path to the `repotools.lock` file under `root`.
pub fn get_lock_file(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}

/// Names of the commands generated in `dir`: files that have a `.cmd`
/// sibling of the same name. Sorted; empty when `dir` does not exist.
pub fn list_commands(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let has_cmd = entry
                .path()
                .with_file_name(format!("{name}.{CMD_EXTENSION}"))
                .is_file();
            has_cmd.then_some(name)
        })
        .collect()
}
