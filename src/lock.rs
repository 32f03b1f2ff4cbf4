use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use crate::group::GroupName;
use crate::paths::absolutize;

/// The resolver's view of a restore: every group in resolution order and the
/// folder each of its packages was extracted to.
///
/// Stored as `repotools.lock` next to `repotools.toml`.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ToolsLock {
    #[serde(default)]
    pub group: Vec<LockedGroup>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LockedGroup {
    pub name: GroupName,
    #[serde(default)]
    pub package: Vec<LockedPackage>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LockedPackage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Relative to the project root unless absolute.
    pub install_folder: PathBuf,
}

/// A package ready for tool discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToolPackage {
    pub group: GroupName,
    pub package: String,
    pub install_folder: PathBuf,
}

impl ToolsLock {
    /// Loads the lock file.
    ///
    /// # Errors
    /// Fails when the file is missing or is not valid TOML for this shape.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ToolsLock> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read lock file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Could not parse lock file {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("Could not write lock file {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Flattens the lock into `(group, package, install folder)` triples in
    /// file order, with install folders made absolute against `root`.
    pub fn resolved_packages(&self, root: &Path) -> Vec<ResolvedToolPackage> {
        self.group
            .iter()
            .flat_map(|group| {
                group.package.iter().map(move |package| ResolvedToolPackage {
                    group: group.name.clone(),
                    package: package.name.clone(),
                    install_folder: absolutize(&package.install_folder, root),
                })
            })
            .collect()
    }

    /// Names of all groups in file order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupName> {
        self.group.iter().map(|g| &g.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LOCK: &str = r#"
[[group]]
name = "Main"

[[group.package]]
name = "FAKE"
version = "5.20.4"
install_folder = "packages/FAKE"

[[group]]
name = "Build"

[[group.package]]
name = "Paket"
install_folder = "/opt/paket"
"#;

    #[test]
    fn test_resolved_packages_keep_file_order() {
        let lock: ToolsLock = toml::from_str(LOCK).unwrap();
        let packages = lock.resolved_packages(Path::new("/repo"));
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].group, GroupName::main());
        assert_eq!(packages[0].install_folder, PathBuf::from("/repo/packages/FAKE"));
        assert_eq!(packages[1].group.as_str(), "Build");
        assert_eq!(packages[1].install_folder, PathBuf::from("/opt/paket"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repotools.lock");
        let lock: ToolsLock = toml::from_str(LOCK).unwrap();
        lock.save(&path).unwrap();
        let loaded = ToolsLock::load(&path).unwrap();
        assert_eq!(loaded.groups().count(), 2);
        assert_eq!(loaded.group[0].package[0].version.as_deref(), Some("5.20.4"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = ToolsLock::load(dir.path().join("repotools.lock")).unwrap_err();
        assert!(err.to_string().contains("Could not read lock file"));
    }
}
