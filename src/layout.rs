use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use crate::group::GroupName;
use crate::paths::{absolutize, compose, PathSegment};
use crate::shims::{write_if_changed, WriteOutcome};

/// Folder below the project root that holds generated files.
pub const PAKET_FILES_DIR: &str = "paket-files";
/// File name of the manifest inside [`PAKET_FILES_DIR`].
pub const MANIFEST_FILE: &str = "paket.repotools.csv";
pub const MANIFEST_HEADER: &str = "group_name,base_dir";

/// Folder the launchers of `group` are written to.
///
/// - main group: `<root>/paket-files/bin`
/// - other groups: `<root>/paket-files/<group>/bin`
/// - with a `bin_dir` override: `<root>/<bin_dir>` for any group
pub fn resolve_output_dir(root: &Path, group: &GroupName, bin_dir: Option<&Path>) -> PathBuf {
    if let Some(bin_dir) = bin_dir {
        return absolutize(bin_dir, root);
    }
    let path = if group.is_main() {
        compose(&[
            PathSegment::Dir(root),
            PathSegment::Literal(PAKET_FILES_DIR),
            PathSegment::Literal("bin"),
        ])
    } else {
        compose(&[
            PathSegment::Dir(root),
            PathSegment::Literal(PAKET_FILES_DIR),
            PathSegment::Group(group),
            PathSegment::Literal("bin"),
        ])
    };
    absolutize(path, root)
}

/// The package manager's own binaries, added to `PATH` by Windows launchers.
pub fn host_bin_dir(root: &Path) -> PathBuf {
    compose(&[
        PathSegment::Dir(root),
        PathSegment::Literal(PAKET_FILES_DIR),
        PathSegment::Literal("paket"),
        PathSegment::Literal("bin"),
    ])
}

pub fn manifest_path(root: &Path) -> PathBuf {
    compose(&[
        PathSegment::Dir(root),
        PathSegment::Literal(PAKET_FILES_DIR),
        PathSegment::Literal(MANIFEST_FILE),
    ])
}

/// One manifest line: a group and the folder holding its launchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupManifestRow {
    pub group_name: String,
    pub base_dir: PathBuf,
}

/// Renders the manifest text: header, then one row per group in the given order.
pub fn render_manifest(rows: &[GroupManifestRow]) -> String {
    let mut content = String::from(MANIFEST_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(&format!("{},{}\n", row.group_name, row.base_dir.display()));
    }
    content
}

/// Writes the manifest, leaving the file alone when nothing changed.
pub fn write_manifest(rows: &[GroupManifestRow], destination: &Path) -> Result<WriteOutcome> {
    write_if_changed(destination, &render_manifest(rows))
}

/// Reads a manifest written by [`write_manifest`].
pub fn read_manifest(path: &Path) -> Result<Vec<GroupManifestRow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read manifest {}", path.display()))?;
    let mut lines = content.lines();
    match lines.next() {
        Some(header) if header.trim() == MANIFEST_HEADER => {}
        _ => bail!("{} is not a repotools manifest", path.display()),
    }
    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (group, dir) = line
                .split_once(',')
                .with_context(|| format!("Malformed manifest row: {line}"))?;
            Ok(GroupManifestRow {
                group_name: group.to_string(),
                base_dir: PathBuf::from(dir),
            })
        })
        .collect()
}
