use std::fmt;
use std::path::{Component, Path, PathBuf};
use crate::group::GroupName;
use crate::runtime::FrameworkMoniker;

/// One piece of a composed path, named after where its text comes from.
#[derive(Debug, Clone, Copy)]
pub enum PathSegment<'a> {
    /// An existing directory used as-is (usually the first segment).
    Dir(&'a Path),
    /// The string form of a dependency group.
    Group(&'a GroupName),
    /// The folder name of a framework moniker, e.g. `net461`.
    Framework(&'a FrameworkMoniker),
    /// A fixed path component such as `paket-files` or `bin`.
    Literal(&'a str),
}

impl PathSegment<'_> {
    fn as_path(&self) -> &Path {
        match self {
            PathSegment::Dir(dir) => dir,
            PathSegment::Group(group) => Path::new(group.as_str()),
            PathSegment::Framework(moniker) => Path::new(moniker.as_str()),
            PathSegment::Literal(literal) => Path::new(literal),
        }
    }
}

impl fmt::Display for PathSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path().display())
    }
}

/// Joins segments left to right into a single path.
///
/// ```
/// use std::path::Path;
/// use repotools::{compose, GroupName, PathSegment};
///
/// let group = GroupName::new("Build");
/// let path = compose(&[
///     PathSegment::Dir(Path::new("/repo")),
///     PathSegment::Literal("paket-files"),
///     PathSegment::Group(&group),
///     PathSegment::Literal("bin"),
/// ]);
/// assert_eq!(path, Path::new("/repo/paket-files/Build/bin"));
/// ```
pub fn compose(segments: &[PathSegment<'_>]) -> PathBuf {
    segments
        .iter()
        .fold(PathBuf::new(), |acc, segment| acc.join(segment.as_path()))
}

/// Lexically resolves `.` and `..` components without touching the filesystem.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Makes `path` absolute against `base` (when relative) and normalizes it.
pub fn absolutize<P: AsRef<Path>, B: AsRef<Path>>(path: P, base: B) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(base.as_ref().join(path))
    }
}

/// Computes the path of `target` relative to the directory `from`.
///
/// Both paths must be absolute. Returns `None` when they share no root
/// (e.g. different drive letters on Windows).
pub fn relative_to<P: AsRef<Path>, Q: AsRef<Path>>(from: P, target: Q) -> Option<PathBuf> {
    let from = normalize(from);
    let target = normalize(target);
    let from_parts: Vec<Component> = from.components().collect();
    let target_parts: Vec<Component> = target.components().collect();

    let common = from_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return None;
    }

    let mut relative = PathBuf::new();
    for _ in common..from_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    Some(relative)
}

/// Renders a relative path with an explicit separator so generated scripts
/// look the same no matter which host produced them.
pub fn join_with_separator<P: AsRef<Path>>(path: P, separator: char) -> String {
    let parts: Vec<String> = path
        .as_ref()
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return ".".to_string();
    }
    parts.join(&separator.to_string())
}
