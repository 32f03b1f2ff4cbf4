use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::paths::{compose, PathSegment};
use crate::runtime::{FrameworkMoniker, RuntimeVariant};

/// Folders below a package's install folder that hold per-framework tool builds.
/// NuGet packages use `tools`; the singular spelling shows up in older packages.
pub const TOOL_FOLDERS: [&str; 2] = ["tools", "tool"];

/// Sub-folder used by dotnet tool packages below the framework folder.
const PORTABLE_RID_FOLDER: &str = "any";

/// One launchable build of a tool found inside a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTool {
    /// File name of the executable without its extension.
    pub name: String,
    /// Framework folder the executable was found in.
    pub moniker: FrameworkMoniker,
    /// Absolute path of the executable.
    pub executable: PathBuf,
}

impl DiscoveredTool {
    pub fn variant(&self) -> RuntimeVariant {
        self.moniker.variant()
    }
}

/// Lists every launchable build in `install_folder`.
///
/// Looks in `<install_folder>/tools/<moniker>/` (and its `any/` sub-folder)
/// for files with the moniker's executable extension. Missing folders and
/// unrelated files are skipped. The returned iterator is lazy; call the
/// function again to walk the folder again.
pub fn discover_tools(install_folder: &Path) -> impl Iterator<Item = DiscoveredTool> + '_ {
    TOOL_FOLDERS.into_iter().flat_map(move |folder| {
        let root = compose(&[PathSegment::Dir(install_folder), PathSegment::Literal(folder)]);
        WalkDir::new(root)
            .min_depth(2)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| classify(entry.path(), entry.depth()))
    })
}

/// Turns a file found below a tool folder into a [`DiscoveredTool`], if it is one.
fn classify(path: &Path, depth: usize) -> Option<DiscoveredTool> {
    let parent = path.parent()?;
    let moniker_dir = match depth {
        2 => parent,
        3 if dir_name(parent)?.eq_ignore_ascii_case(PORTABLE_RID_FOLDER) => parent.parent()?,
        _ => return None,
    };
    let moniker = FrameworkMoniker::parse(dir_name(moniker_dir)?)?;

    let extension = path.extension()?.to_str()?;
    if !extension.eq_ignore_ascii_case(moniker.variant().executable_extension()) {
        return None;
    }
    let name = path.file_stem()?.to_str()?.to_string();

    if moniker.variant() == RuntimeVariant::Core && !is_app_entry_point(path, &name) {
        tracing::debug!("skipping library {}", path.display());
        return None;
    }

    Some(DiscoveredTool {
        name,
        moniker,
        executable: path.to_path_buf(),
    })
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

/// A cross-platform build folder also holds every dependency dll; only the
/// ones with a runtime config next to them can be started with `dotnet`.
fn is_app_entry_point(dll: &Path, name: &str) -> bool {
    dll.with_file_name(format!("{name}.runtimeconfig.json")).is_file()
}
