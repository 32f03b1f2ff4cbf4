use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use anyhow::{bail, Result};
use crate::config::{AliasEntry, RepoToolsConfig, SynthesisOptions};
use crate::discovery::{discover_tools, DiscoveredTool};
use crate::group::GroupName;
use crate::layout::{host_bin_dir, manifest_path, read_manifest, resolve_output_dir, write_manifest, GroupManifestRow};
use crate::lock::{ResolvedToolPackage, ToolsLock};
use crate::runtime::select_build;
use crate::shims::{create_launchers, PersistOutcome, WrapperScript, WriteOutcome};

/// The launchers planned for one group.
#[derive(Debug, Clone)]
pub struct PlannedGroup {
    pub group: GroupName,
    pub output_dir: PathBuf,
    pub scripts: Vec<PlannedCommand>,
}

/// A command to generate and where it came from.
#[derive(Debug, Clone)]
pub struct PlannedCommand {
    pub package: String,
    /// Tool name the command launches; differs from the script name for aliases.
    pub tool: String,
    pub script: WrapperScript,
}

/// A command that was generated during a run.
#[derive(Debug, Clone)]
pub struct GeneratedCommand {
    pub group: GroupName,
    pub package: String,
    pub name: String,
    pub outcome: PersistOutcome,
}

#[derive(Debug, Clone)]
pub struct SynthesisReport {
    pub commands: Vec<GeneratedCommand>,
    pub manifest: Vec<GroupManifestRow>,
    pub manifest_path: PathBuf,
    pub manifest_outcome: WriteOutcome,
}

impl SynthesisReport {
    /// Number of launcher files that were actually written.
    pub fn files_written(&self) -> usize {
        self.commands
            .iter()
            .map(|c| {
                [c.outcome.sh, c.outcome.cmd]
                    .iter()
                    .filter(|o| **o == WriteOutcome::Written)
                    .count()
            })
            .sum()
    }
}

/// Discovers the tools of one package and keeps one build per tool name.
pub fn select_package_tools(
    package: &ResolvedToolPackage,
    options: &SynthesisOptions,
) -> Vec<DiscoveredTool> {
    if !package.install_folder.is_dir() {
        tracing::warn!(
            "Install folder {} of package {} does not exist; skipping",
            package.install_folder.display(),
            package.package
        );
        return Vec::new();
    }
    let mut by_name: BTreeMap<String, Vec<DiscoveredTool>> = BTreeMap::new();
    for tool in discover_tools(&package.install_folder) {
        by_name.entry(tool.name.clone()).or_default().push(tool);
    }
    by_name
        .values()
        .filter_map(|builds| select_build(builds, options.preferred_runtime).cloned())
        .collect()
}

/// The tool an alias applies to within one package: a tool with the alias key
/// as its name, or the only tool of a package named like the key.
fn alias_target<'a>(
    alias: &AliasEntry,
    package: &ResolvedToolPackage,
    tools: &'a [DiscoveredTool],
) -> Option<&'a DiscoveredTool> {
    tools
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(&alias.key))
        .or_else(|| match tools {
            [only] if package.package.eq_ignore_ascii_case(&alias.key) => Some(only),
            _ => None,
        })
}

/// Works out every launcher to generate, group by group in lock order.
/// Reads the install folders but writes nothing.
pub fn plan(
    root: &Path,
    lock: &ToolsLock,
    config: &RepoToolsConfig,
    options: &SynthesisOptions,
) -> Result<Vec<PlannedGroup>> {
    if let Some(filter) = &options.group_filter {
        if !lock.groups().any(|g| g == filter) {
            bail!("Group {} not found in the lock file", filter);
        }
    }

    let packages = lock.resolved_packages(root);
    let host_bin = host_bin_dir(root);
    let mut planned = Vec::new();

    for group in lock.groups() {
        if options.group_filter.as_ref().is_some_and(|f| f != group) {
            continue;
        }
        let output_dir = resolve_output_dir(root, group, config.bin_dir_for(group));
        let aliases = config.aliases_for(group);
        let mut used_aliases: HashSet<&str> = HashSet::new();
        // command name -> (index in `scripts`, whether an alias produced it)
        let mut claimed: HashMap<String, (usize, bool)> = HashMap::new();
        let mut scripts = Vec::new();

        let mut claim = |package: &str, script: WrapperScript, tool: &str, is_alias: bool| {
            let name = script.base_name.clone();
            let command = PlannedCommand {
                package: package.to_string(),
                tool: tool.to_string(),
                script,
            };
            match claimed.get(&name).copied() {
                None => {
                    claimed.insert(name, (scripts.len(), is_alias));
                    scripts.push(command);
                }
                // an alias takes over a plain tool command of the same name
                Some((index, false)) if is_alias => {
                    tracing::debug!("alias {} replaces the plain command of the same name", name);
                    claimed.insert(name, (index, true));
                    scripts[index] = command;
                }
                Some(_) => {
                    tracing::warn!(
                        "Command {} of package {} in group {} is already provided; skipping",
                        name,
                        package,
                        group
                    );
                }
            }
        };

        for package in packages.iter().filter(|p| &p.group == group) {
            let tools = select_package_tools(package, options);
            for tool in &tools {
                let script = WrapperScript {
                    output_dir: output_dir.clone(),
                    base_name: tool.name.clone(),
                    target: tool.executable.clone(),
                    variant: tool.variant(),
                    args: Vec::new(),
                    host_bin_dir: host_bin.clone(),
                };
                claim(&package.package, script, &tool.name, false);
            }
            for alias in aliases {
                let Some(tool) = alias_target(alias, package, &tools) else {
                    continue;
                };
                used_aliases.insert(alias.name.as_str());
                let script = WrapperScript {
                    output_dir: output_dir.clone(),
                    base_name: alias.name.clone(),
                    target: tool.executable.clone(),
                    variant: tool.variant(),
                    args: alias.args.clone(),
                    host_bin_dir: host_bin.clone(),
                };
                claim(&package.package, script, &tool.name, true);
            }
        }

        for alias in aliases.iter().filter(|a| !used_aliases.contains(a.name.as_str())) {
            tracing::warn!("Alias {} in group {}: no tool named {} was found", alias.name, group, alias.key);
        }

        planned.push(PlannedGroup {
            group: group.clone(),
            output_dir,
            scripts,
        });
    }
    Ok(planned)
}

/// Merges this run's rows into the rows of an earlier manifest when only one
/// group was regenerated.
fn merge_rows(
    previous: Vec<GroupManifestRow>,
    current: Vec<GroupManifestRow>,
    regenerated: &GroupName,
) -> Vec<GroupManifestRow> {
    let find_current = |name: &str| current.iter().find(|c| c.group_name.eq_ignore_ascii_case(name)).cloned();
    let mut merged: Vec<GroupManifestRow> = previous
        .into_iter()
        .filter_map(|row| match find_current(&row.group_name) {
            Some(updated) => Some(updated),
            None if regenerated.matches(&row.group_name) => None,
            None => Some(row),
        })
        .collect();
    for row in current {
        if !merged.iter().any(|m| m.group_name.eq_ignore_ascii_case(&row.group_name)) {
            merged.push(row);
        }
    }
    merged
}

/// Generates the launchers of every tool in the lock and writes the manifest.
///
/// A failed write aborts the run; files written before the failure stay.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use repotools::{generate_wrappers, RepoToolsConfig, SynthesisOptions, ToolsLock};
///
/// let root = Path::new(".");
/// let lock = ToolsLock::load(root.join("repotools.lock")).unwrap();
/// let report = generate_wrappers(root, &lock, &RepoToolsConfig::default(), &SynthesisOptions::default()).unwrap();
/// println!("{} commands", report.commands.len());
/// ```
pub fn generate_wrappers(
    root: &Path,
    lock: &ToolsLock,
    config: &RepoToolsConfig,
    options: &SynthesisOptions,
) -> Result<SynthesisReport> {
    let planned = plan(root, lock, config, options)?;
    let mut commands = Vec::new();
    let mut rows = Vec::new();

    for group in planned {
        if group.scripts.is_empty() {
            tracing::debug!("group {} has no tools", group.group);
            continue;
        }
        for command in &group.scripts {
            let outcome = create_launchers(&command.script)?;
            commands.push(GeneratedCommand {
                group: group.group.clone(),
                package: command.package.clone(),
                name: command.script.base_name.clone(),
                outcome,
            });
        }
        rows.push(GroupManifestRow {
            group_name: group.group.to_string(),
            base_dir: group.output_dir,
        });
    }

    let destination = manifest_path(root);
    if let Some(filter) = &options.group_filter {
        let previous = if destination.exists() {
            read_manifest(&destination).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable manifest: {e:#}");
                Vec::new()
            })
        } else {
            Vec::new()
        };
        rows = merge_rows(previous, rows, filter);
    }
    let manifest_outcome = write_manifest(&rows, &destination)?;

    Ok(SynthesisReport {
        commands,
        manifest: rows,
        manifest_path: destination,
        manifest_outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeVariant;

    fn row(name: &str, dir: &str) -> GroupManifestRow {
        GroupManifestRow {
            group_name: name.to_string(),
            base_dir: PathBuf::from(dir),
        }
    }

    #[test]
    fn test_merge_rows_replaces_regenerated_group_in_place() {
        let previous = vec![row("Main", "/a"), row("Build", "/old")];
        let merged = merge_rows(previous, vec![row("build", "/new")], &GroupName::new("Build"));
        assert_eq!(merged, vec![row("Main", "/a"), row("build", "/new")]);
    }

    #[test]
    fn test_merge_rows_drops_group_without_tools() {
        let previous = vec![row("Main", "/a"), row("Build", "/old")];
        let merged = merge_rows(previous, Vec::new(), &GroupName::new("Build"));
        assert_eq!(merged, vec![row("Main", "/a")]);
    }

    #[test]
    fn test_merge_rows_appends_new_group() {
        let merged = merge_rows(vec![row("Main", "/a")], vec![row("Docs", "/d")], &GroupName::new("Docs"));
        assert_eq!(merged, vec![row("Main", "/a"), row("Docs", "/d")]);
    }

    #[test]
    fn test_alias_target_by_tool_or_package_name() {
        let tool = DiscoveredTool {
            name: "fake".to_string(),
            moniker: crate::runtime::FrameworkMoniker::parse("net461").unwrap(),
            executable: PathBuf::from("/p/tools/net461/fake.exe"),
        };
        let package = ResolvedToolPackage {
            group: GroupName::main(),
            package: "FAKE.Tool".to_string(),
            install_folder: PathBuf::from("/p"),
        };
        let tools = vec![tool];
        let by_tool = AliasEntry { key: "FAKE".to_string(), name: "f".to_string(), args: vec![] };
        let by_package = AliasEntry { key: "fake.tool".to_string(), name: "g".to_string(), args: vec![] };
        let unknown = AliasEntry { key: "paket".to_string(), name: "h".to_string(), args: vec![] };
        assert!(alias_target(&by_tool, &package, &tools).is_some());
        assert_eq!(alias_target(&by_package, &package, &tools).unwrap().variant(), RuntimeVariant::Framework);
        assert!(alias_target(&unknown, &package, &tools).is_none());
    }
}
