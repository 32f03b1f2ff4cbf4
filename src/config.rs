use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use crate::group::GroupName;
use crate::runtime::{parse_preference, RuntimeVariant, PREFERRED_RUNTIME_ENV};

/// Contents of `repotools.toml`: which folder each group's launchers go to
/// and which extra commands (aliases) packages expose.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct RepoToolsConfig {
    /// Output folder for every group without its own `bin_dir`, relative to the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
    /// Runtime to prefer when a tool ships several builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_runtime: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, GroupSettings>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct GroupSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<AliasEntry>,
}

/// An extra command generated for a tool, with arguments baked in.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// Tool name or package name the alias applies to.
    pub key: String,
    /// Name of the generated command.
    pub name: String,
    /// Arguments passed before the ones given on the command line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl RepoToolsConfig {
    /// Loads the config, returning defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<RepoToolsConfig> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(RepoToolsConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Could not parse {}", path.display()))
    }

    /// Saves the config in pretty TOML format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Could not write {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Settings of a group, matched case-insensitively.
    pub fn group(&self, group: &GroupName) -> Option<&GroupSettings> {
        self.groups
            .iter()
            .find(|(name, _)| group.matches(name))
            .map(|(_, settings)| settings)
    }

    fn group_mut(&mut self, group: &GroupName) -> &mut GroupSettings {
        let key = self
            .groups
            .keys()
            .find(|name| group.matches(name))
            .cloned()
            .unwrap_or_else(|| group.to_string());
        self.groups.entry(key).or_default()
    }

    /// The `bin_dir` override that applies to `group`, if any.
    pub fn bin_dir_for(&self, group: &GroupName) -> Option<&Path> {
        self.group(group)
            .and_then(|g| g.bin_dir.as_deref())
            .or(self.bin_dir.as_deref())
    }

    pub fn aliases_for(&self, group: &GroupName) -> &[AliasEntry] {
        self.group(group).map(|g| g.alias.as_slice()).unwrap_or(&[])
    }

    /// Adds an alias to a group.
    ///
    /// # Errors
    /// Fails when the name is empty or another alias in the group already uses it.
    pub fn add_alias(&mut self, group: &GroupName, alias: AliasEntry) -> Result<()> {
        if alias.name.trim().is_empty() || alias.key.trim().is_empty() {
            bail!("Alias name and key must not be empty");
        }
        let settings = self.group_mut(group);
        if settings.alias.iter().any(|a| a.name == alias.name) {
            bail!("Alias {} already exists in group {}", alias.name, group);
        }
        settings.alias.push(alias);
        Ok(())
    }

    /// Removes an alias by its exposed name. Returns whether one was removed.
    pub fn remove_alias(&mut self, group: &GroupName, name: &str) -> bool {
        let settings = self.group_mut(group);
        let before = settings.alias.len();
        settings.alias.retain(|a| a.name != name);
        before != settings.alias.len()
    }
}

/// User-wide defaults read from `<config dir>/config.toml`.
#[derive(Deserialize, Debug, Default)]
pub struct GlobalConfig {
    #[serde(default)]
    pub preferred_runtime: Option<String>,
}

impl GlobalConfig {
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("org", "paket", "repotools").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the global config. A missing or unreadable file yields defaults.
    pub fn load() -> GlobalConfig {
        let Some(path) = GlobalConfig::path() else {
            return GlobalConfig::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid global config {}: {}", path.display(), e);
                GlobalConfig::default()
            }),
            Err(_) => GlobalConfig::default(),
        }
    }
}

/// Settings captured once at the start of a synthesis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisOptions {
    pub preferred_runtime: Option<RuntimeVariant>,
    /// Only generate launchers for this group when set.
    pub group_filter: Option<GroupName>,
}

impl SynthesisOptions {
    /// Resolves the preferred runtime from, in order: the command line, the
    /// environment value, the project config and the global config.
    pub fn resolve(
        cli_runtime: Option<&str>,
        env_runtime: Option<&str>,
        config: &RepoToolsConfig,
        global: &GlobalConfig,
    ) -> Option<RuntimeVariant> {
        let chosen = [
            cli_runtime,
            env_runtime,
            config.preferred_runtime.as_deref(),
            global.preferred_runtime.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty());
        parse_preference(chosen)
    }

    /// Builds the options for one run, reading the environment exactly once.
    pub fn capture(
        cli_runtime: Option<&str>,
        group_filter: Option<GroupName>,
        config: &RepoToolsConfig,
    ) -> SynthesisOptions {
        let env_runtime = std::env::var(PREFERRED_RUNTIME_ENV).ok();
        let global = GlobalConfig::load();
        SynthesisOptions {
            preferred_runtime: SynthesisOptions::resolve(
                cli_runtime,
                env_runtime.as_deref(),
                config,
                &global,
            ),
            group_filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
bin_dir = "tools/bin"
preferred_runtime = "netcore"

[groups.build]
bin_dir = "build/bin"

[[groups.Main.alias]]
key = "FAKE"
name = "fake"
args = ["run"]
"#;

    #[test]
    fn test_bin_dir_precedence() {
        let config: RepoToolsConfig = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.bin_dir_for(&GroupName::new("Build")), Some(Path::new("build/bin")));
        assert_eq!(config.bin_dir_for(&GroupName::main()), Some(Path::new("tools/bin")));
        assert_eq!(RepoToolsConfig::default().bin_dir_for(&GroupName::main()), None);
    }

    #[test]
    fn test_aliases_for_group() {
        let config: RepoToolsConfig = toml::from_str(CONFIG).unwrap();
        let aliases = config.aliases_for(&GroupName::new("main"));
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].args, vec!["run"]);
        assert!(config.aliases_for(&GroupName::new("Docs")).is_empty());
    }

    #[test]
    fn test_add_alias_rejects_duplicates() {
        let mut config = RepoToolsConfig::default();
        let alias = AliasEntry {
            key: "FAKE".to_string(),
            name: "fake".to_string(),
            args: vec![],
        };
        config.add_alias(&GroupName::main(), alias.clone()).unwrap();
        assert!(config.add_alias(&GroupName::new("MAIN"), alias).is_err());
        assert_eq!(config.groups.len(), 1);
    }

    #[test]
    fn test_remove_alias() {
        let mut config: RepoToolsConfig = toml::from_str(CONFIG).unwrap();
        assert!(config.remove_alias(&GroupName::main(), "fake"));
        assert!(!config.remove_alias(&GroupName::main(), "fake"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repotools.toml");
        assert_eq!(RepoToolsConfig::load_or_default(&path).unwrap(), RepoToolsConfig::default());

        let config: RepoToolsConfig = toml::from_str(CONFIG).unwrap();
        config.save(&path).unwrap();
        assert_eq!(RepoToolsConfig::load_or_default(&path).unwrap(), config);
    }

    #[test]
    fn test_runtime_resolution_order() {
        let config: RepoToolsConfig = toml::from_str(CONFIG).unwrap();
        let global = GlobalConfig {
            preferred_runtime: Some("net".to_string()),
        };
        assert_eq!(
            SynthesisOptions::resolve(Some("mono"), Some("dotnet"), &config, &global),
            Some(RuntimeVariant::Framework)
        );
        assert_eq!(
            SynthesisOptions::resolve(None, Some("netfx"), &config, &global),
            Some(RuntimeVariant::Framework)
        );
        assert_eq!(
            SynthesisOptions::resolve(None, None, &config, &global),
            Some(RuntimeVariant::Core)
        );
        assert_eq!(
            SynthesisOptions::resolve(None, None, &RepoToolsConfig::default(), &global),
            Some(RuntimeVariant::Framework)
        );
        assert_eq!(
            SynthesisOptions::resolve(None, None, &RepoToolsConfig::default(), &GlobalConfig::default()),
            None
        );
    }
}
