use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use repotools::config::{AliasEntry, RepoToolsConfig, SynthesisOptions};
use repotools::group::GroupName;
use repotools::layout::{manifest_path, read_manifest, resolve_output_dir};
use repotools::lock::ToolsLock;
use repotools::path_env::{build_path_snippets, emit_snippets, is_on_path, PathDirection, PathExportRequest, ShellDialect, SnippetDestination};
use repotools::synthesis::generate_wrappers;
use repotools::util::{get_config_file, get_lock_file, get_project_root, list_commands};
use crate::cli::{RepoToolsCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    match cli.command {
        RepoToolsCommand::Init => {
            execute_init()
        }
        RepoToolsCommand::Install { group, runtime } => {
            execute_install(group, runtime)
        }
        RepoToolsCommand::Add { key, alias, group, args } => {
            execute_add(key, alias, group, args)
        }
        RepoToolsCommand::Path { group, enable, disable, export, export_path } => {
            execute_path(group, enable, disable, export, export_path)
        }
        RepoToolsCommand::List { json } => {
            execute_list(json)
        }
    }
}

pub fn execute_init() -> Result<()> {
    let root = get_project_root()?;
    let config_path = get_config_file(&root);
    if config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(());
    }
    RepoToolsConfig::default().save(&config_path)?;
    println!("Created {}", config_path.display());
    Ok(())
}

pub fn execute_install(group: Option<String>, runtime: Option<String>) -> Result<()> {
    let root = get_project_root()?;
    let lock_path = get_lock_file(&root);
    if !lock_path.exists() {
        bail!("{} not found. Restore your packages first.", lock_path.display());
    }
    let lock = ToolsLock::load(&lock_path)?;
    let config = RepoToolsConfig::load_or_default(get_config_file(&root))?;
    let options = SynthesisOptions::capture(runtime.as_deref(), group.map(GroupName::new), &config);

    let report = generate_wrappers(&root, &lock, &config, &options)?;
    for command in &report.commands {
        let status = if command.outcome.wrote_any() {
            "generated".green()
        } else {
            "up to date".dimmed()
        };
        println!("{:>12} {} ({}, group {})", status, command.name, command.package, command.group);
    }
    if report.commands.is_empty() {
        println!("No tools found");
    }
    println!("Manifest: {}", report.manifest_path.display());
    Ok(())
}

pub fn execute_add(key: String, alias: String, group: Option<String>, args: Vec<String>) -> Result<()> {
    let root = get_project_root()?;
    let config_path = get_config_file(&root);
    let mut config = RepoToolsConfig::load_or_default(&config_path)?;
    let group = group.map(GroupName::new).unwrap_or_default();
    config.add_alias(
        &group,
        AliasEntry {
            key,
            name: alias.clone(),
            args,
        },
    )?;
    config.save(&config_path)?;
    println!("Added alias {} to group {}", alias, group);
    Ok(())
}

pub fn execute_path(
    group: Option<String>,
    enable: bool,
    disable: bool,
    export: Option<String>,
    export_path: Option<std::path::PathBuf>,
) -> Result<()> {
    let root = get_project_root()?;
    let config = RepoToolsConfig::load_or_default(get_config_file(&root))?;
    let group = group.map(GroupName::new).unwrap_or_default();
    let directory = resolve_output_dir(&root, &group, config.bin_dir_for(&group));

    let dialect = export
        .as_deref()
        .map(str::parse::<ShellDialect>)
        .transpose()?;
    let request = PathExportRequest {
        direction: PathDirection::from_flags(enable, disable),
        dialect,
        destination: export_path.map_or(SnippetDestination::Stdout, SnippetDestination::File),
    };

    if request.direction == PathDirection::List {
        let on_path = std::env::var("PATH")
            .map(|p| is_on_path(&p, &directory))
            .unwrap_or(false);
        println!("Tool directory: {}", directory.display());
        println!("  exists:  {}", if directory.exists() { "yes" } else { "no" });
        println!("  on PATH: {}", if on_path { "yes" } else { "no" });
        for name in list_commands(&directory) {
            println!("  {name}");
        }
    }

    let lines = build_path_snippets(&request, &directory);
    emit_snippets(&lines, &request.destination)
}

#[derive(Serialize)]
struct ListedGroup {
    group_name: String,
    base_dir: std::path::PathBuf,
    commands: Vec<String>,
}

pub fn execute_list(json: bool) -> Result<()> {
    let root = get_project_root()?;
    let path = manifest_path(&root);
    if !path.exists() {
        println!("No manifest found. Run `repotools install` first.");
        return Ok(());
    }
    let groups: Vec<ListedGroup> = read_manifest(&path)?
        .into_iter()
        .map(|row| ListedGroup {
            commands: list_commands(&row.base_dir),
            group_name: row.group_name,
            base_dir: row.base_dir,
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&groups).context("Could not serialize listing")?;
        println!("{out}");
        return Ok(());
    }
    for group in &groups {
        println!("{}: {}", group.group_name.bold(), group.base_dir.display());
        for command in &group.commands {
            println!("   {command}");
        }
        println!();
    }
    Ok(())
}
