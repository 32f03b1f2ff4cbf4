use std::path::PathBuf;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Log more (-v info, -vv debug). REPOTOOLS_LOG overrides this
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: RepoToolsCommand,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum RepoToolsCommand {
    /// Creates an empty `repotools.toml`
    Init,
    /// Generates launcher scripts for every tool in `repotools.lock` and writes the manifest
    #[clap(alias = "restore")]
    Install {
        /// Only generate launchers for this group
        #[clap(long)]
        group: Option<String>,
        /// Preferred runtime when a tool ships several builds (net, netcore)
        #[clap(long)]
        runtime: Option<String>,
    },
    /// Adds a command alias for a tool to `repotools.toml`. Run `install` afterwards
    Add {
        /// Tool or package name the alias launches
        key: String,
        /// Name of the generated command
        #[clap(long)]
        alias: String,
        /// Group the tool belongs to
        #[clap(long)]
        group: Option<String>,
        /// Arguments always passed to the tool, before the user's
        #[clap(last = true)]
        args: Vec<String>,
    },
    /// Prints or writes snippets that add or remove the launcher folder from PATH
    Path {
        /// Group whose launcher folder to use
        #[clap(long)]
        group: Option<String>,
        /// Emit lines that add the folder to PATH
        #[clap(long, conflicts_with = "disable")]
        enable: bool,
        /// Emit lines that remove the folder from PATH
        #[clap(long)]
        disable: bool,
        /// Shell syntax of the snippets: cmd or sh
        #[clap(long)]
        export: Option<String>,
        /// Write the snippets to this file instead of stdout
        #[clap(long)]
        export_path: Option<PathBuf>,
    },
    /// Lists the generated commands per group
    List {
        /// Print JSON instead of text
        #[clap(long)]
        json: bool,
    },
}
