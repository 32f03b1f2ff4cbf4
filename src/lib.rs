//! # Repotools Core Library
//!
//! This crate turns resolved tool packages into commands on the local machine.
//! For every executable a package ships it writes two launchers next to each
//! other: a Windows batch file (`<name>.cmd`) and a POSIX shell script
//! (`<name>`), each starting the executable with the right runtime host
//! (`mono`, `dotnet` or none) and any baked-in alias arguments.
//!
//! The resolver's output is read from `repotools.lock` and the project settings
//! from `repotools.toml`; this crate resolves nothing and installs nothing.
//!
//! ## Modules Overview
//! - [`paths`] – Typed path composition and relative paths
//! - [`group`] – Dependency group names
//! - [`lock`] – Resolved packages per group (`repotools.lock`)
//! - [`config`] – Output folder overrides, aliases and run options (`repotools.toml`)
//! - [`discovery`] – Finding launchable builds inside a package
//! - [`runtime`] – Runtime variants and picking the build to launch
//! - [`shims`] – Rendering and idempotently writing launcher scripts
//! - [`layout`] – Output folders and the `paket.repotools.csv` manifest
//! - [`synthesis`] – The full generation pass
//! - [`path_env`] – PATH enable/disable snippets
//! - [`util`] – Project file locations and listing
//! - [`logging`] – `tracing` subscriber setup


pub mod paths;
pub mod group;
pub mod lock;
pub mod config;
pub mod discovery;
pub mod runtime;
pub mod shims;
pub mod layout;
pub mod synthesis;
pub mod path_env;
pub mod util;
pub mod logging;

pub use paths::*;
pub use group::*;
pub use lock::*;
pub use config::*;
pub use discovery::*;
pub use runtime::*;
pub use shims::*;
pub use layout::*;
pub use synthesis::*;
pub use path_env::*;
pub use util::*;
