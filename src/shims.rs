use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::paths::{join_with_separator, relative_to};
use crate::runtime::RuntimeVariant;

/// Extension of the Windows launcher; the POSIX launcher has none.
pub const CMD_EXTENSION: &str = "cmd";

/// Everything needed to render the launcher pair of one command.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperScript {
    /// Folder both launchers are written to.
    pub output_dir: PathBuf,
    /// Command name: the tool name or the alias name.
    pub base_name: String,
    /// Absolute path of the executable to start.
    pub target: PathBuf,
    pub variant: RuntimeVariant,
    /// Arguments passed before the ones given on the command line.
    pub args: Vec<String>,
    /// The package manager's own `paket-files/paket/bin` folder, put on
    /// `PATH` by the Windows launcher.
    pub host_bin_dir: PathBuf,
}

impl WrapperScript {
    /// How a launcher refers to `target`: joined onto `script_dir` when a
    /// relative path exists, otherwise the absolute path on its own (e.g. a
    /// package on another Windows drive).
    fn locate(&self, target: &Path, separator: char, script_dir: &str) -> String {
        match relative_to(&self.output_dir, target) {
            Some(relative) => format!("{script_dir}{}", join_with_separator(relative, separator)),
            None => target.display().to_string(),
        }
    }

    pub fn cmd_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.{}", self.base_name, CMD_EXTENSION))
    }

    pub fn sh_path(&self) -> PathBuf {
        self.output_dir.join(&self.base_name)
    }
}

/// Rendered text of both launchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScripts {
    pub cmd: String,
    pub sh: String,
}

/// Renders both launcher bodies for a command.
pub fn render(script: &WrapperScript) -> RenderedScripts {
    RenderedScripts {
        cmd: render_cmd(script),
        sh: render_sh(script),
    }
}

/// Renders the Windows batch launcher.
///
/// The script prepends `paket-files\paket\bin` to `PATH` unless a
/// case-insensitive search finds it there already, then starts the target
/// relative to its own folder (`%~dp0`). Paths with no relative form are
/// written absolute.
pub fn render_cmd(script: &WrapperScript) -> String {
    let host_bin = script.locate(&script.host_bin_dir, '\\', "%~dp0");
    let exe = script.locate(&script.target, '\\', "%~dp0");
    let args: String = script.args.iter().map(|a| format!(" {}", quote_cmd(a))).collect();

    let lines = [
        "@ECHO OFF".to_string(),
        format!("SET \"PAKET_BIN={host_bin}\""),
        "FOR %%I IN (\"%PAKET_BIN%\") DO SET \"PAKET_BIN=%%~fI\"".to_string(),
        "ECHO \";%PATH%;\" | FIND /I \";%PAKET_BIN%;\" >NUL || SET \"PATH=%PAKET_BIN%;%PATH%\"".to_string(),
        format!(
            "{}\"{exe}\"{args} %*",
            script.variant.cmd_host_prefix()
        ),
    ];
    lines.iter().map(|l| format!("{l}\r\n")).collect()
}

/// Renders the POSIX shell launcher.
pub fn render_sh(script: &WrapperScript) -> String {
    let exe = script.locate(&script.target, '/', "$(dirname \"$0\")/");
    let args: String = script.args.iter().map(|a| format!(" {}", quote_sh(a))).collect();
    format!(
        "#!/bin/sh\n{}\"{exe}\"{args} \"$@\"\n",
        script.variant.sh_host_prefix()
    )
}

/// Quotes an argument for a batch file. `%` is doubled so cmd.exe passes it
/// through literally instead of expanding variables.
fn quote_cmd(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg.chars().any(|c| c.is_whitespace() || "&|<>^()\",;=".contains(c));
    let escaped = arg.replace('%', "%%");
    if needs_quotes {
        format!("\"{}\"", escaped.replace('"', "\"\""))
    } else {
        escaped
    }
}

fn quote_sh(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// What [`write_if_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Writes `content` to `path` unless the file already holds exactly that
/// content. An unreadable existing file counts as different.
///
/// # Errors
/// Returns an error if the parent folder cannot be created or the write fails.
pub fn write_if_changed<P: AsRef<Path>>(path: P, content: &str) -> Result<WriteOutcome> {
    let path = path.as_ref();
    if let Ok(existing) = fs::read(path) {
        if existing == content.as_bytes() {
            tracing::debug!("{} is up to date", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;
    tracing::info!("wrote {}", path.display());
    Ok(WriteOutcome::Written)
}

/// Result of persisting one launcher pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub sh: WriteOutcome,
    pub cmd: WriteOutcome,
}

impl PersistOutcome {
    pub fn wrote_any(&self) -> bool {
        self.sh == WriteOutcome::Written || self.cmd == WriteOutcome::Written
    }
}

/// Writes `<output_dir>/<base_name>` and `<output_dir>/<base_name>.cmd`.
///
/// Both files are written on every host so a checked-in folder works
/// everywhere. On non-Windows hosts the shell launcher is made executable;
/// failing to do so only logs a warning.
pub fn persist(output_dir: &Path, base_name: &str, scripts: &RenderedScripts) -> Result<PersistOutcome> {
    let sh_path = output_dir.join(base_name);
    let sh = write_if_changed(&sh_path, &scripts.sh)?;
    if let Err(e) = make_executable(&sh_path) {
        tracing::warn!("Could not mark {} as executable: {}", sh_path.display(), e);
    }

    let cmd_path = output_dir.join(format!("{base_name}.{CMD_EXTENSION}"));
    let cmd = write_if_changed(&cmd_path, &scripts.cmd)?;
    Ok(PersistOutcome { sh, cmd })
}

/// Renders and persists one launcher pair.
pub fn create_launchers(script: &WrapperScript) -> Result<PersistOutcome> {
    let rendered = render(script);
    persist(&script.output_dir, &script.base_name, &rendered)
}

/// Adds the execute bits to a file, leaving its content untouched.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 == 0o111 {
        return Ok(());
    }
    permissions.set_mode(mode | 0o111);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
