use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{bail, Context, Result};

/// Shell syntax the PATH snippets are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellDialect {
    /// Windows `cmd.exe`.
    Cmd,
    /// POSIX `sh` and compatible shells.
    Sh,
}

impl ShellDialect {
    /// Dialect of the host this program runs on.
    pub fn native() -> ShellDialect {
        if cfg!(windows) {
            ShellDialect::Cmd
        } else {
            ShellDialect::Sh
        }
    }
}

impl FromStr for ShellDialect {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cmd" | "bat" => Ok(ShellDialect::Cmd),
            "sh" | "bash" | "zsh" => Ok(ShellDialect::Sh),
            other => bail!("Unknown export format '{}'; expected cmd or sh", other),
        }
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellDialect::Cmd => write!(f, "cmd"),
            ShellDialect::Sh => write!(f, "sh"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDirection {
    Enable,
    Disable,
    List,
}

impl PathDirection {
    /// Neither flag means "list".
    pub fn from_flags(enable: bool, disable: bool) -> PathDirection {
        match (enable, disable) {
            (true, _) => PathDirection::Enable,
            (false, true) => PathDirection::Disable,
            (false, false) => PathDirection::List,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetDestination {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExportRequest {
    pub direction: PathDirection,
    /// `None` prints notices as plain text.
    pub dialect: Option<ShellDialect>,
    pub destination: SnippetDestination,
}

fn notice(dialect: Option<ShellDialect>, text: &str) -> String {
    match dialect {
        Some(ShellDialect::Cmd) => format!("ECHO {text}"),
        Some(ShellDialect::Sh) => format!("echo \"{text}\""),
        None => text.to_string(),
    }
}

/// Line that puts `dir` in front of `PATH`.
pub fn enable_line(dialect: ShellDialect, dir: &str) -> String {
    match dialect {
        ShellDialect::Cmd => format!("SET \"PATH={dir};%PATH%\""),
        ShellDialect::Sh => format!("export PATH=\"{dir}:$PATH\""),
    }
}

/// Line that removes what [`enable_line`] added.
///
/// The cmd form ends right after the closing `%%` with no trailing space, so
/// the substitution does not leave a space at the end of `PATH`.
pub fn disable_line(dialect: ShellDialect, dir: &str) -> String {
    match dialect {
        ShellDialect::Cmd => format!("CALL SET PATH=%%PATH:{dir};=%%"),
        ShellDialect::Sh => format!("export PATH=\"${{PATH//\"{dir}:\"/}}\""),
    }
}

/// Builds the snippet lines for a request. `List` yields no lines.
///
/// The directory does not have to exist.
pub fn build_path_snippets(request: &PathExportRequest, directory: &Path) -> Vec<String> {
    let dir = directory.display().to_string();
    let mutation_dialect = request.dialect.unwrap_or_else(ShellDialect::native);
    match request.direction {
        PathDirection::Enable => vec![
            notice(request.dialect, &format!("Adding {dir} to PATH")),
            enable_line(mutation_dialect, &dir),
        ],
        PathDirection::Disable => vec![
            notice(request.dialect, &format!("Removing {dir} from PATH")),
            disable_line(mutation_dialect, &dir),
        ],
        PathDirection::List => Vec::new(),
    }
}

/// Sends snippet lines to their destination, one per line. A file
/// destination is overwritten.
pub fn emit_snippets(lines: &[String], destination: &SnippetDestination) -> Result<()> {
    match destination {
        SnippetDestination::Stdout => {
            for line in lines {
                println!("{line}");
            }
        }
        SnippetDestination::File(path) => {
            let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create directory {}", parent.display()))?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("Could not write {}", path.display()))?;
        }
    }
    Ok(())
}

/// Whether `dir` is one of the entries of the `PATH` value given.
pub fn is_on_path(path_var: &str, dir: &Path) -> bool {
    std::env::split_paths(path_var).any(|entry| entry == dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn request(direction: PathDirection, dialect: Option<ShellDialect>) -> PathExportRequest {
        PathExportRequest {
            direction,
            dialect,
            destination: SnippetDestination::Stdout,
        }
    }

    #[test]
    fn test_enable_then_disable_cmd() {
        let dir = Path::new(r"C:\repo\paket-files\bin");
        let mut lines = build_path_snippets(&request(PathDirection::Enable, Some(ShellDialect::Cmd)), dir);
        lines.extend(build_path_snippets(&request(PathDirection::Disable, Some(ShellDialect::Cmd)), dir));
        assert_eq!(
            lines,
            vec![
                r"ECHO Adding C:\repo\paket-files\bin to PATH".to_string(),
                r#"SET "PATH=C:\repo\paket-files\bin;%PATH%""#.to_string(),
                r"ECHO Removing C:\repo\paket-files\bin from PATH".to_string(),
                r"CALL SET PATH=%%PATH:C:\repo\paket-files\bin;=%%".to_string(),
            ]
        );
    }

    #[test]
    fn test_enable_then_disable_sh() {
        let dir = Path::new("/repo/paket-files/bin");
        let mut lines = build_path_snippets(&request(PathDirection::Enable, Some(ShellDialect::Sh)), dir);
        lines.extend(build_path_snippets(&request(PathDirection::Disable, Some(ShellDialect::Sh)), dir));
        assert_eq!(
            lines,
            vec![
                "echo \"Adding /repo/paket-files/bin to PATH\"".to_string(),
                "export PATH=\"/repo/paket-files/bin:$PATH\"".to_string(),
                "echo \"Removing /repo/paket-files/bin from PATH\"".to_string(),
                "export PATH=\"${PATH//\"/repo/paket-files/bin:\"/}\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_plain_notice_without_dialect() {
        let lines = build_path_snippets(&request(PathDirection::Enable, None), Path::new("/x"));
        assert_eq!(lines[0], "Adding /x to PATH");
        assert_eq!(lines[1], enable_line(ShellDialect::native(), "/x"));
    }

    #[test]
    fn test_list_emits_nothing() {
        assert!(build_path_snippets(&request(PathDirection::List, Some(ShellDialect::Sh)), Path::new("/x")).is_empty());
        assert_eq!(PathDirection::from_flags(false, false), PathDirection::List);
        assert_eq!(PathDirection::from_flags(false, true), PathDirection::Disable);
    }

    #[test]
    fn test_emit_to_file_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("env.sh");
        std::fs::write(&path, "stale\nstale\nstale\n").unwrap();
        let lines = vec!["one".to_string(), "two".to_string()];
        emit_snippets(&lines, &SnippetDestination::File(path.clone())).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_parse_dialect() {
        assert_eq!("CMD".parse::<ShellDialect>().unwrap(), ShellDialect::Cmd);
        assert_eq!("sh".parse::<ShellDialect>().unwrap(), ShellDialect::Sh);
        assert!("fish".parse::<ShellDialect>().is_err());
    }

    #[test]
    fn test_is_on_path() {
        let dir = PathBuf::from("/repo/paket-files/bin");
        let joined = std::env::join_paths([PathBuf::from("/usr/bin"), dir.clone()]).unwrap();
        assert!(is_on_path(joined.to_str().unwrap(), &dir));
        assert!(!is_on_path("/usr/bin", &dir));
    }
}
