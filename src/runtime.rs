use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use anyhow::{bail, Result};
use regex::Regex;
use crate::discovery::DiscoveredTool;

/// Environment variable that can name the preferred runtime for a run.
pub const PREFERRED_RUNTIME_ENV: &str = "PAKET_REPOTOOL_PREFERRED_RUNTIME";

/// The runtime families a tool package can ship a build for.
///
/// The declaration order is the default preference order: a legacy framework
/// build runs on Windows without any extra runtime, so it comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuntimeVariant {
    /// Legacy .NET Framework build (`net45`, `net472`, ...).
    Framework,
    /// Modern cross-platform build (`netcoreapp3.1`, `net6.0`, ...).
    Core,
}

impl RuntimeVariant {
    pub const DEFAULT_ORDER: [RuntimeVariant; 2] = [RuntimeVariant::Framework, RuntimeVariant::Core];

    /// Extension of the files that can be launched for this variant.
    pub fn executable_extension(self) -> &'static str {
        match self {
            RuntimeVariant::Framework => "exe",
            RuntimeVariant::Core => "dll",
        }
    }

    /// Text placed before the executable path in a Windows batch launcher.
    pub fn cmd_host_prefix(self) -> &'static str {
        match self {
            RuntimeVariant::Framework => "",
            RuntimeVariant::Core => "dotnet ",
        }
    }

    /// Text placed before the executable path in a POSIX shell launcher.
    pub fn sh_host_prefix(self) -> &'static str {
        match self {
            RuntimeVariant::Framework => "mono ",
            RuntimeVariant::Core => "dotnet ",
        }
    }
}

impl fmt::Display for RuntimeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeVariant::Framework => write!(f, "net"),
            RuntimeVariant::Core => write!(f, "netcore"),
        }
    }
}

impl FromStr for RuntimeVariant {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "net" | "netfx" | "framework" | "mono" => Ok(RuntimeVariant::Framework),
            "netcore" | "core" | "dotnet" | "coreclr" => Ok(RuntimeVariant::Core),
            other => bail!(
                "Unknown runtime '{}'; expected one of: net, netfx, framework, mono, netcore, core, dotnet, coreclr",
                other
            ),
        }
    }
}

/// A target framework folder name such as `net461` or `netcoreapp3.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkMoniker {
    raw: String,
    variant: RuntimeVariant,
    version: Vec<u32>,
}

fn moniker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^net(coreapp)?(\d+(?:\.\d+)*)(?:-[a-z0-9.]+)?$").expect("moniker regex is valid")
    })
}

impl FrameworkMoniker {
    /// Parses a folder name into a moniker. Returns `None` for anything that
    /// is not a runnable framework (`netstandard2.0`, `lib`, `any`, ...).
    pub fn parse(name: &str) -> Option<FrameworkMoniker> {
        let lower = name.to_ascii_lowercase();
        let caps = moniker_regex().captures(&lower)?;
        let is_coreapp = caps.get(1).is_some();
        let digits = caps.get(2)?.as_str();

        let (variant, version) = if is_coreapp {
            (RuntimeVariant::Core, parse_dotted(digits)?)
        } else if digits.contains('.') {
            // net5.0 and later dropped the "coreapp" infix
            let version = parse_dotted(digits)?;
            if version.first().copied().unwrap_or(0) < 5 {
                return None;
            }
            (RuntimeVariant::Core, version)
        } else {
            // net45, net461: every digit is a version part
            let version = digits.chars().filter_map(|c| c.to_digit(10)).collect();
            (RuntimeVariant::Framework, version)
        };

        Some(FrameworkMoniker {
            raw: name.to_string(),
            variant,
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn variant(&self) -> RuntimeVariant {
        self.variant
    }

    pub fn version(&self) -> &[u32] {
        &self.version
    }
}

impl fmt::Display for FrameworkMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_dotted(value: &str) -> Option<Vec<u32>> {
    value.split('.').map(|part| part.parse().ok()).collect()
}

/// Picks the runtime variant to launch a tool with.
///
/// `preference` wins when it is among `candidates`; otherwise the first
/// variant of [`RuntimeVariant::DEFAULT_ORDER`] that is available is used.
/// `candidates` must not be empty.
pub fn select_variant(candidates: &[RuntimeVariant], preference: Option<RuntimeVariant>) -> RuntimeVariant {
    if let Some(preferred) = preference {
        if candidates.contains(&preferred) {
            return preferred;
        }
    }
    RuntimeVariant::DEFAULT_ORDER
        .into_iter()
        .find(|variant| candidates.contains(variant))
        .unwrap_or(RuntimeVariant::Framework)
}

/// Reduces all discovered builds of one tool to the one to launch: the
/// selected variant, then the highest framework version, then path order.
pub fn select_build(builds: &[DiscoveredTool], preference: Option<RuntimeVariant>) -> Option<&DiscoveredTool> {
    let variants: Vec<RuntimeVariant> = builds.iter().map(|b| b.moniker.variant()).collect();
    if variants.is_empty() {
        return None;
    }
    let chosen = select_variant(&variants, preference);
    builds
        .iter()
        .filter(|b| b.moniker.variant() == chosen)
        .max_by(|a, b| compare_builds(a, b))
}

fn compare_builds(a: &DiscoveredTool, b: &DiscoveredTool) -> Ordering {
    a.moniker
        .version()
        .cmp(b.moniker.version())
        // reversed so the lexically first path wins a version tie
        .then_with(|| b.executable.cmp(&a.executable))
}

/// Parses a user supplied runtime name, logging and ignoring unknown values.
pub fn parse_preference(value: Option<&str>) -> Option<RuntimeVariant> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(variant) => Some(variant),
        Err(e) => {
            tracing::warn!("{e}; falling back to the default runtime order");
            None
        }
    }
}
