use anyhow::{anyhow, Result};
use tracing_subscriber::filter::EnvFilter;

/// Environment variable holding a `tracing` filter directive, e.g. `repotools=debug`.
pub const LOG_ENV: &str = "REPOTOOLS_LOG";

/// Maps the `-v` count to a default filter level.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs the stderr subscriber. `REPOTOOLS_LOG` wins over `verbosity`.
///
/// Logs never go to stdout, which carries PATH snippets.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level_for(verbosity)))
        .map_err(|e| anyhow!("invalid log filter: {e}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("logging already initialized: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(5), "debug");
    }
}
