//! Logging setup
//!
//! Logs go to stderr so they never mix with menu output or mpv's terminal UI.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// 0 = warn, 1 = info, 2 = debug, 3+ = trace. `RUST_LOG` overrides all of these
/// unless `quiet` is set.
pub fn init_logging(verbose_level: u8, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        let level = match verbose_level {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}
