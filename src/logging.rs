//! Logging setup.
//!
//! All diagnostics go to stderr so stdout stays clean for `--json` output.
//! `RUST_LOG` takes precedence over the verbosity flags.

use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TEST_LOGGING: OnceCell<()> = OnceCell::new();

/// Filter directive for the given verbosity flags.
#[must_use]
pub const fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// `json` switches to one JSON object per event.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.without_time().try_init()
    };
    result.map_err(|e| anyhow!("{e}"))
}

/// Idempotent subscriber for tests; output is captured by the test harness.
pub fn init_test_logging() {
    TEST_LOGGING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    });
}
