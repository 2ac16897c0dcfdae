//! Version command implementation.

use anyhow::Result;
use serde::Serialize;

use crate::cli::VersionArgs;

#[derive(Serialize)]
struct VersionOutput<'a> {
    name: &'a str,
    version: &'a str,
    build: &'a str,
    core_version: &'a str,
}

const fn build_kind() -> &'static str {
    if cfg!(debug_assertions) { "dev" } else { "release" }
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &VersionArgs, json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    if args.short {
        println!("{version}");
        return Ok(());
    }

    if json {
        let output = VersionOutput {
            name: "itr",
            version,
            build: build_kind(),
            core_version: iterion_lib::VERSION,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("itr version {version} ({})", build_kind());
    Ok(())
}
