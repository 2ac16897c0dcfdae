//! Helpers for driving the `itr` binary in an isolated directory.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use assert_cmd::Command;
use tempfile::TempDir;

/// Environment variables that would leak the developer's setup into tests.
const SCRUBBED_ENV: &[&str] = &[
    "GEMINI_API_KEY",
    "ITERION_ORG",
    "ITERION_MODEL",
    "ITERION_SEED",
    "ITERION_LOG_JSON",
    "RUST_LOG",
];

/// A scratch directory used as cwd, `HOME` and `XDG_CONFIG_HOME`.
pub struct ItrWorkspace {
    pub temp_dir: TempDir,
}

impl ItrWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `contents` to `relative` under the workspace, creating parents.
    pub fn write_file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Write `.iterion/config.yaml` in the workspace.
    pub fn write_config(&self, yaml: &str) -> PathBuf {
        self.write_file(".iterion/config.yaml", yaml)
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("itr").expect("itr binary");
        cmd.current_dir(self.root())
            .env("HOME", self.root())
            .env("XDG_CONFIG_HOME", self.root().join("xdg"));
        for var in SCRUBBED_ENV {
            cmd.env_remove(var);
        }
        cmd
    }
}

pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }
}

/// Run `itr` with `args`; `label` names the step in failure output.
pub fn run_itr<I, S>(workspace: &ItrWorkspace, args: I, label: &str) -> CmdOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = workspace
        .command()
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("{label}: failed to run itr: {e}"));
    CmdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
