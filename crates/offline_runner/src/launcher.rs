//! Toolchain subprocess invocation.
//!
//! The toolchain is an opaque external program with two uses: `env` (queried
//! once per harness instance, parsed and cached) and `run <artifact>` (once
//! per invocation, with a fully composed environment and captured stdio).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use offline_core::environment::parse_toolchain_env;
use tokio::process::Command;

/// Pinned mock-runtime module the rewritten import resolves to.
pub const MOCK_RUNTIME_MODULE: &str = "github.com/icarus-sullivan/mock-lambda@e065469";

/// Raw text captured from a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Launches the toolchain and caches its reported environment for the
/// lifetime of this instance.
#[derive(Debug)]
pub struct ToolchainLauncher {
    toolchain: String,
    env_cache: Option<BTreeMap<String, String>>,
}

impl ToolchainLauncher {
    pub fn new(toolchain: impl Into<String>) -> Self {
        Self {
            toolchain: toolchain.into(),
            env_cache: None,
        }
    }

    /// The toolchain-reported environment, queried at most once per
    /// instance. Falls back to stderr when the toolchain reports on that
    /// stream instead.
    pub async fn toolchain_env(&mut self) -> Result<BTreeMap<String, String>, String> {
        if let Some(cached) = &self.env_cache {
            return Ok(cached.clone());
        }

        let output = Command::new(&self.toolchain)
            .arg("env")
            .output()
            .await
            .map_err(|error| format!("failed to run `{} env`: {error}", self.toolchain))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let text = if stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            stdout
        };

        let parsed = parse_toolchain_env(&text);
        self.env_cache = Some(parsed.clone());
        Ok(parsed)
    }

    /// Run the staged artifact with the composed environment and capture
    /// both streams until the child exits.
    ///
    /// The child environment is exactly `env`; nothing leaks in from the
    /// harness process. A non-zero exit status is not an error here, the
    /// caller decides based on the captured stderr. No timeout is imposed.
    pub async fn run_artifact(
        &self,
        artifact_path: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<ProcessOutput, String> {
        let output = Command::new(&self.toolchain)
            .arg("run")
            .arg(artifact_path)
            .env_clear()
            .envs(env)
            .output()
            .await
            .map_err(|error| format!("failed to run `{} run`: {error}", self.toolchain))?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Express a path relative to the current working directory so the
/// toolchain resolves module context the same way a developer invoking it
/// from the project root would. Paths outside the cwd stay absolute.
pub fn relative_to_cwd(path: &Path) -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => path
            .strip_prefix(&cwd)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Fetch the pinned mock runtime so staged artifacts resolve their
/// rewritten import. Wired by the host at setup time, not per invocation.
pub fn ensure_mock_runtime(toolchain: &str) -> Result<(), String> {
    let output = std::process::Command::new(toolchain)
        .args(["get", MOCK_RUNTIME_MODULE])
        .output()
        .map_err(|error| format!("failed to run `{toolchain} get`: {error}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`{toolchain} get {MOCK_RUNTIME_MODULE}` failed: {}",
            stderr.trim()
        ));
    }

    Ok(())
}
