//! Temporary-artifact lifecycle.
//!
//! Each invocation stages a rewritten copy of the handler source under a
//! deterministic temp directory next to the handler's code root. Directory
//! creation and file writes are best-effort: failures are logged and the
//! invocation proceeds, surfacing later as a launch failure if the artifact
//! is genuinely missing.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use offline_core::rewrite::rewrite_runtime_import;
use serde_json::json;
use tokio::fs;

use crate::observe::log_runner_warn;

/// Fixed directory name the staged artifact lives under.
pub const STAGING_DIR_NAME: &str = "tmp";

/// Fixed filename of the staged artifact inside the staging directory.
pub const STAGED_FILE_NAME: &str = "main.go";

/// Extension of the handler source read from disk.
pub const HANDLER_SOURCE_EXTENSION: &str = "go";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub source_path: PathBuf,
    pub temp_dir: PathBuf,
    pub temp_file: PathBuf,
}

/// Owns at most one staged artifact at a time.
#[derive(Debug, Default)]
pub struct ArtifactStager {
    staged: Option<StagedArtifact>,
}

impl ArtifactStager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize the rewritten handler under `<handler dir>/../tmp`.
    ///
    /// The staging path depends only on the handler path, so repeated
    /// invocations reuse the same location. Reading the handler source is
    /// the one staging step whose failure propagates.
    pub async fn stage(&mut self, handler_path: &Path) -> Result<StagedArtifact, String> {
        let handler_dir = handler_path.parent().unwrap_or_else(|| Path::new(""));
        let code_root = handler_dir.parent().unwrap_or_else(|| Path::new(""));
        let temp_dir = code_root.join(STAGING_DIR_NAME);
        let temp_file = temp_dir.join(STAGED_FILE_NAME);
        let source_path = handler_path.with_extension(HANDLER_SOURCE_EXTENSION);

        let source = fs::read_to_string(&source_path).await.map_err(|error| {
            format!(
                "failed to read handler source '{}': {error}",
                source_path.display()
            )
        })?;
        let rewritten = rewrite_runtime_import(&source);

        if let Err(error) = fs::create_dir_all(&temp_dir).await {
            log_runner_warn(
                "artifact_dir_create_failed",
                json!({
                    "temp_dir": temp_dir.display().to_string(),
                    "error": error.to_string(),
                }),
            );
        }
        if let Err(error) = fs::write(&temp_file, rewritten).await {
            log_runner_warn(
                "artifact_write_failed",
                json!({
                    "temp_file": temp_file.display().to_string(),
                    "error": error.to_string(),
                }),
            );
        }

        let artifact = StagedArtifact {
            source_path,
            temp_dir,
            temp_file,
        };
        self.staged = Some(artifact.clone());
        Ok(artifact)
    }

    /// Remove the staged artifact's directory recursively.
    ///
    /// A missing directory is a no-op, so double cleanup is safe; removal
    /// failures are logged and swallowed. State is reset either way, keeping
    /// the stager usable for the next invocation.
    pub async fn cleanup(&mut self) {
        let Some(artifact) = self.staged.take() else {
            return;
        };

        if let Err(error) = fs::remove_dir_all(&artifact.temp_dir).await {
            if error.kind() != ErrorKind::NotFound {
                log_runner_warn(
                    "artifact_cleanup_failed",
                    json!({
                        "temp_dir": artifact.temp_dir.display().to_string(),
                        "error": error.to_string(),
                    }),
                );
            }
        }
    }

    /// The artifact staged by the most recent `stage` call, if cleanup has
    /// not run since.
    pub fn staged(&self) -> Option<&StagedArtifact> {
        self.staged.as_ref()
    }
}
