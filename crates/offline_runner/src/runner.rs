//! The invocation harness facade.
//!
//! One `HandlerRunner` is created per function by the host and driven once
//! per invocation: stage the artifact, reuse or acquire credentials,
//! compose the child environment, launch the toolchain, clean the artifact
//! up, and demultiplex the captured output into a result payload plus
//! forwarded diagnostics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use offline_core::contract::{InvocationContext, InvocationEvent, ResultPayload};
use offline_core::environment::compose_child_env;
use offline_core::payload::split_result_payload;
use serde_json::json;

use crate::adapters::sts::StsCredentialSource;
use crate::credentials::{Clock, CredentialCache, CredentialSource, SystemClock};
use crate::launcher::{relative_to_cwd, ProcessOutput, ToolchainLauncher};
use crate::observe::{log_runner_error, log_runner_info};
use crate::stager::ArtifactStager;

/// Developer-facing sink for the child's diagnostic output. The whole
/// buffer is delivered as one block per invocation, in original order,
/// with the marker line already removed.
pub trait LogSink: Send + Sync {
    fn write_block(&self, text: &str);
}

/// Default sink: the child's diagnostics go to the harness stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogSink;

impl LogSink for ConsoleLogSink {
    fn write_block(&self, text: &str) {
        println!("{text}");
    }
}

/// Per-function harness configuration supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Handler source location without its extension.
    pub handler_path: PathBuf,
    /// Named credential profile.
    pub profile: String,
    /// Toolchain program; `go` unless the host overrides it.
    pub toolchain: String,
    /// Host-provided base environment, lowest merge precedence.
    pub base_env: BTreeMap<String, String>,
}

impl RunnerConfig {
    pub fn new(handler_path: impl Into<PathBuf>) -> Self {
        Self {
            handler_path: handler_path.into(),
            profile: "default".to_string(),
            toolchain: "go".to_string(),
            base_env: BTreeMap::new(),
        }
    }
}

/// Failures surfaced to the host. Staging create/write and artifact
/// cleanup failures are absorbed (logged, never fatal) and so have no
/// variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The handler source could not be read.
    HandlerSource(String),
    /// Credential acquisition failed; never retried internally.
    Credentials(String),
    /// The toolchain could not be spawned or its environment queried.
    Launch(String),
    /// The child wrote to stderr; its stdout (and any payload in it) is
    /// discarded.
    ChildProcess { stderr: String },
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::HandlerSource(message)
            | RunnerError::Credentials(message)
            | RunnerError::Launch(message) => f.write_str(message),
            // the raw diagnostic text is the error, verbatim
            RunnerError::ChildProcess { stderr } => f.write_str(stderr),
        }
    }
}

impl std::error::Error for RunnerError {}

/// The local invocation harness for one handler function.
pub struct HandlerRunner {
    config: RunnerConfig,
    stager: ArtifactStager,
    launcher: ToolchainLauncher,
    credentials: CredentialCache,
    log_sink: Box<dyn LogSink>,
}

impl HandlerRunner {
    /// Wire the production dependencies: STS credentials, the system
    /// clock, and console diagnostics.
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_dependencies(
            config,
            Box::new(StsCredentialSource),
            Box::new(SystemClock),
            Box::new(ConsoleLogSink),
        )
    }

    pub fn with_dependencies(
        config: RunnerConfig,
        credential_source: Box<dyn CredentialSource>,
        clock: Box<dyn Clock>,
        log_sink: Box<dyn LogSink>,
    ) -> Self {
        let launcher = ToolchainLauncher::new(config.toolchain.clone());
        Self {
            stager: ArtifactStager::new(),
            launcher,
            credentials: CredentialCache::new(credential_source, clock),
            log_sink,
            config,
        }
    }

    /// Execute one invocation against the handler.
    ///
    /// The staged artifact is removed unconditionally once the child has
    /// terminated, before its output is inspected, so no invocation leaves
    /// a temp directory behind regardless of outcome.
    pub async fn run(
        &mut self,
        event: &InvocationEvent,
        context: &InvocationContext,
    ) -> Result<Option<ResultPayload>, RunnerError> {
        log_runner_info(
            "invocation_started",
            json!({
                "function_name": context.function_name,
                "handler": self.config.handler_path.display().to_string(),
            }),
        );

        let artifact = self
            .stager
            .stage(&self.config.handler_path)
            .await
            .map_err(RunnerError::HandlerSource)?;
        let toolchain_env = self
            .launcher
            .toolchain_env()
            .await
            .map_err(RunnerError::Launch)?;
        let credentials = self
            .credentials
            .get(&self.config.profile)
            .map_err(RunnerError::Credentials)?;

        let child_env = compose_child_env(
            &self.config.base_env,
            &toolchain_env,
            &credentials,
            &self.config.profile,
            context,
            event,
            std::env::var("PATH").ok().as_deref(),
        );

        let artifact_path = relative_to_cwd(&artifact.temp_file);
        let launch_result = self.launcher.run_artifact(&artifact_path, &child_env).await;

        // the artifact never outlives its invocation, whatever the outcome
        self.stager.cleanup().await;

        let output = launch_result.map_err(RunnerError::Launch)?;
        let payload = finish_invocation(output, context, self.log_sink.as_ref())?;

        Ok(payload)
    }

    /// Harness teardown: drop any cached credentials and remove any staged
    /// artifact. Safe to call repeatedly.
    pub async fn cleanup(&mut self) {
        self.credentials.clear();
        self.stager.cleanup().await;
    }
}

/// Judge the captured output: non-empty stderr is a hard failure that
/// discards stdout entirely; otherwise the stdout is demultiplexed and the
/// diagnostics forwarded to the sink as a single block.
fn finish_invocation(
    output: ProcessOutput,
    context: &InvocationContext,
    log_sink: &dyn LogSink,
) -> Result<Option<ResultPayload>, RunnerError> {
    if !output.stderr.is_empty() {
        log_runner_error(
            "invocation_failed",
            json!({
                "function_name": context.function_name,
                "stderr_bytes": output.stderr.len(),
            }),
        );
        return Err(RunnerError::ChildProcess {
            stderr: output.stderr,
        });
    }

    let split = split_result_payload(&output.stdout);
    log_sink.write_block(&split.diagnostics_block());

    log_runner_info(
        "invocation_completed",
        json!({
            "function_name": context.function_name,
            "payload_kind": match &split.payload {
                None => "none",
                Some(payload) if payload.is_error() => "error",
                Some(_) => "success",
            },
        }),
    );

    Ok(split.payload)
}
