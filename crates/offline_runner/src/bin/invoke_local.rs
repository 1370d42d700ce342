//! Invoke one Go handler locally, the way the plugin host would.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use offline_core::contract::InvocationContext;
use offline_runner::launcher::ensure_mock_runtime;
use offline_runner::runner::{HandlerRunner, RunnerConfig};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "invoke_local",
    about = "Run a Go handler locally with a Lambda-shaped environment"
)]
struct Cli {
    /// Handler source location without its extension (e.g. functions/hello/main)
    #[arg(long)]
    handler: PathBuf,
    /// Named credential profile
    #[arg(long, env = "AWS_PROFILE", default_value = "default")]
    profile: String,
    /// Toolchain program used to stage and run the artifact
    #[arg(long, default_value = "go")]
    toolchain: String,
    /// Inline JSON event payload
    #[arg(long, conflicts_with = "event_file", default_value = "{}")]
    event: String,
    /// Read the JSON event payload from a file instead
    #[arg(long)]
    event_file: Option<PathBuf>,
    /// Simulated function name
    #[arg(long, default_value = "offline-function")]
    function_name: String,
    /// Simulated memory limit in MB
    #[arg(long, default_value_t = 128)]
    memory: u32,
    /// Simulated function version
    #[arg(long, default_value = "$LATEST")]
    function_version: String,
    /// Skip fetching the pinned mock runtime before invoking
    #[arg(long)]
    skip_runtime_fetch: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match invoke(cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

async fn invoke(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let event: Value = match &cli.event_file {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::from_str(&cli.event)?,
    };

    let context = InvocationContext {
        log_group_name: format!("/aws/lambda/{}", cli.function_name),
        log_stream_name: format!(
            "{}/[{}]local",
            chrono::Utc::now().format("%Y/%m/%d"),
            cli.function_version
        ),
        function_name: cli.function_name.clone(),
        memory_limit_in_mb: cli.memory,
        function_version: cli.function_version.clone(),
    };

    if !cli.skip_runtime_fetch {
        ensure_mock_runtime(&cli.toolchain)?;
    }

    let mut config = RunnerConfig::new(cli.handler);
    config.profile = cli.profile;
    config.toolchain = cli.toolchain;
    config.base_env = std::env::vars().collect();

    let mut runner = HandlerRunner::new(config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("invoking {}", cli.function_name));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = runner.run(&event, &context).await;
    spinner.finish_and_clear();
    runner.cleanup().await;

    match result? {
        Some(payload) => {
            let is_error = payload.is_error();
            println!("{}", serde_json::to_string_pretty(&payload.into_value())?);
            Ok(if is_error { 1 } else { 0 })
        }
        None => {
            eprintln!("invocation produced no result payload");
            Ok(0)
        }
    }
}
