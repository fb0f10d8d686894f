//! taskgen CLI entry point.
//!
//! This binary is the composition root. It loads configuration from the
//! environment (and `.env`), wires JSON logging with optional OTLP export,
//! builds the OpenAI-compatible provider and the JSON file store, and hands
//! both to the [`nodes::Orchestrator`].
//!
//! Every command prints a single JSON document on stdout: the success body, or
//! `{ "error": ..., "reason"?: ... }` when the pipeline refuses or fails. The
//! process exits with status 1 in the latter case.

mod commands;
mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use llm::OpenAiCompatibleProvider;
use nodes::Orchestrator;
use pipeline::PipelineError;
use serde::Serialize;
use store::JsonFileStore;
use tracing::info;

use crate::commands::{Cli, Command};
use crate::config::AppConfig;
use crate::telemetry::Telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let telemetry = Telemetry::init(config.otlp_endpoint.as_deref())?;

    let result = run(cli.command, &config).await;
    telemetry.shutdown();
    result
}

async fn run(command: Command, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let provider = OpenAiCompatibleProvider::new(config.provider.clone())
        .context("failed to build language-model client")?;
    info!(
        model = provider.model(),
        store = %config.store_path.display(),
        "pipeline ready"
    );
    let orchestrator = Orchestrator::new(
        Arc::new(provider),
        Arc::new(JsonFileStore::new(config.store_path.clone())),
        config.pipeline_settings(),
    );

    match command {
        Command::Basic(args) => respond(orchestrator.generate_basic(args.into_request()?).await),
        Command::Advanced(args) => {
            respond(orchestrator.generate_advanced(args.into_request()?).await)
        }
        Command::Questions(args) => respond(orchestrator.questions(args.into_request()?).await),
        Command::Usage(user) => respond(orchestrator.usage_stats(&user.user_id()?).await),
        Command::SetCreativity { user, value } => respond(
            orchestrator
                .set_creativity(&user.user_id()?, value)
                .await
                .map(|creativity| serde_json::json!({ "success": true, "creativity": creativity })),
        ),
        Command::Logs(user) => respond(orchestrator.audit_log(&user.user_id()?).await),
    }
}

/// Prints the response body and maps the outcome to an exit status.
fn respond<T: Serialize>(outcome: Result<T, PipelineError>) -> anyhow::Result<ExitCode> {
    let (body, code) = match outcome {
        Ok(value) => (serde_json::to_string_pretty(&value)?, ExitCode::SUCCESS),
        Err(e) => (serde_json::to_string_pretty(&e.to_body())?, ExitCode::FAILURE),
    };
    println!("{body}");
    Ok(code)
}
