//! `hackertarget` command-line entry point
//!
//! Runs a single query, a batch from a target file, or lists the tool table.
//! Logs go to stderr so stdout carries only results.

mod cli;
mod output;
mod targets;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, GlobalArgs};
use hackertarget_client::HackerTargetClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(global: &GlobalArgs) {
    let level = global.log_level().as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,hackertarget={level},hackertarget_client={level}"))
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(global.verbose),
        )
        .with(filter)
        .init();
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing up...");
            token.cancel();
        }
    });
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let global = cli.global;

    match cli.command {
        Command::Tools => {
            output::emit(&output::render_tools(), global.save.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Query { tool, target } => {
            let client = HackerTargetClient::new(global.client_config()?)?;
            tracing::info!("Running {} for: {target}", tool.display_name());

            let result = client.query(tool, &target).await;
            let text = output::render_query(&result, global.output)?;
            output::emit(&text, global.save.as_deref())?;

            if result.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                if let Some(error) = result.error() {
                    tracing::error!("Error: {error}");
                }
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Batch {
            file,
            tool,
            delay,
            stop_on_error,
        } => {
            let options = cli::batch_options(delay, stop_on_error)?;
            let client = HackerTargetClient::new(global.client_config()?)?;
            let targets = targets::read_targets(&file)?;

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());

            let report = client
                .batch_query_with(tool, &targets, options, &cancel, |item| {
                    if let Some(error) = item.error() {
                        tracing::warn!("{}: {error}", item.target());
                    }
                })
                .await?;

            let text = output::render_batch(&report, global.output)?;
            output::emit(&text, global.save.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
