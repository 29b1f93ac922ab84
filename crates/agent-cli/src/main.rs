//! market-intel: run the market intelligence pipeline from the command line

mod render;

use agent_llm::providers::OpenAIProvider;
use agent_market::{MarketConfig, build_market_pipeline};
use agent_runtime::{ExecutorConfig, LlmExecutor, ScriptedExecutor};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use render::EventPrinter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "market-intel")]
#[command(about = "Multi-agent market intelligence pipeline", long_about = None)]
struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline for a query, streaming progress
    Run {
        /// What to analyse, e.g. "Analyze Apple (AAPL) and Tesla (TSLA)"
        query: String,

        /// Cancel the run after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Write the run summary as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report which provider credentials are configured
    Check,
    /// Print the pipeline's stages, agents, state keys and tools
    Plan,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.log_format {
        LogFormat::Text => agent_utils::init_tracing(),
        LogFormat::Json => agent_utils::init_tracing_json(),
    }

    match args.command {
        Command::Run {
            query,
            timeout,
            output,
        } => run(query, timeout, output).await,
        Command::Check => check(),
        Command::Plan => plan(),
    }
}

async fn run(query: String, timeout: Option<u64>, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = MarketConfig::from_env()?;
    config.validate()?;
    for missing in config.credential_report().missing_optional {
        warn!(env = missing.env, purpose = missing.purpose, "Optional credential not set");
    }

    let endpoint = config
        .model_endpoint()
        .context("model endpoint is not configured")?;
    let provider = OpenAIProvider::with_config(endpoint)?;
    let executor = LlmExecutor::new(
        Arc::new(provider),
        ExecutorConfig {
            model: config.model.clone(),
            ..ExecutorConfig::default()
        },
    );
    let pipeline = build_market_pipeline(&config, Arc::new(executor))?;
    let keys: Vec<String> = pipeline.output_keys().into_iter().map(String::from).collect();
    let runner = agent_workflow::Runner::new(pipeline);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling run");
                cancel.cancel();
            }
        }
    });
    if let Some(secs) = timeout {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(timeout_secs = secs, "Run timed out, cancelling");
            cancel.cancel();
        });
    }

    println!("Query: {query}");
    let (mut events, handle) = runner.run_streaming(query, cancel);
    let mut printer = EventPrinter::new();
    while let Some(event) = events.recv().await {
        printer.print(&event);
    }
    let session = handle.await.context("pipeline task panicked")?;

    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    for line in render::state_report(&session, &keys) {
        println!("{line}");
    }

    if let Some(path) = output {
        let summary = serde_json::to_string_pretty(&session.summary())?;
        std::fs::write(&path, summary)
            .with_context(|| format!("writing run summary to {}", path.display()))?;
        info!(path = %path.display(), "Run summary written");
    }

    if session.is_cancelled() {
        bail!("run cancelled before completion");
    }
    Ok(())
}

fn check() -> anyhow::Result<()> {
    let config = MarketConfig::from_env()?;
    let report = config.credential_report();

    for credential in &report.missing_required {
        println!("missing (required): {} - {}", credential.env, credential.purpose);
    }
    for credential in &report.missing_optional {
        println!("missing (optional): {} - {}", credential.env, credential.purpose);
    }
    if report.is_complete() {
        println!("All provider credentials are set");
    }

    if !report.is_ready() {
        bail!("required credentials are missing");
    }
    Ok(())
}

fn plan() -> anyhow::Result<()> {
    let config = MarketConfig::from_env()?;
    // The plan never invokes agents, so no model endpoint is needed
    let pipeline = build_market_pipeline(&config, Arc::new(ScriptedExecutor::new()))?;
    for line in render::plan_report(&pipeline.plan()) {
        println!("{line}");
    }
    Ok(())
}
