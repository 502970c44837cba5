//! Budget Guard CLI
//!
//! Runs the Pub/Sub push endpoint, or feeds a single budget alert through the
//! handler for manual testing.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use budget_guard::alerting::MessageHandler;
use budget_guard::api::HttpServer;
use budget_guard::billing::{BillingApi, CloudBillingClient};
use budget_guard::config::{LogFormat, LoggingConfig};
use budget_guard::models::Delivery;
use budget_guard::Config;

/// Budget Guard - detach billing when a budget alert reports runaway spend
#[derive(Parser)]
#[command(name = "budget-guard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "BUDGET_GUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Project id to guard (overrides configuration and GCLOUD_PROJECT)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Pub/Sub push endpoint
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Run one budget alert (raw JSON or push envelope) through the handler
    Evaluate {
        /// File containing the alert; stdin when omitted or "-"
        file: Option<PathBuf>,
    },

    /// Show the project's current billing info
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref(), cli.project.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging, cli.verbose) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Serve { host, port } => run_serve(config, host, port).await,
        Commands::Evaluate { file } => run_evaluate(&config, file, cli.format).await,
        Commands::Status => run_status(&config, cli.format).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let result = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(false)
            .with_env_filter(filter)
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

async fn run_serve(config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    info!(
        project = %config.project_name(),
        policy = ?config.policy.on_failure,
        "Starting budget guard on {}",
        addr
    );

    let handler = MessageHandler::from_config(&config)?;
    HttpServer::new(Arc::new(handler)).serve(&addr).await?;

    Ok(())
}

async fn run_evaluate(
    config: &Config,
    file: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let body = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let delivery = Delivery::from_body(&body).context("input is not a budget alert")?;
    let handler = MessageHandler::from_config(config)?;
    let outcome = handler.handle(&delivery.payload).await?;
    let outcome = outcome.map(|outcome| outcome.to_string());

    match format {
        OutputFormat::Text => match outcome {
            Some(outcome) => println!("{outcome}"),
            None => println!("Message was not processed; see logs"),
        },
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "outcome": outcome }));
        }
    }

    Ok(())
}

async fn run_status(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let client = CloudBillingClient::new(&config.billing)?;
    let info = client
        .get_project_billing_info(&config.project_name())
        .await
        .with_context(|| format!("failed to query billing for {}", config.project_name()))?;

    match format {
        OutputFormat::Text => {
            println!("Project:          {}", config.project_name());
            println!("Billing enabled:  {}", info.billing_enabled);
            println!(
                "Billing account:  {}",
                if info.billing_account_name.is_empty() {
                    "(none)"
                } else {
                    info.billing_account_name.as_str()
                }
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
