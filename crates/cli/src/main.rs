//! Tasksmith CLI — the main entry point.
//!
//! ```text
//! tasksmith --request "Add a health endpoint" --dir ./service
//! tasksmith -d . -r "Fix the bug in the authentication system"
//! ```
//!
//! The agent explores the directory, prints a plan, then executes each
//! task in order and prints a summary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tasksmith_agent::Orchestrator;
use tasksmith_config::AppConfig;
use tasksmith_core::event::EventBus;
use tokio::sync::broadcast::error::RecvError;

mod render;

#[derive(Parser)]
#[command(
    name = "tasksmith",
    about = "Tasksmith — plans and executes code changes in a directory",
    version,
    author
)]
struct Cli {
    /// The task request for the agent
    #[arg(short, long)]
    request: String,

    /// Working directory for the agent
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Override the model from the config file
    #[arg(short, long, env = "TASKSMITH_MODEL")]
    model: Option<String>,

    /// Config file to load instead of ~/.tasksmith/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the run report
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load()?,
    };
    if let Some(model) = cli.model {
        config.model = model;
    }

    // Check for API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export ANTHROPIC_API_KEY=your-api-key");
        eprintln!("    export TASKSMITH_API_KEY=your-api-key");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = tasksmith_providers::build_from_config(&config)?;
    let event_bus = Arc::new(EventBus::default());

    let mut events = event_bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(text) = render::render(&event) {
                        println!("{text}");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Progress output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let outcome = Orchestrator::new(&config, provider, event_bus)
        .run(&cli.dir, &cli.request)
        .await;

    // The orchestrator held the last sender; wait for the printer to drain
    let _ = printer.await;

    match outcome {
        Ok(summary) => {
            println!("{}", render::banner("📊 Execution Summary"));
            println!("{summary}");
            Ok(())
        }
        Err(e) => {
            eprintln!("\n❌ Agent failed: {e}");
            Err(e.into())
        }
    }
}
