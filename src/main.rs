use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use switchbridge::{Config, Engine, LogStateWriter};

/// Switchbridge - cloud synchronization bridge for SwitchBot smart devices
#[derive(Parser)]
#[command(name = "switchbridge", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SWITCHBRIDGE_CONFIG", default_value = "switchbridge.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the synchronization engine until interrupted (default)
    Run,
    /// Discover devices once and print the registry snapshot
    Devices,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,switchbridge=info",
        1 => "info,switchbridge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_file(&cli.config)?;
    let engine = Arc::new(Engine::new(config, Arc::new(LogStateWriter))?);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_engine(&engine).await,
        Command::Devices => list_devices(&engine).await,
    }
}

/// Run the engine until ctrl-c
async fn run_engine(engine: &Arc<Engine>) -> anyhow::Result<()> {
    let runner = {
        let engine = Arc::clone(engine);
        tokio::spawn(async move { engine.run().await })
    };

    tokio::select! {
        result = runner => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received");
            engine.shutdown();
        }
    }

    Ok(())
}

/// One-shot discovery listing
async fn list_devices(engine: &Arc<Engine>) -> anyhow::Result<()> {
    let count = engine.discover().await?;
    tracing::info!(devices = count, "discovery complete");

    for device in engine.registry().snapshot() {
        println!(
            "{}  {}  [{}]",
            device.id, device.name, device.device_type
        );
    }

    Ok(())
}
