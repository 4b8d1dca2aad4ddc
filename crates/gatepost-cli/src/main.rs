//! gatepost - access-control terminal
//!
//! Reads contactless tags and fingerprints, asks the access authority for a
//! decision and pulses the gate relay.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gatepost_biometric::R30x;
use gatepost_cli::gpio::SYSFS_GPIO_BASE;
use gatepost_cli::{
    Config, ConsoleDisplay, SysfsButton, SysfsRelay, provision_identity, read_identity,
};
use gatepost_network::HttpReporter;
use gatepost_rfid::SerialTagReader;
use gatepost_terminal::{Devices, Pipeline};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gatepost", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "gatepost.toml")]
    config: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the terminal (default)
    Run,

    /// Write the device identity file
    Provision {
        /// Identity to store; a random UUID when omitted
        #[arg(long)]
        id: Option<String>,

        /// Replace an existing identity
        #[arg(long)]
        force: bool,
    },

    /// Print the provisioned device identity
    Identity,
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Provision { id, force } => {
            let identity =
                provision_identity(&config.terminal.identity_file, id.as_deref(), force)?;
            println!("{identity}");
            Ok(())
        }
        Command::Identity => {
            let identity = read_identity(&config.terminal.identity_file)?;
            println!("{identity}");
            Ok(())
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let identity = read_identity(&config.terminal.identity_file)
        .context("device identity not provisioned (run `gatepost provision`)")?;
    info!(
        device = %identity,
        tag_reader = %config.tag_reader.port,
        fingerprint = %config.fingerprint.port,
        report_url = %config.report.url,
        relay_gpio = config.relay.gpio,
        "gatepost starting"
    );

    let tags = SerialTagReader::open(&config.tag_reader_config()).context("opening tag reader")?;

    let mut sensor = R30x::open(
        &config.fingerprint.port,
        config.fingerprint.baud_rate,
        config.r30x_config(),
    )
    .context("opening fingerprint sensor")?;
    sensor
        .handshake()
        .await
        .context("fingerprint sensor handshake")?;
    match sensor.template_count().await {
        Ok(count) => info!(templates = count, "Fingerprint library loaded"),
        Err(e) => warn!(error = %e, "Could not read fingerprint library size"),
    }

    let relay = SysfsRelay::open(SYSFS_GPIO_BASE, config.relay.gpio, config.relay.active_low)
        .await
        .context("opening gate relay")?;

    let button = match &config.button {
        Some(button) => Some(
            SysfsButton::open(SYSFS_GPIO_BASE, button.gpio, button.active_low)
                .await
                .context("opening exit button")?,
        ),
        None => None,
    };

    let reporter = HttpReporter::new(config.reporter_config()).context("building HTTP client")?;

    let devices = Devices {
        tags,
        sensor,
        relay,
        display: ConsoleDisplay::new(),
        reporter,
    };
    let mut pipeline = Pipeline::new(devices, identity, config.pipeline_config());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
    };

    pipeline.run(button, config.tick_interval(), shutdown).await;
    Ok(())
}
