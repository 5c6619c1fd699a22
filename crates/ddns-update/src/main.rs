// # ddns-update - one-shot DDNS client
//
// This binary is a THIN integration layer: it reads configuration, sets up
// logging and the runtime, wires the OS interface source and the selected
// transport into ddns-core, and runs exactly one update cycle.
//
// All DNS logic lives in ddns-core. Scheduling repeated runs is the job of
// cron or a systemd timer.
//
// ## Configuration
//
// Settings come from the TOML file (`--config`, default `config.toml`) and
// can be overridden by flags or `DDNS_*` environment variables:
//
// - `DDNS_NAME_SERVER`, `DDNS_PORT`: Nameserver address and port
// - `DDNS_ZONE`, `DDNS_HOSTNAME`: Zone and host name to update
// - `DDNS_TTL`, `DDNS_TIMEOUT`, `DDNS_PROTOCOL`: Record TTL, response timeout, udp/tcp
// - `DDNS_INTERFACE`: Interface to take the address from
// - `DDNS_LOG_LEVEL`, `DDNS_LOG_FILE`: Logging
// - `DDNS_KEY_NAME`: Key to sign with
// - `DDNS_TSIG_NAME`, `DDNS_TSIG_ALGORITHM`, `DDNS_TSIG_SECRET`: One extra key
//
// ## Example
//
// ```bash
// export DDNS_TSIG_SECRET=c2VjcmV0LWtleS1tYXRlcmlhbA==
// ddns-update --name-server 192.0.2.53 --zone example.com --hostname host \
//     --tsig-name ddns-key
// ```

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use ddns_core::{AddressResolver, DdnsClient, DdnsConfig, UpdateEngine, ValidatedConfig};
use ddns_ip_ifaddrs::IfAddrsSource;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use crate::cli::Args;

/// Exit codes for different termination scenarios
///
/// - 0: The update was accepted
/// - 1: Configuration, key or address resolution failure; nothing was sent
/// - 2: The update was rejected or the exchange failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Update accepted
    Success = 0,
    /// Precondition failed before any network I/O
    PreconditionFailed = 1,
    /// Update rejected or transport failure
    UpdateFailed = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match cli::load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::PreconditionFailed.into();
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return DdnsExitCode::PreconditionFailed.into();
    }

    let validated = match config.validate() {
        Ok(validated) => validated,
        Err(e) => {
            error!("Configuration validation error: {}", e);
            return DdnsExitCode::PreconditionFailed.into();
        }
    };
    debug!("Configuration loaded: {:?}", validated);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::PreconditionFailed.into();
        }
    };

    rt.block_on(run_once(validated)).into()
}

/// Install stdout and log-file layers filtered by the configured level
fn init_logging(config: &DdnsConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file))?;

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(config.log_level.as_level()))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("tracing subscriber already set")?;
    Ok(())
}

/// Run one cycle and map its result to an exit code
async fn run_once(config: ValidatedConfig) -> DdnsExitCode {
    let engine = UpdateEngine::new(
        ddns_transport::for_protocol(config.protocol),
        config.server,
        config.timeout,
    );
    let resolver = AddressResolver::new(Box::new(IfAddrsSource::new()));
    let client = DdnsClient::new(resolver, engine, config);

    match client.run_once().await {
        Ok(report) if report.outcome.is_success() => DdnsExitCode::Success,
        Ok(_) => DdnsExitCode::UpdateFailed,
        // Already logged by the client.
        Err(_) => DdnsExitCode::PreconditionFailed,
    }
}
