//! Command-line arguments and configuration loading
//!
//! Values are layered, highest precedence first: command-line flags (each
//! also readable from a `DDNS_*` environment variable), the TOML file,
//! then built-in defaults.

use anyhow::{Context, Result, bail};
use clap::Parser;
use ddns_core::{DdnsConfig, LogLevel, Protocol, TsigKeyConfig};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Publish this host's IPv4 address with a TSIG-signed DNS UPDATE
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML configuration file [default: config.toml, if present]
    #[arg(long, short, env = "DDNS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Nameserver address
    #[arg(long, env = "DDNS_NAME_SERVER")]
    pub name_server: Option<IpAddr>,

    /// Nameserver port
    #[arg(long, env = "DDNS_PORT")]
    pub port: Option<u16>,

    /// Zone to update
    #[arg(long, short, env = "DDNS_ZONE")]
    pub zone: Option<String>,

    /// Host name, relative to the zone unless it ends with '.'
    #[arg(long = "hostname", short = 'H', env = "DDNS_HOSTNAME")]
    pub hostname: Option<String>,

    /// Record TTL in seconds
    #[arg(long, env = "DDNS_TTL")]
    pub ttl: Option<u32>,

    /// Response timeout in seconds
    #[arg(long, env = "DDNS_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Transport protocol (udp or tcp)
    #[arg(long, short, env = "DDNS_PROTOCOL")]
    pub protocol: Option<Protocol>,

    /// Interface to take the address from
    #[arg(long, short, env = "DDNS_INTERFACE")]
    pub interface: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DDNS_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log file, appended to
    #[arg(long, env = "DDNS_LOG_FILE")]
    pub log_file: Option<String>,

    /// Name of the configured key to sign with
    #[arg(long, env = "DDNS_KEY_NAME")]
    pub key_name: Option<String>,

    /// Name of an additional TSIG key
    #[arg(long, env = "DDNS_TSIG_NAME", requires = "tsig_secret")]
    pub tsig_name: Option<String>,

    /// Algorithm of the additional TSIG key
    #[arg(long, env = "DDNS_TSIG_ALGORITHM", default_value = "hmac-sha256")]
    pub tsig_algorithm: String,

    /// Base64 secret of the additional TSIG key
    #[arg(long, env = "DDNS_TSIG_SECRET", hide_env_values = true, requires = "tsig_name")]
    pub tsig_secret: Option<String>,
}

impl Args {
    /// Overlay every value given on the command line onto `config`
    pub fn apply(&self, config: &mut DdnsConfig) {
        if let Some(name_server) = self.name_server {
            config.name_server = Some(name_server);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(zone) = &self.zone {
            config.zone = Some(zone.clone());
        }
        if let Some(hostname) = &self.hostname {
            config.hostname = Some(hostname.clone());
        }
        if let Some(ttl) = self.ttl {
            config.ttl = ttl;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(interface) = &self.interface {
            config.interface = Some(interface.clone());
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        if let Some(key_name) = &self.key_name {
            config.key_name = Some(key_name.clone());
        }
        if let (Some(name), Some(secret)) = (&self.tsig_name, &self.tsig_secret) {
            config
                .tsig
                .push(TsigKeyConfig::new(name.clone(), self.tsig_algorithm.clone(), secret.clone()));
        }
    }
}

/// Build the effective configuration from the file and the arguments
///
/// An explicitly named file must exist; the default file is optional.
pub fn load_config(args: &Args) -> Result<DdnsConfig> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                read_config_file(path)?
            } else {
                DdnsConfig::default()
            }
        }
    };
    args.apply(&mut config);
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<DdnsConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read configuration file {}", path.display()))?;
    let config: DdnsConfig = toml::from_str(&text)
        .with_context(|| format!("invalid configuration file {}", path.display()))?;
    if config.tsig.iter().any(|k| k.secret.trim().is_empty()) {
        bail!("configuration file {} has a TSIG key without a secret", path.display());
    }
    Ok(config)
}
