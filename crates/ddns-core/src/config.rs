//! Configuration types for the DDNS client
//!
//! [`DdnsConfig`] is the raw, serde-friendly shape read from the TOML file
//! and overlaid with command-line values. [`DdnsConfig::validate`] turns it
//! into a [`ValidatedConfig`], which is immutable and is what the core
//! operates on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::Name;
use crate::engine::MAX_TTL;
use crate::error::{Error, Result};
use crate::keyring::{AuthKey, Keyring};
use crate::traits::Protocol;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DdnsConfig {
    /// Nameserver to send the update to
    pub name_server: Option<IpAddr>,

    /// Nameserver port
    pub port: u16,

    /// Zone to update (e.g., "example.com")
    pub zone: Option<String>,

    /// Host name, relative to the zone unless it ends with '.'
    pub hostname: Option<String>,

    /// TTL of the published record (in seconds)
    pub ttl: u32,

    /// Response timeout (in seconds)
    pub timeout: u64,

    /// Transport protocol
    pub protocol: Protocol,

    /// Interface to take the address from; heuristic when unset
    pub interface: Option<String>,

    /// Log verbosity
    pub log_level: LogLevel,

    /// Log file, appended to on every run
    pub log_file: String,

    /// Name of the key to sign with
    pub key_name: Option<String>,

    /// TSIG keys
    pub tsig: Vec<TsigKeyConfig>,
}

impl DdnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            name_server: None,
            port: default_port(),
            zone: None,
            hostname: None,
            ttl: default_ttl(),
            timeout: default_timeout_secs(),
            protocol: Protocol::default(),
            interface: None,
            log_level: LogLevel::default(),
            log_file: default_log_file(),
            key_name: None,
            tsig: Vec::new(),
        }
    }

    /// Validate the configuration
    ///
    /// Checks every precondition of an update run: nameserver, zone,
    /// hostname and at least one key must be present, TTL and timeout must
    /// be positive, every key must decode and the owner name must be
    /// derivable from hostname and zone.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        let name_server = self
            .name_server
            .ok_or_else(|| Error::config("name_server is not configured"))?;

        let zone_text = non_empty(self.zone.as_deref())
            .ok_or_else(|| Error::config("zone is not configured"))?;
        let zone = parse_name(&normalize_zone(zone_text))?;
        if zone.is_root() {
            return Err(Error::config("zone must not be the root"));
        }

        let hostname = non_empty(self.hostname.as_deref())
            .ok_or_else(|| Error::config("hostname is not configured"))?
            .to_string();
        let owner = owner_name(&hostname, &zone)?;

        if self.ttl == 0 {
            return Err(Error::config("ttl must be greater than 0"));
        }
        if self.ttl > MAX_TTL {
            return Err(Error::config(format!("ttl must not exceed {}", MAX_TTL)));
        }
        if self.timeout == 0 {
            return Err(Error::config("timeout must be greater than 0"));
        }

        if self.tsig.is_empty() {
            return Err(Error::config("no TSIG keys are configured"));
        }
        let keys = self
            .tsig
            .iter()
            .map(TsigKeyConfig::to_auth_key)
            .collect::<Result<Vec<_>>>()?;
        let keyring = Keyring::new(keys)?;

        let key_name = match non_empty(self.key_name.as_deref()) {
            Some(name) => Some(parse_name(name)?),
            None => None,
        };
        // Fail now rather than after the address is resolved.
        keyring.select(key_name.as_ref(), &zone)?;

        Ok(ValidatedConfig {
            server: SocketAddr::new(name_server, self.port),
            zone,
            owner,
            hostname,
            ttl: self.ttl,
            timeout: Duration::from_secs(self.timeout),
            protocol: self.protocol,
            interface: non_empty(self.interface.as_deref()).map(str::to_string),
            keyring,
            key_name,
        })
    }
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One TSIG key as written in the configuration file
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TsigKeyConfig {
    /// Key name (e.g., "ddns-key")
    pub name: String,

    /// HMAC algorithm name
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Base64-encoded shared secret
    pub secret: String,
}

impl TsigKeyConfig {
    /// Create a key configuration
    pub fn new(name: impl Into<String>, algorithm: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            algorithm: algorithm.into(),
            secret: secret.into(),
        }
    }

    /// Decode into a usable key
    pub fn to_auth_key(&self) -> Result<AuthKey> {
        AuthKey::new(&self.name, &self.algorithm, &self.secret)
    }
}

impl fmt::Debug for TsigKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsigKeyConfig")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The matching tracing level
    pub fn as_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::config(format!("unknown log level '{}'", other))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration after validation
///
/// Every field is checked and normalized; the core never re-validates it.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// Nameserver socket address
    pub server: SocketAddr,

    /// Zone, absolute
    pub zone: Name,

    /// Owner name of the A record, absolute
    pub owner: Name,

    /// Hostname as configured, for log lines
    pub hostname: String,

    pub ttl: u32,

    pub timeout: Duration,

    pub protocol: Protocol,

    pub interface: Option<String>,

    pub keyring: Keyring,

    /// Explicit key selection, if any
    pub key_name: Option<Name>,
}

impl ValidatedConfig {
    /// The key that signs updates
    pub fn signing_key(&self) -> Result<&AuthKey> {
        self.keyring.select(self.key_name.as_ref(), &self.zone)
    }
}

/// Append the trailing dot to a zone name if it is missing
pub fn normalize_zone(zone: &str) -> String {
    let zone = zone.trim();
    if zone.ends_with('.') {
        zone.to_string()
    } else {
        format!("{}.", zone)
    }
}

/// Parse a domain name; a missing trailing dot is implied
pub fn parse_name(text: &str) -> Result<Name> {
    let text = text.trim();
    Name::from_str(text).map_err(|e| Error::invalid_name(format!("'{}': {}", text, e)))
}

/// Join a hostname to its zone
///
/// `@` names the zone apex and a hostname ending in '.' is already absolute.
pub fn owner_name(hostname: &str, zone: &Name) -> Result<Name> {
    let hostname = hostname.trim();
    if hostname == "@" {
        return Ok(zone.clone());
    }
    if hostname.ends_with('.') {
        return parse_name(hostname);
    }
    parse_name(&format!("{}.{}", hostname, zone))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn default_port() -> u16 {
    53
}

fn default_ttl() -> u32 {
    300
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_log_file() -> String {
    "ddns.log".to_string()
}

fn default_algorithm() -> String {
    "hmac-sha256".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Algorithm;
    use domain::base::ToDname;

    const SECRET: &str = "c2VjcmV0LWtleS1tYXRlcmlhbA==";

    fn name(text: &str) -> Name {
        parse_name(text).unwrap()
    }

    fn minimal() -> DdnsConfig {
        let mut config = DdnsConfig::new();
        config.name_server = Some("192.0.2.53".parse().unwrap());
        config.zone = Some("example.com".to_string());
        config.hostname = Some("host".to_string());
        config.tsig = vec![TsigKeyConfig::new("ddns-key", "hmac-sha256", SECRET)];
        config
    }

    #[test]
    fn defaults() {
        let config = DdnsConfig::default();
        assert_eq!(config.port, 53);
        assert_eq!(config.ttl, 300);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.protocol, Protocol::Udp);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_file, "ddns.log");
    }

    #[test]
    fn parses_toml_file() {
        let config: DdnsConfig = toml::from_str(
            r#"
            name_server = "192.0.2.53"
            port = 5353
            zone = "example.com."
            hostname = "host"
            ttl = 60
            protocol = "tcp"
            log_level = "debug"

            [[tsig]]
            name = "ddns-key"
            secret = "c2VjcmV0LWtleS1tYXRlcmlhbA=="

            [[tsig]]
            name = "other"
            algorithm = "hmac-sha512"
            secret = "c2VjcmV0LWtleS1tYXRlcmlhbA=="
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 5353);
        assert_eq!(config.protocol, Protocol::Tcp);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.tsig.len(), 2);
        assert_eq!(config.tsig[0].algorithm, "hmac-sha256");

        let validated = config.validate().unwrap();
        assert_eq!(validated.server, "192.0.2.53:5353".parse().unwrap());
        assert_eq!(validated.keyring.len(), 2);
        assert_eq!(validated.signing_key().unwrap().algorithm(), Algorithm::Sha256);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(toml::from_str::<DdnsConfig>("nameserver = \"192.0.2.1\"").is_err());
    }

    #[test]
    fn validate_normalizes_zone_and_owner() {
        let validated = minimal().validate().unwrap();
        assert_eq!(normalize_zone(" example.com "), "example.com.");
        assert_eq!(validated.zone, name("example.com."));
        assert_eq!(validated.owner, name("host.example.com."));
        assert_eq!(validated.hostname, "host");
        assert_eq!(validated.timeout, Duration::from_secs(5));

        let mut absolute = minimal();
        absolute.hostname = Some("www.example.com.".to_string());
        assert_eq!(absolute.validate().unwrap().owner, name("www.example.com."));

        let mut apex = minimal();
        apex.hostname = Some("@".to_string());
        assert_eq!(apex.validate().unwrap().owner, name("example.com."));

        let mut bad = minimal();
        bad.hostname = Some("x".repeat(64));
        assert!(matches!(bad.validate(), Err(Error::InvalidName(_))));
    }

    #[test]
    fn validate_requires_preconditions() {
        let mut config = minimal();
        config.name_server = None;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.zone = Some("  ".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.hostname = None;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.tsig.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.ttl = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.ttl = MAX_TTL + 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = minimal();
        config.ttl = MAX_TTL;
        assert_eq!(config.validate().unwrap().ttl, MAX_TTL);

        let mut config = minimal();
        config.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_keys() {
        let mut config = minimal();
        config.tsig[0].secret = "not base64!".to_string();
        assert!(matches!(config.validate(), Err(Error::Key(_))));

        let mut config = minimal();
        config.tsig[0].algorithm = "hmac-md5".to_string();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.tsig.push(TsigKeyConfig::new("DDNS-KEY.", "hmac-sha384", SECRET));
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.key_name = Some("missing".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_key_name_wins() {
        let mut config = minimal();
        config.tsig.push(TsigKeyConfig::new("example.com", "hmac-sha512", SECRET));
        let validated = config.validate().unwrap();
        assert!(validated.signing_key().unwrap().name().name_eq(&name("example.com")));

        config.key_name = Some("ddns-key".to_string());
        let validated = config.validate().unwrap();
        assert!(validated.signing_key().unwrap().name().name_eq(&name("ddns-key")));
    }

    #[test]
    fn secret_is_not_debug_printed() {
        let key = TsigKeyConfig::new("k", "hmac-sha256", SECRET);
        assert!(!format!("{:?}", key).contains(SECRET));
    }

    #[test]
    fn log_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Info.as_level(), tracing::Level::INFO);
    }
}
