// # Transport Trait
//
// Defines the interface for carrying one DNS message to a nameserver and
// returning its answer.
//
// ## Implementations
//
// - UDP and TCP: `ddns-transport` crate
// - Scripted doubles: contract tests in `tests/common`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::{Error, TransportError};

/// Delivery mode for the update exchange
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Connection-oriented: one TCP connection per exchange
    Tcp,
    /// Connectionless: one UDP datagram each way
    #[default]
    Udp,
}

impl Protocol {
    /// Lowercase protocol name
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(Error::config(format!(
                "unsupported protocol '{}' (supported: tcp, udp)",
                s
            ))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for transport implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Open one socket or connection per call to the given server only
/// - ✅ Discard datagrams that do not answer the request
///
/// ## Forbidden Capabilities
/// - ❌ Retry, or fall back to another protocol (the caller decides)
/// - ❌ Keep connections between calls
/// - ❌ Inspect or rewrite message contents beyond framing
///
/// Waiting is bounded by the caller, which wraps every call in a timeout;
/// implementations must be cancellation-safe.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` to `server` and return the raw response
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<u8>)`: The response message, unparsed
    /// - `Err(TransportError)`: If the exchange failed at the socket level
    async fn exchange(&self, server: SocketAddr, request: &[u8])
    -> Result<Vec<u8>, TransportError>;

    /// The delivery mode this transport implements
    fn protocol(&self) -> Protocol;
}
