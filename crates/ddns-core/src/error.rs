//! Error types for the DDNS client
//!
//! This module defines the error taxonomy used throughout the crate:
//! - [`Error`]: precondition and input errors that abort a run before any
//!   network I/O is attempted
//! - [`ResolveError`]: failures to pick the address to publish
//! - [`TransportError`]: the update exchange could not complete or could not
//!   be trusted
//!
//! Rejections by the nameserver are not errors; they are reported through
//! [`UpdateOutcome`](crate::engine::UpdateOutcome).

use std::time::Duration;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain name syntax errors
    #[error("Invalid domain name: {0}")]
    InvalidName(String),

    /// TSIG key errors
    #[error("TSIG key error: {0}")]
    Key(String),

    /// Address resolution errors
    #[error("Address resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid name error
    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    /// Create a TSIG key error
    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Failures of the address resolver
///
/// Every variant is terminal for the run: the caller aborts without
/// attempting an update.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The explicitly requested interface does not exist
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    /// No interface name matched the preference list
    #[error("no interface matches the preferred names ({0})")]
    NoPreferredInterface(String),

    /// The chosen interface has no publishable IPv4 address
    #[error("no usable IPv4 address on interface {0}")]
    NoUsableAddress(String),

    /// The operating system could not enumerate interfaces
    #[error("interface enumeration failed: {0}")]
    Enumeration(String),
}

/// Failures of the update exchange itself
///
/// These are distinct from a server rejecting the update: they mean either
/// that no response arrived or that the response cannot be trusted.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No response within the configured timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Socket-level failure (connection refused, reset, ...)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The response had the TC bit set
    #[error("response truncated")]
    Truncated,

    /// The response does not answer our request
    #[error("response ID {got:#06x} does not match request ID {expected:#06x}")]
    IdMismatch {
        /// ID of the request
        expected: u16,
        /// ID found in the response
        got: u16,
    },

    /// The response signature is missing or invalid
    #[error("TSIG verification failed: {0}")]
    Verification(String),
}

impl TransportError {
    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a verification error
    pub fn verification(msg: impl Into<String>) -> Self {
        Self::Verification(msg.into())
    }

    /// Short machine-readable category name, used in outcome reports
    pub fn category(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Io(_) => "io",
            TransportError::Malformed(_) => "malformed",
            TransportError::Truncated => "truncated",
            TransportError::IdMismatch { .. } => "id-mismatch",
            TransportError::Verification(_) => "verification",
        }
    }
}
