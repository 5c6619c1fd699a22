// # Interface Source Trait
//
// Defines the interface for enumerating the host's network interface
// addresses.
//
// ## Implementations
//
// - Operating-system enumeration (Unix and Windows): `ddns-ip-ifaddrs` crate
// - Fixed lists for tests and embedding: `resolver::StaticInterfaceSource`

use std::net::{IpAddr, Ipv4Addr};

use crate::error::ResolveError;

/// One address assignment reported by the operating system
///
/// Interfaces without an IP address still appear, with `address` set to
/// `None`, so that an existing interface can be told apart from a missing
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface name as reported by the OS (e.g. "eth0", "WLAN")
    pub interface: String,
    /// The assigned address, if any
    pub address: Option<IpAddr>,
}

impl InterfaceAddress {
    /// Create a new interface address entry
    pub fn new(interface: impl Into<String>, address: Option<IpAddr>) -> Self {
        Self {
            interface: interface.into(),
            address,
        }
    }

    /// The IPv4 address, if this entry carries one
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self.address {
            Some(IpAddr::V4(v4)) => Some(v4),
            _ => None,
        }
    }

    /// Whether the address is in 127.0.0.0/8
    pub fn is_loopback(&self) -> bool {
        self.ipv4().is_some_and(|a| a.is_loopback())
    }

    /// Whether the address is in 169.254.0.0/16
    pub fn is_link_local(&self) -> bool {
        self.ipv4().is_some_and(|a| a.is_link_local())
    }

    /// Whether the address is in a reserved range: 240.0.0.0/4 (which
    /// includes the limited broadcast address) or 0.0.0.0/8
    pub fn is_reserved(&self) -> bool {
        self.ipv4().is_some_and(|a| {
            let first = a.octets()[0];
            first >= 240 || first == 0
        })
    }

    /// The IPv4 address if it may be published in an A record
    pub fn usable_ipv4(&self) -> Option<Ipv4Addr> {
        if self.is_loopback() || self.is_link_local() || self.is_reserved() {
            return None;
        }
        self.ipv4()
    }
}

/// Trait for interface enumeration
///
/// Every call takes a fresh, uncached snapshot. The order of the returned
/// entries is whatever the platform reports, and it matters: the resolver's
/// heuristic picks the first matching interface.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform read-only platform I/O (getifaddrs, GetAdaptersAddresses)
///
/// ## Forbidden Capabilities
/// - ❌ Filter or reorder addresses (owned by `AddressResolver`)
/// - ❌ Cache results between calls
pub trait InterfaceSource: Send + Sync {
    /// Enumerate all interface addresses
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<InterfaceAddress>)`: One entry per address, in OS order
    /// - `Err(ResolveError::Enumeration)`: If the OS call failed
    fn addresses(&self) -> Result<Vec<InterfaceAddress>, ResolveError>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
