//! Address resolver
//!
//! Picks the IPv4 address to publish from the host's interfaces.
//!
//! ## Selection
//!
//! 1. With an explicit interface name, that exact interface is used; if the
//!    enumeration does not contain it, resolution fails with
//!    [`ResolveError::InterfaceNotFound`]. There is no fallback.
//! 2. Without one, the first interface in enumeration order whose name
//!    case-insensitively equals an entry of [`PREFERRED_INTERFACES`] is used.
//! 3. On the chosen interface, the first IPv4 address that is not loopback,
//!    link-local or reserved wins.
//!
//! The heuristic in step 2 depends on the platform's enumeration order,
//! which is unspecified. When several interfaces match, the first one
//! encountered wins.

use std::net::Ipv4Addr;
use tracing::debug;

use crate::error::ResolveError;
use crate::traits::{InterfaceAddress, InterfaceSource};

/// Interface names tried when none is configured
///
/// Covers the default wireless and wired adapter names on Windows
/// (including the localized Chinese "Ethernet"), Linux and macOS.
pub const PREFERRED_INTERFACES: &[&str] = &["wlan", "以太网", "ethernet", "eth0", "wlan0", "en0"];

/// Resolves the address to publish from an [`InterfaceSource`]
pub struct AddressResolver {
    source: Box<dyn InterfaceSource>,
}

impl AddressResolver {
    /// Create a resolver over the given interface source
    pub fn new(source: Box<dyn InterfaceSource>) -> Self {
        Self { source }
    }

    /// Resolve the IPv4 address to publish
    ///
    /// # Parameters
    ///
    /// - `interface`: Exact interface name, or `None` for the heuristic
    pub fn resolve(&self, interface: Option<&str>) -> Result<Ipv4Addr, ResolveError> {
        let addresses = self.source.addresses()?;
        debug!(
            "{} reported {} interface address(es)",
            self.source.source_name(),
            addresses.len()
        );
        select_address(&addresses, interface)
    }
}

/// Apply the selection policy to an enumeration snapshot
pub fn select_address(
    addresses: &[InterfaceAddress],
    interface: Option<&str>,
) -> Result<Ipv4Addr, ResolveError> {
    let chosen = match interface {
        Some(name) => addresses
            .iter()
            .find(|a| a.interface == name)
            .map(|a| a.interface.as_str())
            .ok_or_else(|| ResolveError::InterfaceNotFound(name.to_string()))?,
        None => addresses
            .iter()
            .map(|a| a.interface.as_str())
            .find(|name| is_preferred(name))
            .ok_or_else(|| ResolveError::NoPreferredInterface(PREFERRED_INTERFACES.join(", ")))?,
    };
    debug!("Selected interface {}", chosen);

    addresses
        .iter()
        .filter(|a| a.interface == chosen)
        .find_map(InterfaceAddress::usable_ipv4)
        .ok_or_else(|| ResolveError::NoUsableAddress(chosen.to_string()))
}

fn is_preferred(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_INTERFACES.iter().any(|p| *p == lower)
}

/// An [`InterfaceSource`] over a fixed list
///
/// Platform enumeration order is not deterministic across systems, so the
/// heuristic path is exercised with injected lists like this one.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaceSource {
    addresses: Vec<InterfaceAddress>,
}

impl StaticInterfaceSource {
    /// Create a source that always reports `addresses`, in order
    pub fn new(addresses: Vec<InterfaceAddress>) -> Self {
        Self { addresses }
    }
}

impl InterfaceSource for StaticInterfaceSource {
    fn addresses(&self) -> Result<Vec<InterfaceAddress>, ResolveError> {
        Ok(self.addresses.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}
