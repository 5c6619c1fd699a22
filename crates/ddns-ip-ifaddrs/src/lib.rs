// # ifaddrs Interface Source
//
// This crate enumerates the host's interface addresses and exposes them
// through the `InterfaceSource` trait of ddns-core.
//
// ## Platform Support
//
// Enumeration goes through the `if-addrs` crate: getifaddrs(3) on Unix and
// GetAdaptersAddresses on Windows, so adapter names such as "Ethernet" or
// "WLAN" show up the same way "eth0" does on Linux.

use ddns_core::ResolveError;
use ddns_core::traits::{InterfaceAddress, InterfaceSource};
use tracing::trace;

/// Operating-system interface source
#[derive(Debug, Default, Clone, Copy)]
pub struct IfAddrsSource;

impl IfAddrsSource {
    pub fn new() -> Self {
        Self
    }
}

impl InterfaceSource for IfAddrsSource {
    fn addresses(&self) -> Result<Vec<InterfaceAddress>, ResolveError> {
        let interfaces = if_addrs::get_if_addrs()
            .map_err(|e| ResolveError::Enumeration(format!("{}: {}", self.source_name(), e)))?;

        let addresses = interfaces
            .into_iter()
            .map(|interface| {
                let address = interface.ip();
                trace!("{}: {}", interface.name, address);
                InterfaceAddress::new(interface.name, Some(address))
            })
            .collect();

        Ok(addresses)
    }

    fn source_name(&self) -> &'static str {
        "if-addrs"
    }
}
