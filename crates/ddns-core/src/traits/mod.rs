//! Core traits for the DDNS client
//!
//! This module defines the seams between the core and the outside world.
//!
//! - [`InterfaceSource`]: Enumerate the host's interface addresses
//! - [`Transport`]: Carry one DNS message to the nameserver and back

pub mod interface_source;
pub mod transport;

pub use interface_source::{InterfaceAddress, InterfaceSource};
pub use transport::{Protocol, Transport};
