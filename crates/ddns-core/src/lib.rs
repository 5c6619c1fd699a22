// # ddns-core
//
// Core library for the one-shot RFC 2136 dynamic DNS client.
//
// ## Architecture Overview
//
// This library provides the core functionality for signed dynamic DNS updates:
// - **InterfaceSource**: Trait for enumerating the host's interface addresses
// - **AddressResolver**: Picks the IPv4 address to publish
// - **Transport**: Trait for one request/response exchange with a nameserver
// - **UpdateEngine**: Builds, signs, sends and classifies one UPDATE
// - **DdnsClient**: Runs one resolve → update cycle for a validated config
//
// ## Design Principles
//
// 1. **Separation of Concerns**: OS enumeration and sockets live in their own crates
// 2. **One Shot**: Every run performs at most one update; no retries, no fallback
// 3. **Closed Variants**: Transports and outcomes are enums, not registries
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: Each update replaces the whole A RRset of the owner name

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod keyring;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use client::{CycleReport, DdnsClient};
pub use config::{DdnsConfig, LogLevel, TsigKeyConfig, ValidatedConfig};
pub use engine::{Rejection, UpdateEngine, UpdateOutcome, UpdateRequest};
pub use error::{Error, ResolveError, Result, TransportError};
pub use keyring::{AuthKey, Keyring};
pub use resolver::{AddressResolver, StaticInterfaceSource};
pub use traits::{InterfaceAddress, InterfaceSource, Protocol, Transport};
pub use domain::tsig::Algorithm;

/// An absolute domain name
pub type Name = domain::base::Dname<Vec<u8>>;
