// # DNS Transports
//
// This crate provides the two `Transport` implementations the DDNS client
// can send an UPDATE over:
//
// - **UdpTransport**: one datagram out, first matching datagram back
// - **TcpTransport**: one connection per exchange, 2-byte length framing
//   ([RFC 1035 § 4.2.2])
//
// Neither transport enforces a timeout or retries; the update engine
// bounds each exchange and decides what a failure means. A truncated UDP
// response is handed back as-is and is not retried over TCP.
//
// [RFC 1035 § 4.2.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.2

mod tcp;
mod udp;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use ddns_core::traits::{Protocol, Transport};

/// Largest DNS message either transport will receive
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// The transport for a configured protocol
pub fn for_protocol(protocol: Protocol) -> Box<dyn Transport> {
    match protocol {
        Protocol::Udp => Box::new(UdpTransport::new()),
        Protocol::Tcp => Box::new(TcpTransport::new()),
    }
}

/// Message ID of a wire-format message, if it is long enough to have one
pub(crate) fn message_id(message: &[u8]) -> Option<u16> {
    match message {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}
