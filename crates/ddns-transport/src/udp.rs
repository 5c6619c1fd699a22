//! Connectionless transport.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use ddns_core::TransportError;
use ddns_core::traits::{Protocol, Transport};

use crate::{MAX_MESSAGE_SIZE, message_id};

/// Sends the request as a single datagram from an ephemeral port
///
/// Datagrams whose message ID differs from the request's are discarded
/// while waiting, so a stray or late answer cannot be mistaken for ours.
/// The socket is connected, so the OS already drops datagrams from other
/// peers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTransport;

impl UdpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn exchange(&self, server: SocketAddr, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let id = message_id(request).ok_or_else(|| TransportError::malformed("request too short"))?;

        let local: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        socket.send(request).await?;
        debug!("Sent {} octets to {} over UDP", request.len(), server);

        let mut buf = vec![0u8; MAX_MESSAGE_SIZE];
        loop {
            let len = socket.recv(&mut buf).await?;
            match message_id(&buf[..len]) {
                Some(got) if got == id => {
                    trace!("Received {} octets from {}", len, server);
                    buf.truncate(len);
                    return Ok(buf);
                }
                got => debug!("Discarding datagram with foreign ID {:?} from {}", got, server),
            }
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }
}
