//! Connection-oriented transport.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use ddns_core::TransportError;
use ddns_core::traits::{Protocol, Transport};

use crate::MAX_MESSAGE_SIZE;

/// Opens one connection per exchange and closes it afterwards
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn exchange(&self, server: SocketAddr, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        if request.len() > MAX_MESSAGE_SIZE {
            return Err(TransportError::malformed(format!(
                "request of {} octets does not fit TCP framing",
                request.len()
            )));
        }

        let mut stream = TcpStream::connect(server).await?;
        debug!("Connected to {} over TCP", server);

        let mut framed = Vec::with_capacity(request.len() + 2);
        framed.extend_from_slice(&(request.len() as u16).to_be_bytes());
        framed.extend_from_slice(request);
        stream.write_all(&framed).await?;

        let len = stream.read_u16().await? as usize;
        let mut response = vec![0u8; len];
        stream.read_exact(&mut response).await?;
        trace!("Received {} octets from {}", len, server);

        // The answer is complete; a peer that already closed or reset the
        // connection must not turn it into a failure.
        if let Err(e) = stream.shutdown().await {
            trace!("Ignoring TCP shutdown error from {}: {}", server, e);
        }
        Ok(response)
    }

    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }
}
