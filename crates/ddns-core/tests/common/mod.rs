//! Test doubles and common utilities for contract tests
//!
//! This module provides transports that stand in for a nameserver without
//! any network I/O: a scripted responder, a hanging transport, a failing
//! transport and an in-memory nameserver that applies updates. Responses
//! are signed the way a TSIG-aware server signs them.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::traits::{Protocol, Transport};
use ddns_core::{AuthKey, Name, TransportError};
use domain::base::iana::{Class, Opcode, Rcode, Rtype};
use domain::base::message_builder::{AdditionalBuilder, MessageBuilder};
use domain::base::{Message, ToDname};
use domain::rdata::A;
use domain::rdata::tsig::Time48;
use domain::tsig::{ClientTransaction, ServerTransaction};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// "topsecret-material" in base64
pub const SECRET: &str = "dG9wc2VjcmV0LW1hdGVyaWFs";

pub fn test_key() -> AuthKey {
    AuthKey::new("ddns-key.example.com", "hmac-sha256", SECRET).expect("valid test key")
}

pub fn other_key() -> AuthKey {
    AuthKey::new("intruder.example.com", "hmac-sha256", SECRET).expect("valid test key")
}

pub fn name(text: &str) -> Name {
    Name::from_str(text).expect("valid name")
}

pub fn zone() -> Name {
    name("example.com.")
}

pub fn owner() -> Name {
    name("host.example.com.")
}

pub fn server_addr() -> SocketAddr {
    "192.0.2.53:53".parse().expect("valid address")
}

/// The single RRset replacement carried by an UPDATE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrsetReplace {
    pub zone: Name,
    pub owner: Name,
    pub ttl: u32,
    pub addresses: Vec<Ipv4Addr>,
}

/// Decode an UPDATE that deletes one A RRset and re-adds its records
///
/// Returns `None` for anything else: other opcodes, prerequisites, a
/// missing delete or records at more than one owner.
pub fn rrset_replace(message: &Message<Vec<u8>>) -> Option<RrsetReplace> {
    if message.header().opcode() != Opcode::Update {
        return None;
    }
    let counts = message.header_counts();
    if counts.qdcount() != 1 || counts.ancount() != 0 {
        return None;
    }
    let question = message.first_question()?;
    if question.qtype() != Rtype::Soa || question.qclass() != Class::In {
        return None;
    }

    let mut update = message.update().ok()?;
    let delete = update.next()?.ok()?;
    if delete.class() != Class::Any
        || delete.rtype() != Rtype::A
        || delete.ttl().as_secs() != 0
        || delete.rdlen() != 0
    {
        return None;
    }
    let owner = delete.owner().to_vec();

    let mut ttl = None;
    let mut addresses = Vec::new();
    for record in update {
        let record = record.ok()?;
        if record.class() != Class::In || record.rtype() != Rtype::A || !record.owner().name_eq(&owner) {
            return None;
        }
        ttl = Some(record.ttl().as_secs());
        let record = record.into_record::<A>().ok()??;
        addresses.push(record.data().addr());
    }

    Some(RrsetReplace {
        zone: question.qname().to_vec(),
        owner,
        ttl: ttl?,
        addresses,
    })
}

/// Start a response to `request` with `rcode`, ready for the TSIG record
fn response_to(request: &Message<Vec<u8>>, rcode: Rcode) -> AdditionalBuilder<Vec<u8>> {
    MessageBuilder::new_vec()
        .start_answer(request, rcode)
        .expect("response fits")
        .additional()
}

/// How a [`ScriptedTransport`] answers
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// Signed response with the given RCODE
    Signed(Rcode),
    /// Unsigned response with the given RCODE
    Unsigned(Rcode),
    /// Signed with a key other than the request's
    ForeignKey(Rcode),
    /// Signed, then one octet of the zone section altered
    Tampered(Rcode),
    /// Signed response with a different message ID
    WrongId,
    /// Signed response with the TC bit set
    Truncated,
    /// A response that does not decode
    Garbage,
}

/// Answers every request according to a fixed [`Reply`]
pub struct ScriptedTransport {
    reply: Reply,
    key: AuthKey,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Vec<u8>>>>,
}

impl ScriptedTransport {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            key: test_key(),
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle for observing calls after the transport is boxed
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Handle for observing the last request after the transport is boxed
    pub fn last_request(&self) -> Arc<Mutex<Option<Vec<u8>>>> {
        self.last_request.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(&self, _server: SocketAddr, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.to_vec());

        let mut message = Message::from_octets(request.to_vec()).expect("engine sends valid messages");
        let server = ServerTransaction::request(&self.key.signing_key(), &mut message, Time48::now())
            .expect("request verifies")
            .expect("request is signed");
        let id = message.header().id();

        let signed = |mut response: AdditionalBuilder<Vec<u8>>| {
            server.clone().answer(&mut response, Time48::now()).unwrap();
            response.finish()
        };

        Ok(match self.reply {
            Reply::Signed(rcode) => signed(response_to(&message, rcode)),
            Reply::Unsigned(rcode) => response_to(&message, rcode).finish(),
            Reply::ForeignKey(rcode) => {
                let mut response = response_to(&message, rcode);
                ClientTransaction::request(other_key().signing_key(), &mut response, Time48::now()).unwrap();
                response.finish()
            }
            Reply::Tampered(rcode) => {
                let mut response = signed(response_to(&message, rcode));
                // First label octet of the zone name in the question.
                response[13] ^= 0x01;
                response
            }
            Reply::WrongId => {
                let mut response = response_to(&message, Rcode::NoError);
                response.header_mut().set_id(id.wrapping_add(1));
                signed(response)
            }
            Reply::Truncated => {
                let mut response = response_to(&message, Rcode::NoError);
                response.header_mut().set_tc(true);
                signed(response)
            }
            Reply::Garbage => vec![0x00, 0x01, 0x02],
        })
    }

    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }
}

/// Never answers
pub struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn exchange(&self, _server: SocketAddr, _request: &[u8]) -> Result<Vec<u8>, TransportError> {
        std::future::pending().await
    }

    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }
}

/// Fails every exchange with an I/O error
pub struct FailingTransport(pub std::io::ErrorKind);

#[async_trait]
impl Transport for FailingTransport {
    async fn exchange(&self, _server: SocketAddr, _request: &[u8]) -> Result<Vec<u8>, TransportError> {
        Err(std::io::Error::from(self.0).into())
    }

    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }
}

/// The A RRset stored at one owner name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRrset {
    pub ttl: u32,
    pub addresses: Vec<Ipv4Addr>,
}

/// In-memory authoritative nameserver for one zone
///
/// Verifies requests against its key, applies RRset-replace updates and
/// signs every answer to a verified request. Requests that fail TSIG
/// checks get the unsigned NOTAUTH a real server sends.
#[derive(Clone)]
pub struct FakeNameserver {
    zone: Name,
    key: AuthKey,
    records: Arc<Mutex<HashMap<Name, StoredRrset>>>,
    updates: Arc<AtomicUsize>,
}

impl FakeNameserver {
    pub fn new(zone: Name, key: AuthKey) -> Self {
        Self {
            zone,
            key,
            records: Arc::new(Mutex::new(HashMap::new())),
            updates: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seed the zone with an existing RRset
    pub fn insert(&self, owner: Name, ttl: u32, addresses: Vec<Ipv4Addr>) {
        self.records
            .lock()
            .unwrap()
            .insert(owner, StoredRrset { ttl, addresses });
    }

    /// Query the A RRset at `owner`
    pub fn lookup(&self, owner: &Name) -> Option<StoredRrset> {
        self.records.lock().unwrap().get(owner).cloned()
    }

    /// Number of updates applied
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn apply(&self, request: &Message<Vec<u8>>) -> Rcode {
        let Some(replace) = rrset_replace(request) else {
            return Rcode::FormErr;
        };
        if replace.zone != self.zone {
            return Rcode::NotAuth;
        }
        if !replace.owner.ends_with(&self.zone) {
            return Rcode::NotZone;
        }
        self.insert(replace.owner, replace.ttl, replace.addresses);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Rcode::NoError
    }
}

#[async_trait]
impl Transport for FakeNameserver {
    async fn exchange(&self, _server: SocketAddr, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut message = Message::from_octets(request.to_vec())
            .map_err(|_| TransportError::malformed("short request"))?;

        match ServerTransaction::request(&self.key.signing_key(), &mut message, Time48::now()) {
            Ok(Some(transaction)) => {
                let rcode = self.apply(&message);
                let mut response = response_to(&message, rcode);
                transaction.answer(&mut response, Time48::now()).unwrap();
                Ok(response.finish())
            }
            Ok(None) => Ok(response_to(&message, Rcode::Refused).finish()),
            Err(error) => Ok(error
                .build_message(&message, MessageBuilder::new_vec())
                .expect("error response fits")
                .finish()),
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }
}
