//! Update transaction engine
//!
//! The UpdateEngine is responsible for:
//! - Building the signed RRset-replace UPDATE for an [`UpdateRequest`]
//! - Sending it once over the configured [`Transport`], bounded by a timeout
//! - Verifying and classifying the response into an [`UpdateOutcome`]
//!
//! ## State Machine
//!
//! ```text
//! Idle ─► MessageBuilt ─► Sent ─┬─► Succeeded
//!                               ├─► RejectedByServer
//!                               └─► TransportFailed
//! ```
//!
//! All right-hand states are terminal. The engine never retries, never
//! switches transport and never rewrites a request after it is built;
//! whether to try again is up to whoever schedules the next run.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use domain::base::iana::{Class, Opcode, Rcode, Rtype};
use domain::base::message_builder::{MessageBuilder, PushError};
use domain::base::question::Question;
use domain::base::rdata::UnknownRecordData;
use domain::base::Message;
use domain::rdata::tsig::Time48;
use domain::rdata::A;
use domain::tsig::{ClientTransaction, Key, ValidationError};
use tracing::{debug, warn};

use crate::Name;
use crate::error::{Error, Result, TransportError};
use crate::keyring::AuthKey;
use crate::traits::Transport;

/// Signing state kept between sending an update and checking its answer
pub type UpdateTransaction = ClientTransaction<Arc<Key>>;

/// Largest TTL allowed by RFC 2181 § 8
pub const MAX_TTL: u32 = i32::MAX as u32;

/// Everything needed to build one update
///
/// Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    zone: Name,
    owner: Name,
    ttl: u32,
    address: Ipv4Addr,
    key: AuthKey,
}

impl UpdateRequest {
    /// Create an update request
    ///
    /// # Parameters
    ///
    /// - `zone`: The zone being updated
    /// - `owner`: Absolute owner name of the A record
    /// - `ttl`: Record TTL in seconds, 1..=2^31-1
    /// - `address`: The address to publish
    /// - `key`: The TSIG key that signs the update
    pub fn new(zone: Name, owner: Name, ttl: u32, address: Ipv4Addr, key: AuthKey) -> Result<Self> {
        if ttl == 0 || ttl > MAX_TTL {
            return Err(Error::invalid_input(format!(
                "TTL must be between 1 and {}, got {}",
                MAX_TTL, ttl
            )));
        }
        Ok(Self {
            zone,
            owner,
            ttl,
            address,
            key,
        })
    }

    pub fn zone(&self) -> &Name {
        &self.zone
    }

    pub fn owner(&self) -> &Name {
        &self.owner
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn key(&self) -> &AuthKey {
        &self.key
    }

    /// The record type this request replaces; always "A"
    pub fn record_type(&self) -> &'static str {
        "A"
    }

    /// Serialize and sign the UPDATE with message ID `id`
    ///
    /// The zone section names the zone's SOA. The update section deletes
    /// the owner's whole A RRset (class ANY, TTL 0, no data) and then adds
    /// the single new record, so the server applies a replace.
    ///
    /// # Returns
    ///
    /// The wire message and the transaction needed to verify the answer.
    pub fn to_signed_message(&self, id: u16, now: Time48) -> Result<(Vec<u8>, UpdateTransaction)> {
        let mut builder = MessageBuilder::new_vec();
        builder.header_mut().set_id(id);
        builder.header_mut().set_opcode(Opcode::Update);

        let mut zone = builder.question();
        zone.push(Question::new(&self.zone, Rtype::Soa, Class::In))
            .map_err(build_error)?;

        let mut update = zone.authority();
        let no_data = UnknownRecordData::from_octets(Rtype::A, Vec::new())
            .map_err(|_| Error::invalid_input("empty record data rejected"))?;
        update
            .push((&self.owner, Class::Any, 0u32, no_data))
            .map_err(build_error)?;
        update
            .push((&self.owner, Class::In, self.ttl, A::new(self.address)))
            .map_err(build_error)?;

        let mut additional = update.additional();
        let transaction = ClientTransaction::request(self.key.signing_key(), &mut additional, now)
            .map_err(build_error)?;
        Ok((additional.finish(), transaction))
    }
}

fn build_error(err: PushError) -> Error {
    Error::invalid_input(format!("cannot build UPDATE message: {}", err))
}

/// Reasons a server rejects an update
///
/// The five named codes are distinct categories; every other non-zero
/// status lands in `Unknown` with its raw value. None of them is retried
/// by this crate, including the often transient SERVFAIL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// NXDOMAIN: a name the update depends on does not exist
    NxDomain,
    /// SERVFAIL: the server could not process the update
    ServFail,
    /// NOTAUTH: not authoritative for the zone, or the signature was refused
    NotAuth,
    /// NOTZONE: the owner name is outside the zone
    NotZone,
    /// REFUSED: policy forbids the update
    Refused,
    /// Any other non-zero RCODE
    Unknown(u8),
}

impl Rejection {
    /// Classify an RCODE; `None` for NOERROR
    pub fn from_rcode(rcode: Rcode) -> Option<Self> {
        match rcode {
            Rcode::NoError => None,
            Rcode::NXDomain => Some(Self::NxDomain),
            Rcode::ServFail => Some(Self::ServFail),
            Rcode::NotAuth => Some(Self::NotAuth),
            Rcode::NotZone => Some(Self::NotZone),
            Rcode::Refused => Some(Self::Refused),
            other => Some(Self::Unknown(other.to_int())),
        }
    }

    /// The RCODE this rejection carries
    pub fn rcode(&self) -> Rcode {
        match self {
            Self::NxDomain => Rcode::NXDomain,
            Self::ServFail => Rcode::ServFail,
            Self::NotAuth => Rcode::NotAuth,
            Self::NotZone => Rcode::NotZone,
            Self::Refused => Rcode::Refused,
            Self::Unknown(code) => Rcode::from_int(*code),
        }
    }

    /// Short machine-readable category name
    pub fn category(&self) -> &'static str {
        match self {
            Self::NxDomain => "nxdomain",
            Self::ServFail => "servfail",
            Self::NotAuth => "notauth",
            Self::NotZone => "notzone",
            Self::Refused => "refused",
            Self::Unknown(_) => "unknown-status",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NxDomain => f.write_str("domain does not exist (NXDOMAIN)"),
            Self::ServFail => f.write_str("server failure (SERVFAIL)"),
            Self::NotAuth => f.write_str("not authorized (NOTAUTH)"),
            Self::NotZone => f.write_str("name not in zone (NOTZONE)"),
            Self::Refused => f.write_str("request refused (REFUSED)"),
            Self::Unknown(code) => write!(f, "unknown status {} ({})", code, Rcode::from_int(*code)),
        }
    }
}

/// Terminal result of one update exchange
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The server applied the update
    Succeeded {
        /// Transaction ID taken from the response
        id: u16,
    },
    /// The exchange completed but the server refused the update
    Rejected {
        reason: Rejection,
        /// One-line summary of the raw response
        summary: String,
    },
    /// The exchange could not complete or its answer cannot be trusted
    TransportFailed(TransportError),
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Succeeded { .. })
    }

    /// Short machine-readable category name
    pub fn category(&self) -> &'static str {
        match self {
            UpdateOutcome::Succeeded { .. } => "success",
            UpdateOutcome::Rejected { reason, .. } => reason.category(),
            UpdateOutcome::TransportFailed(e) => e.category(),
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Succeeded { id } => write!(f, "update succeeded (id {:#06x})", id),
            UpdateOutcome::Rejected { reason, summary } => {
                write!(f, "update rejected: {}; response: {}", reason, summary)
            }
            UpdateOutcome::TransportFailed(e) => write!(f, "update exchange failed: {}", e),
        }
    }
}

/// Core update engine
///
/// Holds the nameserver address, transport and timeout; each call to
/// [`UpdateEngine::submit`] performs exactly one exchange.
pub struct UpdateEngine {
    /// Transport for the exchange
    transport: Box<dyn Transport>,

    /// Nameserver address
    server: SocketAddr,

    /// Upper bound on waiting for the response
    timeout: Duration,
}

impl UpdateEngine {
    /// Create a new update engine
    pub fn new(transport: Box<dyn Transport>, server: SocketAddr, timeout: Duration) -> Self {
        Self {
            transport,
            server,
            timeout,
        }
    }

    /// Nameserver this engine talks to
    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Submit an update with a random message ID
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome)`: The terminal state of the exchange
    /// - `Err(Error)`: The request could not be signed; nothing was sent
    pub async fn submit(&self, request: &UpdateRequest) -> Result<UpdateOutcome> {
        self.submit_with_id(request, rand::random()).await
    }

    /// Submit an update with the given message ID
    pub async fn submit_with_id(&self, request: &UpdateRequest, id: u16) -> Result<UpdateOutcome> {
        let (wire, transaction) = request.to_signed_message(id, Time48::now())?;
        debug!(
            "Built UPDATE id {:#06x} for {} in zone {} ({} octets, key {})",
            id,
            request.owner(),
            request.zone(),
            wire.len(),
            request.key().name()
        );

        debug!(
            "Sending UPDATE to {} over {} (timeout {:?})",
            self.server,
            self.transport.protocol(),
            self.timeout
        );
        let exchange = self.transport.exchange(self.server, &wire);
        let response = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Ok(UpdateOutcome::TransportFailed(e)),
            Err(_) => return Ok(UpdateOutcome::TransportFailed(TransportError::Timeout(self.timeout))),
        };

        Ok(match classify(response, id, &transaction) {
            Ok(outcome) => outcome,
            Err(e) => UpdateOutcome::TransportFailed(e),
        })
    }
}

/// Verify and classify a raw response to the request with `id`.
fn classify(
    response: Vec<u8>,
    id: u16,
    transaction: &UpdateTransaction,
) -> std::result::Result<UpdateOutcome, TransportError> {
    let mut message = Message::from_octets(response)
        .map_err(|_| TransportError::malformed("response shorter than a DNS header"))?;
    let summary = summarize(&message);
    debug!("Received response: {}", summary);

    let header = message.header();
    if header.id() != id {
        return Err(TransportError::IdMismatch {
            expected: id,
            got: header.id(),
        });
    }
    if !header.qr() {
        return Err(TransportError::malformed("QR bit not set"));
    }
    if header.opcode() != Opcode::Update {
        return Err(TransportError::malformed(format!(
            "opcode {} in response to UPDATE",
            header.opcode()
        )));
    }
    if header.tc() {
        return Err(TransportError::Truncated);
    }

    // Servers answer BADSIG/BADKEY without a MAC (RFC 8945 § 5.3.2), so an
    // unsigned answer is acceptable only as a rejection.
    let rcode = header.rcode();
    match transaction.answer(&mut message, Time48::now()) {
        Ok(()) => {}
        Err(
            e @ (ValidationError::ServerUnsigned
            | ValidationError::ServerBadKey
            | ValidationError::ServerBadSig
            | ValidationError::ServerBadTime { .. }),
        ) if rcode != Rcode::NoError => {
            warn!("Accepting {} response without a valid signature: {}", rcode, e);
        }
        Err(ValidationError::ServerUnsigned) => {
            return Err(TransportError::verification("NOERROR response is not signed"));
        }
        Err(e) => return Err(TransportError::verification(e.to_string())),
    }

    Ok(match Rejection::from_rcode(rcode) {
        None => UpdateOutcome::Succeeded { id: header.id() },
        Some(reason) => UpdateOutcome::Rejected { reason, summary },
    })
}

/// One-line description of a response for logs and rejection reports
fn summarize(message: &Message<Vec<u8>>) -> String {
    let header = message.header();
    let counts = message.header_counts();
    let zone = match message.first_question() {
        Some(question) => question.qname().to_string(),
        None => "-".to_string(),
    };
    format!(
        "id {:#06x} {} {} zone {} (zo {}, pr {}, up {}, ad {})",
        header.id(),
        header.opcode(),
        header.rcode(),
        zone,
        counts.qdcount(),
        counts.ancount(),
        counts.nscount(),
        counts.arcount()
    )
}
