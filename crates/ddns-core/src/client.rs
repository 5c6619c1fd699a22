//! One-shot update cycle
//!
//! [`DdnsClient`] ties the pieces together for a single run:
//! resolve the address, build and sign the update, submit it once and
//! report the outcome. Scheduling repeated runs is left to the caller
//! (cron, a systemd timer, ...).

use std::net::Ipv4Addr;

use tracing::{debug, error, info};

use crate::config::ValidatedConfig;
use crate::engine::{UpdateEngine, UpdateOutcome, UpdateRequest};
use crate::error::Result;
use crate::Name;
use crate::resolver::AddressResolver;

/// What one cycle did
#[derive(Debug)]
pub struct CycleReport {
    /// Owner name that was updated
    pub owner: Name,
    /// Address that was published
    pub address: Ipv4Addr,
    /// Terminal state of the exchange
    pub outcome: UpdateOutcome,
}

/// Runs update cycles for one validated configuration
pub struct DdnsClient {
    resolver: AddressResolver,
    engine: UpdateEngine,
    config: ValidatedConfig,
}

impl DdnsClient {
    /// Create a client
    ///
    /// The engine is expected to target `config.server`.
    pub fn new(resolver: AddressResolver, engine: UpdateEngine, config: ValidatedConfig) -> Self {
        Self {
            resolver,
            engine,
            config,
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Perform exactly one update cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleReport)`: An update was sent; the report carries its outcome
    /// - `Err(Error)`: A precondition failed (address resolution, signing);
    ///   nothing was sent
    pub async fn run_once(&self) -> Result<CycleReport> {
        let result = self.cycle().await;
        if let Err(e) = &result {
            error!(
                "No update sent for {} in zone {} via {}: {}",
                self.config.hostname,
                self.config.zone,
                self.engine.server(),
                e
            );
        }
        result
    }

    async fn cycle(&self) -> Result<CycleReport> {
        let config = &self.config;

        let address = self.resolver.resolve(config.interface.as_deref())?;
        debug!("Resolved address {}", address);

        let key = config.signing_key()?;
        debug!("Signing with key {} ({})", key.name(), key.algorithm());

        let request = UpdateRequest::new(
            config.zone.clone(),
            config.owner.clone(),
            config.ttl,
            address,
            key.clone(),
        )?;
        let outcome = self.engine.submit(&request).await?;

        match &outcome {
            UpdateOutcome::Succeeded { id } => info!(
                "Updated {} in zone {} via {}: A {} (ttl {}, id {:#06x})",
                config.hostname,
                config.zone,
                self.engine.server(),
                address,
                config.ttl,
                id
            ),
            UpdateOutcome::Rejected { reason, summary } => error!(
                "Update of {} in zone {} via {} to {} rejected [{}]: {}; response: {}",
                config.hostname,
                config.zone,
                self.engine.server(),
                address,
                reason.category(),
                reason,
                summary
            ),
            UpdateOutcome::TransportFailed(e) => error!(
                "Update of {} in zone {} via {} to {} failed [{}]: {}",
                config.hostname,
                config.zone,
                self.engine.server(),
                address,
                e.category(),
                e
            ),
        }

        Ok(CycleReport {
            owner: config.owner.clone(),
            address,
            outcome,
        })
    }
}
