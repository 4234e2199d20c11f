// ── Per-domain reconciliation ──
//
// Apply pushes the repository's desired state for one domain onto an
// appliance; Sync imports the appliance's state into the repository.
// Each domain shape has its own algorithm in a sibling module; all of
// them drive a `Machine` so failures carry the state they broke in.

mod ip_mac;
mod rule_set;
mod settings;
mod state;
mod verdict;

pub use state::{ApplyState, Phase, SyncState};

use strum::IntoEnumIterator;
use tracing::{debug, warn};

use fwsync_api::{ApplianceClient, WireId};

use crate::error::CoreError;
use crate::model::{DeviceId, Domain, DomainReport, DomainShape, RuleRecord};
use crate::repository::RuleRepository;

/// Reconciles domains of one device over one open session.
#[derive(Debug)]
pub struct DomainReconciler<'a, R> {
    client: &'a ApplianceClient,
    repo: &'a R,
    device: &'a DeviceId,
}

impl<'a, R: RuleRepository> DomainReconciler<'a, R> {
    pub fn new(client: &'a ApplianceClient, repo: &'a R, device: &'a DeviceId) -> Self {
        Self {
            client,
            repo,
            device,
        }
    }

    /// Make the appliance's `domain` match the repository.
    pub async fn apply(&self, domain: Domain) -> Result<(), CoreError> {
        match domain.shape() {
            DomainShape::RuleList(kind) => self.apply_rule_set(domain, kind).await,
            DomainShape::Verdict(kind) => self.apply_verdicts(domain, kind).await,
            DomainShape::IpMac => self.apply_ip_mac().await,
            DomainShape::Singleton => self.apply_singleton(domain).await,
        }
    }

    /// Replace the repository's `domain` with what the appliance holds.
    pub async fn sync(&self, domain: Domain) -> Result<(), CoreError> {
        if !domain.supports_sync() {
            return Err(unsupported_sync(domain));
        }
        match domain.shape() {
            DomainShape::RuleList(kind) => self.sync_rule_set(domain, kind).await,
            DomainShape::Singleton => self.sync_singleton(domain).await,
            DomainShape::Verdict(_) | DomainShape::IpMac => Err(unsupported_sync(domain)),
        }
    }

    /// Apply every domain in turn. A failed domain is recorded and the
    /// rest still run.
    pub async fn apply_all(&self) -> DomainReport {
        let mut report = DomainReport::new(self.device.clone());
        for domain in Domain::iter() {
            let result = self.apply(domain).await;
            if let Err(ref e) = result {
                warn!(device = %self.device, %domain, error = %e, "apply failed");
            }
            report.push(domain, result);
        }
        report
    }

    /// Sync every domain that supports it.
    pub async fn sync_all(&self) -> DomainReport {
        let mut report = DomainReport::new(self.device.clone());
        for domain in Domain::iter().filter(|d| d.supports_sync()) {
            let result = self.sync(domain).await;
            if let Err(ref e) = result {
                warn!(device = %self.device, %domain, error = %e, "sync failed");
            }
            report.push(domain, result);
        }
        report
    }
}

pub(crate) fn unsupported_sync(domain: Domain) -> CoreError {
    CoreError::Unsupported {
        operation: format!("sync of {domain}"),
        required: "a domain the appliance is authoritative for".into(),
    }
}

/// Remote ids of the enabled records after an add.
///
/// When the appliance echoes one id per pushed record they are matched
/// by position; otherwise the local ids are assumed to have been kept.
fn enabled_remote_ids(records: &[RuleRecord], echoed: Vec<WireId>) -> Vec<WireId> {
    if echoed.len() == records.len() {
        return records
            .iter()
            .zip(echoed)
            .filter(|(record, _)| record.is_enabled())
            .map(|(_, id)| id)
            .collect();
    }
    if !echoed.is_empty() {
        debug!(
            pushed = records.len(),
            echoed = echoed.len(),
            "echoed id count differs, using local ids"
        );
    }
    records
        .iter()
        .filter(|r| r.is_enabled())
        .map(|r| r.id.to_wire())
        .collect()
}
