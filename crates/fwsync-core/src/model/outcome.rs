// ── Results of per-device and fleet runs ──

use std::fmt::Write as _;

use crate::error::CoreError;

use super::device::DeviceId;
use super::domain::Domain;

/// Result of one operation on one device.
#[derive(Debug)]
pub enum ReconciliationOutcome {
    Succeeded { device_id: DeviceId },
    Failed { device_id: DeviceId, error: CoreError },
}

impl ReconciliationOutcome {
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::Succeeded { device_id } | Self::Failed { device_id, .. } => device_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Aggregate of a fleet-wide operation.
///
/// `outcomes` holds one entry per attempted device, in request order.
/// `skipped` lists devices that were requested but not attempted
/// (unknown, or in a non-operable status).
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub outcomes: Vec<ReconciliationOutcome>,
    pub skipped: Vec<DeviceId>,
}

impl BatchOutcome {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded_device_ids(&self) -> Vec<DeviceId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.device_id().clone())
            .collect()
    }

    pub fn failed_device_ids(&self) -> Vec<DeviceId> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.device_id().clone())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(ReconciliationOutcome::is_success)
    }

    /// Collapse into a single result; any failure yields
    /// [`CoreError::PartialFleetFailure`] naming every failed device.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.all_succeeded() {
            Ok(())
        } else {
            Err(CoreError::PartialFleetFailure {
                failed_device_ids: self.failed_device_ids(),
            })
        }
    }
}

#[derive(Debug)]
pub struct DomainResult {
    pub domain: Domain,
    pub result: Result<(), CoreError>,
}

/// Per-domain results of an all-domains run on one device. Domains are
/// independent, so one failure does not stop the others.
#[derive(Debug)]
pub struct DomainReport {
    pub device_id: DeviceId,
    pub results: Vec<DomainResult>,
}

impl DomainReport {
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, domain: Domain, result: Result<(), CoreError>) {
        self.results.push(DomainResult { domain, result });
    }

    pub fn failed_domains(&self) -> Vec<Domain> {
        self.results
            .iter()
            .filter(|r| r.result.is_err())
            .map(|r| r.domain)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.result.is_ok())
    }

    pub fn into_result(self) -> Result<(), CoreError> {
        let mut domains = Vec::new();
        let mut summary = String::new();
        for DomainResult { domain, result } in self.results {
            if let Err(e) = result {
                if !summary.is_empty() {
                    summary.push_str("; ");
                }
                let _ = write!(summary, "{e}");
                domains.push(domain);
            }
        }
        if domains.is_empty() {
            Ok(())
        } else {
            Err(CoreError::DomainFailures {
                device_id: self.device_id,
                domains,
                summary,
            })
        }
    }
}
