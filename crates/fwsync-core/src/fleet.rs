// ── Fleet batch runner ──
//
// Fans one per-device operation out over many appliances with a bounded
// number in flight. Devices are independent: a failure is recorded
// against its device and never stops the rest of the batch.

use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{BatchOutcome, Device, DeviceId, DeviceStatus, ReconciliationOutcome};
use crate::repository::DeviceRegistry;

pub struct FleetBatchRunner<'a, D> {
    registry: &'a D,
    max_concurrency: usize,
    operable: &'a [DeviceStatus],
}

impl<'a, D: DeviceRegistry> FleetBatchRunner<'a, D> {
    pub fn new(registry: &'a D, max_concurrency: usize, operable: &'a [DeviceStatus]) -> Self {
        Self {
            registry,
            max_concurrency: max_concurrency.max(1),
            operable,
        }
    }

    /// Run `operation` on every operable device in `device_ids`.
    ///
    /// Unknown devices and devices outside the operable statuses are
    /// listed in [`BatchOutcome::skipped`], not counted as failures.
    /// Repeated ids run once. Outcomes keep request order.
    pub async fn run<F, Fut>(&self, device_ids: &[DeviceId], operation: F) -> BatchOutcome
    where
        F: Fn(Device) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let mut seen = HashSet::new();
        let mut eligible = Vec::new();
        let mut skipped = Vec::new();

        for id in device_ids {
            if !seen.insert(id) {
                continue;
            }
            match self.registry.device(id).await {
                Ok(device) if self.operable.contains(&device.status) => eligible.push(device),
                Ok(device) => {
                    debug!(device = %id, status = %device.status, "skipping non-operable device");
                    skipped.push(device.id);
                }
                Err(e) => {
                    warn!(device = %id, error = %e, "skipping unknown device");
                    skipped.push(id.clone());
                }
            }
        }

        let outcomes: Vec<ReconciliationOutcome> = stream::iter(eligible)
            .map(|device| {
                let device_id = device.id.clone();
                let work = operation(device);
                async move {
                    match work.await {
                        Ok(()) => ReconciliationOutcome::Succeeded { device_id },
                        Err(error) => {
                            warn!(device = %device_id, error = %error, "device operation failed");
                            ReconciliationOutcome::Failed { device_id, error }
                        }
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let outcome = BatchOutcome { outcomes, skipped };
        info!(
            attempted = outcome.attempted(),
            failed = outcome.failed_device_ids().len(),
            skipped = outcome.skipped.len(),
            "batch finished"
        );
        outcome
    }
}
