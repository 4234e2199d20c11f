// ── Reconciliation engine ──
//
// Entry point for consumers. Resolves devices through the registry,
// opens one scoped appliance session per device operation, and routes
// the work to the per-domain reconcilers or the fleet runner.

use std::sync::Arc;

use tracing::{debug, info};

use fwsync_api::{ApplianceClient, ApplianceTarget, TransportConfig};

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::fleet::FleetBatchRunner;
use crate::model::{BatchOutcome, Device, DeviceId, Domain, DomainReport, RegistrationStatus};
use crate::reconcile::{self, DomainReconciler};
use crate::repository::{DeviceRegistry, RuleRepository};

/// The reconciliation engine.
///
/// Cheaply cloneable. Holds no appliance connections between calls:
/// every operation logs in, does its work and logs out.
pub struct Engine<R> {
    inner: Arc<EngineInner<R>>,
}

impl<R> Clone for Engine<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<R> {
    config: EngineConfig,
    transport: TransportConfig,
    repo: Arc<R>,
}

impl<R> Engine<R>
where
    R: RuleRepository + DeviceRegistry,
{
    pub fn new(config: EngineConfig, repo: Arc<R>) -> Self {
        let transport = config.transport();
        Self {
            inner: Arc::new(EngineInner {
                config,
                transport,
                repo,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.inner.repo
    }

    // ── Single device ────────────────────────────────────────────

    /// Push the stored state of one domain onto a device.
    pub async fn apply_domain(&self, device_id: &DeviceId, domain: Domain) -> Result<(), CoreError> {
        let device = self.inner.repo.device(device_id).await?;
        self.with_session(&device, |client| async move {
            DomainReconciler::new(&client, self.inner.repo.as_ref(), device_id)
                .apply(domain)
                .await
        })
        .await
    }

    /// Import one domain from a device into the repository.
    ///
    /// Apply-only domains fail with `Unsupported` before any connection
    /// is made.
    pub async fn sync_domain(&self, device_id: &DeviceId, domain: Domain) -> Result<(), CoreError> {
        if !domain.supports_sync() {
            return Err(reconcile::unsupported_sync(domain));
        }
        let device = self.inner.repo.device(device_id).await?;
        self.with_session(&device, |client| async move {
            DomainReconciler::new(&client, self.inner.repo.as_ref(), device_id)
                .sync(domain)
                .await
        })
        .await
    }

    /// Apply every domain over one session. `Err` only when the device
    /// cannot be resolved or reached; per-domain failures are in the
    /// report.
    pub async fn apply_all_domains(&self, device_id: &DeviceId) -> Result<DomainReport, CoreError> {
        let device = self.inner.repo.device(device_id).await?;
        self.apply_all_on(&device).await
    }

    /// Sync every sync-capable domain over one session.
    pub async fn sync_all_domains(&self, device_id: &DeviceId) -> Result<DomainReport, CoreError> {
        let device = self.inner.repo.device(device_id).await?;
        self.with_session(&device, |client| async move {
            Ok(
                DomainReconciler::new(&client, self.inner.repo.as_ref(), device_id)
                    .sync_all()
                    .await,
            )
        })
        .await
    }

    // ── Fleet ────────────────────────────────────────────────────

    pub async fn batch_reboot(&self, device_ids: &[DeviceId]) -> BatchOutcome {
        info!(devices = device_ids.len(), "batch reboot");
        self.runner()
            .run(device_ids, |device| async move {
                self.with_session(&device, |client| async move {
                    client.reboot().await.map_err(CoreError::from)
                })
                .await
            })
            .await
    }

    /// Unregister devices from the platform. The stored registration
    /// flips only after the appliance confirms.
    pub async fn batch_unregister(&self, device_ids: &[DeviceId]) -> BatchOutcome {
        info!(devices = device_ids.len(), "batch unregister");
        self.runner()
            .run(device_ids, |device| async move {
                self.with_session(&device, |client| async move {
                    client.unregister().await.map_err(CoreError::from)
                })
                .await?;
                self.inner
                    .repo
                    .set_registration(&device.id, RegistrationStatus::NotRegistered)
                    .await?;
                Ok(())
            })
            .await
    }

    /// Apply every domain on every device. A device counts as failed if
    /// any of its domains failed.
    pub async fn batch_apply_all(&self, device_ids: &[DeviceId]) -> BatchOutcome {
        info!(devices = device_ids.len(), "batch apply");
        self.runner()
            .run(device_ids, |device| async move {
                self.apply_all_on(&device).await?.into_result()
            })
            .await
    }

    // ── Internals ────────────────────────────────────────────────

    fn runner(&self) -> FleetBatchRunner<'_, R> {
        FleetBatchRunner::new(
            self.inner.repo.as_ref(),
            self.inner.config.max_concurrency,
            &self.inner.config.operable_statuses,
        )
    }

    async fn apply_all_on(&self, device: &Device) -> Result<DomainReport, CoreError> {
        self.with_session(device, |client| async move {
            Ok(
                DomainReconciler::new(&client, self.inner.repo.as_ref(), &device.id)
                    .apply_all()
                    .await,
            )
        })
        .await
    }

    fn target(&self, device: &Device) -> Result<ApplianceTarget, CoreError> {
        let port = device.port.unwrap_or(self.inner.config.port);
        ApplianceTarget::new(self.inner.config.scheme, &device.ip.to_string(), port)
            .map_err(CoreError::from)
    }

    /// Open a session to `device`, run `f`, and always log out.
    async fn with_session<T, F, Fut>(&self, device: &Device, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(ApplianceClient) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let target = self.target(device)?;
        debug!(device = %device.id, %target, "opening session");
        ApplianceClient::oneshot(
            target,
            &self.inner.config.credentials,
            &self.inner.transport,
            Arc::clone(&self.inner.config.endpoints),
            f,
        )
        .await
    }
}
