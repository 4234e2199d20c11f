// ── Persistence seam ──
//
// The engine never owns storage. It reads desired state from and writes
// imported state to whatever implements these traits; `memory` provides
// the in-process implementation used by tests and embedders.

mod memory;

pub use memory::InMemoryRepository;

use thiserror::Error;

use crate::model::{Device, DeviceId, Domain, RegistrationStatus, RuleRecord, SingletonConfig};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage backend error: {message}")]
    Backend { message: String },
}

/// Per-device, per-domain rule storage.
///
/// Rows are keyed by `(device, domain)`. List-style domains hold any
/// number of [`RuleRecord`]s; singleton domains hold at most one
/// [`SingletonConfig`].
#[allow(async_fn_in_trait)]
pub trait RuleRepository {
    /// Every record stored for the device and domain, device-owned or
    /// template-owned.
    async fn list_records(
        &self,
        device: &DeviceId,
        domain: Domain,
    ) -> Result<Vec<RuleRecord>, RepositoryError>;

    async fn delete_all(&self, device: &DeviceId, domain: Domain) -> Result<(), RepositoryError>;

    /// Insert records; an id already present in the domain is a
    /// [`RepositoryError::Conflict`].
    async fn bulk_insert(
        &self,
        device: &DeviceId,
        domain: Domain,
        records: Vec<RuleRecord>,
    ) -> Result<(), RepositoryError>;

    /// Swap the stored rows for `records`.
    ///
    /// The default deletes then inserts. Backends with transactions
    /// should override it so a failed insert leaves the old rows intact.
    async fn replace_all(
        &self,
        device: &DeviceId,
        domain: Domain,
        records: Vec<RuleRecord>,
    ) -> Result<(), RepositoryError> {
        self.delete_all(device, domain).await?;
        self.bulk_insert(device, domain, records).await
    }

    async fn get_singleton(
        &self,
        device: &DeviceId,
        domain: Domain,
    ) -> Result<SingletonConfig, RepositoryError>;

    /// Replace the singleton row for `config.domain()`.
    async fn put_singleton(
        &self,
        device: &DeviceId,
        config: SingletonConfig,
    ) -> Result<(), RepositoryError>;
}

/// The platform's inventory of managed appliances.
#[allow(async_fn_in_trait)]
pub trait DeviceRegistry {
    async fn device(&self, id: &DeviceId) -> Result<Device, RepositoryError>;

    async fn set_registration(
        &self,
        id: &DeviceId,
        registration: RegistrationStatus,
    ) -> Result<(), RepositoryError>;
}
