use std::collections::HashSet;

use dashmap::DashMap;

use crate::model::{Device, DeviceId, Domain, RegistrationStatus, RuleRecord, SingletonConfig};

use super::{DeviceRegistry, RepositoryError, RuleRepository};

type Key = (DeviceId, Domain);

/// Concurrent in-memory repository.
///
/// Each `(device, domain)` entry is swapped as a whole, so `replace_all`
/// is atomic and readers never observe a half-replaced domain.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: DashMap<Key, Vec<RuleRecord>>,
    singletons: DashMap<Key, SingletonConfig>,
    devices: DashMap<DeviceId, Device>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a device in the inventory.
    pub fn insert_device(&self, device: Device) {
        self.devices.insert(device.id.clone(), device);
    }

    /// Seed records without the duplicate check.
    pub fn seed_records(&self, device: &DeviceId, domain: Domain, records: Vec<RuleRecord>) {
        self.records.insert((device.clone(), domain), records);
    }

    pub fn seed_singleton(&self, device: &DeviceId, config: SingletonConfig) {
        self.singletons
            .insert((device.clone(), config.domain()), config);
    }

    /// Snapshot of the stored records.
    pub fn records(&self, device: &DeviceId, domain: Domain) -> Vec<RuleRecord> {
        self.records
            .get(&(device.clone(), domain))
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn singleton(&self, device: &DeviceId, domain: Domain) -> Option<SingletonConfig> {
        self.singletons
            .get(&(device.clone(), domain))
            .map(|r| *r.value())
    }

    pub fn registration(&self, device: &DeviceId) -> Option<RegistrationStatus> {
        self.devices.get(device).map(|d| d.registration)
    }
}

fn check_unique<'a>(
    domain: Domain,
    existing: impl IntoIterator<Item = &'a RuleRecord>,
    incoming: &'a [RuleRecord],
) -> Result<(), RepositoryError> {
    let mut seen: HashSet<&str> = existing.into_iter().map(|r| r.id.as_str()).collect();
    for record in incoming {
        if !seen.insert(record.id.as_str()) {
            return Err(RepositoryError::Conflict {
                message: format!("duplicate {domain} id {}", record.id),
            });
        }
    }
    Ok(())
}

impl RuleRepository for InMemoryRepository {
    async fn list_records(
        &self,
        device: &DeviceId,
        domain: Domain,
    ) -> Result<Vec<RuleRecord>, RepositoryError> {
        Ok(self.records(device, domain))
    }

    async fn delete_all(&self, device: &DeviceId, domain: Domain) -> Result<(), RepositoryError> {
        self.records.remove(&(device.clone(), domain));
        Ok(())
    }

    async fn bulk_insert(
        &self,
        device: &DeviceId,
        domain: Domain,
        records: Vec<RuleRecord>,
    ) -> Result<(), RepositoryError> {
        let mut entry = self.records.entry((device.clone(), domain)).or_default();
        check_unique(domain, entry.iter(), &records)?;
        entry.extend(records);
        Ok(())
    }

    async fn replace_all(
        &self,
        device: &DeviceId,
        domain: Domain,
        records: Vec<RuleRecord>,
    ) -> Result<(), RepositoryError> {
        check_unique(domain, std::iter::empty(), &records)?;
        self.records.insert((device.clone(), domain), records);
        Ok(())
    }

    async fn get_singleton(
        &self,
        device: &DeviceId,
        domain: Domain,
    ) -> Result<SingletonConfig, RepositoryError> {
        self.singleton(device, domain)
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "singleton config",
                identifier: format!("{device}/{domain}"),
            })
    }

    async fn put_singleton(
        &self,
        device: &DeviceId,
        config: SingletonConfig,
    ) -> Result<(), RepositoryError> {
        self.singletons
            .insert((device.clone(), config.domain()), config);
        Ok(())
    }
}

impl DeviceRegistry for InMemoryRepository {
    async fn device(&self, id: &DeviceId) -> Result<Device, RepositoryError> {
        self.devices
            .get(id)
            .map(|d| d.value().clone())
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "device",
                identifier: id.to_string(),
            })
    }

    async fn set_registration(
        &self,
        id: &DeviceId,
        registration: RegistrationStatus,
    ) -> Result<(), RepositoryError> {
        let mut device = self
            .devices
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "device",
                identifier: id.to_string(),
            })?;
        device.registration = registration;
        Ok(())
    }
}
