// ── Managed appliance identity ──

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Platform-side identifier of a managed appliance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Upgrading,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    NotRegistered,
}

/// A managed appliance as the platform knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: Option<String>,
    pub ip: IpAddr,
    /// Overrides the fleet-wide management port.
    pub port: Option<u16>,
    pub status: DeviceStatus,
    pub registration: RegistrationStatus,
}

impl Device {
    pub fn new(id: impl Into<DeviceId>, ip: IpAddr) -> Self {
        Self {
            id: id.into(),
            name: None,
            ip,
            port: None,
            status: DeviceStatus::Online,
            registration: RegistrationStatus::Registered,
        }
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}
