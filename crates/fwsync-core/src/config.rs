// ── Runtime engine configuration ──
//
// How the engine reaches appliances and how hard it drives the fleet.
// Carries credentials but never touches disk; `fwsync-config` builds an
// `EngineConfig` from files and environment and hands it in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use fwsync_api::{Credentials, Endpoints, Scheme, TlsMode, TransportConfig};

use crate::model::DeviceStatus;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Appliances ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Fleet-wide connection and concurrency settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Management account shared by every appliance.
    pub credentials: Credentials,
    pub scheme: Scheme,
    /// Management port unless a device overrides it.
    pub port: u16,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on devices worked in parallel by batch operations.
    pub max_concurrency: usize,
    /// Device statuses a batch operation will touch.
    pub operable_statuses: Vec<DeviceStatus>,
    pub endpoints: Arc<Endpoints>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials {
                username: "admin".into(),
                password: SecretString::from(String::new()),
            },
            scheme: Scheme::Https,
            port: 443,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            max_concurrency: 8,
            operable_statuses: vec![DeviceStatus::Online],
            endpoints: Arc::new(Endpoints::default()),
        }
    }
}

impl EngineConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookie_jar: None,
        }
    }
}
