// fwsync-core: Strategy reconciliation between the platform and its firewall fleet.

pub mod config;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod repository;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{EngineConfig, TlsVerification};
pub use engine::Engine;
pub use error::CoreError;
pub use fleet::FleetBatchRunner;
pub use normalize::{FieldMapping, FieldNormalizer, LocalField};
pub use reconcile::{ApplyState, DomainReconciler, Phase, SyncState};
pub use repository::{DeviceRegistry, InMemoryRepository, RepositoryError, RuleRepository};

pub use model::{
    // Devices and outcomes
    BatchOutcome, Device, DeviceId, DeviceStatus, DomainReport, DomainResult,
    ReconciliationOutcome, RegistrationStatus,
    // Rules
    Domain, DomainShape, RuleAction, RuleId, RuleOwner, RuleRecord, RuleStatus,
    // Singletons
    ConnectionMode, ConnectionSettings, IpMacPolicy, OpcMode, OpcSettings, ProtocolDefaults,
    SingletonConfig,
};
