// ── Domain model ──
//
// Canonical local types the engine reads from and writes to the
// repository. Wire shapes stay in `fwsync_api`; `crate::normalize`
// bridges the two.

pub mod device;
pub mod domain;
pub mod outcome;
pub mod rule;
pub mod settings;

pub use device::{Device, DeviceId, DeviceStatus, RegistrationStatus};
pub use domain::{Domain, DomainShape};
pub use outcome::{BatchOutcome, DomainReport, DomainResult, ReconciliationOutcome};
pub use rule::{RuleAction, RuleId, RuleOwner, RuleRecord, RuleStatus};
pub use settings::{
    ConnectionMode, ConnectionSettings, IpMacPolicy, OpcMode, OpcSettings, ProtocolDefaults,
    SingletonConfig,
};
