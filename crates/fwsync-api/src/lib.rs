// fwsync-api: Async client for industrial-firewall appliance APIs

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use client::ApplianceClient;
pub use client::ip_mac::{BindingRef, IpMacBindings};
pub use client::rules::{RuleSet, RuleSetKind};
pub use client::verdicts::{VerdictKind, VerdictSet};
pub use endpoints::{Endpoints, IpMacEndpoints, RuleSetEndpoints, SettingsEndpoints, VerdictEndpoints};
pub use error::Error;
pub use models::{WireId, WireRecord};
pub use session::{ApplianceSession, ApplianceTarget, CheckMode, Credentials, Scheme};
pub use transport::{TlsMode, TransportConfig};
