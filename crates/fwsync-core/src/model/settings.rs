// ── Singleton configuration rows ──

use serde::{Deserialize, Serialize};

use super::domain::Domain;
use super::rule::RuleAction;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ConnectionMode {
    #[default]
    Route = 0,
    Bridge = 1,
    Monitor = 2,
}

impl ConnectionMode {
    pub fn code(self) -> i64 {
        i64::from(self as u8)
    }

    pub fn from_code(code: i64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum OpcMode {
    #[default]
    ReadOnly = 0,
    ReadWrite = 1,
    Deny = 2,
}

impl OpcMode {
    pub fn code(self) -> i64 {
        i64::from(self as u8)
    }

    pub fn from_code(code: i64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub connection_mode: ConnectionMode,
    pub default_action: RuleAction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDefaults {
    pub dpi_default_action: RuleAction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcSettings {
    pub mode: OpcMode,
}

/// Actions used around an IP-MAC push: the pass-through action for the
/// clear call and the trailing policy for unknown devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpMacPolicy {
    pub clear_action: RuleAction,
    pub unknown_device_action: RuleAction,
}

impl Default for IpMacPolicy {
    fn default() -> Self {
        Self {
            clear_action: RuleAction::Pass,
            unknown_device_action: RuleAction::Alert,
        }
    }
}

/// The single stored row for a settings-style domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SingletonConfig {
    Connection(ConnectionSettings),
    ProtocolDefault(ProtocolDefaults),
    Opc(OpcSettings),
    IpMacPolicy(IpMacPolicy),
}

impl SingletonConfig {
    /// Domain the row is stored under.
    pub fn domain(&self) -> Domain {
        match self {
            Self::Connection(_) => Domain::ConnectionConfig,
            Self::ProtocolDefault(_) => Domain::ProtocolDefaultConfig,
            Self::Opc(_) => Domain::OpcReadWrite,
            Self::IpMacPolicy(_) => Domain::IpMacBinding,
        }
    }
}
