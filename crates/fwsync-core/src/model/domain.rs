// ── Strategy domains ──

use serde::{Deserialize, Serialize};

use fwsync_api::{RuleSetKind, VerdictKind};

/// One independent rule or config category on the appliance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
    FiveTuple,
    Whitelist,
    LearnedWhitelist,
    ConnectionConfig,
    ProtocolDefaultConfig,
    OpcReadWrite,
    Modbus,
    S7,
    IpMacBinding,
    Blacklist,
}

/// Which reconciliation algorithm a domain follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainShape {
    /// disable → delete → add → enable.
    RuleList(RuleSetKind),
    /// Fixed signature set: re-label by action, then toggle.
    Verdict(VerdictKind),
    /// Clear, add, enable by IP, deploy by binding id, trailing policy.
    IpMac,
    /// One row of mode/enum settings.
    Singleton,
}

impl Domain {
    pub fn shape(self) -> DomainShape {
        match self {
            Self::FiveTuple => DomainShape::RuleList(RuleSetKind::FiveTuple),
            Self::Whitelist => DomainShape::RuleList(RuleSetKind::Whitelist),
            Self::Modbus => DomainShape::RuleList(RuleSetKind::Modbus),
            Self::S7 => DomainShape::RuleList(RuleSetKind::S7),
            Self::Blacklist => DomainShape::Verdict(VerdictKind::Blacklist),
            Self::LearnedWhitelist => DomainShape::Verdict(VerdictKind::LearnedWhitelist),
            Self::IpMacBinding => DomainShape::IpMac,
            Self::ConnectionConfig | Self::ProtocolDefaultConfig | Self::OpcReadWrite => {
                DomainShape::Singleton
            }
        }
    }

    pub fn is_singleton(self) -> bool {
        self.shape() == DomainShape::Singleton
    }

    /// IP-MAC, blacklist and learned whitelist are local-authoritative:
    /// the platform pushes them but never imports them back.
    pub fn supports_sync(self) -> bool {
        !matches!(
            self,
            Self::IpMacBinding | Self::Blacklist | Self::LearnedWhitelist
        )
    }
}
