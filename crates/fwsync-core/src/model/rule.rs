// ── Canonical rule records ──

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fwsync_api::WireId;

use super::device::DeviceId;

/// Identifier of one rule, binding or signature.
///
/// For most domains this is the appliance-assigned id. IP-MAC bindings
/// are keyed by IP and learned-whitelist entries by feature code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_wire(&self) -> WireId {
        WireId::new(self.0.clone())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<WireId> for RuleId {
    fn from(id: WireId) -> Self {
        Self(id.as_str().to_owned())
    }
}

/// Verdict applied to matching traffic. Wire codes: 0, 1, 2.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum RuleAction {
    #[default]
    Pass = 0,
    Alert = 1,
    Block = 2,
}

impl RuleAction {
    pub fn code(self) -> i64 {
        i64::from(self as u8)
    }

    pub fn from_code(code: i64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Enabled,
    Disabled,
}

impl RuleStatus {
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }

    /// Wire form used when pushing records.
    pub fn code(self) -> i64 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 0,
        }
    }
}

/// Which side of the platform owns a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum RuleOwner {
    Device(DeviceId),
    Template(String),
}

/// One stored rule. Domain-specific columns live in `attributes` under
/// their canonical names; `crate::normalize` decides which are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: RuleId,
    pub action: RuleAction,
    pub status: RuleStatus,
    pub owner: RuleOwner,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl RuleRecord {
    pub fn new(id: impl Into<RuleId>, owner: RuleOwner) -> Self {
        Self {
            id: id.into(),
            action: RuleAction::default(),
            status: RuleStatus::default(),
            owner,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_action(mut self, action: RuleAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_owned(), value.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }
}
