// Wire-level reply shapes
//
// Appliance firmware is loose about reply layout: list endpoints return
// either a bare array or an object wrapping the array, and identifiers
// arrive as numbers on some builds and strings on others. These helpers
// absorb the variation so endpoint methods stay one-liners.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One rule as the appliance sends or expects it: wire field names
/// (`_ruleID`, `_srcIP`, ...) mapped to loosely typed values.
pub type WireRecord = Map<String, Value>;

/// An identifier assigned by the appliance.
///
/// Accepts JSON numbers or strings; always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WireId(String);

impl WireId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an identifier out of an arbitrary JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WireId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for WireId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid identifier: {value}")))
    }
}

/// Extract record rows from a list reply (`[..]`, `{data: [..]}` or `{rules: [..]}`).
/// Non-object rows are skipped.
pub(crate) fn rows_from_reply(reply: Value) -> Vec<WireRecord> {
    let rows = match reply {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("data").or_else(|| obj.remove("rules")) {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// Extract identifiers from an id-list reply (`[..]` or `{ids: [..]}`).
pub(crate) fn ids_from_reply(reply: &Value) -> Vec<WireId> {
    let items = match reply {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("ids") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    items.iter().filter_map(WireId::from_value).collect()
}

/// Read the `status` field of a reply as an integer, tolerating
/// firmware that sends it as a numeric string.
pub(crate) fn status_of(reply: &Value) -> Option<i64> {
    match reply.get("status")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
