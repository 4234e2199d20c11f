// ── Field normalization ──
//
// Each list-style domain has a fixed table pairing the appliance's wire
// field names with canonical local fields. Conversion in either direction
// goes through the table only: wire fields it does not list are dropped,
// and so are local attributes it does not list.

use serde_json::Value;
use tracing::{trace, warn};

use fwsync_api::{WireId, WireRecord};

use crate::error::CoreError;
use crate::model::{Domain, RuleAction, RuleOwner, RuleRecord, RuleStatus};

/// Where a wire field lands in a [`RuleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalField {
    Id,
    Action,
    Status,
    Attr(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub wire: &'static str,
    pub local: LocalField,
}

const fn field(wire: &'static str, local: LocalField) -> FieldMapping {
    FieldMapping { wire, local }
}

const fn attr(wire: &'static str, local: &'static str) -> FieldMapping {
    FieldMapping {
        wire,
        local: LocalField::Attr(local),
    }
}

const FIVE_TUPLE: &[FieldMapping] = &[
    field("_ruleID", LocalField::Id),
    attr("_srcIP", "src_ip"),
    attr("_dstIP", "dst_ip"),
    attr("_srcPort", "src_port"),
    attr("_dstPort", "dst_port"),
    attr("_protocol", "protocol"),
    field("_action", LocalField::Action),
    field("_status", LocalField::Status),
    attr("_log", "log"),
    attr("_desc", "description"),
];

const WHITELIST: &[FieldMapping] = &[
    field("_ruleID", LocalField::Id),
    attr("_srcIP", "src_ip"),
    attr("_dstIP", "dst_ip"),
    attr("_dstPort", "dst_port"),
    attr("_protocol", "protocol"),
    field("_action", LocalField::Action),
    field("_status", LocalField::Status),
    attr("_desc", "description"),
];

const MODBUS: &[FieldMapping] = &[
    field("_ruleID", LocalField::Id),
    attr("_srcIP", "src_ip"),
    attr("_dstIP", "dst_ip"),
    attr("_funcCode", "function_code"),
    attr("_startAddr", "start_address"),
    attr("_endAddr", "end_address"),
    field("_action", LocalField::Action),
    field("_status", LocalField::Status),
    attr("_desc", "description"),
];

const S7: &[FieldMapping] = &[
    field("_ruleID", LocalField::Id),
    attr("_srcIP", "src_ip"),
    attr("_dstIP", "dst_ip"),
    attr("_funcType", "function_type"),
    attr("_pduType", "pdu_type"),
    field("_action", LocalField::Action),
    field("_status", LocalField::Status),
    attr("_desc", "description"),
];

const LEARNED_WHITELIST: &[FieldMapping] = &[
    field("_featureCode", LocalField::Id),
    attr("_srcIP", "src_ip"),
    attr("_dstIP", "dst_ip"),
    attr("_protocol", "protocol"),
    attr("_hits", "hits"),
    field("_action", LocalField::Action),
    field("_status", LocalField::Status),
];

const IP_MAC: &[FieldMapping] = &[
    field("_ip", LocalField::Id),
    attr("_mac", "mac"),
    field("_action", LocalField::Action),
    field("_status", LocalField::Status),
    attr("_desc", "description"),
];

const BLACKLIST: &[FieldMapping] = &[
    field("_sid", LocalField::Id),
    attr("_name", "name"),
    attr("_level", "level"),
    field("_action", LocalField::Action),
    field("_status", LocalField::Status),
];

/// Table-driven translation between wire records and [`RuleRecord`]s.
pub struct FieldNormalizer;

impl FieldNormalizer {
    /// Mapping table for `domain`. Singleton domains have none.
    pub fn table(domain: Domain) -> &'static [FieldMapping] {
        match domain {
            Domain::FiveTuple => FIVE_TUPLE,
            Domain::Whitelist => WHITELIST,
            Domain::Modbus => MODBUS,
            Domain::S7 => S7,
            Domain::LearnedWhitelist => LEARNED_WHITELIST,
            Domain::IpMacBinding => IP_MAC,
            Domain::Blacklist => BLACKLIST,
            Domain::ConnectionConfig | Domain::ProtocolDefaultConfig | Domain::OpcReadWrite => &[],
        }
    }

    /// Wire name of the identifier field.
    pub fn id_field(domain: Domain) -> Option<&'static str> {
        Self::table(domain)
            .iter()
            .find(|m| m.local == LocalField::Id)
            .map(|m| m.wire)
    }

    /// Build a canonical record from one wire row.
    pub fn from_wire(
        domain: Domain,
        wire: &WireRecord,
        owner: RuleOwner,
    ) -> Result<RuleRecord, CoreError> {
        let table = Self::table(domain);
        if table.is_empty() {
            return Err(CoreError::Normalization {
                domain,
                message: "singleton domains have no record form".into(),
            });
        }

        let mut id = None;
        let mut action = RuleAction::default();
        let mut status = RuleStatus::Disabled;
        let mut attributes = std::collections::BTreeMap::new();

        for (key, value) in wire {
            let Some(mapping) = table.iter().find(|m| m.wire == key) else {
                trace!(%domain, field = %key, "dropping unmapped wire field");
                continue;
            };
            match mapping.local {
                LocalField::Id => id = WireId::from_value(value),
                LocalField::Action => {
                    action = parse_action(value).ok_or_else(|| CoreError::Normalization {
                        domain,
                        message: format!("unknown action {value}"),
                    })?;
                }
                LocalField::Status => status = parse_status(value),
                LocalField::Attr(name) => {
                    attributes.insert(name.to_owned(), value.clone());
                }
            }
        }

        let id = id.ok_or_else(|| CoreError::Normalization {
            domain,
            message: format!(
                "missing {}",
                Self::id_field(domain).unwrap_or("identifier")
            ),
        })?;

        Ok(RuleRecord {
            id: id.into(),
            action,
            status,
            owner,
            attributes,
        })
    }

    /// Build the records of a whole list reply.
    ///
    /// Rows carrying an action code this build does not know are skipped
    /// with a warning, so newer firmware does not block the rest of the
    /// import. Any other malformed row fails the batch.
    pub fn from_wire_rows(
        domain: Domain,
        rows: &[WireRecord],
        owner: &RuleOwner,
    ) -> Result<Vec<RuleRecord>, CoreError> {
        let action_field = Self::table(domain)
            .iter()
            .find(|m| m.local == LocalField::Action)
            .map(|m| m.wire);
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let unknown_action = action_field
                .and_then(|f| row.get(f))
                .filter(|value| parse_action(value).is_none());
            if let Some(value) = unknown_action {
                warn!(
                    %domain,
                    action = %value,
                    id = ?Self::id_field(domain).and_then(|f| row.get(f)),
                    "skipping row with unknown action"
                );
                continue;
            }
            records.push(Self::from_wire(domain, row, owner.clone())?);
        }
        Ok(records)
    }

    /// Render a canonical record in the appliance's wire shape.
    pub fn to_wire(domain: Domain, record: &RuleRecord) -> WireRecord {
        let mut wire = WireRecord::new();
        for mapping in Self::table(domain) {
            let value = match mapping.local {
                LocalField::Id => Value::String(record.id.as_str().to_owned()),
                LocalField::Action => Value::from(record.action.code()),
                LocalField::Status => Value::from(record.status.code()),
                LocalField::Attr(name) => match record.attributes.get(name) {
                    Some(v) => v.clone(),
                    None => continue,
                },
            };
            wire.insert(mapping.wire.to_owned(), value);
        }
        wire
    }
}

/// Action as a wire code, a numeric string, or a name.
fn parse_action(value: &Value) -> Option<RuleAction> {
    match value {
        Value::Number(n) => n.as_i64().and_then(RuleAction::from_code),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(RuleAction::from_code)
            .or_else(|| s.trim().to_ascii_lowercase().parse().ok()),
        _ => None,
    }
}

/// `1`, `true` and `"enable"` style values mean enabled; anything else
/// is disabled.
fn parse_status(value: &Value) -> RuleStatus {
    let enabled = match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "enable" | "enabled" | "on"
        ),
        _ => false,
    };
    if enabled {
        RuleStatus::Enabled
    } else {
        RuleStatus::Disabled
    }
}
