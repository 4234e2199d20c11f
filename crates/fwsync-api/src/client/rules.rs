// Plain rule-list endpoints
//
// Five-tuple, whitelist, Modbus and S7 rules share one endpoint shape:
// list ids, list records, disable/enable/delete by id, add a batch.
// `RuleSet` is a borrowed handle bound to one of those groups.

use tracing::debug;

use crate::client::ApplianceClient;
use crate::endpoints::RuleSetEndpoints;
use crate::error::Error;
use crate::models::{WireId, WireRecord};
use crate::session::CheckMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSetKind {
    FiveTuple,
    Whitelist,
    Modbus,
    S7,
}

/// Endpoint handle for one plain rule-list domain.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet<'a> {
    client: &'a ApplianceClient,
    kind: RuleSetKind,
    endpoints: &'a RuleSetEndpoints,
}

impl ApplianceClient {
    pub fn rule_set(&self, kind: RuleSetKind) -> RuleSet<'_> {
        let endpoints = match kind {
            RuleSetKind::FiveTuple => &self.endpoints.five_tuple,
            RuleSetKind::Whitelist => &self.endpoints.whitelist,
            RuleSetKind::Modbus => &self.endpoints.modbus,
            RuleSetKind::S7 => &self.endpoints.s7,
        };
        RuleSet {
            client: self,
            kind,
            endpoints,
        }
    }

    pub fn five_tuple_rules(&self) -> RuleSet<'_> {
        self.rule_set(RuleSetKind::FiveTuple)
    }

    pub fn whitelist_rules(&self) -> RuleSet<'_> {
        self.rule_set(RuleSetKind::Whitelist)
    }

    pub fn modbus_rules(&self) -> RuleSet<'_> {
        self.rule_set(RuleSetKind::Modbus)
    }

    pub fn s7_rules(&self) -> RuleSet<'_> {
        self.rule_set(RuleSetKind::S7)
    }
}

impl RuleSet<'_> {
    pub fn kind(&self) -> RuleSetKind {
        self.kind
    }

    /// Identifiers of every rule currently on the appliance.
    ///
    /// `GET {prefix}/ids` — `NoCheck`.
    pub async fn list_ids(&self) -> Result<Vec<WireId>, Error> {
        debug!(kind = ?self.kind, "listing rule ids");
        self.client.fetch_ids(&self.endpoints.ids).await
    }

    /// Every rule currently on the appliance, in wire field names.
    ///
    /// `GET {prefix}/list` — `NoCheck`.
    pub async fn list_all(&self) -> Result<Vec<WireRecord>, Error> {
        debug!(kind = ?self.kind, "listing rules");
        self.client.fetch_rows(&self.endpoints.list).await
    }

    /// `POST {prefix}/disable` — `StatusCheck(0)`.
    pub async fn disable(&self, ids: &[WireId]) -> Result<(), Error> {
        debug!(kind = ?self.kind, count = ids.len(), "disabling rules");
        self.client
            .post_ids(&self.endpoints.disable, ids, CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// `POST {prefix}/enable` — `StatusCheck(0)`.
    pub async fn enable(&self, ids: &[WireId]) -> Result<(), Error> {
        debug!(kind = ?self.kind, count = ids.len(), "enabling rules");
        self.client
            .post_ids(&self.endpoints.enable, ids, CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// Some firmware rejects deleting an active rule; disable first.
    ///
    /// `POST {prefix}/delete` — `StatusCheck(0)`.
    pub async fn delete(&self, ids: &[WireId]) -> Result<(), Error> {
        debug!(kind = ?self.kind, count = ids.len(), "deleting rules");
        self.client
            .post_ids(&self.endpoints.delete, ids, CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// Add a batch of rules. Returns the identifiers the appliance echoed,
    /// which may be empty on firmware that does not echo.
    ///
    /// `POST {prefix}/add` — `RangeCheck`.
    pub async fn add_batch(&self, records: &[WireRecord]) -> Result<Vec<WireId>, Error> {
        debug!(kind = ?self.kind, count = records.len(), "adding rules");
        self.client.post_records(&self.endpoints.add, records).await
    }
}
