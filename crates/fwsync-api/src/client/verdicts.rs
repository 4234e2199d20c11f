// Fixed-signature endpoints
//
// The blacklist is a fixed signature set and the learned whitelist is
// produced by the appliance itself: neither supports delete or add.
// Apply re-labels identifiers with an action and toggles them instead.

use serde_json::json;
use tracing::debug;

use crate::client::ApplianceClient;
use crate::endpoints::VerdictEndpoints;
use crate::error::Error;
use crate::models::WireId;
use crate::session::CheckMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictKind {
    Blacklist,
    LearnedWhitelist,
}

#[derive(Debug, Clone, Copy)]
pub struct VerdictSet<'a> {
    client: &'a ApplianceClient,
    kind: VerdictKind,
    endpoints: &'a VerdictEndpoints,
}

impl ApplianceClient {
    pub fn verdict_set(&self, kind: VerdictKind) -> VerdictSet<'_> {
        let endpoints = match kind {
            VerdictKind::Blacklist => &self.endpoints.blacklist,
            VerdictKind::LearnedWhitelist => &self.endpoints.learned_whitelist,
        };
        VerdictSet {
            client: self,
            kind,
            endpoints,
        }
    }

    pub fn blacklist(&self) -> VerdictSet<'_> {
        self.verdict_set(VerdictKind::Blacklist)
    }

    pub fn learned_whitelist(&self) -> VerdictSet<'_> {
        self.verdict_set(VerdictKind::LearnedWhitelist)
    }
}

impl VerdictSet<'_> {
    pub fn kind(&self) -> VerdictKind {
        self.kind
    }

    /// Whether this profile has a deploy step for the set.
    pub fn deploys(&self) -> bool {
        self.endpoints.deploy.is_some()
    }

    /// `GET {prefix}/ids` — `NoCheck`.
    pub async fn list_ids(&self) -> Result<Vec<WireId>, Error> {
        self.client.fetch_ids(&self.endpoints.ids).await
    }

    /// Give every listed identifier the same action code.
    ///
    /// `POST {prefix}/action` with `{"ids": [..], "action": code}` — `SuccessCheck`.
    pub async fn set_action(&self, ids: &[WireId], action: i64) -> Result<(), Error> {
        debug!(kind = ?self.kind, action, count = ids.len(), "setting action");
        self.client
            .session
            .post_json(
                &self.endpoints.set_action,
                &json!({ "ids": ids, "action": action }),
                CheckMode::Success,
            )
            .await?;
        Ok(())
    }

    /// `POST {prefix}/enable` — `StatusCheck(0)`.
    pub async fn enable(&self, ids: &[WireId]) -> Result<(), Error> {
        debug!(kind = ?self.kind, count = ids.len(), "enabling");
        self.client
            .post_ids(&self.endpoints.enable, ids, CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// `POST {prefix}/disable` — `StatusCheck(0)`.
    pub async fn disable(&self, ids: &[WireId]) -> Result<(), Error> {
        debug!(kind = ?self.kind, count = ids.len(), "disabling");
        self.client
            .post_ids(&self.endpoints.disable, ids, CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// Push the enabled set into the live filter.
    ///
    /// `POST {prefix}/deploy` — `SuccessCheck`. Blacklists have no deploy step.
    pub async fn deploy(&self, ids: &[WireId]) -> Result<(), Error> {
        let endpoint = self
            .endpoints
            .deploy
            .as_deref()
            .ok_or(Error::UnsupportedOperation("deploy without a deploy endpoint"))?;
        debug!(kind = ?self.kind, count = ids.len(), "deploying");
        self.client
            .post_ids(endpoint, ids, CheckMode::Success)
            .await?;
        Ok(())
    }
}
