// Appliance API client
//
// Typed endpoint methods on top of `ApplianceSession`. Each strategy
// domain lives in its own file as inherent methods or a borrowed handle;
// this module holds construction, the scoped-session helper, and the
// request shapes shared by every domain.

pub mod ip_mac;
pub mod rules;
pub mod settings;
pub mod system;
pub mod verdicts;

use std::future::Future;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::endpoints::Endpoints;
use crate::error::Error;
use crate::models::{WireId, WireRecord, ids_from_reply, rows_from_reply};
use crate::session::{ApplianceSession, ApplianceTarget, CheckMode, Credentials};
use crate::transport::TransportConfig;

/// One typed method per remote endpoint, scoped to a single appliance.
///
/// No method retries; every call is issued at most once and errors
/// propagate unchanged.
#[derive(Debug, Clone)]
pub struct ApplianceClient {
    session: ApplianceSession,
    endpoints: Arc<Endpoints>,
}

impl ApplianceClient {
    /// Open an authenticated session against `target`.
    pub async fn open(
        target: ApplianceTarget,
        credentials: &Credentials,
        transport: &TransportConfig,
        endpoints: Arc<Endpoints>,
    ) -> Result<Self, Error> {
        let session = ApplianceSession::open(target, credentials, transport, &endpoints.login).await?;
        Ok(Self { session, endpoints })
    }

    /// Wrap an already-authenticated session.
    pub fn from_session(session: ApplianceSession, endpoints: Arc<Endpoints>) -> Self {
        Self { session, endpoints }
    }

    /// Scoped session: open, run `f`, log out.
    ///
    /// Logout happens on every exit path of `f`, success or error. A
    /// failed logout is logged and does not mask the result of `f`.
    pub async fn oneshot<F, Fut, T, E>(
        target: ApplianceTarget,
        credentials: &Credentials,
        transport: &TransportConfig,
        endpoints: Arc<Endpoints>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(ApplianceClient) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Error>,
    {
        let client = Self::open(target, credentials, transport, endpoints).await?;
        let result = f(client.clone()).await;
        if let Err(e) = client.close().await {
            debug!(error = %e, target = %client.session.target(), "logout failed");
        }
        result
    }

    /// Log out of the appliance.
    pub async fn close(&self) -> Result<(), Error> {
        self.session.close(&self.endpoints.logout).await
    }

    pub fn session(&self) -> &ApplianceSession {
        &self.session
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ── Shared request shapes ────────────────────────────────────────

    /// `GET` an id list.
    async fn fetch_ids(&self, endpoint: &str) -> Result<Vec<WireId>, Error> {
        let reply = self.session.get(endpoint, &[], CheckMode::NoCheck).await?;
        Ok(ids_from_reply(&reply))
    }

    /// `GET` a record list.
    async fn fetch_rows(&self, endpoint: &str) -> Result<Vec<WireRecord>, Error> {
        let reply = self.session.get(endpoint, &[], CheckMode::NoCheck).await?;
        Ok(rows_from_reply(reply))
    }

    /// `POST {"ids": [..]}`.
    async fn post_ids(
        &self,
        endpoint: &str,
        ids: &[WireId],
        check: CheckMode,
    ) -> Result<Value, Error> {
        self.session
            .post_json(endpoint, &json!({ "ids": ids }), check)
            .await
    }

    /// `POST {"rules": [..]}`, returning identifiers the appliance echoed.
    async fn post_records(
        &self,
        endpoint: &str,
        records: &[WireRecord],
    ) -> Result<Vec<WireId>, Error> {
        let reply = self
            .session
            .post_json(endpoint, &json!({ "rules": records }), CheckMode::Range)
            .await?;
        Ok(ids_from_reply(&reply))
    }
}
