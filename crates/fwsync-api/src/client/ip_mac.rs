// IP-MAC binding endpoints
//
// Bindings are addressed by IP when enabling and by appliance-assigned
// binding id when deleting or deploying; `lookup` bridges the two.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::ApplianceClient;
use crate::endpoints::IpMacEndpoints;
use crate::error::Error;
use crate::models::{WireId, WireRecord, rows_from_reply};
use crate::session::CheckMode;

/// Binding id the appliance assigned to an IP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BindingRef {
    #[serde(rename = "_id")]
    pub id: WireId,
    #[serde(rename = "_ip")]
    pub ip: String,
}

#[derive(Debug, Clone, Copy)]
pub struct IpMacBindings<'a> {
    client: &'a ApplianceClient,
    endpoints: &'a IpMacEndpoints,
}

impl ApplianceClient {
    pub fn ip_mac(&self) -> IpMacBindings<'_> {
        IpMacBindings {
            client: self,
            endpoints: &self.endpoints.ip_mac,
        }
    }
}

impl IpMacBindings<'_> {
    /// Every binding on the appliance, including its `_id`.
    ///
    /// `GET ipmac/list` — `NoCheck`.
    pub async fn list_all(&self) -> Result<Vec<WireRecord>, Error> {
        self.client.fetch_rows(&self.endpoints.list).await
    }

    /// Binding ids currently on the appliance, read from `list_all`.
    pub async fn list_ids(&self) -> Result<Vec<WireId>, Error> {
        Ok(self
            .list_all()
            .await?
            .iter()
            .filter_map(|row| row.get("_id").and_then(WireId::from_value))
            .collect())
    }

    /// Clear the binding table. `action` is passed through to the
    /// appliance unchanged.
    ///
    /// `POST ipmac/clear` form `action=code` — `StatusCheck(0)`.
    pub async fn clear(&self, action: i64) -> Result<(), Error> {
        debug!(action, "clearing ip-mac bindings");
        self.client
            .session
            .post_form(&self.endpoints.clear, &[("action", action)], CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// `POST ipmac/delete` — `StatusCheck(0)`.
    pub async fn delete(&self, ids: &[WireId]) -> Result<(), Error> {
        debug!(count = ids.len(), "deleting ip-mac bindings");
        self.client
            .post_ids(&self.endpoints.delete, ids, CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// `POST ipmac/add` — `RangeCheck`.
    pub async fn add_batch(&self, records: &[WireRecord]) -> Result<Vec<WireId>, Error> {
        debug!(count = records.len(), "adding ip-mac bindings");
        self.client.post_records(&self.endpoints.add, records).await
    }

    /// Enable bindings by IP.
    ///
    /// `POST ipmac/enable` with `{"ips": [..]}` — `StatusCheck(0)`.
    pub async fn enable(&self, ips: &[String]) -> Result<(), Error> {
        debug!(count = ips.len(), "enabling ip-mac bindings");
        self.client
            .session
            .post_json(&self.endpoints.enable, &json!({ "ips": ips }), CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// Resolve IPs to binding ids.
    ///
    /// `POST ipmac/lookup` with `{"ips": [..]}` — `NoCheck`. Rows that do
    /// not carry both `_id` and `_ip` are skipped.
    pub async fn lookup(&self, ips: &[String]) -> Result<Vec<BindingRef>, Error> {
        let reply = self
            .client
            .session
            .post_json(&self.endpoints.lookup, &json!({ "ips": ips }), CheckMode::NoCheck)
            .await?;
        Ok(rows_from_reply(reply)
            .into_iter()
            .filter_map(|row| serde_json::from_value(Value::Object(row)).ok())
            .collect())
    }

    /// Activate bindings by id.
    ///
    /// `POST ipmac/deploy` — `SuccessCheck`.
    pub async fn deploy(&self, ids: &[WireId]) -> Result<(), Error> {
        debug!(count = ids.len(), "deploying ip-mac bindings");
        self.client
            .post_ids(&self.endpoints.deploy, ids, CheckMode::Success)
            .await?;
        Ok(())
    }

    /// Action for traffic from devices with no binding.
    ///
    /// `GET ipmac/unknown_action` — `NoCheck`.
    pub async fn unknown_device_action(&self) -> Result<i64, Error> {
        let reply = self
            .client
            .session
            .get(&self.endpoints.unknown_device_action, &[], CheckMode::NoCheck)
            .await?;
        super::settings::read_code(&self.endpoints.unknown_device_action, &reply, "action")
    }

    /// `POST ipmac/unknown_action` form `action=code` — `StatusCheck(0)`.
    pub async fn set_unknown_device_action(&self, action: i64) -> Result<(), Error> {
        debug!(action, "setting unknown-device action");
        self.client
            .session
            .post_form(
                &self.endpoints.unknown_device_action,
                &[("action", action)],
                CheckMode::Status(0),
            )
            .await?;
        Ok(())
    }
}
