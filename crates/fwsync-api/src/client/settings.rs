// Singleton setting endpoints
//
// Mode/enum settings with exactly one value per appliance. Getters read a
// numeric code out of the reply; setters post it form-encoded.

use serde_json::Value;
use tracing::debug;

use crate::client::ApplianceClient;
use crate::error::Error;
use crate::session::CheckMode;

/// Read a numeric code from `field` (or `data.field`) of a getter reply.
pub(crate) fn read_code(endpoint: &str, reply: &Value, field: &str) -> Result<i64, Error> {
    let raw = reply
        .get(field)
        .or_else(|| reply.get("data").and_then(|d| d.get(field)))
        .ok_or_else(|| Error::Deserialization {
            message: format!("{endpoint}: reply has no '{field}'"),
            body: reply.to_string(),
        })?;
    let code = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    code.ok_or_else(|| Error::Deserialization {
        message: format!("{endpoint}: '{field}' is not an integer code"),
        body: reply.to_string(),
    })
}

impl ApplianceClient {
    async fn get_code(&self, endpoint: &str, field: &str) -> Result<i64, Error> {
        let reply = self.session.get(endpoint, &[], CheckMode::NoCheck).await?;
        read_code(endpoint, &reply, field)
    }

    async fn set_code(&self, endpoint: &str, field: &str, code: i64) -> Result<(), Error> {
        debug!(endpoint, code, "writing setting");
        self.session
            .post_form(endpoint, &[(field, code)], CheckMode::Status(0))
            .await?;
        Ok(())
    }

    /// `GET config/connection_mode` — `NoCheck`, field `mode`.
    pub async fn connection_mode(&self) -> Result<i64, Error> {
        self.get_code(&self.endpoints.settings.connection_mode, "mode")
            .await
    }

    /// `POST config/connection_mode` form `mode=code` — `StatusCheck(0)`.
    pub async fn set_connection_mode(&self, mode: i64) -> Result<(), Error> {
        self.set_code(&self.endpoints.settings.connection_mode, "mode", mode)
            .await
    }

    /// Default action for traffic no packet-filter rule matched.
    ///
    /// `GET config/default_action` — `NoCheck`, field `action`.
    pub async fn default_action(&self) -> Result<i64, Error> {
        self.get_code(&self.endpoints.settings.default_action, "action")
            .await
    }

    /// `POST config/default_action` form `action=code` — `StatusCheck(0)`.
    pub async fn set_default_action(&self, action: i64) -> Result<(), Error> {
        self.set_code(&self.endpoints.settings.default_action, "action", action)
            .await
    }

    /// Default action of the industrial-protocol (DPI) filter.
    ///
    /// `GET dpi/default_action` — `NoCheck`, field `action`.
    pub async fn protocol_default_action(&self) -> Result<i64, Error> {
        self.get_code(&self.endpoints.settings.protocol_default_action, "action")
            .await
    }

    /// `POST dpi/default_action` form `action=code` — `StatusCheck(0)`.
    pub async fn set_protocol_default_action(&self, action: i64) -> Result<(), Error> {
        self.set_code(
            &self.endpoints.settings.protocol_default_action,
            "action",
            action,
        )
        .await
    }

    /// OPC read/write enforcement mode.
    ///
    /// `GET opc/rw_mode` — `NoCheck`, field `mode`.
    pub async fn opc_mode(&self) -> Result<i64, Error> {
        self.get_code(&self.endpoints.settings.opc_mode, "mode").await
    }

    /// `POST opc/rw_mode` form `mode=code` — `StatusCheck(0)`.
    pub async fn set_opc_mode(&self, mode: i64) -> Result<(), Error> {
        self.set_code(&self.endpoints.settings.opc_mode, "mode", mode)
            .await
    }
}
