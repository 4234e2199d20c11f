// Remote endpoint table
//
// Every endpoint name the client can call, grouped by strategy domain.
// The table is an immutable value handed to `ApplianceClient` at
// construction; firmware variants override individual groups through
// configuration instead of patching constants.

use serde::{Deserialize, Serialize};

/// Endpoints shared by the four plain rule-list domains
/// (five-tuple, whitelist, Modbus, S7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetEndpoints {
    pub ids: String,
    pub list: String,
    pub disable: String,
    pub enable: String,
    pub delete: String,
    pub add: String,
}

impl RuleSetEndpoints {
    /// Stock endpoint names under a common prefix, e.g. `modbus/ids`.
    pub fn under(prefix: &str) -> Self {
        Self {
            ids: format!("{prefix}/ids"),
            list: format!("{prefix}/list"),
            disable: format!("{prefix}/disable"),
            enable: format!("{prefix}/enable"),
            delete: format!("{prefix}/delete"),
            add: format!("{prefix}/add"),
        }
    }
}

/// Endpoints for the fixed-signature domains (blacklist, learned whitelist)
/// where rules are never deleted, only re-labelled and toggled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictEndpoints {
    pub ids: String,
    pub set_action: String,
    pub enable: String,
    pub disable: String,
    /// Only the learned whitelist has a deploy step.
    #[serde(default)]
    pub deploy: Option<String>,
}

impl VerdictEndpoints {
    pub fn under(prefix: &str, with_deploy: bool) -> Self {
        Self {
            ids: format!("{prefix}/ids"),
            set_action: format!("{prefix}/action"),
            enable: format!("{prefix}/enable"),
            disable: format!("{prefix}/disable"),
            deploy: with_deploy.then(|| format!("{prefix}/deploy")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpMacEndpoints {
    pub list: String,
    pub clear: String,
    pub delete: String,
    pub add: String,
    pub enable: String,
    pub lookup: String,
    pub deploy: String,
    pub unknown_device_action: String,
}

impl Default for IpMacEndpoints {
    fn default() -> Self {
        Self {
            list: "ipmac/list".into(),
            clear: "ipmac/clear".into(),
            delete: "ipmac/delete".into(),
            add: "ipmac/add".into(),
            enable: "ipmac/enable".into(),
            lookup: "ipmac/lookup".into(),
            deploy: "ipmac/deploy".into(),
            unknown_device_action: "ipmac/unknown_action".into(),
        }
    }
}

/// Singleton settings. Each name serves GET (read) and POST (write).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsEndpoints {
    pub connection_mode: String,
    pub default_action: String,
    pub protocol_default_action: String,
    pub opc_mode: String,
}

impl Default for SettingsEndpoints {
    fn default() -> Self {
        Self {
            connection_mode: "config/connection_mode".into(),
            default_action: "config/default_action".into(),
            protocol_default_action: "dpi/default_action".into(),
            opc_mode: "opc/rw_mode".into(),
        }
    }
}

/// Full endpoint table for one appliance firmware profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub logout: String,
    pub reboot: String,
    pub unregister: String,
    pub five_tuple: RuleSetEndpoints,
    pub whitelist: RuleSetEndpoints,
    pub modbus: RuleSetEndpoints,
    pub s7: RuleSetEndpoints,
    pub learned_whitelist: VerdictEndpoints,
    pub blacklist: VerdictEndpoints,
    pub ip_mac: IpMacEndpoints,
    pub settings: SettingsEndpoints,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "login".into(),
            logout: "logout".into(),
            reboot: "system/reboot".into(),
            unregister: "system/unregister".into(),
            five_tuple: RuleSetEndpoints::under("rule"),
            whitelist: RuleSetEndpoints::under("whitelist"),
            modbus: RuleSetEndpoints::under("modbus"),
            s7: RuleSetEndpoints::under("s7"),
            learned_whitelist: VerdictEndpoints::under("learned", true),
            blacklist: VerdictEndpoints::under("blacklist", false),
            ip_mac: IpMacEndpoints::default(),
            settings: SettingsEndpoints::default(),
        }
    }
}
