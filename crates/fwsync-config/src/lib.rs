//! Configuration for hosts embedding the fwsync engine.
//!
//! One TOML file plus `FWSYNC_`-prefixed environment overrides, password
//! resolution, and translation to `fwsync_core::EngineConfig`. The engine
//! itself never reads files; hosts load a [`Config`] here and hand the
//! result in.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fwsync_api::{Credentials, Endpoints, Scheme};
use fwsync_core::{DeviceStatus, EngineConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no appliance password configured (set appliance.password_env or appliance.password)")]
    NoCredentials,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub appliance: ApplianceSection,

    #[serde(default)]
    pub fleet: FleetSection,

    /// Endpoint name overrides for non-stock firmware. Unset names keep
    /// their stock values.
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// How to reach and log in to every appliance.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApplianceSection {
    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password. Prefer `password_env`.
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// `https` or `http`.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Management port unless a device overrides it.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Skip certificate verification. Unset means skip as well, since
    /// appliances ship self-signed certificates.
    pub insecure: Option<bool>,

    /// Path to a CA certificate for verifying appliances.
    pub ca_cert: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ApplianceSection {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            password_env: None,
            scheme: default_scheme(),
            port: default_port(),
            insecure: None,
            ca_cert: None,
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FleetSection {
    /// Devices worked in parallel by batch operations.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Statuses a batch operation will touch.
    #[serde(default = "default_operable_statuses")]
    pub operable_statuses: Vec<DeviceStatus>,
}

impl Default for FleetSection {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            operable_statuses: default_operable_statuses(),
        }
    }
}

fn default_username() -> String {
    "admin".into()
}
fn default_scheme() -> String {
    "https".into()
}
fn default_port() -> u16 {
    443
}
fn default_timeout() -> u64 {
    30
}
fn default_max_concurrency() -> usize {
    8
}
fn default_operable_statuses() -> Vec<DeviceStatus> {
    vec![DeviceStatus::Online]
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "fwsync", "fwsync").map_or_else(
        || PathBuf::from(".fwsync").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the platform config path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` plus environment. A missing file yields defaults.
///
/// Environment variables use `__` for nesting, e.g.
/// `FWSYNC_APPLIANCE__PORT=8443` or `FWSYNC_FLEET__MAX_CONCURRENCY=16`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FWSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the appliance password: named env var first, then plaintext.
pub fn resolve_password(appliance: &ApplianceSection) -> Result<SecretString, ConfigError> {
    // 1. Env var named by the config
    if let Some(ref env_name) = appliance.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Plaintext in config
    if let Some(ref pw) = appliance.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and build the engine's runtime configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let appliance = &self.appliance;

        let scheme = match appliance.scheme.to_ascii_lowercase().as_str() {
            "https" => Scheme::Https,
            "http" => Scheme::Http,
            other => {
                return Err(invalid(
                    "appliance.scheme",
                    format!("expected 'https' or 'http', got '{other}'"),
                ));
            }
        };
        if appliance.port == 0 {
            return Err(invalid("appliance.port", "must be non-zero"));
        }
        if appliance.timeout == 0 {
            return Err(invalid("appliance.timeout", "must be at least one second"));
        }
        if self.fleet.max_concurrency == 0 {
            return Err(invalid("fleet.max_concurrency", "must be at least 1"));
        }
        if self.fleet.operable_statuses.is_empty() {
            return Err(invalid(
                "fleet.operable_statuses",
                "at least one status is required",
            ));
        }

        let tls = match (appliance.insecure, &appliance.ca_cert) {
            (Some(true), _) => TlsVerification::DangerAcceptInvalid,
            (_, Some(ca_path)) => TlsVerification::CustomCa(ca_path.clone()),
            (Some(false), None) => TlsVerification::SystemDefaults,
            (None, None) => TlsVerification::DangerAcceptInvalid,
        };

        let credentials = Credentials {
            username: appliance.username.clone(),
            password: resolve_password(appliance)?,
        };

        Ok(EngineConfig {
            credentials,
            scheme,
            port: appliance.port,
            tls,
            timeout: Duration::from_secs(appliance.timeout),
            max_concurrency: self.fleet.max_concurrency,
            operable_statuses: self.fleet.operable_statuses.clone(),
            endpoints: Arc::new(self.endpoints.clone()),
        })
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}
