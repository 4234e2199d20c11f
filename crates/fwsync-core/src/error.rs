// ── Core error types ──
//
// Errors surfaced by the reconciliation engine. Transport-level detail
// from `fwsync_api` is folded into the taxonomy below; a failure inside a
// reconciliation is wrapped in `Reconcile` so callers know which domain
// and which state transition broke.

use thiserror::Error;

use crate::model::{DeviceId, Domain};
use crate::reconcile::Phase;
use crate::repository::RepositoryError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Appliance unreachable: {message}")]
    ApplianceUnreachable { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Communication error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Communication {
        status: Option<u16>,
        message: String,
    },

    // ── Appliance logic ──────────────────────────────────────────────
    #[error("Appliance rejected {endpoint} (status {code:?}): {message}")]
    ApplianceLogic {
        endpoint: String,
        code: Option<i64>,
        message: String,
    },

    #[error("Unreadable reply: {message}")]
    MalformedReply { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Cannot normalize {domain} record: {message}")]
    Normalization { domain: Domain, message: String },

    #[error("Repository error: {message}")]
    Repository { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    #[error("{domain} {phase} failed: {source}")]
    Reconcile {
        domain: Domain,
        phase: Phase,
        #[source]
        source: Box<CoreError>,
    },

    #[error("{} domain(s) failed on device {device_id}: {summary}", .domains.len())]
    DomainFailures {
        device_id: DeviceId,
        domains: Vec<Domain>,
        summary: String,
    },

    #[error("Batch failed on {} device(s): {}", .failed_device_ids.len(), join_ids(.failed_device_ids))]
    PartialFleetFailure { failed_device_ids: Vec<DeviceId> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_ids(ids: &[DeviceId]) -> String {
    ids.iter()
        .map(DeviceId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CoreError {
    /// The innermost error once `Reconcile` wrappers are peeled off.
    pub fn root(&self) -> &CoreError {
        match self {
            Self::Reconcile { source, .. } => source.root(),
            other => other,
        }
    }

    /// The state transition that failed, for reconciliation errors.
    pub fn failed_phase(&self) -> Option<Phase> {
        match self {
            Self::Reconcile { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Whether re-running the same operation later might succeed.
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            Self::ApplianceUnreachable { .. } | Self::PartialFleetFailure { .. } => true,
            Self::Communication { status, .. } => status.is_none_or(|s| s >= 500),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fwsync_api::Error> for CoreError {
    fn from(err: fwsync_api::Error) -> Self {
        match err {
            fwsync_api::Error::Unreachable { message } => {
                CoreError::ApplianceUnreachable { message }
            }
            fwsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            fwsync_api::Error::Transport(ref e) => {
                if e.is_timeout() || e.is_connect() {
                    CoreError::ApplianceUnreachable {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::Communication {
                        status: e.status().map(|s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            fwsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fwsync_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            fwsync_api::Error::Communication {
                endpoint,
                status,
                body,
            } => CoreError::Communication {
                status: Some(status),
                message: format!("{endpoint}: {body}"),
            },
            fwsync_api::Error::Logic {
                endpoint,
                code,
                message,
            } => CoreError::ApplianceLogic {
                endpoint,
                code,
                message,
            },
            fwsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedReply { message }
            }
            fwsync_api::Error::UnsupportedOperation(op) => CoreError::Unsupported {
                operation: op.to_string(),
                required: "an endpoint for this appliance profile".into(),
            },
        }
    }
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound {
                entity_type,
                identifier,
            } => CoreError::NotFound {
                entity_type: entity_type.to_owned(),
                identifier,
            },
            other => CoreError::Repository {
                message: other.to_string(),
            },
        }
    }
}
