use thiserror::Error;

/// Top-level error type for the `fwsync-api` crate.
///
/// Covers every failure mode of a single appliance session: reaching the
/// appliance, logging in, the HTTP exchange itself, and the body checks
/// applied to each reply. `fwsync-core` maps these into the reconciliation
/// error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connectivity ────────────────────────────────────────────────
    /// Network or TLS failure before any HTTP reply arrived.
    #[error("Appliance unreachable: {message}")]
    Unreachable { message: String },

    /// Login rejected by the appliance.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error that is neither a connect nor a timeout failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration error (CA file, client builder).
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status from an endpoint.
    #[error("{endpoint}: HTTP {status}: {body}")]
    Communication {
        endpoint: String,
        status: u16,
        body: String,
    },

    // ── Appliance logic ─────────────────────────────────────────────
    /// HTTP succeeded but the body failed the endpoint's check mode.
    /// `code` is the appliance's own `status` value when the body had one.
    #[error("{endpoint} rejected by appliance (status {code:?}): {message}")]
    Logic {
        endpoint: String,
        code: Option<i64>,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// Reply body could not be decoded, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Operation has no endpoint on this appliance profile.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl Error {
    /// Returns `true` if re-running the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Communication { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The appliance's own status code for a rejected request.
    pub fn logic_code(&self) -> Option<i64> {
        match self {
            Self::Logic { code, .. } => *code,
            _ => None,
        }
    }

    /// Classify a `reqwest` send failure: connect and timeout failures mean
    /// the appliance was never reached.
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable {
                message: err.to_string(),
            }
        } else {
            Self::Transport(err)
        }
    }
}
