// HTTP client construction for appliance sessions.
//
// Each session gets its own `reqwest::Client` and its own cookie jar;
// appliances never share a session cookie.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;
use reqwest::cookie::Jar;

use crate::error::Error;

/// How the appliance's certificate is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// System certificate store.
    System,
    /// Trust the CA in this PEM file in addition to the system store.
    CustomCa(PathBuf),
    /// Accept any certificate. Appliances ship self-signed.
    DangerAcceptInvalid,
}

impl TlsMode {
    fn configure(&self, builder: ClientBuilder) -> Result<ClientBuilder, Error> {
        Ok(match self {
            Self::System => builder,
            Self::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            Self::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        })
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read CA {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("bad CA {}: {e}", path.display())))
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-call timeout. The only cancellation primitive the engine has.
    pub timeout: Duration,
    /// Jar to share; a fresh one is made per client when unset.
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let jar = self.cookie_jar.clone().unwrap_or_default();
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("fwsync/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(jar);
        self.tls
            .configure(builder)?
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_self_signed_with_thirty_second_timeout() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.cookie_jar.is_none());
    }

    #[test]
    fn client_builds_with_own_or_shared_jar() {
        assert!(TransportConfig::default().build_client().is_ok());
        let shared = TransportConfig {
            cookie_jar: Some(Arc::new(Jar::default())),
            ..TransportConfig::default()
        };
        assert!(shared.build_client().is_ok());
    }

    #[test]
    fn missing_ca_file_is_a_tls_error() {
        let cfg = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/ca.pem")),
            ..TransportConfig::default()
        };
        assert!(matches!(cfg.build_client(), Err(Error::Tls(_))));
    }
}
