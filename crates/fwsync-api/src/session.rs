// Appliance session
//
// One authenticated channel to a single appliance. Owns the HTTP client
// (and with it the cookie jar), the optional auth token, and the reply
// validation contract every endpoint goes through. Endpoint methods live
// on `ApplianceClient`; this module only knows about transport mechanics.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::status_of;
use crate::transport::TransportConfig;

const TOKEN_HEADER: &str = "X-Auth-Token";

// ── Target ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}

/// Base URL of one appliance. Endpoints resolve to `{base}/api/{endpoint}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceTarget {
    base_url: Url,
}

impl ApplianceTarget {
    /// Build a target from host and port, e.g. `https://10.0.0.5:8443`.
    pub fn new(scheme: Scheme, host: &str, port: u16) -> Result<Self, Error> {
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let base_url = Url::parse(&format!("{scheme}://{host}:{port}"))?;
        Ok(Self { base_url })
    }

    pub fn from_url(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/api/{endpoint}"))?)
    }
}

impl fmt::Display for ApplianceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

/// Login credentials for an appliance.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

// ── Check modes ──────────────────────────────────────────────────────

/// How a 2xx reply body is validated before the caller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Any parseable body is accepted.
    NoCheck,
    /// `status` must equal the given value.
    Status(i64),
    /// `status` must be present and `>= 0`.
    Range,
    /// `success` must be truthy.
    Success,
}

impl CheckMode {
    /// Validate a decoded reply for `endpoint`.
    pub fn verify(self, endpoint: &str, reply: &Value) -> Result<(), Error> {
        let status = status_of(reply);
        let passed = match self {
            Self::NoCheck => true,
            Self::Status(expected) => status == Some(expected),
            Self::Range => status.is_some_and(|s| s >= 0),
            Self::Success => is_truthy(reply.get("success")),
        };
        if passed {
            return Ok(());
        }
        Err(Error::Logic {
            endpoint: endpoint.to_owned(),
            code: status,
            message: reply_message(reply).unwrap_or_else(|| format!("{self:?} failed")),
        })
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1" | "ok"),
        _ => false,
    }
}

fn reply_message(reply: &Value) -> Option<String> {
    ["msg", "message", "error"]
        .iter()
        .find_map(|k| reply.get(*k).and_then(Value::as_str))
        .map(String::from)
}

/// Decode a reply body that may be native JSON or a JSON string holding JSON.
///
/// A string whose content is not itself JSON is returned as a plain string.
pub fn decode_body(body: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str::<Value>(body)? {
        Value::String(inner) => Ok(serde_json::from_str(&inner).unwrap_or(Value::String(inner))),
        other => Ok(other),
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

// ── Session ──────────────────────────────────────────────────────────

/// Authenticated channel to a single appliance.
///
/// Cheap to clone: the HTTP client and token are shared. Created per
/// reconciliation attempt and closed when the attempt ends; see
/// [`ApplianceClient::oneshot`](crate::ApplianceClient::oneshot) for the
/// scoped form.
#[derive(Clone)]
pub struct ApplianceSession {
    http: reqwest::Client,
    target: ApplianceTarget,
    token: Arc<RwLock<Option<String>>>,
}

impl fmt::Debug for ApplianceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplianceSession")
            .field("target", &self.target.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApplianceSession {
    /// Log in to the appliance. Must succeed before any other call.
    ///
    /// Connect and timeout failures surface as [`Error::Unreachable`];
    /// anything the appliance says back that is not an accepted login
    /// surfaces as [`Error::Authentication`].
    pub async fn open(
        target: ApplianceTarget,
        credentials: &Credentials,
        transport: &TransportConfig,
        login_endpoint: &str,
    ) -> Result<Self, Error> {
        let session = Self {
            http: transport.build_client()?,
            target,
            token: Arc::new(RwLock::new(None)),
        };
        session.login(credentials, login_endpoint).await?;
        Ok(session)
    }

    pub fn target(&self) -> &ApplianceTarget {
        &self.target
    }

    async fn login(&self, credentials: &Credentials, endpoint: &str) -> Result<(), Error> {
        let url = self.target.endpoint_url(endpoint)?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": credentials.username,
            "password": credentials.password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::from_send)?;

        let status = resp.status();
        self.capture_token(resp.headers());
        let text = resp.text().await.map_err(Error::from_send)?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&text)),
            });
        }

        let reply = decode_body(&text).map_err(|e| Error::Authentication {
            message: format!("unreadable login reply: {e}"),
        })?;
        CheckMode::Status(0)
            .verify(endpoint, &reply)
            .map_err(|e| Error::Authentication {
                message: e.to_string(),
            })?;

        if let Some(token) = reply.get("token").and_then(Value::as_str) {
            self.set_token(token.to_owned());
        }

        debug!("login successful");
        Ok(())
    }

    /// End the session. Errors are returned but callers usually only log them.
    pub async fn close(&self, logout_endpoint: &str) -> Result<(), Error> {
        let url = self.target.endpoint_url(logout_endpoint)?;
        debug!("logging out at {}", url);
        let _resp = self
            .apply_token(self.http.post(url))
            .send()
            .await
            .map_err(Error::from_send)?;
        Ok(())
    }

    // ── Token management ─────────────────────────────────────────────

    fn set_token(&self, token: String) {
        trace!("storing auth token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn capture_token(&self, headers: &reqwest::header::HeaderMap) {
        if let Some(token) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
            self.set_token(token.to_owned());
        }
    }

    fn apply_token(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    // ── Request primitives ───────────────────────────────────────────

    /// `GET /api/{endpoint}` with query parameters.
    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        check: CheckMode,
    ) -> Result<Value, Error> {
        let url = self.target.endpoint_url(endpoint)?;
        debug!("GET {}", url);
        self.execute(endpoint, self.http.get(url).query(params), check)
            .await
    }

    /// `POST /api/{endpoint}` with a JSON body.
    pub async fn post_json(
        &self,
        endpoint: &str,
        body: &(impl Serialize + Sync),
        check: CheckMode,
    ) -> Result<Value, Error> {
        let url = self.target.endpoint_url(endpoint)?;
        debug!("POST {}", url);
        self.execute(endpoint, self.http.post(url).json(body), check)
            .await
    }

    /// `POST /api/{endpoint}` with a form-encoded body.
    pub async fn post_form(
        &self,
        endpoint: &str,
        form: &(impl Serialize + Sync),
        check: CheckMode,
    ) -> Result<Value, Error> {
        let url = self.target.endpoint_url(endpoint)?;
        debug!("POST (form) {}", url);
        self.execute(endpoint, self.http.post(url).form(form), check)
            .await
    }

    async fn execute(
        &self,
        endpoint: &str,
        builder: reqwest::RequestBuilder,
        check: CheckMode,
    ) -> Result<Value, Error> {
        let resp = self
            .apply_token(builder)
            .send()
            .await
            .map_err(Error::from_send)?;

        let status = resp.status();
        self.capture_token(resp.headers());

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Communication {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let body = resp.text().await.map_err(Error::from_send)?;
        if check == CheckMode::NoCheck && body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let reply = decode_body(&body).map_err(|e| Error::Deserialization {
            message: format!("{endpoint}: {e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;
        trace!(endpoint, %reply, "reply");

        check.verify(endpoint, &reply)?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_and_double_encoded_bodies_decode_alike() {
        let native = decode_body(r#"{"status": 0}"#).expect("native");
        let double = decode_body(r#""{\"status\": 0}""#).expect("double");
        assert_eq!(native, double);
        assert_eq!(native, json!({"status": 0}));
    }

    #[test]
    fn plain_json_string_stays_a_string() {
        assert_eq!(decode_body(r#""done""#).expect("string"), json!("done"));
    }

    #[test]
    fn garbage_body_fails_to_decode() {
        assert!(decode_body("<html>").is_err());
    }

    #[test]
    fn status_check_requires_exact_match() {
        assert!(CheckMode::Status(0).verify("x", &json!({"status": 0})).is_ok());
        let err = CheckMode::Status(0)
            .verify("x", &json!({"status": 2, "msg": "busy"}))
            .expect_err("mismatch");
        assert_eq!(err.logic_code(), Some(2));
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn range_check_accepts_non_negative_only() {
        assert!(CheckMode::Range.verify("x", &json!({"status": 3})).is_ok());
        assert!(CheckMode::Range.verify("x", &json!({"status": 0})).is_ok());
        assert!(CheckMode::Range.verify("x", &json!({"status": -1})).is_err());
        assert!(CheckMode::Range.verify("x", &json!({})).is_err());
    }

    #[test]
    fn success_check_reads_truthy_values() {
        assert!(CheckMode::Success.verify("x", &json!({"success": true})).is_ok());
        assert!(CheckMode::Success.verify("x", &json!({"success": 1})).is_ok());
        let err = CheckMode::Success
            .verify("x", &json!({"success": false, "status": -7}))
            .expect_err("falsy");
        assert_eq!(err.logic_code(), Some(-7));
    }

    #[test]
    fn no_check_accepts_anything() {
        assert!(CheckMode::NoCheck.verify("x", &json!([1, 2])).is_ok());
    }

    #[test]
    fn target_builds_api_urls() {
        let target = ApplianceTarget::new(Scheme::Https, "10.0.0.5", 8443).expect("target");
        let url = target.endpoint_url("rule/ids").expect("url");
        assert_eq!(url.as_str(), "https://10.0.0.5:8443/api/rule/ids");
    }

    #[test]
    fn target_brackets_ipv6_hosts() {
        let target = ApplianceTarget::new(Scheme::Http, "fe80::1", 80).expect("target");
        assert_eq!(target.base_url().host_str(), Some("[fe80::1]"));
    }
}
