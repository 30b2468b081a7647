//! Apple Push Notification service transport using token-based auth.
//!
//! Requests are signed with a short-lived ES256 provider token built from
//! the team's `.p8` key. Apple rejects tokens older than an hour and
//! throttles tokens refreshed more often than every 20 minutes, so a token
//! is reused for [`TOKEN_LIFETIME`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use super::{token_preview, PushTransport};
use crate::{PushError, PushMessage};

const PRODUCTION_HOST: &str = "https://api.push.apple.com";
const SANDBOX_HOST: &str = "https://api.sandbox.push.apple.com";

/// How long a signed provider token is reused.
const TOKEN_LIFETIME: Duration = Duration::from_secs(50 * 60);

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// APNs credentials.
#[derive(Debug, Clone)]
pub struct ApnsConfig {
    pub key_id: String,
    pub team_id: String,
    pub key_path: String,
    /// App bundle id, used as the `apns-topic`.
    pub bundle_id: String,
    pub production: bool,
}

impl ApnsConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var          | Default  |
    /// |------------------|----------|
    /// | `APN_KEY_ID`     | --       |
    /// | `APN_TEAM_ID`    | --       |
    /// | `APN_KEY_PATH`   | --       |
    /// | `APN_BUNDLE_ID`  | --       |
    /// | `APN_PRODUCTION` | `false`  |
    ///
    /// Returns `None` when any of the first four is unset, in which case the
    /// caller should fall back to [`crate::LogOnlyTransport`].
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            key_id: var("APN_KEY_ID")?,
            team_id: var("APN_TEAM_ID")?,
            key_path: var("APN_KEY_PATH")?,
            bundle_id: var("APN_BUNDLE_ID")?,
            production: var("APN_PRODUCTION").is_some_and(|v| v == "true" || v == "1"),
        })
    }

    fn host(&self) -> &'static str {
        if self.production {
            PRODUCTION_HOST
        } else {
            SANDBOX_HOST
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ProviderClaims<'a> {
    iss: &'a str,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct ApnsErrorBody {
    reason: String,
}

struct CachedToken {
    token: String,
    issued: Instant,
}

/// Sends alerts through APNs.
pub struct ApnsTransport {
    client: reqwest::Client,
    config: ApnsConfig,
    key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

/// APNs only speaks HTTP/2. rustls advertises `h2` through ALPN, which
/// the default native-tls backend does not.
fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .http2_prior_knowledge()
        .timeout(REQUEST_TIMEOUT)
        .build()
}

impl ApnsTransport {
    /// Read the `.p8` key from `config.key_path` and build the transport.
    pub async fn new(config: ApnsConfig) -> Result<Self, PushError> {
        let pem = tokio::fs::read(&config.key_path).await.map_err(|e| {
            PushError::Config(format!("cannot read APNs key {}: {e}", config.key_path))
        })?;
        Self::from_pem(config, &pem)
    }

    pub fn from_pem(config: ApnsConfig, pem: &[u8]) -> Result<Self, PushError> {
        let key = EncodingKey::from_ec_pem(pem)?;
        let client = http_client()?;
        Ok(Self {
            client,
            config,
            key,
            token: Mutex::new(None),
        })
    }

    /// Current provider token, re-signed once [`TOKEN_LIFETIME`] has passed.
    async fn provider_token(&self) -> Result<String, PushError> {
        let mut cached = self.token.lock().await;
        if let Some(existing) = cached.as_ref() {
            if existing.issued.elapsed() < TOKEN_LIFETIME {
                return Ok(existing.token.clone());
            }
        }

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.clone());
        let claims = ProviderClaims {
            iss: &self.config.team_id,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = encode(&header, &claims, &self.key)?;
        *cached = Some(CachedToken {
            token: token.clone(),
            issued: Instant::now(),
        });
        Ok(token)
    }
}

/// Build the APNs JSON body: `aps` plus the message data merged at top level.
pub fn apns_payload(message: &PushMessage) -> serde_json::Value {
    let mut payload = json!({
        "aps": {
            "alert": { "title": message.title, "body": message.body },
            "sound": "default",
            "badge": 1,
            "category": message.category,
            "content-available": 1,
        }
    });
    if let (Some(target), Some(data)) = (payload.as_object_mut(), message.data.as_object()) {
        for (key, value) in data {
            if key != "aps" {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    payload
}

#[async_trait]
impl PushTransport for ApnsTransport {
    fn name(&self) -> &'static str {
        "apns"
    }

    async fn send(&self, device_token: &str, message: &PushMessage) -> Result<(), PushError> {
        let token = self.provider_token().await?;
        let response = self
            .client
            .post(format!("{}/3/device/{device_token}", self.config.host()))
            .header("authorization", format!("bearer {token}"))
            .header("apns-topic", &self.config.bundle_id)
            .header("apns-push-type", "alert")
            .header("apns-priority", "10")
            .json(&apns_payload(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(device = token_preview(device_token), kind = message.kind(), "APNs accepted notification");
            return Ok(());
        }

        let reason = response
            .json::<ApnsErrorBody>()
            .await
            .map(|b| b.reason)
            .unwrap_or_else(|_| "unknown".to_string());
        if status.as_u16() == 410 || reason == "BadDeviceToken" || reason == "Unregistered" {
            return Err(PushError::Unregistered);
        }
        Err(PushError::Rejected {
            status: status.as_u16(),
            reason,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
