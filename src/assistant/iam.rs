//! IAM API-key authentication.
//!
//! Exchanges the instance API key for a short-lived bearer token and
//! caches it. The token is refreshed once 80% of its lifetime is gone.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

const TOKEN_PATH: &str = "/identity/token";
const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds.
    expires_in: i64,
}

struct CachedToken {
    value: SecretString,
    refresh_at: DateTime<Utc>,
}

impl CachedToken {
    /// A lifetime that doesn't fit in a timestamp leaves the token stale
    /// from the start, so the next call fetches a new one.
    fn from_response(resp: TokenResponse, now: DateTime<Utc>) -> Self {
        let lifetime = resp.expires_in.max(0);
        let refresh_at = Duration::try_seconds(lifetime - lifetime / 5)
            .and_then(|usable| now.checked_add_signed(usable))
            .unwrap_or(now);
        Self {
            value: SecretString::from(resp.access_token),
            refresh_at,
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_at
    }
}

/// Bearer-token source for the assistant API.
pub struct IamAuthenticator {
    api_key: SecretString,
    token_url: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl IamAuthenticator {
    /// `auth_url` is the IAM base (e.g. `https://iam.cloud.ibm.com`) or the
    /// full token endpoint.
    pub fn new(api_key: SecretString, auth_url: &str, http: reqwest::Client) -> Self {
        Self {
            api_key,
            token_url: token_url(auth_url),
            http,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a new one if the cached one is stale.
    pub async fn token(&self) -> Result<SecretString> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn request_token(&self) -> Result<CachedToken> {
        debug!(url = %self.token_url, "requesting IAM token");

        let resp = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", GRANT_TYPE),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("token request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::Auth(format!("bad token response: {e}")))?;

        Ok(CachedToken::from_response(token, Utc::now()))
    }
}

fn token_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with(TOKEN_PATH) {
        base.to_string()
    } else {
        format!("{base}{TOKEN_PATH}")
    }
}
