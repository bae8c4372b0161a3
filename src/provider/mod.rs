//! # Provider Module
//!
//! One adapter per music catalog. Every adapter knows how to
//!
//! - build the authorization URL the browser is sent to,
//! - exchange the returned authorization code for an access token,
//! - fetch the saved album library and normalize it into [`NormalizedAlbum`].
//!
//! The adapters share the request plumbing in this module and only differ in
//! endpoints, pagination and how a raw record maps to a normalized album.
//!
//! ```text
//! Session (flow controller)
//!     ↓
//! ProviderAdapter ── SpotifyAdapter  (PKCE, `next` link pagination)
//!                 └─ TidalAdapter    (PKCE or client secret, offset pagination)
//!     ↓
//! reqwest
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::time::sleep;

use crate::{
    Res,
    config::{self, ProviderConfig},
    error::Error,
    types::{NormalizedAlbum, Provider, TokenResult},
    warning,
};

mod spotify;
mod tidal;

pub use spotify::SpotifyAdapter;
pub use tidal::TidalAdapter;

/// Longest `Retry-After` we are willing to sit out.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Rate-limited answers tolerated for a single request before giving up.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Capability set every catalog integration implements.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Whether the token exchange carries a `code_verifier`.
    fn uses_pkce(&self) -> bool;

    /// Authorization endpoint URL for this attempt. Pure, the caller persists
    /// the verifier before navigating.
    fn authorization_url(&self, challenge: &str) -> Res<Url>;

    /// Trades the authorization code for an access token.
    ///
    /// `verifier` is `None` for verifier-less exchanges.
    async fn exchange_token(&self, code: &str, verifier: Option<&str>) -> Res<TokenResult>;

    /// Fetches every saved album, following pagination until exhausted.
    async fn fetch_library(&self, token: &TokenResult) -> Res<Vec<NormalizedAlbum>>;

    /// User id as the album cache knows it, if it can be determined
    /// client-side.
    async fn resolve_user_id(&self, token: &TokenResult) -> Option<String>;
}

/// Creates the adapter for `provider` from the environment configuration.
pub fn adapter_from_env(provider: Provider) -> Res<Box<dyn ProviderAdapter>> {
    let cfg = config::provider_config(provider)?;
    Ok(adapter_for(provider, cfg))
}

pub fn adapter_for(provider: Provider, cfg: ProviderConfig) -> Box<dyn ProviderAdapter> {
    match provider {
        Provider::Spotify => Box::new(SpotifyAdapter::new(cfg)),
        Provider::Tidal => Box::new(TidalAdapter::new(cfg)),
    }
}

pub(crate) fn build_authorization_url(cfg: &ProviderConfig, challenge: Option<&str>) -> Res<Url> {
    let mut params: Vec<(&str, &str)> = vec![
        ("client_id", cfg.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", cfg.redirect_uri.as_str()),
    ];
    if let Some(challenge) = challenge {
        params.push(("code_challenge_method", "S256"));
        params.push(("code_challenge", challenge));
    }
    params.push(("scope", cfg.scope.as_str()));

    Url::parse_with_params(&cfg.auth_url, &params)
        .map_err(|e| Error::Config(format!("Invalid authorization URL {}: {}", cfg.auth_url, e)))
}

#[derive(Debug, Deserialize)]
struct RawToken {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
    user_id: Option<Value>,
}

/// Form-encoded `authorization_code` grant against the provider token
/// endpoint.
pub(crate) async fn exchange_code(
    client: &Client,
    cfg: &ProviderConfig,
    code: &str,
    verifier: Option<&str>,
) -> Res<TokenResult> {
    let mut form: Vec<(&str, &str)> = vec![
        ("client_id", cfg.client_id.as_str()),
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", cfg.redirect_uri.as_str()),
    ];
    if let Some(verifier) = verifier {
        form.push(("code_verifier", verifier));
    }

    let mut request = client.post(&cfg.token_url).form(&form);
    if verifier.is_none() {
        if let Some(secret) = &cfg.client_secret {
            request = request.basic_auth(&cfg.client_id, Some(secret));
        }
    }

    let res = request
        .send()
        .await
        .map_err(|e| Error::AuthExchange(e.to_string()))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| Error::AuthExchange(e.to_string()))?;
    if !status.is_success() {
        return Err(Error::AuthExchange(format!("{}: {}", status, body)));
    }

    parse_token(&body)
}

pub(crate) fn parse_token(body: &str) -> Res<TokenResult> {
    let raw: RawToken = serde_json::from_str(body)
        .map_err(|e| Error::AuthExchange(format!("Malformed token response: {}", e)))?;

    let access_token = raw
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::AuthExchange("Token response has no access_token".to_string()))?;

    Ok(TokenResult {
        access_token,
        refresh_token: raw.refresh_token,
        expires_in: raw.expires_in,
        scope: raw.scope,
        user_id: raw.user_id.as_ref().and_then(id_to_string),
    })
}

/// Ids show up as strings or numbers depending on the provider.
pub(crate) fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Authenticated GET that decodes the JSON body into `T`.
///
/// A 429 with a reasonable `Retry-After` is waited out and retried up to
/// [`MAX_RATE_LIMIT_RETRIES`] times. Every other non-success status, and a
/// 429 past that limit, is a [`Error::LibraryFetch`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    token: &str,
    query: &[(&str, String)],
) -> Res<T> {
    let mut retries = 0;
    loop {
        let request: RequestBuilder = client.get(url).bearer_auth(token).query(query);
        let response = request
            .send()
            .await
            .map_err(|e| Error::LibraryFetch(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(1);
            if retries >= MAX_RATE_LIMIT_RETRIES {
                return Err(Error::LibraryFetch(format!(
                    "Still rate limited by {} after {} retries",
                    url, retries
                )));
            }
            if retry_after <= MAX_RETRY_AFTER_SECS {
                retries += 1;
                sleep(Duration::from_secs(retry_after)).await;
                continue;
            }
            warning!(
                "Retry after has reached an abnormal high of {} seconds.",
                retry_after
            );
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::LibraryFetch(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::LibraryFetch(format!("{} {}: {}", status, url, body)));
        }

        return serde_json::from_str::<T>(&body)
            .map_err(|e| Error::LibraryFetch(format!("Malformed response from {}: {}", url, e)));
    }
}
