//! Configuration management for pickmytunes.
//!
//! Values are read from environment variables. A `.env` file in the local
//! data directory is loaded first so users can keep their client ids there:
//! - Linux: `~/.local/share/pickmytunes/.env`
//! - macOS: `~/Library/Application Support/pickmytunes/.env`
//! - Windows: `%LOCALAPPDATA%/pickmytunes/.env`
//!
//! Every provider endpoint has a default, only the client id and the redirect
//! URI have to be supplied.

use std::{env, path::PathBuf};

use crate::{Res, error::Error, types::Provider};

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_PICK_COUNT: usize = 3;

pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_SCOPE: &str = "user-library-read";

pub const TIDAL_AUTH_URL: &str = "https://login.tidal.com/authorize";
pub const TIDAL_TOKEN_URL: &str = "https://auth.tidal.com/v1/oauth2/token";
pub const TIDAL_API_URL: &str = "https://api.tidal.com/v1";
pub const TIDAL_SCOPE: &str = "collection.read";
pub const TIDAL_COUNTRY_CODE: &str = "US";

/// Everything an adapter needs to talk to one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    /// Only used by verifier-less exchanges.
    pub client_secret: Option<String>,
    /// Must match the URI registered with the provider exactly.
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub use_pkce: bool,
    pub country_code: String,
}

/// Loads environment variables from `pickmytunes/.env` in the local data
/// directory.
///
/// The directory is created if needed. A missing `.env` file is fine since
/// all values can come from the process environment as well.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("pickmytunes");
    path
}

fn env_path() -> PathBuf {
    data_dir().join(".env")
}

/// Address the local callback server binds to, e.g. `127.0.0.1:8888`.
pub fn server_addr() -> String {
    env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Number of albums shown per pick.
pub fn pick_count() -> usize {
    env::var("PICKMYTUNES_PICK_COUNT")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PICK_COUNT)
}

/// Base URL of the album cache backend, if one is configured.
pub fn cache_url() -> Option<String> {
    env::var("PICKMYTUNES_CACHE_URL")
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}

/// Builds the configuration for `provider` from the environment.
///
/// # Errors
///
/// Returns [`Error::Config`] when the client id or redirect URI is missing.
pub fn provider_config(provider: Provider) -> Res<ProviderConfig> {
    match provider {
        Provider::Spotify => Ok(ProviderConfig {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: None,
            redirect_uri: required("SPOTIFY_REDIRECT_URI")?,
            scope: env_or("SPOTIFY_SCOPE", SPOTIFY_SCOPE),
            auth_url: env_or("SPOTIFY_AUTH_URL", SPOTIFY_AUTH_URL),
            token_url: env_or("SPOTIFY_TOKEN_URL", SPOTIFY_TOKEN_URL),
            api_url: env_or("SPOTIFY_API_URL", SPOTIFY_API_URL),
            use_pkce: true,
            country_code: String::new(),
        }),
        Provider::Tidal => Ok(ProviderConfig {
            client_id: required("TIDAL_CLIENT_ID")?,
            client_secret: optional("TIDAL_CLIENT_SECRET"),
            redirect_uri: required("TIDAL_REDIRECT_URI")?,
            scope: env_or("TIDAL_SCOPE", TIDAL_SCOPE),
            auth_url: env_or("TIDAL_AUTH_URL", TIDAL_AUTH_URL),
            token_url: env_or("TIDAL_TOKEN_URL", TIDAL_TOKEN_URL),
            api_url: env_or("TIDAL_API_URL", TIDAL_API_URL),
            use_pkce: parse_flag(optional("TIDAL_USE_PKCE").as_deref(), true),
            country_code: env_or("TIDAL_COUNTRY_CODE", TIDAL_COUNTRY_CODE),
        }),
    }
}

/// Interprets the usual spellings of a boolean switch.
pub fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn required(key: &str) -> Res<String> {
    optional(key).ok_or_else(|| Error::Config(format!("{} must be set", key)))
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}
