use std::{fmt, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Music catalog a user can log in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Spotify,
    Tidal,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Spotify, Provider::Tidal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Spotify => "spotify",
            Provider::Tidal => "tidal",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spotify" => Ok(Provider::Spotify),
            "tidal" => Ok(Provider::Tidal),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

/// Result of a successful authorization code exchange.
///
/// Only `access_token` is load-bearing. The rest is kept for completeness and
/// for providers that hand out the user id together with the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResult {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
    pub user_id: Option<String>,
}

/// Provider-agnostic album as every adapter produces it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedAlbum {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub title: String,
    pub artist: String,
    pub link: String,
}

/// Query parameters the provider attaches to the redirect back to us.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}
