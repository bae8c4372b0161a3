use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{
    Res,
    config::ProviderConfig,
    provider::{ProviderAdapter, build_authorization_url, exchange_code, get_json},
    types::{NormalizedAlbum, Provider, TokenResult},
    utils, warning,
};

const PAGE_LIMIT: u32 = 50;
const OPEN_ALBUM_URL: &str = "https://open.spotify.com/album";

#[derive(Debug, Deserialize)]
struct SavedAlbumsPage {
    items: Option<Vec<SavedAlbum>>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SavedAlbum {
    album: Option<SpotifyAlbum>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    id: Option<String>,
    name: Option<String>,
    artists: Option<Vec<SpotifyArtist>>,
    images: Option<Vec<SpotifyImage>>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    id: Option<String>,
}

/// Spotify Web API adapter. Always uses PKCE.
///
/// Saved albums come from `/me/albums` in pages of 50, following the `next`
/// link until it is null.
///
/// # Example
///
/// ```
/// let adapter = SpotifyAdapter::new(config::provider_config(Provider::Spotify)?);
/// let url = adapter.authorization_url(&utils::generate_code_challenge(&verifier))?;
/// // ... browser round trip ...
/// let token = adapter.exchange_token(&code, Some(&verifier)).await?;
/// let albums = adapter.fetch_library(&token).await?;
/// ```
pub struct SpotifyAdapter {
    client: Client,
    cfg: ProviderConfig,
}

impl SpotifyAdapter {
    /// Creates the adapter with its own HTTP client.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Client id, redirect URI, scope and endpoints
    pub fn new(cfg: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    fn normalize(album: SpotifyAlbum) -> NormalizedAlbum {
        let artists = album.artists.unwrap_or_default();
        let artist = utils::join_artists(artists.iter().filter_map(|a| a.name.as_deref()));

        let image = album
            .images
            .unwrap_or_default()
            .into_iter()
            .find_map(|i| i.url)
            .unwrap_or_default();

        let link = album
            .external_urls
            .and_then(|u| u.spotify)
            .or_else(|| album.id.map(|id| format!("{}/{}", OPEN_ALBUM_URL, id)))
            .unwrap_or_default();

        NormalizedAlbum {
            title: album.name.unwrap_or_default(),
            artist,
            image,
            link,
        }
    }
}

#[async_trait]
impl ProviderAdapter for SpotifyAdapter {
    fn provider(&self) -> Provider {
        Provider::Spotify
    }

    fn uses_pkce(&self) -> bool {
        true
    }

    fn authorization_url(&self, challenge: &str) -> Res<Url> {
        build_authorization_url(&self.cfg, Some(challenge))
    }

    async fn exchange_token(&self, code: &str, verifier: Option<&str>) -> Res<TokenResult> {
        exchange_code(&self.client, &self.cfg, code, verifier).await
    }

    async fn fetch_library(&self, token: &TokenResult) -> Res<Vec<NormalizedAlbum>> {
        let mut albums: Vec<NormalizedAlbum> = Vec::new();
        let mut url = Some(format!(
            "{api}/me/albums?limit={limit}",
            api = self.cfg.api_url,
            limit = PAGE_LIMIT
        ));

        // `next` is an absolute URL carrying its own offset
        while let Some(page_url) = url {
            let page: SavedAlbumsPage =
                get_json(&self.client, &page_url, &token.access_token, &[]).await?;

            let Some(items) = page.items else {
                break;
            };
            albums.extend(
                items
                    .into_iter()
                    .filter_map(|i| i.album)
                    .map(Self::normalize),
            );
            url = page.next.filter(|n| !n.is_empty());
        }

        Ok(albums)
    }

    async fn resolve_user_id(&self, token: &TokenResult) -> Option<String> {
        let url = format!("{}/me", self.cfg.api_url);
        match get_json::<CurrentUser>(&self.client, &url, &token.access_token, &[]).await {
            Ok(user) => user.id.filter(|id| !id.is_empty()),
            Err(e) => {
                warning!("Cannot resolve Spotify user id: {}", e);
                None
            }
        }
    }
}
