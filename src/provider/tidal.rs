use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Res,
    config::ProviderConfig,
    error::Error,
    provider::{
        ProviderAdapter, build_authorization_url, exchange_code, get_json, id_to_string,
    },
    types::{NormalizedAlbum, Provider, TokenResult},
    utils, warning,
};

const PAGE_LIMIT: usize = 50;
const IMAGE_BASE_URL: &str = "https://resources.tidal.com/images";
const IMAGE_SIZE: &str = "640x640";
const BROWSE_ALBUM_URL: &str = "https://tidal.com/browse/album";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteAlbumsPage {
    items: Option<Vec<FavoriteAlbum>>,
    total_number_of_items: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FavoriteAlbum {
    item: Option<TidalAlbum>,
}

#[derive(Debug, Deserialize)]
struct TidalAlbum {
    id: Option<Value>,
    title: Option<String>,
    artists: Option<Vec<TidalArtist>>,
    artist: Option<TidalArtist>,
    cover: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TidalArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    user_id: Option<Value>,
}

/// Tidal adapter.
///
/// Depending on configuration the exchange is either PKCE or a confidential
/// client exchange without verifier, authenticated with HTTP Basic client
/// credentials.
///
/// The favorites endpoint is paged by `offset`. Paging stops at an empty
/// page or once `totalNumberOfItems` albums have been received.
///
/// # Example
///
/// ```
/// let adapter = TidalAdapter::new(config::provider_config(Provider::Tidal)?);
/// let token = adapter.exchange_token(&code, adapter.uses_pkce().then_some(&verifier)).await?;
/// let albums = adapter.fetch_library(&token).await?;
/// ```
pub struct TidalAdapter {
    client: Client,
    cfg: ProviderConfig,
}

impl TidalAdapter {
    /// Creates the adapter with its own HTTP client.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Client credentials, endpoints, country code and whether the
    ///   exchange uses PKCE
    pub fn new(cfg: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    fn cover_url(cover: &str) -> String {
        format!(
            "{base}/{path}/{size}.jpg",
            base = IMAGE_BASE_URL,
            path = cover.replace('-', "/"),
            size = IMAGE_SIZE
        )
    }

    fn normalize(album: TidalAlbum) -> NormalizedAlbum {
        let mut artists = album.artists.unwrap_or_default();
        if artists.is_empty() {
            artists.extend(album.artist);
        }
        let artist = utils::join_artists(artists.iter().filter_map(|a| a.name.as_deref()));

        let image = album
            .cover
            .filter(|c| !c.is_empty())
            .map(|c| Self::cover_url(&c))
            .unwrap_or_default();

        let link = album
            .url
            .filter(|u| !u.is_empty())
            .or_else(|| {
                album
                    .id
                    .as_ref()
                    .and_then(id_to_string)
                    .map(|id| format!("{}/{}", BROWSE_ALBUM_URL, id))
            })
            .unwrap_or_default();

        NormalizedAlbum {
            title: album.title.unwrap_or_default(),
            artist,
            image,
            link,
        }
    }
}

#[async_trait]
impl ProviderAdapter for TidalAdapter {
    fn provider(&self) -> Provider {
        Provider::Tidal
    }

    fn uses_pkce(&self) -> bool {
        self.cfg.use_pkce
    }

    fn authorization_url(&self, challenge: &str) -> Res<Url> {
        let challenge = self.cfg.use_pkce.then_some(challenge);
        build_authorization_url(&self.cfg, challenge)
    }

    async fn exchange_token(&self, code: &str, verifier: Option<&str>) -> Res<TokenResult> {
        let verifier = if self.cfg.use_pkce { verifier } else { None };
        exchange_code(&self.client, &self.cfg, code, verifier).await
    }

    async fn fetch_library(&self, token: &TokenResult) -> Res<Vec<NormalizedAlbum>> {
        let user_id = self.resolve_user_id(token).await.ok_or_else(|| {
            Error::LibraryFetch("Cannot determine the Tidal user id".to_string())
        })?;
        let url = format!(
            "{api}/users/{user}/favorites/albums",
            api = self.cfg.api_url,
            user = user_id
        );

        let mut albums: Vec<NormalizedAlbum> = Vec::new();
        let mut offset = 0usize;

        loop {
            let query = [
                ("limit", PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
                ("countryCode", self.cfg.country_code.clone()),
            ];
            let page: FavoriteAlbumsPage =
                get_json(&self.client, &url, &token.access_token, &query).await?;

            let Some(items) = page.items else {
                break;
            };
            let received = items.len();
            albums.extend(items.into_iter().filter_map(|i| i.item).map(Self::normalize));
            offset += received;

            match page.total_number_of_items {
                Some(total) if received > 0 && offset < total => continue,
                _ => break,
            }
        }

        Ok(albums)
    }

    async fn resolve_user_id(&self, token: &TokenResult) -> Option<String> {
        if let Some(id) = &token.user_id {
            return Some(id.clone());
        }

        let url = format!("{}/sessions", self.cfg.api_url);
        match get_json::<SessionInfo>(&self.client, &url, &token.access_token, &[]).await {
            Ok(session) => session.user_id.as_ref().and_then(id_to_string),
            Err(e) => {
                warning!("Cannot resolve Tidal user id: {}", e);
                None
            }
        }
    }
}
