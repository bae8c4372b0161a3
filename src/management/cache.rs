use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    Res,
    error::Error,
    provider::id_to_string,
    types::{NormalizedAlbum, Provider},
};

#[derive(Debug, Deserialize)]
struct CachedAlbums {
    albums: Option<Vec<NormalizedAlbum>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest<'a> {
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    user_id: Option<serde_json::Value>,
}

/// Client for the album cache backend.
///
/// The backend keeps a normalized copy of every user's library and refreshes
/// it from the provider on `sync`. Every failure is reported as
/// [`Error::CacheGateway`] so the caller can fall back to the provider.
///
/// # Example
///
/// ```
/// let cache = CacheGateway::new("http://localhost:3000");
/// let mut albums = cache.albums(Provider::Spotify, "listener").await?;
/// if albums.is_empty() {
///     let user_id = cache.sync(Provider::Spotify, &token.access_token, Some("listener")).await?;
///     albums = cache.albums(Provider::Spotify, user_id.as_deref().unwrap_or("listener")).await?;
/// }
/// ```
pub struct CacheGateway {
    client: Client,
    base_url: String,
}

impl CacheGateway {
    /// Creates a gateway for the backend at `base_url`. A trailing slash is
    /// ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reads the cached library of one user.
    ///
    /// Issues `GET /albums?provider=<p>&userId=<id>`.
    ///
    /// # Arguments
    ///
    /// * `provider` - Catalog the library belongs to
    /// * `user_id` - Provider user id as the backend stores it
    ///
    /// # Returns
    ///
    /// - `Ok(albums)` - Cached albums, empty when the backend has none or the
    ///   response carries no `albums` field
    /// - `Err(Error::CacheGateway)` - Transport failure, non-success status or
    ///   malformed body
    pub async fn albums(&self, provider: Provider, user_id: &str) -> Res<Vec<NormalizedAlbum>> {
        let res = self
            .client
            .get(format!("{}/albums", self.base_url))
            .query(&[("provider", provider.as_str()), ("userId", user_id)])
            .send()
            .await
            .map_err(|e| Error::CacheGateway(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::CacheGateway(format!(
                "Reading cached albums returned {}",
                status
            )));
        }

        let cached: CachedAlbums = res
            .json()
            .await
            .map_err(|e| Error::CacheGateway(e.to_string()))?;
        Ok(cached.albums.unwrap_or_default())
    }

    /// Asks the backend to refresh its copy of the library from the provider.
    ///
    /// Issues `POST /sync/<provider>` with `{ accessToken, userId? }`.
    ///
    /// # Arguments
    ///
    /// * `provider` - Catalog to sync from
    /// * `access_token` - Token the backend uses against the provider
    /// * `user_id` - Known user id, left out of the body when `None`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(id))` - The user id the backend resolved
    /// - `Ok(None)` - Sync accepted without a user id in the response
    /// - `Err(Error::CacheGateway)` - Transport failure or non-success status
    pub async fn sync(
        &self,
        provider: Provider,
        access_token: &str,
        user_id: Option<&str>,
    ) -> Res<Option<String>> {
        let res = self
            .client
            .post(format!("{}/sync/{}", self.base_url, provider))
            .json(&SyncRequest {
                access_token,
                user_id,
            })
            .send()
            .await
            .map_err(|e| Error::CacheGateway(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::CacheGateway(format!("Sync returned {}", status)));
        }

        // An empty or non-JSON body just means nothing was resolved
        let body = res
            .text()
            .await
            .map_err(|e| Error::CacheGateway(e.to_string()))?;
        let synced: SyncResponse = serde_json::from_str(&body).unwrap_or_default();

        Ok(synced.user_id.as_ref().and_then(id_to_string))
    }
}
