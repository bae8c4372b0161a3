#![allow(dead_code)]

use std::collections::HashMap;

use pickmytunes::{config::ProviderConfig, types::NormalizedAlbum};
use reqwest::Url;
use serde_json::{Value, json};
use wiremock::{MockServer, Request};

pub const REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

pub fn spotify_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        client_id: "spotify-client".to_string(),
        client_secret: None,
        redirect_uri: REDIRECT_URI.to_string(),
        scope: "user-library-read".to_string(),
        auth_url: format!("{}/spotify/authorize", server.uri()),
        token_url: format!("{}/spotify/api/token", server.uri()),
        api_url: format!("{}/spotify/v1", server.uri()),
        use_pkce: true,
        country_code: String::new(),
    }
}

pub fn tidal_config(server: &MockServer, use_pkce: bool) -> ProviderConfig {
    ProviderConfig {
        client_id: "tidal-client".to_string(),
        client_secret: Some("tidal-secret".to_string()),
        redirect_uri: REDIRECT_URI.to_string(),
        scope: "collection.read".to_string(),
        auth_url: format!("{}/tidal/authorize", server.uri()),
        token_url: format!("{}/tidal/oauth2/token", server.uri()),
        api_url: format!("{}/tidal/v1", server.uri()),
        use_pkce,
        country_code: "DE".to_string(),
    }
}

/// Decodes an `application/x-www-form-urlencoded` request body.
pub fn form_fields(request: &Request) -> HashMap<String, String> {
    let body = String::from_utf8_lossy(&request.body);
    Url::parse(&format!("http://form.local/?{}", body))
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

pub fn query_map(url: &Url) -> HashMap<String, String> {
    url.query_pairs().into_owned().collect()
}

pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .collect()
}

pub fn token_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-me",
        "scope": "user-library-read"
    })
}

pub fn spotify_item(name: &str, artists: &[&str], image: Option<&str>) -> Value {
    let images: Vec<Value> = image.map(|u| json!({ "url": u })).into_iter().collect();
    json!({
        "added_at": "2024-01-01T00:00:00Z",
        "album": {
            "id": format!("id-{}", name.replace(' ', "-")),
            "name": name,
            "artists": artists.iter().map(|a| json!({ "name": a })).collect::<Vec<_>>(),
            "images": images,
            "external_urls": { "spotify": format!("https://open.spotify.com/album/{}", name.replace(' ', "-")) }
        }
    })
}

pub fn album(title: &str) -> NormalizedAlbum {
    NormalizedAlbum {
        title: title.to_string(),
        artist: format!("{} Artist", title),
        image: String::new(),
        link: format!("https://example.com/{}", title),
    }
}
