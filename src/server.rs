use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{Res, api, error::Error, types::CallbackParams, warning};

pub fn router(state: Arc<Mutex<Option<CallbackParams>>>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)))
}

/// Binds the callback server on `addr` and serves it in the background.
pub async fn start_api_server(
    addr: &str,
    state: Arc<Mutex<Option<CallbackParams>>>,
) -> Res<(SocketAddr, JoinHandle<()>)> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("Failed to parse server address {}: {}", addr, e)))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Config(format!("Cannot bind callback server on {}: {}", addr, e)))?;
    let local_addr = listener.local_addr().unwrap_or(addr);

    let app = router(state);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    Ok((local_addr, handle))
}
