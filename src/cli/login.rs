use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    Res, config,
    cli::{build_session, display},
    error::Error,
    info,
    server::start_api_server,
    types::{CallbackParams, Provider},
    warning,
};

const CALLBACK_WAIT: Duration = Duration::from_secs(120);

/// Full login: persist the attempt, open the provider's authorization page,
/// wait for the redirect to hit the local callback server and carry on from
/// there.
pub async fn login(provider: Provider, count: Option<usize>, open_browser: bool) -> Res<()> {
    config::provider_config(provider)?;
    let mut session = build_session(count)?;

    let callback_state: Arc<Mutex<Option<CallbackParams>>> = Arc::new(Mutex::new(None));
    let (addr, server) = start_api_server(&config::server_addr(), Arc::clone(&callback_state)).await?;
    info!("Waiting for the {} redirect on http://{}/callback", provider, addr);

    let auth_url = session.start_login(provider).await?;

    if !open_browser || webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Open the following URL in your browser to log in:\n{}",
            auth_url
        );
    }

    let received = wait_for_callback(callback_state).await;
    server.abort();

    match received {
        Some(CallbackParams {
            code: Some(code), ..
        }) => display::finish_login(&mut session, &code).await,
        Some(CallbackParams { error, .. }) => {
            session.on_page_load(None).await?;
            Err(Error::AuthExchange(format!(
                "{} did not return an authorization code ({})",
                provider,
                error.unwrap_or_else(|| "no reason given".to_string())
            )))
        }
        None => {
            warning!(
                "No redirect received. If the browser ended up elsewhere, run pickmytunes resume --code <code>."
            );
            Err(Error::InvalidState("Login timed out".to_string()))
        }
    }
}

async fn wait_for_callback(shared_state: Arc<Mutex<Option<CallbackParams>>>) -> Option<CallbackParams> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < CALLBACK_WAIT {
        let lock = shared_state.lock().await;
        if let Some(params) = lock.as_ref() {
            return Some(params.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}
