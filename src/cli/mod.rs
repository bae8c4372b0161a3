//! # CLI Module
//!
//! Terminal front end of the login flow and album picker.
//!
//! - [`login`] starts the PKCE login for a provider, waits for the redirect on
//!   the local callback server and shows a first random pick.
//! - [`resume`] finishes a login from a code pasted by the user, in a new
//!   process, using the attempt persisted by `login`.
//! - [`reset`] clears any pending attempt.
//!
//! ```bash
//! pickmytunes login --provider spotify     # log in, pick 3 albums
//! pickmytunes login --provider tidal -n 5  # pick 5 at a time
//! pickmytunes resume --code AQB...         # finish a login by hand
//! pickmytunes reset
//! ```

use std::sync::Arc;

use crate::{
    Res, config,
    management::{CacheGateway, FileFlowStore, Session},
    provider,
    types::Provider,
};

mod display;
mod login;
mod resume;

pub use display::print_albums;
pub use login::login;
pub use resume::reset;
pub use resume::resume;

/// Session wired with the on-disk flow store, every configured provider and
/// the album cache if one is set up.
pub(crate) fn build_session(count: Option<usize>) -> Res<Session> {
    let pick_count = count.filter(|n| *n > 0).unwrap_or_else(config::pick_count);
    let mut session = Session::new(Arc::new(FileFlowStore::default_location()), pick_count);

    for p in Provider::ALL {
        if let Ok(adapter) = provider::adapter_from_env(p) {
            session = session.with_adapter(adapter);
        }
    }

    if let Some(url) = config::cache_url() {
        session = session.with_cache(CacheGateway::new(url));
    }

    Ok(session)
}
