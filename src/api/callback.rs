use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::CallbackParams;

/// Records the provider's redirect back to us.
///
/// Only the first redirect counts, later ones cannot replace a code that is
/// already being exchanged.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<CallbackParams>>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    if state.is_some() {
        return Html("<h4>Login already handled.</h4><p>Close this browser window.</p>");
    }

    let received = CallbackParams {
        code: params.get("code").cloned().filter(|c| !c.is_empty()),
        error: params.get("error").cloned(),
    };

    let page = match (&received.code, &received.error) {
        (Some(_), _) => {
            "<h2>Login received.</h2><p>Close this browser window and head back to your terminal.</p>"
        }
        (None, Some(_)) => "<h4>Login was denied.</h4>",
        (None, None) => "<h4>Missing authorization code.</h4>",
    };

    *state = Some(received);
    Html(page)
}
