use crate::{
    Res,
    cli::{build_session, display},
    success,
};

/// Continues a login whose redirect landed outside the local callback server,
/// using the code copied from the browser's address bar.
pub async fn resume(code: String, count: Option<usize>) -> Res<()> {
    let mut session = build_session(count)?;
    display::finish_login(&mut session, &code).await
}

/// Back to the entry point: drops every persisted verifier and provider choice.
pub async fn reset() -> Res<()> {
    let mut session = build_session(None)?;
    session.on_page_load(None).await?;
    success!("Cleared any pending login.");
    Ok(())
}
