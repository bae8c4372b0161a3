use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::{
    Res,
    management::{FlowStage, Session},
    success,
    types::{AlbumTableRow, NormalizedAlbum},
    warning,
};

/// Drives a return navigation carrying `code` to completion, with a spinner
/// while the exchange and library fetch are in flight.
pub(crate) async fn finish_login(session: &mut Session, code: &str) -> Res<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_message("Fetching your saved albums...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let result = session.on_page_load(Some(code)).await.map(|s| s.clone());
    pb.finish_and_clear();

    match result? {
        FlowStage::Ready(provider) => {
            success!(
                "Loaded {} saved albums from {}.",
                session.library().len(),
                provider
            );
            pick_loop(session).await
        }
        _ => {
            warning!("No login in progress (or it expired). Run pickmytunes login first.");
            Ok(())
        }
    }
}

/// Shows the current selection and re-picks until the user quits.
pub(crate) async fn pick_loop(session: &mut Session) -> Res<()> {
    if session.library().is_empty() {
        warning!("Your library has no saved albums to pick from.");
        return Ok(());
    }

    print_albums(session.selection());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let prompt = format!("Pick {} more? [Y/n] ", session.pick_count());
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(answer) = lines.next_line().await? else {
            return Ok(());
        };
        match answer.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => {
                let picked = session.pick_more()?;
                print_albums(picked);
            }
            _ => return Ok(()),
        }
    }
}

pub fn print_albums(albums: &[NormalizedAlbum]) {
    let rows: Vec<AlbumTableRow> = albums
        .iter()
        .enumerate()
        .map(|(i, a)| AlbumTableRow {
            position: i + 1,
            title: a.title.clone(),
            artist: a.artist.clone(),
            link: a.link.clone(),
        })
        .collect();

    println!("{}", Table::new(rows));
}
