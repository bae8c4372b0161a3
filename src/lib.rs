//! pickmytunes library
//!
//! Logs a user in to a music catalog (Spotify or Tidal) with the OAuth
//! authorization code flow and PKCE, loads their saved albums and picks a few
//! of them at random.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local OAuth callback server
//! - `cli` - Command-line front end
//! - `config` - Configuration from environment variables and `.env`
//! - `error` - Error type shared by every module
//! - `management` - Flow controller, persisted flow state and album cache client
//! - `provider` - One adapter per music catalog
//! - `server` - Local HTTP server receiving the OAuth redirect
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE helpers and random album picking
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pickmytunes::{management::{MemoryFlowStore, Session}, provider, types::Provider};
//!
//! #[tokio::main]
//! async fn main() -> pickmytunes::Res<()> {
//!     let mut session = Session::new(Arc::new(MemoryFlowStore::new()), 3)
//!         .with_adapter(provider::adapter_from_env(Provider::Spotify)?);
//!     let url = session.start_login(Provider::Spotify).await?;
//!     println!("Log in at {}", url);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod provider;
pub mod server;
pub mod types;
pub mod utils;

/// Result type used throughout the crate.
///
/// # Example
///
/// ```
/// use pickmytunes::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, error::Error>;

/// Status line with a blue `o` marker.
///
/// ```
/// info!("Opening the authorization page...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Status line with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints to stderr with a red `!` marker and exits with code 1.
///
/// Only meant for the binary's top level; library code returns [`Res`].
///
/// ```
/// error!("Login failed: {}", err);
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Recoverable problem, printed to stderr with a yellow `!` marker.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
