use thiserror::Error;

/// Everything that can go wrong while logging in, fetching the library or
/// picking albums.
#[derive(Debug, Error)]
pub enum Error {
    /// Token endpoint answered with a non-success status, an unparseable body
    /// or a body without an access token.
    #[error("Token exchange failed: {0}")]
    AuthExchange(String),

    /// Provider library endpoint failed.
    #[error("Failed to fetch album library: {0}")]
    LibraryFetch(String),

    /// Backend cache read or sync failed. Never fatal on its own.
    #[error("Album cache unavailable: {0}")]
    CacheGateway(String),

    #[error("Code verifier length must be between 43 and 128, got {0}")]
    InvalidVerifierLength(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Flow state storage error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}
