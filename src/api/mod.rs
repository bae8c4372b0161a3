//! # API Module
//!
//! HTTP endpoints of the local callback server:
//!
//! - [`callback`] receives the provider redirect carrying `?code=` and hands
//!   it to the waiting login command.
//! - [`health`] reports status and version.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use pickmytunes::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
