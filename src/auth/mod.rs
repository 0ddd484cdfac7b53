//! Session credentials and everything the client needs to keep them valid.
//!
//! # Overview
//!
//! - [`Session`]: access token, refresh token and user profile
//! - [`SessionSink`]: external storage the client persists to and clears
//! - [`MemorySessionStore`]: in-process [`SessionSink`]
//! - [`token_error`]: stale vs. terminal classification of 401/403 responses
//! - [`refresh`]: wire contract of the renewal endpoint
//! - [`RefreshError`]: why a renewal attempt failed
//!
//! The client only reads the session, replaces it after a renewal, and clears
//! it on an unrecoverable authentication failure. Creating it (login,
//! registration) happens elsewhere.
//!
//! # Example
//!
//! ```rust
//! use raffle_client::auth::{MemorySessionStore, Session, SessionSink};
//!
//! let store = MemorySessionStore::new();
//! store.set(Session::new("access").with_refresh_token("refresh"));
//!
//! assert!(store.current().is_some_and(|s| s.can_refresh()));
//! ```

mod error;
pub mod refresh;
pub mod session;
mod sink;
pub mod token_error;

pub use error::RefreshError;
pub use session::{PersistOptions, Session};
pub use sink::{MemorySessionStore, SessionSink};
pub use token_error::TokenErrorKind;
