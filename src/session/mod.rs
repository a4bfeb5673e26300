//! Session Layer
//!
//! Owns the authentication token and its persistence, orchestrates the
//! endpoint catalog, and keeps the realtime push channel in lock-step
//! with the authentication state.

pub mod manager;
pub mod token;

pub use manager::{ChangeNotifier, Session, SessionError, SessionHooks};
pub use token::{FileTokenStore, MemoryTokenStore, SessionToken, StoreError, TokenStore};
