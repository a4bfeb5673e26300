//! # Billow Client
//!
//! Session and synchronization layer for the Billow social wall. Talks
//! to a Billow server over HTTP and keeps a realtime push channel open
//! while signed in.
//!
//! ## Features
//!
//! - **Signed requests**: Every authenticated call carries an HMAC over
//!   a timestamp, the session token and the request body
//! - **Realtime push**: Live usage statistics arrive over a WebSocket
//!   channel; a server-side close signs the session out
//! - **Template bundle**: Remote display templates are fetched in
//!   parallel and compiled into a local cache
//! - **Session persistence**: The token survives restarts so a session
//!   can be restored without re-entering credentials
//!
//! ## Modules
//!
//! - [`request`]: Single-fire request tasks, envelopes and signing
//! - [`push`]: Realtime push channel and its wire frames
//! - [`templates`]: Remote template cache and renderer
//! - [`remote`]: Typed catalog of server endpoints
//! - [`session`]: Session lifecycle and token persistence
//! - [`wall`]: Wall view model with media classification
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use billow_client::config::Config;
//! use billow_client::remote::RemoteService;
//! use billow_client::session::{FileTokenStore, Session, SessionHooks};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let service = Arc::new(RemoteService::new(&config.api));
//!     let store = Arc::new(FileTokenStore::new(&config.storage.state_dir));
//!
//!     let session = Session::connect(
//!         service,
//!         store,
//!         &config.realtime.ws_url,
//!         SessionHooks::default(),
//!     )
//!     .await?;
//!
//!     if session.is_signed_in().await {
//!         let profile = session.current_profile().await?;
//!         println!("Signed in as {}", profile.email);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod push;
pub mod remote;
pub mod request;
pub mod session;
pub mod templates;
pub mod wall;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export top-level types for convenience
pub use request::{Envelope, RequestSigner, RequestTask, TaskError};

pub use push::{ClientFrame, PushChannel, PushError, ServerFrame};

pub use templates::{CompiledTemplate, TemplateCache};

pub use remote::{MediaUpload, Profile, RegistrationForm, RemoteService, Statistics, WallPost};

pub use session::{
    FileTokenStore, MemoryTokenStore, Session, SessionError, SessionHooks, SessionToken,
    StoreError, TokenStore,
};

pub use wall::{MediaKind, WallEntry, WallModel, WallTarget};

pub use config::{
    ApiConfig, Config, ConfigError, LoggingConfig, RealtimeConfig, StorageConfig,
};
