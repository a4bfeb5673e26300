//! Realtime Push Channel
//!
//! A persistent, authenticated WebSocket connection for server-initiated
//! notifications (live statistics, forced session invalidation). The
//! channel is owned by the session: it is created on sign-in, torn down on
//! sign-out, and never reconnects on its own.

pub mod channel;
pub mod frames;

pub use channel::{CloseHandler, NotificationHandler, PushChannel, PushError};
pub use frames::{ClientFrame, ServerFrame};
