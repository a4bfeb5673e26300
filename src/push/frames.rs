//! Push Channel Frame Types
//!
//! Frames on the realtime channel are JSON objects tagged by a `type`
//! field. The client sends exactly one frame shape (the authentication
//! frame); the server pushes tagged notifications, of which `statistics`
//! is the one consumed type. Unrecognized tags deserialize to
//! [`ServerFrame::Unknown`] so new server frame types never break an
//! older client.

use serde::{Deserialize, Serialize};

use crate::remote::Statistics;

/// Frames sent from client to server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// First frame on the wire, always before any other traffic
    Authenticate {
        /// The session token
        data: String,
    },
}

/// Frames pushed from server to client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Live usage statistics update
    Statistics { data: Statistics },
    /// Any tag this client does not recognize
    #[serde(other)]
    Unknown,
}
