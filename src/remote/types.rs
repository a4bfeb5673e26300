//! Wire Types
//!
//! Payload shapes shared with the Billow service.

use serde::{Deserialize, Serialize};

/// Public profile data for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub first_name: String,
    pub family_name: String,
    pub gender: String,
    pub city: String,
    pub country: String,
}

/// A message posted on a user's wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallPost {
    /// Author's email address
    pub from_user: String,
    /// Wall owner's email address
    pub to_user: String,
    /// Message text; may be empty for media-only posts
    #[serde(default)]
    pub content: String,
    /// Server-side media name, when the post carries an attachment
    #[serde(default)]
    pub media: Option<String>,
    /// Server-formatted post timestamp
    pub date_posted: String,
}

/// Registration payload for `POST /register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub family_name: String,
    pub gender: String,
    pub city: String,
    pub country: String,
}

/// Live usage statistics pushed over the realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    /// Users currently holding an open realtime channel
    pub nb_connected_users: u64,
    /// Posts on the receiving user's wall
    #[serde(default)]
    pub nb_posts: u64,
    /// Profile views of the receiving user
    #[serde(default)]
    pub nb_views: u64,
}

/// A media attachment for a wall post.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Original file name; the extension drives server-side acceptance
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}
