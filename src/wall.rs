//! Wall Model
//!
//! View-side model of a user's wall: the profile header plus the list
//! of posts, with attached media classified by file extension so a
//! frontend knows which element to render.

use crate::remote::{MediaUpload, Profile, WallPost};
use crate::request::Envelope;
use crate::session::{Session, SessionError};

/// Whose wall this model tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WallTarget {
    /// The signed-in user's own wall.
    Own,
    /// Another user's wall, by email.
    User(String),
}

/// How an attached media file should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Classify by file extension. Unknown extensions get no player.
    pub fn classify(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "mp4" => Some(Self::Video),
            "mp3" | "wav" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// A post together with its classified media, ready for rendering.
#[derive(Debug, Clone)]
pub struct WallEntry {
    pub post: WallPost,
    pub media_kind: Option<MediaKind>,
}

impl WallEntry {
    fn from_post(post: WallPost) -> Self {
        let media_kind = post.media.as_deref().and_then(MediaKind::classify);
        Self { post, media_kind }
    }
}

pub struct WallModel {
    session: Session,
    target: WallTarget,
    profile: Option<Profile>,
    entries: Vec<WallEntry>,
}

impl WallModel {
    pub fn new(session: Session, target: WallTarget) -> Self {
        Self {
            session,
            target,
            profile: None,
            entries: Vec::new(),
        }
    }

    pub fn target(&self) -> &WallTarget {
        &self.target
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn entries(&self) -> &[WallEntry] {
        &self.entries
    }

    /// Reload the profile header and the post list from the server.
    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        let (profile, posts) = match &self.target {
            WallTarget::Own => (
                self.session.current_profile().await?,
                self.session.current_messages().await?,
            ),
            WallTarget::User(email) => (
                self.session.profile_of(email).await?,
                self.session.messages_of(email).await?,
            ),
        };
        self.profile = Some(profile);
        self.entries = posts.into_iter().map(WallEntry::from_post).collect();
        Ok(())
    }

    /// Post to this wall and refresh so the new entry shows up.
    pub async fn post(
        &mut self,
        text: &str,
        media: Option<MediaUpload>,
    ) -> Result<Envelope, SessionError> {
        let envelope = match &self.target {
            WallTarget::Own => self.session.post_on_own_wall(text, media).await?,
            WallTarget::User(email) => self.session.post_message(email, text, media).await?,
        };
        self.refresh().await?;
        Ok(envelope)
    }
}
