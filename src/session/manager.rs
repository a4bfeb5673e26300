//! Session Manager
//!
//! A `Session` is a cheap clone over shared state. It signs the user in
//! and out, persists the token through a `TokenStore`, and opens or
//! tears down the realtime push channel whenever the authentication
//! state changes. A channel closed from the server side is treated as a
//! forced sign-out.

use crate::push::{CloseHandler, PushChannel, PushError};
use crate::remote::{MediaUpload, Profile, RegistrationForm, RemoteService};
use crate::request::{Envelope, TaskError};
use crate::session::token::{SessionToken, StoreError, TokenStore};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Invoked whenever the session transitions between signed-in and
/// signed-out, successfully or not.
pub type ChangeNotifier = Arc<dyn Fn() + Send + Sync>;

/// Callbacks a frontend wires into the session.
#[derive(Clone)]
pub struct SessionHooks {
    pub on_change: ChangeNotifier,
    pub on_statistics: crate::push::NotificationHandler,
}

impl Default for SessionHooks {
    fn default() -> Self {
        Self {
            on_change: Arc::new(|| {}),
            on_statistics: Arc::new(|_| {}),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Human-readable message suitable for display.
    pub fn message(&self) -> String {
        match self {
            Self::Task(e) => e.message(),
            Self::Store(e) => e.to_string(),
        }
    }
}

struct SessionInner {
    service: Arc<RemoteService>,
    store: Arc<dyn TokenStore>,
    hooks: SessionHooks,
    ws_url: String,
    token: RwLock<Option<SessionToken>>,
    channel: Mutex<Option<PushChannel>>,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Restore a session from the token store. If a token was persisted
    /// the push channel is reopened; a channel failure keeps the token
    /// so the next remote call can still settle validity.
    pub async fn connect(
        service: Arc<RemoteService>,
        store: Arc<dyn TokenStore>,
        ws_url: impl Into<String>,
        hooks: SessionHooks,
    ) -> Result<Self, SessionError> {
        let token = store.load().await?;
        let session = Self {
            inner: Arc::new(SessionInner {
                service,
                store,
                hooks,
                ws_url: ws_url.into(),
                token: RwLock::new(token.clone()),
                channel: Mutex::new(None),
            }),
        };
        if let Some(token) = token {
            match session.open_channel(&token).await {
                Ok(channel) => *session.inner.channel.lock().await = Some(channel),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not reopen realtime channel for persisted session")
                }
            }
        }
        Ok(session)
    }

    /// Exchange credentials for a token, persist it and open the push
    /// channel. The returned envelope carries the server's message.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Envelope, SessionError> {
        let envelope = self.inner.service.sign_in(email, password).send().await?;
        let token = SessionToken::new(envelope.data_as::<String>()?);
        self.inner.store.save(&token).await?;
        *self.inner.token.write().await = Some(token.clone());

        let mut channel = self.inner.channel.lock().await;
        if let Some(old) = channel.take() {
            old.close();
        }
        match self.open_channel(&token).await {
            Ok(fresh) => *channel = Some(fresh),
            Err(e) => tracing::warn!(error = %e, "Realtime channel unavailable; session continues without push"),
        }
        drop(channel);

        (self.inner.hooks.on_change)();
        Ok(envelope)
    }

    /// Register a new account and sign straight into it. The returned
    /// envelope is the registration outcome, not the sign-in one.
    pub async fn sign_up(&self, form: &RegistrationForm) -> Result<Envelope, SessionError> {
        let registered = self.inner.service.sign_up(form).send().await?;
        self.sign_in(&form.email, &form.password).await?;
        Ok(registered)
    }

    /// Tear the session down. The remote sign-out is best effort; the
    /// local state is cleared and the change hook fired regardless.
    pub async fn sign_out(&self) {
        self.finish_sign_out().await;
    }

    /// A token is only trusted after the server has confirmed it.
    pub async fn is_signed_in(&self) -> bool {
        let token = self.token_or_empty().await;
        self.inner
            .service
            .profile_by_token(&token)
            .send()
            .await
            .is_ok()
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Envelope, SessionError> {
        let token = self.token_or_empty().await;
        Ok(self
            .inner
            .service
            .change_password(&token, old_password, new_password)
            .send()
            .await?)
    }

    pub async fn current_profile(&self) -> Result<Profile, SessionError> {
        let token = self.token_or_empty().await;
        let envelope = self.inner.service.profile_by_token(&token).send().await?;
        Ok(envelope.data_as()?)
    }

    pub async fn profile_of(&self, email: &str) -> Result<Profile, SessionError> {
        let token = self.token_or_empty().await;
        let envelope = self
            .inner
            .service
            .profile_by_email(&token, email)
            .send()
            .await?;
        Ok(envelope.data_as()?)
    }

    pub async fn current_messages(&self) -> Result<Vec<crate::remote::WallPost>, SessionError> {
        let token = self.token_or_empty().await;
        let envelope = self.inner.service.messages_by_token(&token).send().await?;
        Ok(envelope.data_as()?)
    }

    pub async fn messages_of(
        &self,
        email: &str,
    ) -> Result<Vec<crate::remote::WallPost>, SessionError> {
        let token = self.token_or_empty().await;
        let envelope = self
            .inner
            .service
            .messages_by_email(&token, email)
            .send()
            .await?;
        Ok(envelope.data_as()?)
    }

    pub async fn post_message(
        &self,
        to_email: &str,
        text: &str,
        media: Option<MediaUpload>,
    ) -> Result<Envelope, SessionError> {
        let token = self.token_or_empty().await;
        Ok(self
            .inner
            .service
            .post_message(&token, to_email, text, media)
            .send()
            .await?)
    }

    /// Posting to one's own wall needs the signed-in user's email first.
    /// If that lookup fails the post is never attempted.
    pub async fn post_on_own_wall(
        &self,
        text: &str,
        media: Option<MediaUpload>,
    ) -> Result<Envelope, SessionError> {
        let me = self.current_profile().await?;
        self.post_message(&me.email, text, media).await
    }

    pub async fn has_channel(&self) -> bool {
        self.inner
            .channel
            .lock()
            .await
            .as_ref()
            .map(|c| !c.is_closed())
            .unwrap_or(false)
    }

    pub fn service(&self) -> &Arc<RemoteService> {
        &self.inner.service
    }

    async fn token_or_empty(&self) -> String {
        self.inner
            .token
            .read()
            .await
            .as_ref()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default()
    }

    async fn open_channel(&self, token: &SessionToken) -> Result<PushChannel, PushError> {
        let weak = Arc::downgrade(&self.inner);
        let on_close: CloseHandler = Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                let session = Session { inner };
                tokio::spawn(async move {
                    session.handle_remote_close().await;
                });
            }
        });
        PushChannel::connect(
            &self.inner.ws_url,
            token.as_str(),
            self.inner.hooks.on_statistics.clone(),
            on_close,
        )
        .await
    }

    /// The server dropped the channel: the session is over.
    async fn handle_remote_close(&self) {
        tracing::info!("Realtime channel closed by server; signing out");
        self.finish_sign_out().await;
    }

    async fn finish_sign_out(&self) {
        if let Some(channel) = self.inner.channel.lock().await.take() {
            channel.close();
        }
        let token = self.inner.token.write().await.take();
        if let Some(token) = token {
            if let Err(e) = self.inner.service.sign_out(token.as_str()).send().await {
                tracing::debug!(error = %e.message(), "Remote sign-out failed; continuing locally");
            }
        }
        if let Err(e) = self.inner.store.clear().await {
            tracing::warn!(error = %e, "Could not clear persisted token");
        }
        (self.inner.hooks.on_change)();
    }
}
