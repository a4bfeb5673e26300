//! Billow Endpoint Catalog
//!
//! HTTP endpoint definitions for the Billow service. Every method builds
//! exactly one unsent [`RequestTask`] against the configured base address,
//! attaching the session token where the endpoint requires one. Transport
//! details that vary per endpoint (basic auth for login, multipart for
//! media posts) are encapsulated here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::config::ApiConfig;
use crate::request::{RequestSigner, RequestTask};

use super::types::{MediaUpload, RegistrationForm};

/// Catalog of Billow service endpoints.
pub struct RemoteService {
    client: Client,
    base_url: String,
    templates_url: String,
    signer: Arc<RequestSigner>,
}

impl RemoteService {
    /// Create a service catalog from the API configuration.
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            templates_url: config.templates_url.trim_end_matches('/').to_string(),
            signer: Arc::new(RequestSigner::new(config.client_secret.as_bytes().to_vec())),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn task(&self, builder: reqwest::RequestBuilder) -> RequestTask {
        RequestTask::new(builder, Arc::clone(&self.signer))
    }

    fn json_task(&self, builder: reqwest::RequestBuilder, body: Vec<u8>) -> RequestTask {
        let builder = builder
            .header(CONTENT_TYPE, "application/json")
            .body(body.clone());
        self.task(builder).signed_body(body)
    }

    /// `POST /login` with basic-auth credentials. Unauthenticated.
    pub fn sign_in(&self, email: &str, password: &str) -> RequestTask {
        let builder = self
            .client
            .post(self.endpoint("/login"))
            .basic_auth(email, Some(password));
        self.task(builder)
    }

    /// `POST /logout`, invalidating the given token server-side.
    pub fn sign_out(&self, token: &str) -> RequestTask {
        let builder = self.client.post(self.endpoint("/logout"));
        self.task(builder).authenticated(token)
    }

    /// `POST /register` with the registration form as JSON. Unauthenticated.
    pub fn sign_up(&self, form: &RegistrationForm) -> RequestTask {
        let body = serde_json::to_vec(form).unwrap_or_default();
        self.json_task(self.client.post(self.endpoint("/register")), body)
    }

    /// `GET /messages`: the wall of the user owning the token.
    pub fn messages_by_token(&self, token: &str) -> RequestTask {
        let builder = self.client.get(self.endpoint("/messages"));
        self.task(builder).authenticated(token)
    }

    /// `GET /messages/{email}`: another user's wall.
    pub fn messages_by_email(&self, token: &str, email: &str) -> RequestTask {
        let path = format!("/messages/{}", urlencoding::encode(email));
        let builder = self.client.get(self.endpoint(&path));
        self.task(builder).authenticated(token)
    }

    /// `POST /messages/{to_email}`: post to a wall, multipart with the
    /// message text and an optional media attachment.
    pub fn post_message(
        &self,
        token: &str,
        to_email: &str,
        message: &str,
        media: Option<MediaUpload>,
    ) -> RequestTask {
        let path = format!("/messages/{}", urlencoding::encode(to_email));

        let mut form = Form::new().text("message", message.to_string());
        if let Some(media) = media {
            form = form.part("media", Part::bytes(media.bytes).file_name(media.file_name));
        }

        let builder = self.client.post(self.endpoint(&path)).multipart(form);
        self.task(builder).authenticated(token)
    }

    /// `GET /profile`: the profile of the user owning the token.
    pub fn profile_by_token(&self, token: &str) -> RequestTask {
        let builder = self.client.get(self.endpoint("/profile"));
        self.task(builder).authenticated(token)
    }

    /// `GET /profile/{email}`: another user's profile.
    pub fn profile_by_email(&self, token: &str, email: &str) -> RequestTask {
        let path = format!("/profile/{}", urlencoding::encode(email));
        let builder = self.client.get(self.endpoint(&path));
        self.task(builder).authenticated(token)
    }

    /// `PUT /changePassword` with old and new password as JSON.
    pub fn change_password(&self, token: &str, old_password: &str, new_password: &str) -> RequestTask {
        let body = serde_json::to_vec(&serde_json::json!({
            "oldPassword": old_password,
            "newPassword": new_password,
        }))
        .unwrap_or_default();

        self.json_task(self.client.put(self.endpoint("/changePassword")), body)
            .authenticated(token)
    }

    /// `GET {templates}/{name}.hbs`: raw template source, served as text.
    pub(crate) fn template_source(&self, name: &str) -> RequestTask {
        let url = format!("{}/{}.hbs", self.templates_url, urlencoding::encode(name));
        self.task(self.client.get(url))
    }
}
