//! In-process mock of the Billow server for tests.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Clone)]
pub(crate) enum PushCommand {
    Stats(Value),
    Close,
}

#[derive(Debug, Clone)]
pub(crate) struct SignedHeaders {
    pub hmac: String,
    pub timestamp: String,
    pub token: String,
}

pub(crate) struct UserRecord {
    pub password: String,
    pub profile: Value,
}

pub(crate) struct ServerState {
    pub users: Mutex<HashMap<String, UserRecord>>,
    pub tokens: Mutex<HashMap<String, String>>,
    pub posts: Mutex<Vec<Value>>,
    pub signed_requests: Mutex<Vec<SignedHeaders>>,
    pub template_fetches: Mutex<HashMap<String, usize>>,
    pub push: broadcast::Sender<PushCommand>,
}

pub(crate) struct MockServer {
    pub base_url: String,
    pub ws_url: String,
    pub state: Arc<ServerState>,
}

impl MockServer {
    pub async fn spawn() -> Self {
        let (push, _) = broadcast::channel(16);
        let state = Arc::new(ServerState {
            users: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            posts: Mutex::new(Vec::new()),
            signed_requests: Mutex::new(Vec::new()),
            template_fetches: Mutex::new(HashMap::new()),
            push,
        });

        let router = Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/register", post(register))
            .route("/messages", get(own_messages))
            .route("/messages/:email", get(messages_of).post(post_message))
            .route("/profile", get(own_profile))
            .route("/profile/:email", get(profile_of))
            .route("/changePassword", put(change_password))
            .route("/templates/:file", get(template_file))
            .route("/ws", get(ws_route))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}/ws"),
            state,
        }
    }

    pub fn api_config(&self) -> crate::config::ApiConfig {
        crate::config::ApiConfig {
            base_url: self.base_url.clone(),
            templates_url: format!("{}/templates", self.base_url),
            client_secret: "test-secret".to_string(),
            request_timeout_secs: 5,
        }
    }

    pub fn seed_user(&self, email: &str, password: &str) {
        self.state.users.lock().unwrap().insert(
            email.to_string(),
            UserRecord {
                password: password.to_string(),
                profile: json!({
                    "email": email,
                    "first_name": "Test",
                    "family_name": "User",
                    "gender": "other",
                    "city": "Linkoping",
                    "country": "Sweden",
                }),
            },
        );
    }

    pub fn seed_post(&self, from: &str, to: &str, content: &str, media: Option<&str>) {
        self.state.posts.lock().unwrap().push(json!({
            "from_user": from,
            "to_user": to,
            "content": content,
            "media": media,
            "date_posted": "2026-08-01 12:00:00",
        }));
    }

    pub fn push_statistics(&self, stats: Value) {
        let _ = self.state.push.send(PushCommand::Stats(stats));
    }

    pub fn close_channels(&self) {
        let _ = self.state.push.send(PushCommand::Close);
    }

    pub async fn wait_for_subscriber(&self) {
        for _ in 0..100 {
            if self.state.push.receiver_count() > 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("no realtime subscriber appeared");
    }
}

fn ok(message: &str, data: Value) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({"success": true, "message": message, "data": data})),
    )
}

fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"success": false, "message": message})))
}

fn record_signature(state: &ServerState, headers: &HeaderMap) {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    state.signed_requests.lock().unwrap().push(SignedHeaders {
        hmac: get("X-Request-Hmac"),
        timestamp: get("X-Request-Timestamp"),
        token: get("X-Session-Token"),
    });
}

fn token_email(state: &ServerState, headers: &HeaderMap) -> Option<String> {
    let token = headers.get("X-Session-Token")?.to_str().ok()?;
    state.tokens.lock().unwrap().get(token).cloned()
}

async fn login(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let encoded = authorization.strip_prefix("Basic ").unwrap_or_default();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap_or_default();
    let decoded = String::from_utf8_lossy(&decoded);
    let (email, password) = match decoded.split_once(':') {
        Some(pair) => pair,
        None => return fail(StatusCode::BAD_REQUEST, "Missing credentials."),
    };

    let valid = state
        .users
        .lock()
        .unwrap()
        .get(email)
        .map(|u| u.password == password)
        .unwrap_or(false);
    if !valid {
        return fail(StatusCode::UNAUTHORIZED, "Wrong username or password.");
    }

    let token = uuid::Uuid::new_v4().to_string();
    state
        .tokens
        .lock()
        .unwrap()
        .insert(token.clone(), email.to_string());
    ok("Successfully signed in.", json!(token))
}

async fn logout(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_signature(&state, &headers);
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if state.tokens.lock().unwrap().remove(token).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "You are not signed in.");
    }
    ok("Successfully signed out.", Value::Null)
}

async fn register(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    if email.is_empty() || password.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Form data missing or incorrect.");
    }

    let mut users = state.users.lock().unwrap();
    if users.contains_key(&email) {
        return fail(StatusCode::CONFLICT, "User already exists.");
    }
    users.insert(
        email.clone(),
        UserRecord {
            password,
            profile: json!({
                "email": email,
                "first_name": body["first_name"],
                "family_name": body["family_name"],
                "gender": body["gender"],
                "city": body["city"],
                "country": body["country"],
            }),
        },
    );
    ok("Successfully registered.", Value::Null)
}

async fn own_messages(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_signature(&state, &headers);
    let email = match token_email(&state, &headers) {
        Some(email) => email,
        None => return fail(StatusCode::UNAUTHORIZED, "You are not signed in."),
    };
    messages_for(&state, &email)
}

async fn messages_of(
    State(state): State<Arc<ServerState>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_signature(&state, &headers);
    if token_email(&state, &headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "You are not signed in.");
    }
    messages_for(&state, &email)
}

fn messages_for(state: &ServerState, email: &str) -> (StatusCode, Json<Value>) {
    let posts: Vec<Value> = state
        .posts
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p["to_user"] == email)
        .cloned()
        .collect();
    ok("Messages retrieved.", Value::Array(posts))
}

async fn post_message(
    State(state): State<Arc<ServerState>>,
    Path(to_email): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    record_signature(&state, &headers);
    let from = match token_email(&state, &headers) {
        Some(email) => email,
        None => return fail(StatusCode::UNAUTHORIZED, "You are not signed in."),
    };

    let mut message = String::new();
    let mut media: Option<String> = None;
    while let Some(field) = multipart.next_field().await.ok().flatten() {
        let name = field.name().map(|s| s.to_string());
        let file = field.file_name().map(|s| s.to_string());
        let data = field.bytes().await.unwrap_or_default();
        match name.as_deref() {
            Some("message") => message = String::from_utf8_lossy(&data).to_string(),
            Some("media") => media = file,
            _ => {}
        }
    }

    state.posts.lock().unwrap().push(json!({
        "from_user": from,
        "to_user": to_email,
        "content": message,
        "media": media,
        "date_posted": "2026-08-01 12:00:00",
    }));
    ok("Message posted.", Value::Null)
}

async fn own_profile(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_signature(&state, &headers);
    let email = match token_email(&state, &headers) {
        Some(email) => email,
        None => return fail(StatusCode::UNAUTHORIZED, "You are not signed in."),
    };
    profile_for(&state, &email)
}

async fn profile_of(
    State(state): State<Arc<ServerState>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_signature(&state, &headers);
    if token_email(&state, &headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "You are not signed in.");
    }
    profile_for(&state, &email)
}

fn profile_for(state: &ServerState, email: &str) -> (StatusCode, Json<Value>) {
    match state.users.lock().unwrap().get(email) {
        Some(user) => ok("Profile retrieved.", user.profile.clone()),
        None => fail(StatusCode::NOT_FOUND, "No such user."),
    }
}

async fn change_password(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_signature(&state, &headers);
    let email = match token_email(&state, &headers) {
        Some(email) => email,
        None => return fail(StatusCode::UNAUTHORIZED, "You are not signed in."),
    };

    let old = body["oldPassword"].as_str().unwrap_or_default();
    let new = body["newPassword"].as_str().unwrap_or_default();
    let mut users = state.users.lock().unwrap();
    let user = users.get_mut(&email).unwrap();
    if user.password != old {
        return fail(StatusCode::UNAUTHORIZED, "Wrong password.");
    }
    user.password = new.to_string();
    ok("Password changed.", Value::Null)
}

async fn template_file(
    State(state): State<Arc<ServerState>>,
    Path(file): Path<String>,
) -> (StatusCode, String) {
    *state
        .template_fetches
        .lock()
        .unwrap()
        .entry(file.clone())
        .or_insert(0) += 1;

    match file.as_str() {
        "welcome.hbs" => (StatusCode::OK, "<h1>Welcome to Billow</h1>".to_string()),
        "login.hbs" => (StatusCode::OK, "<form>{{error}}</form>".to_string()),
        "wall.hbs" => (
            StatusCode::OK,
            "<div>{{profile.first_name}} {{profile.family_name}}</div>".to_string(),
        ),
        "message.hbs" => (StatusCode::OK, "<p>{{content}}</p>".to_string()),
        _ => (StatusCode::NOT_FOUND, "not found".to_string()),
    }
}

async fn ws_route(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<ServerState>) {
    // First frame must authenticate with a live token
    let first = match socket.recv().await {
        Some(Ok(Message::Text(text))) => text,
        _ => return,
    };
    let frame: Value = match serde_json::from_str(&first) {
        Ok(v) => v,
        Err(_) => return,
    };
    let token = frame["data"].as_str().unwrap_or_default();
    let authenticated =
        frame["type"] == "authenticate" && state.tokens.lock().unwrap().contains_key(token);
    if !authenticated {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    let mut commands = state.push.subscribe();
    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Ok(PushCommand::Stats(stats)) => {
                    let frame = json!({"type": "statistics", "data": stats});
                    if socket.send(Message::Text(frame.to_string())).await.is_err() {
                        return;
                    }
                }
                Ok(PushCommand::Close) => {
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                }
                Err(_) => return,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                _ => {}
            },
        }
    }
}

/// Poll until the condition holds or the timeout hits.
pub(crate) async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
