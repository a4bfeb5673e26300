//! Push Channel Lifecycle
//!
//! Connects to the fixed realtime endpoint, authenticates with the session
//! token as the first frame on the wire, then dispatches tagged server
//! frames from a background reader task. Closing is idempotent; a
//! server-initiated close fires the close callback exactly once and is
//! never retried here (reconnection policy belongs to the owner).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::remote::Statistics;

use super::frames::{ClientFrame, ServerFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Callback invoked for each recognized server notification.
pub type NotificationHandler = Arc<dyn Fn(Statistics) + Send + Sync>;

/// Callback invoked exactly once on server-initiated closure.
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

/// A live, authenticated realtime connection.
///
/// At most one instance exists per authenticated session.
pub struct PushChannel {
    closed: Arc<AtomicBool>,
    sink: Arc<Mutex<Option<SplitSink<WsStream, Message>>>>,
    reader: JoinHandle<()>,
}

impl PushChannel {
    /// Open the channel and send the authentication frame.
    ///
    /// The token frame is guaranteed to precede any other client traffic;
    /// the reader task only starts once it has been written.
    pub async fn connect(
        ws_url: &str,
        token: &str,
        on_notification: NotificationHandler,
        on_close: CloseHandler,
    ) -> Result<Self, PushError> {
        let (mut ws, _) = connect_async(ws_url).await.map_err(PushError::Connect)?;

        let auth = ClientFrame::Authenticate {
            data: token.to_string(),
        };
        let frame = serde_json::to_string(&auth)
            .map_err(|e| PushError::BadFrame(e.to_string()))?;
        ws.send(Message::Text(frame))
            .await
            .map_err(PushError::Authenticate)?;

        tracing::debug!(url = %ws_url, "Push channel open and authenticated");

        let (sink, stream) = ws.split();
        let closed = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_loop(
            stream,
            Arc::clone(&closed),
            on_notification,
            on_close,
        ));

        Ok(Self {
            closed,
            sink: Arc::new(Mutex::new(Some(sink))),
            reader,
        })
    }

    /// Close the channel.
    ///
    /// Idempotent: closing an already-closed channel is a no-op. The close
    /// callback is suppressed, and the socket teardown is not awaited.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::debug!("Closing push channel");

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Some(mut sink) = sink.lock().await.take() {
                let _ = sink.send(Message::Close(None)).await;
            }
        });
        self.reader.abort();
    }

    /// Whether the channel has been closed, by either side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.reader.abort();
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    closed: Arc<AtomicBool>,
    on_notification: NotificationHandler,
    on_close: CloseHandler,
) {
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "Push channel read error");
                break;
            }
        };

        match serde_json::from_str::<ServerFrame>(&text) {
            Ok(ServerFrame::Statistics { data }) => on_notification(data),
            Ok(ServerFrame::Unknown) => {
                tracing::debug!("Ignoring unrecognized push frame");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed push frame");
            }
        }
    }

    // Only a server-initiated closure reaches this point with the flag
    // still unset; an explicit close() sets it first.
    if !closed.swap(true, Ordering::SeqCst) {
        tracing::info!("Push channel closed by server");
        on_close();
    }
}

/// Errors opening the realtime channel.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to connect realtime channel: {0}")]
    Connect(tokio_tungstenite::tungstenite::Error),

    #[error("failed to send authentication frame: {0}")]
    Authenticate(tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode frame: {0}")]
    BadFrame(String),
}
