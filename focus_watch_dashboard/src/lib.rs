use std::path::PathBuf;
use std::sync::Arc;

use focus_watch::config::DashboardConfig;
use focus_watch::{Notifier, StatusEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::debug;

pub mod page;

/// Fan-out of focus status events to dashboard clients. Also keeps the latest
/// status so a client that connects late starts from the current state.
#[derive(Clone)]
pub struct StatusBus {
    pub status_tx: broadcast::Sender<StatusEvent>,
    snapshot_tx: Arc<watch::Sender<StatusEvent>>,
}

impl StatusBus {
    pub fn new(capacity: usize) -> Self {
        let (status_tx, _) = broadcast::channel::<StatusEvent>(capacity.max(1));
        let (snapshot_tx, _) = watch::channel(StatusEvent { active: false });
        Self {
            status_tx,
            snapshot_tx: Arc::new(snapshot_tx),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_tx.subscribe()
    }

    pub fn snapshot(&self) -> StatusEvent {
        *self.snapshot_tx.borrow()
    }
}

impl Notifier for StatusBus {
    fn emit(&self, event: StatusEvent) {
        self.snapshot_tx.send_replace(event);
        if self.status_tx.send(event).is_err() {
            debug!(active = event.active, "no dashboard clients connected");
        }
    }
}

/// Messages pushed to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    Status { active: bool },
}

impl From<StatusEvent> for ServerMessage {
    fn from(event: StatusEvent) -> Self {
        ServerMessage::Status {
            active: event.active,
        }
    }
}

/// Messages accepted from the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The dashboard finished loading and may be hidden until needed.
    ReadyToHide,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(msg) => Some(msg),
            Err(e) => {
                debug!(error = %e, "ignoring unrecognised client message");
                None
            }
        }
    }
}

/// Applies a client message to the shared state.
pub fn handle_client_message(msg: &ClientMessage, stealth: &focus_watch::StealthFlag) {
    match msg {
        ClientMessage::ReadyToHide => {
            stealth.engage();
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub index_path: PathBuf,
    pub video_path: PathBuf,
}

impl From<&DashboardConfig> for ServerConfig {
    fn from(cfg: &DashboardConfig) -> Self {
        Self {
            bind_addr: cfg.bind_addr.clone(),
            index_path: cfg.index_path.clone(),
            video_path: cfg.video_dir.join(&cfg.video_file),
        }
    }
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg") | Some("ogv") => "video/ogg",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// The part of the video a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteRange {
    Full,
    /// Inclusive bounds.
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

/// Interprets a `Range` header against a body of `len` bytes. Only a single
/// `bytes=` range is honoured; anything else is served in full.
fn byte_range(header: Option<&str>, len: u64) -> ByteRange {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return ByteRange::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    let bounds = match (first.is_empty(), last.is_empty()) {
        // bytes=-N: the final N bytes.
        (true, false) => match last.parse::<u64>() {
            Ok(0) => return ByteRange::Unsatisfiable,
            Ok(n) => (len.saturating_sub(n), len.saturating_sub(1)),
            Err(_) => return ByteRange::Full,
        },
        (false, true) => match first.parse::<u64>() {
            Ok(start) => (start, len.saturating_sub(1)),
            Err(_) => return ByteRange::Full,
        },
        (false, false) => match (first.parse::<u64>(), last.parse::<u64>()) {
            (Ok(start), Ok(end)) if start <= end => (start, end.min(len.saturating_sub(1))),
            _ => return ByteRange::Full,
        },
        (true, true) => return ByteRange::Full,
    };

    if len == 0 || bounds.0 >= len {
        return ByteRange::Unsatisfiable;
    }
    ByteRange::Partial {
        start: bounds.0,
        end: bounds.1,
    }
}

/// Reads `reader` to the end in fixed-size chunks, for streaming response
/// bodies without buffering the whole file.
#[cfg(feature = "web")]
fn read_chunks<R>(reader: R) -> impl futures_util::Stream<Item = std::io::Result<Vec<u8>>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    const CHUNK: usize = 64 * 1024;
    futures_util::stream::try_unfold(reader, |mut reader| async move {
        let mut buf = vec![0; CHUNK];
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok::<_, std::io::Error>(Some((buf, reader)))
    })
}

#[cfg(feature = "web")]
pub async fn start_server(
    bus: StatusBus,
    stealth: focus_watch::StealthFlag,
    cfg: ServerConfig,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    use axum::body::Body;
    use axum::extract::State;
    use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::{Html, IntoResponse, Response};
    use axum::{Router, routing::get};
    use futures_util::{SinkExt, StreamExt};
    use std::io::SeekFrom;
    use tokio::io::{AsyncReadExt, AsyncSeekExt};
    use tokio::sync::broadcast::error::RecvError;
    use tracing::{info, warn};

    #[derive(Clone)]
    struct AppState {
        bus: StatusBus,
        stealth: focus_watch::StealthFlag,
        cfg: Arc<ServerConfig>,
    }

    async fn index(State(state): State<AppState>) -> Html<String> {
        match tokio::fs::read_to_string(&state.cfg.index_path).await {
            Ok(page) => Html(page),
            Err(e) => {
                debug!(path = %state.cfg.index_path.display(), error = %e, "serving embedded dashboard");
                Html(page::INDEX_HTML.to_string())
            }
        }
    }

    async fn video(State(state): State<AppState>, headers: HeaderMap) -> Response {
        let path = &state.cfg.video_path;
        let opened = match tokio::fs::File::open(path).await {
            Ok(file) => file.metadata().await.map(|meta| (file, meta.len())),
            Err(e) => Err(e),
        };
        let (mut file, len) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "video not available");
                return (StatusCode::NOT_FOUND, "video not found").into_response();
            }
        };

        let requested = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
        let (status, start, end) = match byte_range(requested, len) {
            ByteRange::Full => (StatusCode::OK, 0, len),
            ByteRange::Partial { start, end } => (StatusCode::PARTIAL_CONTENT, start, end + 1),
            ByteRange::Unsatisfiable => {
                return (
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    [(header::CONTENT_RANGE, format!("bytes */{len}"))],
                )
                    .into_response();
            }
        };
        if start > 0 {
            if let Err(e) = file.seek(SeekFrom::Start(start)).await {
                warn!(path = %path.display(), error = %e, "video seek failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }

        let mut resp = Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, content_type_for(path))
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CONTENT_LENGTH, end - start);
        if status == StatusCode::PARTIAL_CONTENT {
            resp = resp.header(header::CONTENT_RANGE, format!("bytes {start}-{}/{len}", end - 1));
        }
        let body = Body::from_stream(read_chunks(file.take(end - start)));
        resp.body(body)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }

    async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
        ws.on_upgrade(move |socket| ws_conn(socket, state))
    }

    async fn send_status(
        tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
        event: StatusEvent,
    ) -> bool {
        match serde_json::to_string(&ServerMessage::from(event)) {
            Ok(txt) => tx.send(Message::Text(txt)).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn ws_conn(socket: WebSocket, state: AppState) {
        let (mut ws_tx, mut ws_rx) = socket.split();
        let mut status_rx = state.bus.subscribe();
        debug!("dashboard client connected");

        // Late joiners start from the current state.
        if !send_status(&mut ws_tx, state.bus.snapshot()).await {
            return;
        }

        loop {
            tokio::select! {
                event = status_rx.recv() => match event {
                    Ok(event) => {
                        if !send_status(&mut ws_tx, event).await { break; }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dashboard client lagged, resending snapshot");
                        if !send_status(&mut ws_tx, state.bus.snapshot()).await { break; }
                    }
                    Err(RecvError::Closed) => break,
                },
                msg = ws_rx.next() => match msg {
                    Some(Ok(Message::Text(txt))) => {
                        if let Some(msg) = ClientMessage::parse(&txt) {
                            handle_client_message(&msg, &state.stealth);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => { debug!(error = %e, "dashboard socket error"); break; }
                    Some(Ok(_)) => {}
                },
            }
        }
        debug!("dashboard client disconnected");
    }

    let state = AppState {
        bus,
        stealth,
        cfg: Arc::new(cfg.clone()),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/video", get(video))
        .route("/ws", get(ws_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!(addr = %cfg.bind_addr, "dashboard listening on http://{}", cfg.bind_addr);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "dashboard server stopped");
        }
    });

    Ok(server)
}

#[cfg(not(feature = "web"))]
pub async fn start_server(
    _bus: StatusBus,
    _stealth: focus_watch::StealthFlag,
    _cfg: ServerConfig,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    Err(anyhow::anyhow!("web feature not enabled for focus_watch_dashboard"))
}
