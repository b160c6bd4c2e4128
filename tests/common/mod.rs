//! In-process stand-in for the transfer backend: REST routes plus a push socket.

#![allow(dead_code)]

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Multipart, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chunkstream_console::config::ClientConfig;
use chunkstream_console::coordinator::{Notice, ViewState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep, timeout, Duration};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub target: String,
}

#[derive(Debug, Clone)]
enum Outgoing {
    Frame(String),
    Close,
}

struct StubState {
    peers: Mutex<Vec<String>>,
    uploads: Mutex<Vec<Upload>>,
    decisions: Mutex<Vec<Value>>,
    requests: Mutex<Vec<String>>,
    push: broadcast::Sender<Outgoing>,
}

#[derive(Clone)]
pub struct StubBackend {
    pub addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let (push, _) = broadcast::channel(64);
        let state = Arc::new(StubState {
            peers: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            decisions: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            push,
        });

        let app = Router::new()
            .route("/connect", post(connect))
            .route("/clients", get(clients))
            .route("/sendfile", post(sendfile))
            .route("/ws", get(websocket_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_server(&format!("http://{}", self.addr)).unwrap()
    }

    /// Push a raw frame to every connected client.
    pub fn push(&self, frame: Value) {
        self.state
            .push
            .send(Outgoing::Frame(frame.to_string()))
            .unwrap();
    }

    /// Close every push socket from the server side.
    pub fn close_push(&self) {
        self.state.push.send(Outgoing::Close).unwrap();
    }

    /// Replace the list served by `/clients`.
    pub fn set_peers(&self, peers: &[&str]) {
        *self.state.peers.lock().unwrap() = peers.iter().map(|p| p.to_string()).collect();
    }

    pub async fn wait_for_subscriber(&self) {
        timeout(WAIT, async {
            while self.state.push.receiver_count() == 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no client subscribed to the push socket");
    }

    pub async fn wait_for_decisions(&self, count: usize) -> Vec<Value> {
        timeout(WAIT, async {
            loop {
                let decisions = self.decisions();
                if decisions.len() >= count {
                    return decisions;
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("decisions not received")
    }

    pub fn decisions(&self) -> Vec<Value> {
        self.state.decisions.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count_requests(&self, route: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == route).count()
    }

    pub async fn wait_for_requests(&self, route: &str, count: usize) {
        timeout(WAIT, async {
            while self.count_requests(route) < count {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("requests not received")
    }
}

fn log(state: &StubState, route: &str) {
    state.requests.lock().unwrap().push(route.to_string());
}

async fn connect(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    log(&state, "POST /connect");

    let address = body["address"].as_str().unwrap_or_default().to_string();
    if address.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing address" })),
        )
            .into_response();
    }
    if address.starts_with("refuse:") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Peer refused" })),
        )
            .into_response();
    }
    if address.starts_with("crash:") {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let mut peers = state.peers.lock().unwrap();
    if !peers.contains(&address) {
        peers.push(address.clone());
    }

    Json(json!({ "message": format!("Connected to {address}") })).into_response()
}

async fn clients(State(state): State<Arc<StubState>>) -> Json<Vec<String>> {
    log(&state, "GET /clients");
    Json(state.peers.lock().unwrap().clone())
}

async fn sendfile(State(state): State<Arc<StubState>>, mut multipart: Multipart) -> Response {
    log(&state, "POST /sendfile");

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut target: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap_or_default().to_vec();
                file = Some((filename, bytes));
            }
            "target" => target = field.text().await.ok(),
            _ => {}
        }
    }

    let (Some((filename, bytes)), Some(target)) = (file, target) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing file or target parameter" })),
        )
            .into_response();
    };

    state.uploads.lock().unwrap().push(Upload {
        filename,
        bytes,
        target: target.clone(),
    });

    Json(json!({ "message": format!("File sent to {target}") })).into_response()
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<StubState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

async fn handle_websocket(mut socket: WebSocket, state: Arc<StubState>) {
    let mut frames = state.push.subscribe();

    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Ok(Outgoing::Frame(text)) => {
                        if socket.send(Message::Text(text)).await.is_err() {
                            return;
                        }
                    }
                    Ok(Outgoing::Close) => {
                        let _ = socket.send(Message::Close(None)).await;
                        return;
                    }
                    Err(_) => return,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(value) = serde_json::from_str::<Value>(&text) {
                            state.decisions.lock().unwrap().push(value);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
}

pub async fn wait_for_view<F>(view: &mut watch::Receiver<ViewState>, predicate: F) -> ViewState
where
    F: FnMut(&ViewState) -> bool,
{
    let state = timeout(WAIT, view.wait_for(predicate))
        .await
        .expect("view did not reach the expected state")
        .expect("coordinator stopped");
    state.clone()
}

pub async fn wait_for_notice<F>(notices: &mut mpsc::UnboundedReceiver<Notice>, mut predicate: F) -> Notice
where
    F: FnMut(&Notice) -> bool,
{
    timeout(WAIT, async {
        while let Some(notice) = notices.recv().await {
            if predicate(&notice) {
                return notice;
            }
        }
        panic!("notice stream ended");
    })
    .await
    .expect("expected notice not received")
}
