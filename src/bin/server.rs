use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use packman_chase_engine::config::{init_tracing, SimConfig};
use packman_chase_engine::constants::TICK_MS;
use packman_chase_engine::driver::{FrameDriver, FrameOutcome};
use packman_chase_engine::engine::{GameEngine, GameEngineOptions};
use packman_chase_engine::highscore_store::HighScoreStore;
use packman_chase_engine::server_protocol::{parse_client_message, ParsedClientMessage};
use packman_chase_engine::types::Snapshot;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON file with gameplay tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    driver: FrameDriver,
    highscore_store: HighScoreStore,
    started_at: Instant,
    game_over_sent: bool,
}

impl ServerState {
    fn new(driver: FrameDriver, highscore_store: HighScoreStore) -> Self {
        Self {
            clients: HashMap::new(),
            driver,
            highscore_store,
            started_at: Instant::now(),
            game_over_sent: false,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let highscore_path = std::env::var("HIGHSCORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/highscore.json"));
    let highscore_store = HighScoreStore::new(highscore_path);

    let config = match cli.config.as_ref() {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let engine = GameEngine::new(GameEngineOptions {
        seed: cli.seed.unwrap_or_else(rand::random),
        config,
        high_score: highscore_store.high_score(),
    })?;

    let state = Arc::new(Mutex::new(ServerState::new(
        FrameDriver::new(engine),
        highscore_store,
    )));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/highscore", get(highscore_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        tracing::info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        tracing::warn!("static file root not found; set STATIC_DIR to serve a client");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;

    tracing::info!(port, "listening");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("../dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn highscore_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.highscore_store.build_response())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_welcome(&mut guard, &client_id);
        tracing::info!(client_id = %client_id, clients = guard.clients.len(), "client connected");
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(&state, &client_id, &text).await;
                } else {
                    let mut guard = state.lock().await;
                    send_error(&mut guard, &client_id, "invalid utf8 message");
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
        tracing::info!(client_id = %client_id, clients = guard.clients.len(), "client disconnected");
    }
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let mut guard = state.lock().await;
    apply_client_message(&mut guard, client_id, raw);
}

fn apply_client_message(state: &mut ServerState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error(state, client_id, "invalid message");
        return;
    };

    match message {
        ParsedClientMessage::Input { dir } => {
            state.driver.engine_mut().set_direction(dir);
        }
        ParsedClientMessage::Pause => {
            state.driver.pause();
            broadcast_session(state);
        }
        ParsedClientMessage::Resume => {
            state.driver.resume();
            broadcast_session(state);
        }
        ParsedClientMessage::Restart => {
            state.driver.restart();
            state.game_over_sent = false;
            let snapshot = state.driver.engine_mut().build_snapshot(true);
            broadcast_session(state);
            broadcast(state, &state_message(&snapshot), QueuePolicy::DropOnFull);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                state,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn send_welcome(state: &mut ServerState, client_id: &str) {
    // Events stay queued for the next broadcast.
    let snapshot = state.driver.engine_mut().build_snapshot(false);
    let message = json!({
        "type": "welcome",
        "clientId": client_id,
        "paused": state.driver.is_paused(),
        "snapshot": snapshot,
    });
    send_to_client(state, client_id, &message, QueuePolicy::DisconnectOnFull);
}

fn broadcast_session(state: &mut ServerState) {
    let message = json!({
        "type": "session",
        "paused": state.driver.is_paused(),
    });
    broadcast(state, &message, QueuePolicy::DisconnectOnFull);
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            let now_ms = guard.elapsed_ms();
            tick_session(&mut guard, now_ms);
        }
    });
}

fn tick_session(state: &mut ServerState, now_ms: u64) {
    match state.driver.frame(now_ms) {
        FrameOutcome::Stepped { .. } => {}
        FrameOutcome::Skipped | FrameOutcome::Failed => return,
    }

    let snapshot = state.driver.engine_mut().build_snapshot(true);
    broadcast(state, &state_message(&snapshot), QueuePolicy::DropOnFull);

    if snapshot.game_over && !state.game_over_sent {
        state.game_over_sent = true;
        let new_record = state.highscore_store.record(snapshot.score);
        let message = json!({
            "type": "game_over",
            "reason": snapshot.end_reason,
            "score": snapshot.score,
            "highScore": state.highscore_store.high_score(),
            "newRecord": new_record,
        });
        broadcast(state, &message, QueuePolicy::DisconnectOnFull);
    }
}

fn state_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "state",
        "snapshot": snapshot,
    })
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_slow_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_slow_client(state, &client_id);
    }
}

fn disconnect_slow_client(state: &mut ServerState, client_id: &str) {
    let Some(client) = state.clients.remove(client_id) else {
        return;
    };
    tracing::warn!(client_id, "outbound queue full; disconnecting");
    let _ = client.tx.try_send(OutboundMessage::Close {
        code: 1013,
        reason: "outbound queue full".to_string(),
    });
}

fn send_error(state: &mut ServerState, client_id: &str, message: &str) {
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use packman_chase_engine::maze::{Maze, MazeGeometry};

    fn temp_store() -> HighScoreStore {
        let unique = format!("server-test-{}-{}", std::process::id(), rand::random::<u32>());
        HighScoreStore::new(std::env::temp_dir().join(unique).join("highscore.json"))
    }

    fn session(rows: &[&str]) -> ServerState {
        let maze = Maze::parse(rows, MazeGeometry::plain()).expect("maze parses");
        let engine = GameEngine::with_setup(maze, Vec::new(), GameEngineOptions::default())
            .expect("engine builds");
        ServerState::new(FrameDriver::new(engine), temp_store())
    }

    fn connect(state: &mut ServerState, client_id: &str) -> mpsc::Receiver<OutboundMessage> {
        let (tx, rx) = mpsc::channel(16);
        state
            .clients
            .insert(client_id.to_string(), ClientContext { tx });
        rx
    }

    fn next_json(rx: &mut mpsc::Receiver<OutboundMessage>) -> Value {
        match rx.try_recv().expect("message queued") {
            OutboundMessage::Text(payload) => serde_json::from_str(&payload).expect("valid json"),
            OutboundMessage::Close { .. } => panic!("unexpected close"),
        }
    }

    #[test]
    fn tick_broadcasts_state_to_connected_clients() {
        let mut state = session(&["######", "#P ..#", "######"]);
        let mut rx = connect(&mut state, "c1");

        tick_session(&mut state, 0);
        let message = next_json(&mut rx);
        assert_eq!(message["type"], "state");
        assert_eq!(message["snapshot"]["tick"], 1);
    }

    #[test]
    fn pause_stops_state_broadcasts() {
        let mut state = session(&["######", "#P ..#", "######"]);
        let mut rx = connect(&mut state, "c1");

        apply_client_message(&mut state, "c1", r#"{"type":"pause"}"#);
        let message = next_json(&mut rx);
        assert_eq!(message["type"], "session");
        assert_eq!(message["paused"], true);

        tick_session(&mut state, 16);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cleared_game_reports_game_over_once_and_records_the_score() {
        // the only dot sits next to the start and is picked up moving right
        let mut state = session(&["####", "#P.#", "####"]);
        let mut rx = connect(&mut state, "c1");

        apply_client_message(&mut state, "c1", r#"{"type":"input","dir":"right"}"#);
        let mut now_ms = 0;
        while !state.game_over_sent && now_ms < 2_000 {
            tick_session(&mut state, now_ms);
            now_ms += TICK_MS;
        }
        assert!(state.game_over_sent);
        assert!(state.highscore_store.high_score() > 0);

        let mut game_over_count = 0;
        while let Ok(OutboundMessage::Text(payload)) = rx.try_recv() {
            let message: Value = serde_json::from_str(&payload).expect("valid json");
            if message["type"] == "game_over" {
                game_over_count += 1;
                assert_eq!(message["reason"], "cleared");
                assert_eq!(message["newRecord"], true);
            }
        }
        assert_eq!(game_over_count, 1);

        tick_session(&mut state, now_ms);
        assert!(rx.try_recv().is_err());

        apply_client_message(&mut state, "c1", r#"{"type":"restart"}"#);
        assert!(!state.game_over_sent);
        assert!(!state.driver.engine().is_ended());
    }

    #[test]
    fn ping_is_answered_and_garbage_is_rejected() {
        let mut state = session(&["######", "#P ..#", "######"]);
        let mut rx = connect(&mut state, "c1");

        apply_client_message(&mut state, "c1", r#"{"type":"ping","t":42}"#);
        let message = next_json(&mut rx);
        assert_eq!(message["type"], "pong");
        assert_eq!(message["t"], 42.0);

        apply_client_message(&mut state, "c1", r#"{"type":"hello"}"#);
        let message = next_json(&mut rx);
        assert_eq!(message["type"], "error");
    }

    #[test]
    fn full_queue_disconnects_on_critical_messages() {
        let mut state = session(&["######", "#P ..#", "######"]);
        let (tx, _rx) = mpsc::channel(1);
        state
            .clients
            .insert("slow".to_string(), ClientContext { tx });

        tick_session(&mut state, 0);
        assert!(state.clients.contains_key("slow"));

        broadcast_session(&mut state);
        assert!(!state.clients.contains_key("slow"));
    }
}
