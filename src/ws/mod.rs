//! WebSocket transport and the session event router.
//!
//! ## Connection lifecycle
//!
//! 1. Client connects to `GET /api/ws` and joins a session with
//!    `session.join`. A connection is `Unjoined` until that succeeds, then
//!    `Joined` until disconnect.
//! 2. All messages are JSON objects with a `"type"` field.
//! 3. On disconnect the connection is unbound from its session. The display
//!    name stays in the participant list — participant lists only grow, which
//!    mirrors the original protocol and is relied on by clients.
//!
//! ## Message types (client → server)
//!
//! | Type              | Fields                    | Response / broadcast                          |
//! |-------------------|---------------------------|-----------------------------------------------|
//! | `session.join`    | `session_id`, `username`  | `session.joined` to requester, `participant.joined` to others, or `error` |
//! | `code.change`     | `code`                    | `code.updated` to every *other* peer          |
//! | `language.change` | `language`                | `language.updated` to **all** peers           |
//! | `problem.select`  | `problem_id`              | `problem.selected` to all peers, or silence   |
//! | `chat.message`    | `text`                    | `chat.message` to all peers, or silence       |
//! | `hint.request`    | `problem_id`              | `hint.received` to requester only, or silence |
//!
//! ## Message types (server → client)
//!
//! | Type                 | Key fields                                          |
//! |----------------------|-----------------------------------------------------|
//! | `session.joined`     | `session_id`, `code`, `language`, `users`, `problem`, `chat` |
//! | `participant.joined` | `username`, `users`                                 |
//! | `code.updated`       | `code`                                              |
//! | `language.updated`   | `language`                                          |
//! | `problem.selected`   | `problem_id`, `problem`, `code`                     |
//! | `chat.message`       | `entry` (`author`, `text`, `timestamp_ms`)          |
//! | `hint.received`      | `hint`                                              |
//! | `error`              | `message`                                           |
//!
//! ## Broadcast scope
//!
//! `code.updated` excludes the sender (echoing a participant's own
//! keystrokes back with nondeterministic timing would fight the editor).
//! Everything else goes to all bound connections, sender included, so every
//! client reconciles to the same canonical value.

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::problems::{problem_by_id, Language};
use crate::util::truncate_str;
use crate::AppState;

/// What a `Joined` connection knows about itself.
struct Binding {
    session_id: String,
    username: String,
    conn_id: Uuid,
}

/// `GET /api/ws` — WebSocket upgrade handler.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Main WebSocket event loop.
///
/// Splits the socket into a sink (outgoing) and stream (incoming). Outgoing
/// messages are funneled through an mpsc channel so broadcasts from other
/// connections can be delivered without holding a reference to the socket.
async fn handle_ws(socket: axum::extract::ws::WebSocket, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Outbox: both this task's replies and other connections' broadcasts.
    let (tx, mut rx) = mpsc::channel::<Value>(state.config.server.ws_outbox_size);

    // Task: forward channel messages to the WebSocket sink.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(t) => t,
                Err(e) => {
                    error!("WS send: failed to serialize message: {e}");
                    continue;
                }
            };
            if ws_sink
                .send(axum::extract::ws::Message::Text(text.into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let mut binding: Option<Binding> = None;

    while let Some(Ok(msg)) = ws_stream.next().await {
        match msg {
            axum::extract::ws::Message::Text(text) => {
                let Ok(parsed) = serde_json::from_str::<Value>(&text) else {
                    let _ = tx
                        .send(json!({
                            "type": "error",
                            "message": "Failed to parse JSON message"
                        }))
                        .await;
                    continue;
                };
                dispatch(&state, &tx, &mut binding, &parsed).await;
            }
            axum::extract::ws::Message::Close(_) => break,
            _ => {}
        }
    }

    // Unbind the transport. The participant list is left as-is.
    if let Some(b) = binding {
        state.registry.unbind(&b.session_id, b.conn_id).await;
        info!(
            "{} disconnected from session {} ({} peer(s) remain)",
            b.username,
            b.session_id,
            state.registry.peer_count(&b.session_id).await
        );
    }
    send_task.abort();
}

/// Route one inbound event to its handler.
async fn dispatch(
    state: &AppState,
    tx: &mpsc::Sender<Value>,
    binding: &mut Option<Binding>,
    parsed: &Value,
) {
    let msg_type = parsed["type"].as_str().unwrap_or("");
    match msg_type {
        "session.join" => {
            let session_id = parsed["session_id"].as_str().unwrap_or("");
            let username = parsed["username"].as_str().unwrap_or("");
            if session_id.is_empty() || username.is_empty() {
                let _ = tx
                    .send(json!({
                        "type": "error",
                        "message": "session_id and username are required"
                    }))
                    .await;
                return;
            }
            handle_join(state, tx, binding, session_id, username).await;
        }
        "code.change" => {
            let Some(b) = bound(tx, binding).await else {
                return;
            };
            let code = parsed["code"].as_str().unwrap_or("");
            handle_code_change(state, tx, b, code).await;
        }
        "language.change" => {
            let Some(b) = bound(tx, binding).await else {
                return;
            };
            let Ok(language) = serde_json::from_value::<Language>(parsed["language"].clone())
            else {
                let _ = tx
                    .send(json!({
                        "type": "error",
                        "message": format!("Unknown language: {}", parsed["language"])
                    }))
                    .await;
                return;
            };
            handle_language_change(state, tx, b, language).await;
        }
        "problem.select" => {
            let Some(b) = bound(tx, binding).await else {
                return;
            };
            let problem_id = parsed["problem_id"].as_str().unwrap_or("");
            handle_problem_select(state, tx, b, problem_id).await;
        }
        "chat.message" => {
            let Some(b) = bound(tx, binding).await else {
                return;
            };
            let text = parsed["text"].as_str().unwrap_or("");
            handle_chat_message(state, tx, b, text).await;
        }
        "hint.request" => {
            if bound(tx, binding).await.is_none() {
                return;
            }
            let problem_id = parsed["problem_id"].as_str().unwrap_or("");
            handle_hint_request(tx, problem_id).await;
        }
        _ => {
            let _ = tx
                .send(json!({
                    "type": "error",
                    "message": format!("Unknown message type: {msg_type}")
                }))
                .await;
        }
    }
}

/// Require a `Joined` connection; reply with a targeted error otherwise.
async fn bound<'a>(tx: &mpsc::Sender<Value>, binding: &'a Option<Binding>) -> Option<&'a Binding> {
    if binding.is_none() {
        let _ = tx
            .send(json!({
                "type": "error",
                "message": "Join a session first"
            }))
            .await;
    }
    binding.as_ref()
}

/// Handle `session.join` — `Unjoined -> Joined`, or an `error` reply with no
/// state created when the session is unknown.
async fn handle_join(
    state: &AppState,
    tx: &mpsc::Sender<Value>,
    binding: &mut Option<Binding>,
    session_id: &str,
    username: &str,
) {
    let users = match state.sessions.append_participant(session_id, username).await {
        Ok(users) => users,
        Err(e) => {
            let _ = tx
                .send(json!({
                    "type": "error",
                    "message": e.to_string()
                }))
                .await;
            return;
        }
    };

    // A connection joining again moves its binding, never holds two.
    if let Some(old) = binding.take() {
        state.registry.unbind(&old.session_id, old.conn_id).await;
    }

    let conn_id = state.registry.bind(session_id, tx.clone()).await;
    *binding = Some(Binding {
        session_id: session_id.to_string(),
        username: username.to_string(),
        conn_id,
    });

    // Full snapshot for the newcomer.
    if let Ok(session) = state.sessions.get(session_id).await {
        let _ = tx
            .send(json!({
                "type": "session.joined",
                "session_id": session.id,
                "code": session.code,
                "language": session.language,
                "users": session.participants,
                "problem": session.problem,
                "chat": session.chat,
            }))
            .await;
    }

    state
        .registry
        .broadcast(
            session_id,
            Some(conn_id),
            &json!({
                "type": "participant.joined",
                "username": username,
                "users": users,
            }),
        )
        .await;

    info!("{username} joined session {session_id}");
}

/// Handle `code.change` — last-write-wins buffer replacement, broadcast to
/// everyone but the sender.
async fn handle_code_change(state: &AppState, tx: &mpsc::Sender<Value>, b: &Binding, code: &str) {
    if let Err(e) = state.sessions.set_code(&b.session_id, code).await {
        let _ = tx
            .send(json!({
                "type": "error",
                "message": e.to_string()
            }))
            .await;
        return;
    }
    state
        .registry
        .broadcast(
            &b.session_id,
            Some(b.conn_id),
            &json!({
                "type": "code.updated",
                "code": code,
            }),
        )
        .await;
}

/// Handle `language.change` — broadcast to all peers including the sender,
/// whose UI reconciles to the canonical value like everyone else's.
async fn handle_language_change(
    state: &AppState,
    tx: &mpsc::Sender<Value>,
    b: &Binding,
    language: Language,
) {
    if let Err(e) = state.sessions.set_language(&b.session_id, language).await {
        let _ = tx
            .send(json!({
                "type": "error",
                "message": e.to_string()
            }))
            .await;
        return;
    }
    state
        .registry
        .broadcast(
            &b.session_id,
            None,
            &json!({
                "type": "language.updated",
                "language": language,
            }),
        )
        .await;
}

/// Handle `problem.select` — unknown problem ids are dropped silently, a
/// known id replaces both the selected problem and the shared buffer.
async fn handle_problem_select(
    state: &AppState,
    tx: &mpsc::Sender<Value>,
    b: &Binding,
    problem_id: &str,
) {
    let Some(problem) = problem_by_id(problem_id) else {
        debug!("problem.select for unknown problem {problem_id}, ignoring");
        return;
    };

    let language = match state.sessions.language(&b.session_id).await {
        Ok(language) => language,
        Err(e) => {
            let _ = tx
                .send(json!({
                    "type": "error",
                    "message": e.to_string()
                }))
                .await;
            return;
        }
    };
    let starter = problem.starter_code.for_language(language);

    if let Err(e) = state
        .sessions
        .set_problem(&b.session_id, problem_id, starter)
        .await
    {
        let _ = tx
            .send(json!({
                "type": "error",
                "message": e.to_string()
            }))
            .await;
        return;
    }

    state
        .registry
        .broadcast(
            &b.session_id,
            None,
            &json!({
                "type": "problem.selected",
                "problem_id": problem_id,
                "problem": problem,
                "code": starter,
            }),
        )
        .await;
}

/// Handle `chat.message` — whitespace-only messages are dropped before they
/// touch the session.
async fn handle_chat_message(state: &AppState, tx: &mpsc::Sender<Value>, b: &Binding, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match state
        .sessions
        .append_chat(&b.session_id, &b.username, text)
        .await
    {
        Ok(entry) => {
            debug!(
                "chat in {} from {}: {}",
                b.session_id,
                b.username,
                truncate_str(text, 80)
            );
            state
                .registry
                .broadcast(
                    &b.session_id,
                    None,
                    &json!({
                        "type": "chat.message",
                        "entry": entry,
                    }),
                )
                .await;
        }
        Err(e) => {
            let _ = tx
                .send(json!({
                    "type": "error",
                    "message": e.to_string()
                }))
                .await;
        }
    }
}

/// Handle `hint.request` — one uniformly random hint to the requester only.
/// A missing problem or an empty hint set yields silence.
async fn handle_hint_request(tx: &mpsc::Sender<Value>, problem_id: &str) {
    let Some(problem) = problem_by_id(problem_id) else {
        debug!("hint.request for unknown problem {problem_id}, ignoring");
        return;
    };
    let Some(hint) = problem.hints.choose(&mut rand::thread_rng()) else {
        return;
    };
    let _ = tx
        .send(json!({
            "type": "hint.received",
            "hint": hint,
        }))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ExecutionConfig, LoggingConfig, ServerConfig};
    use crate::sessions::{DEFAULT_CODE, DEFAULT_LANGUAGE};

    fn test_state() -> AppState {
        AppState::new(Config {
            server: ServerConfig::default(),
            execution: ExecutionConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// A fake connection: an outbox pair plus the router-side binding slot.
    struct Conn {
        tx: mpsc::Sender<Value>,
        rx: mpsc::Receiver<Value>,
        binding: Option<Binding>,
    }

    impl Conn {
        fn new() -> Self {
            let (tx, rx) = mpsc::channel(64);
            Self {
                tx,
                rx,
                binding: None,
            }
        }

        async fn send(&mut self, state: &AppState, msg: Value) {
            dispatch(state, &self.tx, &mut self.binding, &msg).await;
        }

        fn recv(&mut self) -> Value {
            self.rx.try_recv().expect("expected an event")
        }

        fn assert_silent(&mut self) {
            assert!(self.rx.try_recv().is_err(), "expected no event");
        }
    }

    async fn joined_pair(state: &AppState) -> (String, Conn, Conn) {
        let session_id = state.sessions.create().await;
        let mut a = Conn::new();
        let mut b = Conn::new();
        a.send(
            state,
            json!({"type": "session.join", "session_id": session_id, "username": "ada"}),
        )
        .await;
        b.send(
            state,
            json!({"type": "session.join", "session_id": session_id, "username": "grace"}),
        )
        .await;
        // Drain join traffic: a gets joined + participant.joined, b gets joined.
        a.recv();
        a.recv();
        b.recv();
        (session_id, a, b)
    }

    #[tokio::test]
    async fn test_join_unknown_session_yields_one_error_and_no_state() {
        let state = test_state();
        let mut conn = Conn::new();
        conn.send(
            &state,
            json!({"type": "session.join", "session_id": "missing", "username": "ada"}),
        )
        .await;

        let event = conn.recv();
        assert_eq!(event["type"], "error");
        assert!(event["message"].as_str().unwrap().contains("not found"));
        conn.assert_silent();
        assert!(conn.binding.is_none());
        assert_eq!(state.sessions.count().await, 0);
        assert_eq!(state.registry.peer_count("missing").await, 0);
    }

    #[tokio::test]
    async fn test_join_delivers_snapshot_and_notifies_others() {
        let state = test_state();
        let session_id = state.sessions.create().await;

        let mut a = Conn::new();
        a.send(
            &state,
            json!({"type": "session.join", "session_id": session_id, "username": "ada"}),
        )
        .await;
        let joined = a.recv();
        assert_eq!(joined["type"], "session.joined");
        assert_eq!(joined["code"], DEFAULT_CODE);
        assert_eq!(joined["language"], DEFAULT_LANGUAGE.as_str());
        assert_eq!(joined["users"], json!(["ada"]));
        assert_eq!(joined["problem"], Value::Null);
        assert_eq!(joined["chat"], json!([]));
        a.assert_silent();

        let mut b = Conn::new();
        b.send(
            &state,
            json!({"type": "session.join", "session_id": session_id, "username": "grace"}),
        )
        .await;
        let joined_b = b.recv();
        assert_eq!(joined_b["users"], json!(["ada", "grace"]));
        b.assert_silent();

        let notice = a.recv();
        assert_eq!(notice["type"], "participant.joined");
        assert_eq!(notice["username"], "grace");
        assert_eq!(notice["users"], json!(["ada", "grace"]));
    }

    #[tokio::test]
    async fn test_duplicate_display_names_are_allowed() {
        let state = test_state();
        let session_id = state.sessions.create().await;
        for _ in 0..2 {
            let mut conn = Conn::new();
            conn.send(
                &state,
                json!({"type": "session.join", "session_id": session_id, "username": "ada"}),
            )
            .await;
        }
        let session = state.sessions.get(&session_id).await.unwrap();
        assert_eq!(session.participants, vec!["ada", "ada"]);
    }

    #[tokio::test]
    async fn test_code_change_reaches_peers_but_never_echoes() {
        let state = test_state();
        let (session_id, mut a, mut b) = joined_pair(&state).await;

        a.send(&state, json!({"type": "code.change", "code": "let x = 1;"}))
            .await;

        let update = b.recv();
        assert_eq!(update["type"], "code.updated");
        assert_eq!(update["code"], "let x = 1;");
        a.assert_silent();
        assert_eq!(state.sessions.get(&session_id).await.unwrap().code, "let x = 1;");
    }

    #[tokio::test]
    async fn test_language_change_is_delivered_to_everyone_including_sender() {
        let state = test_state();
        let (session_id, mut a, mut b) = joined_pair(&state).await;

        a.send(&state, json!({"type": "language.change", "language": "python"}))
            .await;

        for conn in [&mut a, &mut b] {
            let update = conn.recv();
            assert_eq!(update["type"], "language.updated");
            assert_eq!(update["language"], "python");
        }
        assert_eq!(
            state.sessions.get(&session_id).await.unwrap().language,
            Language::Python
        );
    }

    #[tokio::test]
    async fn test_whitespace_chat_is_dropped_entirely() {
        let state = test_state();
        let (session_id, mut a, mut b) = joined_pair(&state).await;

        a.send(&state, json!({"type": "chat.message", "text": "  "}))
            .await;

        a.assert_silent();
        b.assert_silent();
        assert!(state.sessions.get(&session_id).await.unwrap().chat.is_empty());
    }

    #[tokio::test]
    async fn test_chat_message_is_stored_and_broadcast_to_all() {
        let state = test_state();
        let (session_id, mut a, mut b) = joined_pair(&state).await;

        a.send(&state, json!({"type": "chat.message", "text": "hi"}))
            .await;

        for conn in [&mut a, &mut b] {
            let event = conn.recv();
            assert_eq!(event["type"], "chat.message");
            assert_eq!(event["entry"]["author"], "ada");
            assert_eq!(event["entry"]["text"], "hi");
            assert!(event["entry"]["timestamp_ms"].as_u64().unwrap() > 0);
        }
        let chat = state.sessions.get(&session_id).await.unwrap().chat;
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].author, "ada");
    }

    #[tokio::test]
    async fn test_problem_select_replaces_buffer_for_current_language() {
        let state = test_state();
        let (session_id, mut a, mut b) = joined_pair(&state).await;

        // Switch to python first so the starter must match the session language.
        a.send(&state, json!({"type": "language.change", "language": "python"}))
            .await;
        a.recv();
        b.recv();

        a.send(&state, json!({"type": "problem.select", "problem_id": "two-sum"}))
            .await;

        let expected = problem_by_id("two-sum")
            .unwrap()
            .starter_code
            .for_language(Language::Python);
        for conn in [&mut a, &mut b] {
            let event = conn.recv();
            assert_eq!(event["type"], "problem.selected");
            assert_eq!(event["problem_id"], "two-sum");
            assert_eq!(event["code"], expected);
            assert_eq!(event["problem"]["title"], "Two Sum");
        }
        let session = state.sessions.get(&session_id).await.unwrap();
        assert_eq!(session.problem.as_deref(), Some("two-sum"));
        assert_eq!(session.code, expected);
    }

    #[tokio::test]
    async fn test_problem_select_with_unknown_id_is_a_silent_noop() {
        let state = test_state();
        let (session_id, mut a, mut b) = joined_pair(&state).await;
        let before = state.sessions.get(&session_id).await.unwrap();

        a.send(
            &state,
            json!({"type": "problem.select", "problem_id": "no-such-problem"}),
        )
        .await;

        a.assert_silent();
        b.assert_silent();
        let after = state.sessions.get(&session_id).await.unwrap();
        assert_eq!(after.code, before.code);
        assert_eq!(after.problem, before.problem);
    }

    #[tokio::test]
    async fn test_hint_goes_only_to_the_requester() {
        let state = test_state();
        let (_, mut a, mut b) = joined_pair(&state).await;

        a.send(&state, json!({"type": "hint.request", "problem_id": "fizzbuzz"}))
            .await;

        let event = a.recv();
        assert_eq!(event["type"], "hint.received");
        let hint = event["hint"].as_str().unwrap();
        assert!(problem_by_id("fizzbuzz")
            .unwrap()
            .hints
            .iter()
            .any(|h| *h == hint));
        b.assert_silent();
    }

    #[tokio::test]
    async fn test_hint_request_for_unknown_problem_is_silent() {
        let state = test_state();
        let (_, mut a, mut b) = joined_pair(&state).await;

        a.send(
            &state,
            json!({"type": "hint.request", "problem_id": "no-such-problem"}),
        )
        .await;

        a.assert_silent();
        b.assert_silent();
    }

    #[tokio::test]
    async fn test_events_from_unjoined_connections_get_a_targeted_error() {
        let state = test_state();
        let mut conn = Conn::new();
        conn.send(&state, json!({"type": "code.change", "code": "x"}))
            .await;
        let event = conn.recv();
        assert_eq!(event["type"], "error");
        assert_eq!(event["message"], "Join a session first");
    }

    #[tokio::test]
    async fn test_unknown_message_type_is_rejected() {
        let state = test_state();
        let mut conn = Conn::new();
        conn.send(&state, json!({"type": "bogus"})).await;
        let event = conn.recv();
        assert_eq!(event["type"], "error");
        assert!(event["message"].as_str().unwrap().contains("bogus"));
    }
}
