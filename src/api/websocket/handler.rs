//! WebSocket connection handler
//!
//! One task per connection runs the read loop; a second task owns the
//! socket sink and drains the connection's outbound queue, so broadcasts
//! never await socket I/O. Whatever way the read loop exits, the
//! termination path below it releases the connection's counter slot
//! exactly once and notifies the remaining members.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use super::broadcast::broadcast_update;
use super::connections::{ConnId, ConnSender};
use super::events::{ClientMessage, ServerMessage};
use super::state::AppState;
use crate::types::Light;

/// WebSocket upgrade handler for `GET /ws/:session_id`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Drive one WebSocket connection from handshake to cleanup
async fn handle_socket(mut socket: WebSocket, session_id: String, state: Arc<AppState>) {
    state.touch_activity();

    // Unknown session: close immediately, no state created.
    if !state.registry.contains(&session_id) {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: "Session not found".into(),
            })))
            .await;
        return;
    }

    let conn_id = state.next_conn_id();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Writer task: sole owner of the sink. Exits when the queue closes or
    // the socket rejects a send.
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    join_session(&state, &session_id, conn_id, tx.clone());
    debug!(%session_id, conn_id, "connection joined");

    // Read loop: any error is treated like a close and falls through to
    // the same cleanup.
    while let Some(result) = stream.next().await {
        match result {
            Ok(msg) => {
                if !handle_message(&state, &session_id, conn_id, &tx, msg) {
                    break;
                }
            }
            Err(e) => {
                debug!(%session_id, conn_id, error = %e, "connection fault");
                break;
            }
        }
    }

    leave_session(&state, &session_id, conn_id);
    debug!(%session_id, conn_id, "connection left");

    // Dropping the last sender ends the writer task.
    drop(tx);
    let _ = writer.await;
}

/// Register a connection and claim its initial slot
///
/// The first appearance of a connection id claims the default green slot;
/// a repeated registration claims nothing. The update broadcast goes out
/// either way so every member sees a fresh snapshot on (re)connect.
pub fn join_session(state: &AppState, session_id: &str, conn_id: ConnId, tx: ConnSender) {
    state.registry.clear_inactive(session_id);

    let first = state.connections.register(session_id, conn_id, tx);
    if first && state.registry.adjust(session_id, Light::Green, 1).is_ok() {
        state.connections.set_slot(session_id, conn_id, Light::Green);
        state.connections.mark_counted(session_id, conn_id);
    }

    broadcast_update(&state.registry, &state.connections, session_id);
}

/// Release a connection's slot and notify the remaining members
///
/// Runs once per connection, for every termination cause. If the session
/// just emptied out, it picks up an inactive marker for the reaper.
pub fn leave_session(state: &AppState, session_id: &str, conn_id: ConnId) {
    if let Some(meta) = state.connections.remove(session_id, conn_id) {
        if meta.counted {
            if let Some(slot) = meta.slot {
                let _ = state.registry.adjust(session_id, slot, -1);
            }
        }
    }

    if let Some(counts) = state.registry.counts(session_id) {
        if counts.total() == 0 {
            state.registry.mark_inactive(session_id, chrono::Utc::now());
        }
    }

    broadcast_update(&state.registry, &state.connections, session_id);
}

/// Handle one inbound frame; returns false when the connection should end
pub fn handle_message(
    state: &AppState,
    session_id: &str,
    conn_id: ConnId,
    tx: &ConnSender,
    msg: Message,
) -> bool {
    match msg {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::SelectLight { light }) => {
                    if apply_selection(state, session_id, conn_id, &light) {
                        broadcast_update(&state.registry, &state.connections, session_id);
                    }
                }
                Ok(ClientMessage::Heartbeat) => {
                    state.touch_activity();
                    if let Ok(json) = serde_json::to_string(&ServerMessage::heartbeat_ack()) {
                        let _ = tx.send(Message::Text(json));
                    }
                }
                Err(_) => {
                    // Malformed frames are dropped, the connection stays up.
                    debug!(session_id, conn_id, "ignoring malformed message");
                }
            }
            true
        }
        Message::Binary(_) => true,
        Message::Ping(data) => {
            let _ = tx.send(Message::Pong(data));
            true
        }
        Message::Pong(_) => true,
        Message::Close(_) => false,
    }
}

/// Apply a light selection; returns whether an update should be broadcast
///
/// A request naming the connection's current slot or an unknown light is
/// silently ignored. For a counted connection the two counter halves move
/// as one transition; the slot is updated either way.
pub fn apply_selection(state: &AppState, session_id: &str, conn_id: ConnId, light_name: &str) -> bool {
    let Ok(new_light) = Light::from_str(light_name) else {
        debug!(session_id, conn_id, light_name, "ignoring unknown light");
        return false;
    };

    let Some(meta) = state.connections.meta(session_id, conn_id) else {
        return false;
    };
    if meta.slot == Some(new_light) {
        return false;
    }

    if meta.counted {
        if let Some(old) = meta.slot {
            if state.registry.transfer(session_id, old, new_light).is_err() {
                return false;
            }
        }
    }

    state.connections.set_slot(session_id, conn_id, new_light);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LightCounts;
    use tokio::sync::mpsc;

    fn join(state: &AppState, session_id: &str) -> (ConnId, mpsc::UnboundedReceiver<Message>) {
        let conn_id = state.next_conn_id();
        let (tx, rx) = mpsc::unbounded_channel();
        join_session(state, session_id, conn_id, tx);
        (conn_id, rx)
    }

    fn counts(state: &AppState, session_id: &str) -> LightCounts {
        state.registry.counts(session_id).unwrap()
    }

    fn drain_updates(rx: &mut mpsc::UnboundedReceiver<Message>) -> usize {
        let mut n = 0;
        while rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    #[test]
    fn test_join_claims_green() {
        let state = AppState::new();
        let id = state.registry.create();

        let (conn, mut rx) = join(&state, &id);

        assert_eq!(counts(&state, &id).green, 1);
        let meta = state.connections.meta(&id, conn).unwrap();
        assert!(meta.counted);
        assert_eq!(meta.slot, Some(Light::Green));
        assert_eq!(drain_updates(&mut rx), 1);
    }

    #[test]
    fn test_join_clears_inactive_marker() {
        let state = AppState::new();
        let id = state.registry.create();
        state.registry.mark_inactive(&id, chrono::Utc::now());

        let _conn = join(&state, &id);

        assert!(!state.registry.is_inactive(&id));
    }

    #[test]
    fn test_selection_moves_counter() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, mut rx) = join(&state, &id);
        drain_updates(&mut rx);

        assert!(apply_selection(&state, &id, conn, "red"));

        let c = counts(&state, &id);
        assert_eq!((c.red, c.yellow, c.green), (1, 0, 0));
        assert_eq!(
            state.connections.meta(&id, conn).unwrap().slot,
            Some(Light::Red)
        );
    }

    #[test]
    fn test_same_light_selection_is_silent() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, _rx) = join(&state, &id);

        assert!(!apply_selection(&state, &id, conn, "green"));
        assert_eq!(counts(&state, &id).green, 1);
    }

    #[test]
    fn test_unknown_light_is_ignored() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, _rx) = join(&state, &id);

        assert!(!apply_selection(&state, &id, conn, "blue"));
        assert_eq!(counts(&state, &id).green, 1);
    }

    #[test]
    fn test_malformed_text_keeps_connection_open() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, _rx) = join(&state, &id);
        let (tx, _ack_rx) = mpsc::unbounded_channel();

        assert!(handle_message(
            &state,
            &id,
            conn,
            &tx,
            Message::Text("{not json".to_string())
        ));
        assert_eq!(counts(&state, &id).green, 1);
    }

    #[test]
    fn test_heartbeat_acks_sender_only() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, mut rx_member) = join(&state, &id);
        drain_updates(&mut rx_member);
        let (tx, mut rx_ack) = mpsc::unbounded_channel();

        handle_message(
            &state,
            &id,
            conn,
            &tx,
            Message::Text(r#"{"type":"heartbeat"}"#.to_string()),
        );

        let Message::Text(json) = rx_ack.try_recv().unwrap() else {
            panic!("expected text frame");
        };
        assert!(json.contains("heartbeat_ack"));
        // No broadcast to session members.
        assert_eq!(drain_updates(&mut rx_member), 0);
    }

    #[test]
    fn test_close_frame_ends_connection() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, _rx) = join(&state, &id);
        let (tx, _rx2) = mpsc::unbounded_channel();

        assert!(!handle_message(&state, &id, conn, &tx, Message::Close(None)));
    }

    #[test]
    fn test_leave_releases_slot_and_marks_inactive() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, _rx) = join(&state, &id);

        leave_session(&state, &id, conn);

        assert_eq!(counts(&state, &id).total(), 0);
        assert!(state.registry.is_inactive(&id));
        assert_eq!(state.connections.session_len(&id), 0);
    }

    #[test]
    fn test_leave_without_registration_is_harmless() {
        let state = AppState::new();
        let id = state.registry.create();
        let _keep = join(&state, &id);

        // A connection that never registered cannot push counters negative.
        leave_session(&state, &id, 999);
        assert_eq!(counts(&state, &id).total(), 1);
    }

    #[test]
    fn test_second_leave_is_noop() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn, _rx) = join(&state, &id);

        leave_session(&state, &id, conn);
        leave_session(&state, &id, conn);

        assert_eq!(counts(&state, &id).total(), 0);
    }

    #[test]
    fn test_remaining_member_sees_leave_broadcast() {
        let state = AppState::new();
        let id = state.registry.create();
        let (conn_a, _rx_a) = join(&state, &id);
        let (_conn_b, mut rx_b) = join(&state, &id);
        drain_updates(&mut rx_b);

        leave_session(&state, &id, conn_a);

        assert_eq!(drain_updates(&mut rx_b), 1);
        assert_eq!(counts(&state, &id).total(), 1);
        assert!(!state.registry.is_inactive(&id));
    }
}
