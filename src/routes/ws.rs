//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic; we reply with a single JSON message per request.
//!
//! The connection also repaints on background changes to its session (upload
//! finished, celebration timed out). Views are idempotent, so a client may see
//! the same view twice.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, error, info, instrument};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ControlMessage, ServerWsMessage, WsQuery};
use crate::state::{AppState, SessionSlot};

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsQuery>,
) -> impl IntoResponse {
  info!(target: "course_player", "WebSocket upgrade requested");
  ws.max_message_size(max_ws_message(state.config.max_upload_bytes))
    .on_upgrade(move |socket| handle_ws(socket, state, q.session))
}

/// Largest text frame worth reading: a base64 upload at the size cap plus
/// room for the JSON envelope. Anything bigger drops the connection.
fn max_ws_message(max_upload_bytes: usize) -> usize {
  max_upload_bytes.div_ceil(3) * 4 + 4096
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, requested: Option<String>) {
  // Attach to an existing session (HTTP-created or reconnect), else own a fresh one.
  let attached = match &requested {
    Some(id) => state.get_session(id).await,
    None => None,
  };
  let owned = attached.is_none();
  let slot = match attached {
    Some(slot) => slot,
    None => state.create_session().await,
  };
  info!(target: "course_player", session = %slot.id, owned, "WebSocket connected");

  let mut changes = slot.subscribe();
  let hello = [
    ServerWsMessage::Session { session_id: slot.id.clone() },
    ServerWsMessage::View { view: render_view(&slot).await, scroll_to_top: false },
  ];
  for msg in &hello {
    if send(&mut socket, msg).await.is_err() {
      return finish(&state, &slot, owned).await;
    }
  }

  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => {
            let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(incoming) => {
                debug!(target: "course_player", "WS received: {:?}", &incoming);
                handle_client_ws(incoming, &state, &slot).await
              }
              Err(e) => ServerWsMessage::Error { message: format!("Invalid message: {}", e) },
            };
            if let Err(e) = send(&mut socket, &reply).await {
              error!(target: "course_player", error = %e, "WS send error");
              break;
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
      changed = changes.changed() => {
        if changed.is_err() { break; }
        let view = render_view(&slot).await;
        if let Err(e) = send(&mut socket, &ServerWsMessage::View { view, scroll_to_top: false }).await {
          error!(target: "course_player", error = %e, "WS push error");
          break;
        }
      }
    }
  }
  finish(&state, &slot, owned).await;
}

async fn finish(state: &AppState, slot: &SessionSlot, owned: bool) {
  if owned {
    state.remove_session(&slot.id).await;
  }
  info!(target: "course_player", session = %slot.id, "WebSocket disconnected");
}

#[instrument(level = "info", skip(msg, state, slot), fields(session = %slot.id))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, slot: &Arc<SessionSlot>) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Control(ControlMessage::Ping) => ServerWsMessage::Pong,

    ClientWsMessage::Control(ControlMessage::GetView) => {
      ServerWsMessage::View { view: render_view(slot).await, scroll_to_top: false }
    }

    ClientWsMessage::Control(ControlMessage::UploadCourse { file_name, pdf_base64 }) => {
      let bytes = match STANDARD.decode(pdf_base64.as_bytes()) {
        Ok(b) => b,
        Err(e) => return ServerWsMessage::Error { message: format!("Invalid base64 upload: {}", e) },
      };
      info!(target: "course_player", session = %slot.id, %file_name, size = bytes.len(), "WS upload received");
      match spawn_upload(state, slot, file_name, bytes).await {
        Ok(()) => ServerWsMessage::View { view: render_view(slot).await, scroll_to_top: false },
        Err(e) => ServerWsMessage::Error { message: e.alert_text() },
      }
    }

    ClientWsMessage::Action(action) => {
      let (outcome, view) = apply_action(state, slot, action).await;
      info!(target: "course", session = %slot.id, ?action, applied = outcome.applied, "WS action applied");
      ServerWsMessage::View { view, scroll_to_top: outcome.scroll_to_top }
    }
  }
}
