//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the round engine. We reply with a single JSON message per
//! request; the round timer stays client-driven (one `tick` per second).

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::chat;
use crate::engine::{Command, Event};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "pitwall_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "pitwall_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "pitwall_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "pitwall_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "pitwall_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartRound { mode, difficulty, timed, username } => {
      match state.start_session(mode, difficulty, timed, username).await {
        Ok((id, session)) => {
          tracing::info!(target: "quiz", session = %id, %mode, %difficulty, "WS round served");
          ServerWsMessage::Question { round: to_round_out(&id, &session) }
        }
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::SubmitAnswer { session_id, answer } => {
      match state.apply_command(&session_id, Command::Answer { text: answer }).await {
        Ok(outcome) => match outcome.event {
          Event::Correct { score, time_left } => {
            tracing::info!(target: "quiz", session = %session_id, correct = true, score, "WS answer evaluated");
            ServerWsMessage::AnswerResult { correct: true, score, time_left }
          }
          Event::Over { reason, correct_answer, final_score } => {
            tracing::info!(target: "quiz", session = %session_id, correct = false, final_score, "WS answer evaluated");
            ServerWsMessage::GameOver {
              reason: over_reason_label(reason).to_string(),
              correct_answer,
              final_score,
              placement: outcome.placement,
              warning: outcome.warning,
            }
          }
          _ => ServerWsMessage::Error { message: "Unexpected round state.".into() },
        },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::NextQuestion { session_id } => {
      match state.apply_command(&session_id, Command::Next).await {
        Ok(outcome) => ServerWsMessage::Question { round: to_round_out(&session_id, &outcome.session) },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Tick { session_id } => {
      match state.apply_command(&session_id, Command::Tick).await {
        Ok(outcome) => match outcome.event {
          Event::Clock { time_left } => ServerWsMessage::Clock { time_left },
          Event::Over { reason, correct_answer, final_score } => ServerWsMessage::GameOver {
            reason: over_reason_label(reason).to_string(),
            correct_answer,
            final_score,
            placement: outcome.placement,
            warning: outcome.warning,
          },
          _ => ServerWsMessage::Error { message: "Unexpected round state.".into() },
        },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::GetLeaderboard { mode } => {
      let (entries, warning) = state.standings(mode).await;
      tracing::info!(target: "quiz", %mode, rows = entries.len(), "WS leaderboard served");
      ServerWsMessage::Leaderboard { mode, entries: to_entry_rows(&entries), warning }
    }

    ClientWsMessage::Chat { chat_id, username, text } => {
      let reply = chat::handle_line(state, &chat_id, &username, &text).await;
      ServerWsMessage::ChatReply { lines: reply.lines, keyboard: reply.keyboard }
    }
  }
}
