//! HTTP endpoint handlers. These are thin wrappers that forward to the round
//! engine and leaderboard via `AppState`; engine rejections come back as 400s.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::chat;
use crate::engine::{Command, Event};
use crate::protocol::*;
use crate::state::AppState;

fn error_response(message: &str) -> Response {
  (StatusCode::BAD_REQUEST, Json(ErrorOut { message: message.to_string() })).into_response()
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(%body.mode, %body.difficulty, timed = body.timed))]
pub async fn http_post_round(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartRoundIn>,
) -> Response {
  match state.start_session(body.mode, body.difficulty, body.timed, body.username).await {
    Ok((id, session)) => {
      info!(target: "quiz", session = %id, mode = %body.mode, "HTTP round served");
      Json(to_round_out(&id, &session)).into_response()
    }
    Err(e) => error_response(&e),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Response {
  match state.apply_command(&body.session_id, Command::Answer { text: body.answer }).await {
    Ok(outcome) => {
      let reply = match outcome.event {
        Event::Correct { score, time_left } => {
          AnswerOut { correct: true, score, time_left, over: None }
        }
        Event::Over { reason, correct_answer, final_score } => AnswerOut {
          correct: false,
          score: final_score,
          time_left: outcome.session.time_left,
          over: Some(GameOverOut {
            reason: over_reason_label(reason).to_string(),
            correct_answer,
            final_score,
            placement: outcome.placement,
            warning: outcome.warning,
          }),
        },
        _ => return error_response("Unexpected round state."),
      };
      info!(target: "quiz", id = %body.session_id, correct = reply.correct, score = reply.score, "HTTP answer evaluated");
      Json(reply).into_response()
    }
    Err(e) => error_response(&e),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_next(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionRef>,
) -> Response {
  match state.apply_command(&body.session_id, Command::Next).await {
    Ok(outcome) => match outcome.event {
      Event::Question { .. } => Json(to_round_out(&body.session_id, &outcome.session)).into_response(),
      _ => error_response("Unexpected round state."),
    },
    Err(e) => error_response(&e),
  }
}

#[instrument(level = "debug", skip(state, body), fields(%body.session_id))]
pub async fn http_post_tick(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionRef>,
) -> Response {
  match state.apply_command(&body.session_id, Command::Tick).await {
    Ok(outcome) => {
      let reply = match outcome.event {
        Event::Clock { time_left } => ClockOut { time_left, over: None },
        Event::Over { reason, correct_answer, final_score } => ClockOut {
          time_left: 0,
          over: Some(GameOverOut {
            reason: over_reason_label(reason).to_string(),
            correct_answer,
            final_score,
            placement: outcome.placement,
            warning: outcome.warning,
          }),
        },
        _ => return error_response("Unexpected round state."),
      };
      Json(reply).into_response()
    }
    Err(e) => error_response(&e),
  }
}

#[instrument(level = "info", skip(state), fields(mode = %q.mode.unwrap_or_default()))]
pub async fn http_get_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LeaderboardQuery>,
) -> impl IntoResponse {
  let mode = q.mode.unwrap_or_default();
  let (entries, warning) = state.standings(mode).await;
  info!(target: "quiz", %mode, rows = entries.len(), "HTTP leaderboard served");
  Json(LeaderboardOut { mode, entries: to_entry_rows(&entries), warning })
}

#[instrument(level = "info", skip(state, body), fields(%body.mode, user = %body.username, score = body.score))]
pub async fn http_post_score(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ScoreIn>,
) -> impl IntoResponse {
  let (placement, warning) =
    state.record_score(body.mode, body.difficulty, &body.username, body.score).await;
  info!(target: "quiz", user = %body.username, placement = ?placement, "HTTP score recorded");
  Json(ScoreOut { placement, warning })
}

#[instrument(level = "info", skip(state, body), fields(%body.chat_id, text_len = body.text.len()))]
pub async fn http_post_chat(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> impl IntoResponse {
  let reply = chat::handle_line(&state, &body.chat_id, &body.username, &body.text).await;
  Json(reply)
}
