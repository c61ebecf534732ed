//! Chat-command front end: the same rounds as the JSON API, driven by slash
//! commands and plain-text answers.
//!
//! Commands:
//!   /start                      greeting and a short how-to
//!   /play [mode] [difficulty]   start an untimed round in this chat
//!   /leaderboard [mode]         current standings, one line per row
//!
//! Any other text while a round is live counts as an answer. With no round
//! live it is ignored, so the bot stays quiet in busy chats.

use tracing::instrument;

use crate::domain::{Difficulty, GameMode};
use crate::engine::{Command, Event, Session};
use crate::protocol::ChatOut;
use crate::state::AppState;

const WELCOME: &[&str] = &[
  "Welcome to the pit wall trivia bot!",
  "/play [drivers|cars] [easy|medium|hard] starts a round.",
  "/leaderboard [drivers|cars] shows the standings.",
];

/// One chat, one round: a fresh /play replaces whatever was running.
fn session_key(chat_id: &str) -> String {
  format!("chat:{}", chat_id)
}

#[instrument(level = "info", skip(state, text), fields(%chat_id, text_len = text.len()))]
pub async fn handle_line(state: &AppState, chat_id: &str, username: &str, text: &str) -> ChatOut {
  let text = text.trim();
  if text == "/start" {
    return ChatOut {
      lines: WELCOME.iter().map(|s| s.to_string()).collect(),
      keyboard: vec![],
    };
  }
  if text == "/play" || text.starts_with("/play ") {
    return play(state, chat_id, username, text["/play".len()..].trim()).await;
  }
  if text == "/leaderboard" || text.starts_with("/leaderboard ") {
    return leaderboard(state, text["/leaderboard".len()..].trim()).await;
  }
  answer(state, chat_id, text).await
}

async fn play(state: &AppState, chat_id: &str, username: &str, args: &str) -> ChatOut {
  let mut mode = GameMode::default();
  let mut difficulty = Difficulty::default();
  for arg in args.split_whitespace() {
    if let Some(m) = GameMode::parse(arg) {
      mode = m;
    } else if let Some(d) = Difficulty::parse(arg) {
      difficulty = d;
    } else {
      return ChatOut {
        lines: vec![format!(
          "I don't know \"{}\". Try /play [drivers|cars] [easy|medium|hard].",
          arg
        )],
        keyboard: vec![],
      };
    }
  }

  match state
    .start_chat_session(session_key(chat_id), mode, difficulty, username.to_string())
    .await
  {
    Ok(session) => question_card(&session),
    Err(e) => ChatOut { lines: vec![e], keyboard: vec![] },
  }
}

async fn leaderboard(state: &AppState, args: &str) -> ChatOut {
  let mode = match args.split_whitespace().next() {
    Some(arg) => match GameMode::parse(arg) {
      Some(m) => m,
      None => {
        return ChatOut {
          lines: vec![format!("I don't know \"{}\". Try /leaderboard [drivers|cars].", arg)],
          keyboard: vec![],
        }
      }
    },
    None => GameMode::default(),
  };

  let (entries, warning) = state.standings(mode).await;
  let mut lines = Vec::with_capacity(entries.len() + 2);
  if entries.is_empty() {
    lines.push(format!("No {} scores yet. /play to set one.", mode));
  } else {
    lines.push(format!("Leaderboard ({}):", mode));
    for (i, e) in entries.iter().enumerate() {
      let mut line = format!("{}. {}: {}", i + 1, e.username, e.score);
      if let Some(d) = e.difficulty {
        line.push_str(&format!(" [{}]", d));
      }
      lines.push(line);
    }
  }
  if let Some(w) = warning {
    lines.push(w);
  }
  ChatOut { lines, keyboard: vec![] }
}

async fn answer(state: &AppState, chat_id: &str, text: &str) -> ChatOut {
  let key = session_key(chat_id);
  if !state.has_session(&key).await {
    // Not every chat line is addressed to us.
    return ChatOut::default();
  }

  let outcome = match state.apply_command(&key, Command::Answer { text: text.to_string() }).await {
    Ok(o) => o,
    Err(e) => return ChatOut { lines: vec![e], keyboard: vec![] },
  };

  match outcome.event {
    Event::Correct { score, .. } => {
      // Chat rounds have no Next button; serve the follow-up question now.
      let mut reply = match state.apply_command(&key, Command::Next).await {
        Ok(next) => question_card(&next.session),
        Err(e) => ChatOut { lines: vec![e], keyboard: vec![] },
      };
      reply.lines.insert(0, format!("Correct! Your score is {}.", score));
      reply
    }
    Event::Over { correct_answer, final_score, .. } => {
      state.remove_session(&key).await;
      let mut lines = vec![format!(
        "Wrong. The correct answer is {}. Your final score is {}.",
        correct_answer, final_score
      )];
      if let Some(p) = outcome.placement {
        lines.push(format!("You are #{} on the leaderboard. /leaderboard to see it.", p));
      }
      if let Some(w) = outcome.warning {
        lines.push(w);
      }
      ChatOut { lines, keyboard: vec![] }
    }
    _ => ChatOut {
      lines: vec!["Unexpected round state. /play to start over.".to_string()],
      keyboard: vec![],
    },
  }
}

fn question_card(session: &Session) -> ChatOut {
  ChatOut {
    lines: vec![session.mode.question_text().to_string()],
    keyboard: session.options().map(<[String]>::to_vec).unwrap_or_default(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;

  fn state() -> AppState {
    AppState::new(&AppConfig::default())
  }

  async fn live_target(state: &AppState, chat_id: &str) -> String {
    let sessions = state.sessions.read().await;
    sessions
      .get(&session_key(chat_id))
      .and_then(|s| s.target())
      .expect("live question")
      .to_string()
  }

  #[tokio::test]
  async fn start_command_greets() {
    let state = state();
    let reply = handle_line(&state, "42", "alice", "/start").await;
    assert!(reply.lines[0].contains("trivia"));
    assert!(reply.keyboard.is_empty());
  }

  #[tokio::test]
  async fn play_starts_an_untimed_round_with_four_options() {
    let state = state();
    let reply = handle_line(&state, "42", "alice", "/play cars hard").await;
    assert_eq!(reply.lines, vec!["Which car is this?".to_string()]);
    assert_eq!(reply.keyboard.len(), 4);

    let sessions = state.sessions.read().await;
    let session = sessions.get(&session_key("42")).expect("registered round");
    assert_eq!(session.mode, GameMode::Cars);
    assert_eq!(session.difficulty, Difficulty::Hard);
    assert_eq!(session.time_left, None);
  }

  #[tokio::test]
  async fn correct_answer_advances_to_the_next_question() {
    let state = state();
    handle_line(&state, "42", "alice", "/play").await;
    let target = live_target(&state, "42").await;

    let reply = handle_line(&state, "42", "alice", &target).await;
    assert_eq!(reply.lines[0], "Correct! Your score is 1.");
    assert_eq!(reply.lines[1], "Who is this driver?");
    assert_eq!(reply.keyboard.len(), 4);
  }

  #[tokio::test]
  async fn wrong_answer_ends_the_round_and_records_the_score() {
    let state = state();
    handle_line(&state, "42", "alice", "/play drivers easy").await;
    let target = live_target(&state, "42").await;

    let reply = handle_line(&state, "42", "alice", "definitely not on the grid").await;
    assert_eq!(
      reply.lines[0],
      format!("Wrong. The correct answer is {}. Your final score is 0.", target)
    );
    assert!(reply.lines[1].contains("#1 on the leaderboard"));
    assert!(!state.has_session(&session_key("42")).await);

    let (entries, _) = state.standings(GameMode::Drivers).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].username, "alice");
  }

  #[tokio::test]
  async fn stray_text_without_a_round_is_ignored() {
    let state = state();
    let reply = handle_line(&state, "42", "alice", "good morning").await;
    assert!(reply.lines.is_empty());
    assert!(reply.keyboard.is_empty());
  }

  #[tokio::test]
  async fn unknown_play_argument_is_reported() {
    let state = state();
    let reply = handle_line(&state, "42", "alice", "/play bikes").await;
    assert!(reply.lines[0].contains("bikes"));
    assert!(!state.has_session(&session_key("42")).await);
  }

  #[tokio::test]
  async fn leaderboard_command_lists_ranked_lines() {
    let state = state();
    state.record_score(GameMode::Drivers, Some(Difficulty::Hard), "alice", 7).await;
    state.record_score(GameMode::Drivers, Some(Difficulty::Easy), "bob", 9).await;

    let reply = handle_line(&state, "42", "carol", "/leaderboard drivers").await;
    assert_eq!(reply.lines[0], "Leaderboard (drivers):");
    assert_eq!(reply.lines[1], "1. alice: 7 [hard]");
    assert_eq!(reply.lines[2], "2. bob: 9 [easy]");
  }
}
