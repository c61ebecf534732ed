//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, GameMode, ScoreEntry};
use crate::engine::{OverReason, Session};
use crate::util::slugify;

fn default_timed() -> bool {
    true
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartRound {
        mode: GameMode,
        difficulty: Difficulty,
        #[serde(default = "default_timed")]
        timed: bool,
        #[serde(default)]
        username: String,
    },
    SubmitAnswer {
        #[serde(rename = "sessionId")]
        session_id: String,
        answer: String,
    },
    NextQuestion {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Tick {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    GetLeaderboard {
        #[serde(default)]
        mode: GameMode,
    },
    Chat {
        #[serde(rename = "chatId")]
        chat_id: String,
        #[serde(default)]
        username: String,
        text: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        round: RoundOut,
    },
    AnswerResult {
        correct: bool,
        score: u32,
        time_left: Option<u32>,
    },
    Clock {
        time_left: u32,
    },
    GameOver {
        reason: String,
        correct_answer: String,
        final_score: u32,
        placement: Option<usize>,
        warning: Option<String>,
    },
    Leaderboard {
        mode: GameMode,
        entries: Vec<EntryOut>,
        warning: Option<String>,
    },
    ChatReply {
        lines: Vec<String>,
        keyboard: Vec<String>,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for question delivery.
#[derive(Debug, Serialize)]
pub struct RoundOut {
    pub id: String,
    pub mode: GameMode,
    pub difficulty: Difficulty,

    pub question: String,
    pub options: Vec<String>,
    /// Front-end asset path for the portrait / livery card.
    pub image: Option<String>,

    pub score: u32,
    pub time_left: Option<u32>,
}

/// Convert a live `Session` (internal) to the public question DTO.
pub fn to_round_out(id: &str, s: &Session) -> RoundOut {
    RoundOut {
        id: id.to_string(),
        mode: s.mode,
        difficulty: s.difficulty,

        question: s.mode.question_text().to_string(),
        options: s.options().map(<[String]>::to_vec).unwrap_or_default(),
        image: s.target().map(|t| format!("assets/{}/{}.jpg", s.mode, slugify(t))),

        score: s.score,
        time_left: s.time_left,
    }
}

/// One ranked leaderboard row.
#[derive(Debug, Serialize)]
pub struct EntryOut {
    pub rank: usize,
    pub username: String,
    pub score: u32,
    pub difficulty: Option<Difficulty>,
}

pub fn to_entry_rows(entries: &[ScoreEntry]) -> Vec<EntryOut> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| EntryOut {
            rank: i + 1,
            username: e.username.clone(),
            score: e.score,
            difficulty: e.difficulty,
        })
        .collect()
}

pub fn over_reason_label(reason: OverReason) -> &'static str {
    match reason {
        OverReason::WrongAnswer => "wrong_answer",
        OverReason::TimeUp => "time_up",
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartRoundIn {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    #[serde(default = "default_timed")]
    pub timed: bool,
    #[serde(default)]
    pub username: String,
}

/// Body for endpoints that only need the round handle.
#[derive(Deserialize)]
pub struct SessionRef {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub answer: String,
}
#[derive(Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub score: u32,
    pub time_left: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub over: Option<GameOverOut>,
}

#[derive(Serialize)]
pub struct ClockOut {
    pub time_left: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub over: Option<GameOverOut>,
}

#[derive(Serialize)]
pub struct GameOverOut {
    pub reason: String,
    pub correct_answer: String,
    pub final_score: u32,
    pub placement: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub mode: Option<GameMode>,
}
#[derive(Serialize)]
pub struct LeaderboardOut {
    pub mode: GameMode,
    pub entries: Vec<EntryOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Direct score submission, for clients that run rounds on their own.
#[derive(Deserialize)]
pub struct ScoreIn {
    pub mode: GameMode,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub username: String,
    pub score: u32,
}
#[derive(Serialize)]
pub struct ScoreOut {
    pub placement: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatIn {
    #[serde(rename = "chatId")]
    pub chat_id: String,
    #[serde(default)]
    pub username: String,
    pub text: String,
}
#[derive(Debug, Default, Serialize)]
pub struct ChatOut {
    pub lines: Vec<String>,
    /// Options to render as reply buttons; empty when free text is fine.
    pub keyboard: Vec<String>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_from_frontend_json() {
        let msg: ClientWsMessage = serde_json::from_str(
            r#"{"type":"start_round","mode":"cars","difficulty":"hard"}"#,
        )
        .expect("start_round");
        match msg {
            ClientWsMessage::StartRound { mode, difficulty, timed, username } => {
                assert_eq!(mode, GameMode::Cars);
                assert_eq!(difficulty, Difficulty::Hard);
                assert!(timed, "timed defaults to true");
                assert_eq!(username, "");
            }
            other => panic!("expected StartRound, got {other:?}"),
        }

        let msg: ClientWsMessage = serde_json::from_str(
            r#"{"type":"submit_answer","sessionId":"abc","answer":"Ayrton Senna"}"#,
        )
        .expect("submit_answer");
        match msg {
            ClientWsMessage::SubmitAnswer { session_id, answer } => {
                assert_eq!(session_id, "abc");
                assert_eq!(answer, "Ayrton Senna");
            }
            other => panic!("expected SubmitAnswer, got {other:?}"),
        }

        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"get_leaderboard"}"#).expect("get_leaderboard");
        match msg {
            ClientWsMessage::GetLeaderboard { mode } => assert_eq!(mode, GameMode::Drivers),
            other => panic!("expected GetLeaderboard, got {other:?}"),
        }
    }

    #[test]
    fn server_messages_tag_with_snake_case() {
        let v = serde_json::to_value(ServerWsMessage::GameOver {
            reason: over_reason_label(OverReason::TimeUp).to_string(),
            correct_answer: "Jim Clark".to_string(),
            final_score: 4,
            placement: Some(2),
            warning: None,
        })
        .expect("to_value");
        assert_eq!(v["type"], "game_over");
        assert_eq!(v["reason"], "time_up");
        assert_eq!(v["correct_answer"], "Jim Clark");
        assert_eq!(v["final_score"], 4);
        assert_eq!(v["placement"], 2);
    }

    #[test]
    fn question_card_points_at_the_target_asset() {
        let pool: Vec<String> = ["Lotus 72", "McLaren MP4/4", "Ferrari F2004", "Brawn BGP 001"]
            .iter()
            .map(|n| n.to_string())
            .collect();
        let (session, _) = Session::start(
            GameMode::Cars,
            Difficulty::Medium,
            true,
            String::new(),
            &pool,
            &mut rand::thread_rng(),
        )
        .expect("start");

        let round = to_round_out("round-1", &session);
        assert_eq!(round.question, "Which car is this?");
        assert_eq!(round.options.len(), 4);
        assert_eq!(round.time_left, Some(90));
        let target = session.target().expect("live question");
        let image = round.image.expect("live question has a card image");
        assert_eq!(image, format!("assets/cars/{}.jpg", slugify(target)));
        assert!(image.starts_with("assets/cars/"));
        assert!(image.ends_with(".jpg"));
    }
}
