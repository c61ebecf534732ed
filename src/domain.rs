//! Domain models used by the backend: game modes, difficulty tiers, and the
//! leaderboard document that the remote store persists.

use serde::{Deserialize, Serialize};

/// Which name pool a round draws its questions from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
  Drivers,
  Cars,
}
impl Default for GameMode {
  fn default() -> Self { GameMode::Drivers }
}

impl GameMode {
  pub fn as_str(self) -> &'static str {
    match self {
      GameMode::Drivers => "drivers",
      GameMode::Cars => "cars",
    }
  }

  /// Prompt shown above the option buttons.
  pub fn question_text(self) -> &'static str {
    match self {
      GameMode::Drivers => "Who is this driver?",
      GameMode::Cars => "Which car is this?",
    }
  }

  /// Parse a user-supplied token, e.g. from a chat command argument.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "drivers" | "driver" => Some(GameMode::Drivers),
      "cars" | "car" => Some(GameMode::Cars),
      _ => None,
    }
  }
}

impl std::fmt::Display for GameMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Difficulty tier: selects the name pool, sets the countdown budget in timed
/// rounds, and orders leaderboard entries (hard beats medium beats easy).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}
impl Default for Difficulty {
  fn default() -> Self { Difficulty::Easy }
}

impl Difficulty {
  /// Ordinal used as the primary leaderboard sort key.
  pub fn rank(self) -> u8 {
    match self {
      Difficulty::Easy => 1,
      Difficulty::Medium => 2,
      Difficulty::Hard => 3,
    }
  }

  /// Countdown budget for a timed round, in seconds.
  pub fn initial_time(self) -> u32 {
    match self {
      Difficulty::Easy => 120,
      Difficulty::Medium => 90,
      Difficulty::Hard => 60,
    }
  }

  /// Seconds added back to the clock for every correct answer.
  pub fn time_bonus(self) -> u32 {
    match self {
      Difficulty::Easy => 15,
      Difficulty::Medium => 10,
      Difficulty::Hard => 5,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "easy" => Some(Difficulty::Easy),
      "medium" => Some(Difficulty::Medium),
      "hard" => Some(Difficulty::Hard),
      _ => None,
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One row of the persisted leaderboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
  pub username: String,
  pub score: u32,
  // Absent in rows written by the pre-tier version of the game.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub difficulty: Option<Difficulty>,
}

/// The whole leaderboard document, spanning both game modes. Persisting
/// overwrites it wholesale; a payload missing either key is malformed.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardDoc {
  pub drivers: Vec<ScoreEntry>,
  pub cars: Vec<ScoreEntry>,
}

impl LeaderboardDoc {
  pub fn entries(&self, mode: GameMode) -> &Vec<ScoreEntry> {
    match mode {
      GameMode::Drivers => &self.drivers,
      GameMode::Cars => &self.cars,
    }
  }

  pub fn entries_mut(&mut self, mode: GameMode) -> &mut Vec<ScoreEntry> {
    match mode {
      GameMode::Drivers => &mut self.drivers,
      GameMode::Cars => &mut self.cars,
    }
  }
}
