//! Merge and ranking policy for the leaderboard document.
//!
//! The remote store overwrites the whole document, so all policy lives here:
//! keep the best score per merge key, order rows by difficulty tier then
//! score, cap rows per player, cut to the top N. `merge` is idempotent for
//! equal-or-lower resubmissions and only ever raises a stored best.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::{Difficulty, GameMode, LeaderboardDoc, ScoreEntry};

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_PER_USER_CAP: usize = 3;

/// Which fields identify "the same row" during a merge. The two deployed
/// versions of the game disagreed (the chat bot kept one row per player, the
/// Mini App one per player and tier), so the key stays configurable instead
/// of silently unified.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergeKey {
  Username,
  UsernameDifficulty,
}
impl Default for MergeKey {
  fn default() -> Self { MergeKey::UsernameDifficulty }
}

/// Ranking knobs, loadable from the `[rules]` config section.
#[derive(Clone, Debug, Deserialize)]
pub struct RankRules {
  #[serde(default = "default_top_n")]
  pub top_n: usize,
  /// Rows one player may occupy before the final cut. 0 disables the cap.
  #[serde(default = "default_per_user_cap")]
  pub per_user_cap: usize,
  #[serde(default)]
  pub merge_key: MergeKey,
}

impl Default for RankRules {
  fn default() -> Self {
    Self { top_n: DEFAULT_TOP_N, per_user_cap: DEFAULT_PER_USER_CAP, merge_key: MergeKey::default() }
  }
}

fn default_top_n() -> usize { DEFAULT_TOP_N }
fn default_per_user_cap() -> usize { DEFAULT_PER_USER_CAP }

// Untiered rows (from the pre-tier version) sort below easy.
fn sort_key(e: &ScoreEntry) -> (u8, u32) {
  (e.difficulty.map(Difficulty::rank).unwrap_or(0), e.score)
}

fn same_row(e: &ScoreEntry, username: &str, difficulty: Option<Difficulty>, key: MergeKey) -> bool {
  match key {
    MergeKey::Username => e.username == username,
    MergeKey::UsernameDifficulty => e.username == username && e.difficulty == difficulty,
  }
}

/// Merge one result into the document and re-apply the ranking policy.
/// Returns the player's 1-based placement in the mode's table, or None when
/// the row did not survive the cut.
pub fn merge(
  doc: &mut LeaderboardDoc,
  mode: GameMode,
  difficulty: Option<Difficulty>,
  username: &str,
  score: u32,
  rules: &RankRules,
) -> Option<usize> {
  let entries = doc.entries_mut(mode);

  match entries.iter_mut().find(|e| same_row(e, username, difficulty, rules.merge_key)) {
    Some(entry) => {
      // Strictly-greater replacement; an equal or lower resubmission is a no-op.
      if score > entry.score {
        entry.score = score;
        entry.difficulty = difficulty;
      }
    }
    None => entries.push(ScoreEntry { username: username.to_string(), score, difficulty }),
  }

  entries.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));

  if rules.per_user_cap > 0 {
    let mut rows_kept: HashMap<String, usize> = HashMap::new();
    entries.retain(|e| {
      let kept = rows_kept.entry(e.username.clone()).or_insert(0);
      *kept += 1;
      *kept <= rules.per_user_cap
    });
  }
  entries.truncate(rules.top_n);

  entries
    .iter()
    .position(|e| same_row(e, username, difficulty, rules.merge_key))
    .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(username: &str, score: u32, difficulty: Option<Difficulty>) -> ScoreEntry {
    ScoreEntry { username: username.into(), score, difficulty }
  }

  fn seeded(drivers: Vec<ScoreEntry>) -> LeaderboardDoc {
    LeaderboardDoc { drivers, cars: vec![] }
  }

  #[test]
  fn higher_score_replaces_the_stored_best() {
    let mut doc = seeded(vec![entry("alice", 7, Some(Difficulty::Hard))]);
    let rules = RankRules::default();
    let placement =
      merge(&mut doc, GameMode::Drivers, Some(Difficulty::Hard), "alice", 9, &rules);
    assert_eq!(placement, Some(1));
    assert_eq!(doc.drivers, vec![entry("alice", 9, Some(Difficulty::Hard))]);
  }

  #[test]
  fn equal_or_lower_resubmission_is_a_no_op() {
    let mut doc = seeded(vec![entry("alice", 7, Some(Difficulty::Hard))]);
    let rules = RankRules::default();

    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Hard), "alice", 5, &rules);
    assert_eq!(doc.drivers, vec![entry("alice", 7, Some(Difficulty::Hard))]);

    let before = doc.clone();
    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Hard), "alice", 7, &rules);
    assert_eq!(doc, before);
  }

  #[test]
  fn rows_sort_by_tier_then_score() {
    let mut doc = seeded(vec![
      entry("bob", 50, Some(Difficulty::Easy)),
      entry("carol", 3, Some(Difficulty::Hard)),
    ]);
    let rules = RankRules::default();
    let placement =
      merge(&mut doc, GameMode::Drivers, Some(Difficulty::Medium), "dave", 20, &rules);
    assert_eq!(placement, Some(2));
    let order: Vec<&str> = doc.drivers.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(order, ["carol", "dave", "bob"]);
  }

  #[test]
  fn untiered_rows_rank_below_easy() {
    let mut doc = seeded(vec![entry("alice", 7, None)]);
    let rules = RankRules::default();
    let placement = merge(&mut doc, GameMode::Drivers, Some(Difficulty::Easy), "bob", 3, &rules);
    assert_eq!(placement, Some(1));
    let order: Vec<&str> = doc.drivers.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(order, ["bob", "alice"]);
  }

  #[test]
  fn table_never_exceeds_top_n() {
    let mut doc = seeded(vec![]);
    let rules = RankRules::default();
    for i in 0..12 {
      merge(&mut doc, GameMode::Drivers, Some(Difficulty::Easy), &format!("user{i}"), 20 + i, &rules);
    }
    assert_eq!(doc.drivers.len(), 10);
    // The weakest scores (20 and 21) were cut.
    assert!(doc.drivers.iter().all(|e| e.score >= 22));

    // A result too weak for the table merges but reports no placement.
    let placement =
      merge(&mut doc, GameMode::Drivers, Some(Difficulty::Easy), "latecomer", 1, &rules);
    assert_eq!(placement, None);
    assert_eq!(doc.drivers.len(), 10);
  }

  #[test]
  fn per_user_cap_applies_before_the_cut() {
    let mut doc = seeded(vec![]);
    let rules = RankRules::default();
    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Hard), "alice", 9, &rules);
    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Medium), "alice", 8, &rules);
    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Easy), "alice", 7, &rules);

    // A fourth row for the same player falls off even though the table has room.
    let placement = merge(&mut doc, GameMode::Drivers, None, "alice", 6, &rules);
    assert_eq!(placement, None);
    assert_eq!(doc.drivers.len(), 3);
    assert!(doc.drivers.iter().all(|e| e.difficulty.is_some()));
  }

  #[test]
  fn username_key_collapses_tiers_into_one_row() {
    let mut doc = seeded(vec![entry("alice", 7, Some(Difficulty::Easy))]);
    let rules = RankRules { merge_key: MergeKey::Username, ..RankRules::default() };
    let placement = merge(&mut doc, GameMode::Drivers, Some(Difficulty::Hard), "alice", 9, &rules);
    assert_eq!(placement, Some(1));
    assert_eq!(doc.drivers, vec![entry("alice", 9, Some(Difficulty::Hard))]);

    // Losing resubmissions leave the stored tier alone too.
    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Easy), "alice", 2, &rules);
    assert_eq!(doc.drivers, vec![entry("alice", 9, Some(Difficulty::Hard))]);
  }

  #[test]
  fn username_difficulty_key_keeps_tiers_separate() {
    let mut doc = seeded(vec![entry("alice", 7, Some(Difficulty::Easy))]);
    let rules = RankRules::default();
    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Hard), "alice", 2, &rules);
    assert_eq!(doc.drivers.len(), 2);
    let order: Vec<(u32, Option<Difficulty>)> =
      doc.drivers.iter().map(|e| (e.score, e.difficulty)).collect();
    assert_eq!(order, [(2, Some(Difficulty::Hard)), (7, Some(Difficulty::Easy))]);
  }

  #[test]
  fn modes_keep_separate_tables() {
    let mut doc = LeaderboardDoc::default();
    let rules = RankRules::default();
    merge(&mut doc, GameMode::Drivers, Some(Difficulty::Easy), "alice", 4, &rules);
    merge(&mut doc, GameMode::Cars, Some(Difficulty::Easy), "alice", 6, &rules);
    assert_eq!(doc.drivers, vec![entry("alice", 4, Some(Difficulty::Easy))]);
    assert_eq!(doc.cars, vec![entry("alice", 6, Some(Difficulty::Easy))]);
  }
}
