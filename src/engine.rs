//! Quiz round state machine: pure state and transitions, no transport or
//! rendering concerns.
//!
//! Flow:
//! 1) `Session::start` zeroes the score, arms the timer and builds question one.
//! 2) Every UI event becomes exactly one `Command`; `Session::apply` performs
//!    one transition and hands back one `Event` for the caller to render.
//! 3) Option sets are rebuilt per question: the target is drawn uniformly from
//!    the pool, distractors preferentially avoid everything shown in the two
//!    previous questions and fall back to whole-pool sampling when the pool is
//!    too small to stay fresh.

use std::collections::{HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Difficulty, GameMode};

/// Options presented per question, target included.
pub const OPTION_COUNT: usize = 4;
/// How many past option-sets bias distractor selection away from repeats.
const HISTORY_WINDOW: usize = 2;

/// One UI event, one transition.
#[derive(Clone, Debug)]
pub enum Command {
  Answer { text: String },
  Next,
  Tick,
}

/// What a transition produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
  /// A new question is live; the timer (if any) is running.
  Question { options: Vec<String>, score: u32, time_left: Option<u32> },
  /// Correct answer accepted; the clock is paused until `Next`.
  Correct { score: u32, time_left: Option<u32> },
  /// One second elapsed, round still running.
  Clock { time_left: u32 },
  /// Round finished; the score is final.
  Over { reason: OverReason, correct_answer: String, final_score: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverReason {
  WrongAnswer,
  TimeUp,
}

#[derive(Clone, Debug)]
enum Phase {
  /// A question is on screen.
  Question { target: String, options: Vec<String> },
  /// Correct answer acknowledged, waiting for the next-question request.
  Between,
  /// Finished. The session stays readable but accepts no more play.
  Over,
}

/// One player's round. Passed to and returned from every operation so that
/// any number of rounds can run side by side.
#[derive(Clone, Debug)]
pub struct Session {
  pub mode: GameMode,
  pub difficulty: Difficulty,
  pub username: String,
  pub score: u32,
  /// `None` for untimed (chat-style) rounds.
  pub time_left: Option<u32>,
  phase: Phase,
  recent: VecDeque<Vec<String>>,
}

impl Session {
  /// Start a fresh round: score 0, full clock, first question live.
  pub fn start(
    mode: GameMode,
    difficulty: Difficulty,
    timed: bool,
    username: String,
    pool: &[String],
    rng: &mut impl Rng,
  ) -> Result<(Session, Event), String> {
    let mut session = Session {
      mode,
      difficulty,
      username,
      score: 0,
      time_left: if timed { Some(difficulty.initial_time()) } else { None },
      phase: Phase::Between,
      recent: VecDeque::new(),
    };
    let event = session.next_question(pool, rng)?;
    Ok((session, event))
  }

  /// Apply one command; returns the single event the transition produced.
  pub fn apply(&mut self, cmd: Command, pool: &[String], rng: &mut impl Rng) -> Result<Event, String> {
    match cmd {
      Command::Answer { text } => self.answer(&text),
      Command::Next => match self.phase {
        Phase::Between => self.next_question(pool, rng),
        Phase::Question { .. } => Err("Answer the current question first.".into()),
        Phase::Over => Err("Round is over. Start a new one.".into()),
      },
      Command::Tick => self.tick(),
    }
  }

  /// Options of the live question, if any.
  pub fn options(&self) -> Option<&[String]> {
    match &self.phase {
      Phase::Question { options, .. } => Some(options),
      _ => None,
    }
  }

  /// The live question's answer. Crate-visible so the protocol layer can
  /// derive the image asset path for the card.
  pub(crate) fn target(&self) -> Option<&str> {
    match &self.phase {
      Phase::Question { target, .. } => Some(target.as_str()),
      _ => None,
    }
  }

  fn answer(&mut self, text: &str) -> Result<Event, String> {
    let target = match &self.phase {
      Phase::Question { target, .. } => target.clone(),
      Phase::Between => return Err("No question is live. Request the next one.".into()),
      Phase::Over => return Err("Round is over. Start a new one.".into()),
    };

    if target == text {
      self.score += 1;
      if let Some(t) = self.time_left.as_mut() {
        *t += self.difficulty.time_bonus();
      }
      self.phase = Phase::Between;
      Ok(Event::Correct { score: self.score, time_left: self.time_left })
    } else {
      self.phase = Phase::Over;
      Ok(Event::Over {
        reason: OverReason::WrongAnswer,
        correct_answer: target,
        final_score: self.score,
      })
    }
  }

  fn tick(&mut self) -> Result<Event, String> {
    let t = match self.time_left {
      Some(t) => t,
      None => return Err("Round is not timed.".into()),
    };
    let target = match &self.phase {
      Phase::Question { target, .. } => target.clone(),
      // Clock is paused between a correct answer and the next question;
      // the host interval may still fire once while the reply is in flight.
      Phase::Between => return Ok(Event::Clock { time_left: t }),
      Phase::Over => return Err("Round is over. Start a new one.".into()),
    };

    let t = t - 1;
    self.time_left = Some(t);
    if t > 0 {
      return Ok(Event::Clock { time_left: t });
    }

    self.phase = Phase::Over;
    Ok(Event::Over {
      reason: OverReason::TimeUp,
      correct_answer: target,
      final_score: self.score,
    })
  }

  /// Build and present the next question: uniform target, anti-repeat
  /// distractors, shuffled final order.
  fn next_question(&mut self, pool: &[String], rng: &mut impl Rng) -> Result<Event, String> {
    if pool.len() < OPTION_COUNT {
      return Err(format!(
        "Pool for {}/{} holds {} names; at least {} are required.",
        self.mode,
        self.difficulty,
        pool.len(),
        OPTION_COUNT
      ));
    }

    let target = pool
      .choose(rng)
      .cloned()
      .ok_or_else(|| "Empty name pool".to_string())?;

    let seen: HashSet<&str> = self
      .recent
      .iter()
      .flat_map(|set| set.iter().map(String::as_str))
      .collect();
    let fresh: Vec<&String> = pool
      .iter()
      .filter(|name| **name != target && !seen.contains(name.as_str()))
      .collect();

    let mut options: Vec<String> = Vec::with_capacity(OPTION_COUNT);
    options.push(target.clone());
    if fresh.len() >= OPTION_COUNT - 1 {
      options.extend(fresh.choose_multiple(rng, OPTION_COUNT - 1).map(|name| (*name).clone()));
    } else {
      // Small pool: the recent window covers nearly everything, so sample the
      // whole pool without replacement instead.
      let mut rest: Vec<&String> = pool.iter().filter(|name| **name != target).collect();
      rest.shuffle(rng);
      options.extend(rest.into_iter().take(OPTION_COUNT - 1).cloned());
    }
    options.shuffle(rng);

    self.recent.push_back(options.clone());
    while self.recent.len() > HISTORY_WINDOW {
      self.recent.pop_front();
    }

    self.phase = Phase::Question { target, options: options.clone() };
    Ok(Event::Question { options, score: self.score, time_left: self.time_left })
  }
}
