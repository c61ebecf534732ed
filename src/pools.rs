//! Built-in name pools and the optional file overlay.
//!
//! Every (mode, difficulty) slot ships with a seed list so the game is
//! playable with zero configuration. A pools directory can replace any slot
//! with a `<mode>.<difficulty>.txt` file, one name per line. Files that are
//! missing, unreadable, or hold fewer than four distinct names keep the
//! built-in list for that slot.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{Difficulty, GameMode};
use crate::engine::OPTION_COUNT;

const MODES: [GameMode; 2] = [GameMode::Drivers, GameMode::Cars];
const TIERS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

/// Immutable name pools for all six slots, built once at startup.
pub struct PoolSet {
  map: HashMap<(GameMode, Difficulty), Vec<String>>,
}

impl PoolSet {
  pub fn get(&self, mode: GameMode, difficulty: Difficulty) -> &[String] {
    self.map.get(&(mode, difficulty)).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Build all pools: seeds first, then file overlays from `dir` if given.
pub fn load_pools(dir: Option<&str>) -> PoolSet {
  let mut map = HashMap::new();
  for mode in MODES {
    for tier in TIERS {
      let mut names = seed_names(mode, tier);
      let mut source = "builtin";
      if let Some(dir) = dir {
        let path = Path::new(dir).join(format!("{}.{}.txt", mode, tier));
        match std::fs::read_to_string(&path) {
          Ok(text) => {
            let parsed = parse_pool(&text);
            if parsed.len() >= OPTION_COUNT {
              names = parsed;
              source = "file";
            } else {
              warn!(target: "quiz", path = %path.display(), names = parsed.len(), "Pool file holds fewer than {} distinct names; keeping built-ins", OPTION_COUNT);
            }
          }
          Err(e) => {
            warn!(target: "quiz", path = %path.display(), error = %e, "Pool file unreadable; keeping built-ins");
          }
        }
      }
      info!(target: "quiz", %mode, difficulty = %tier, names = names.len(), source, "Startup pool inventory");
      map.insert((mode, tier), names);
    }
  }
  PoolSet { map }
}

/// One name per line. Blank lines are skipped; duplicates keep the first.
pub fn parse_pool(text: &str) -> Vec<String> {
  let mut seen = std::collections::HashSet::new();
  let mut names = Vec::new();
  for line in text.lines() {
    let name = line.trim();
    if name.is_empty() {
      continue;
    }
    if seen.insert(name.to_string()) {
      names.push(name.to_string());
    }
  }
  names
}

fn seed_names(mode: GameMode, tier: Difficulty) -> Vec<String> {
  let names: &[&str] = match (mode, tier) {
    (GameMode::Drivers, Difficulty::Easy) => DRIVERS_EASY,
    (GameMode::Drivers, Difficulty::Medium) => DRIVERS_MEDIUM,
    (GameMode::Drivers, Difficulty::Hard) => DRIVERS_HARD,
    (GameMode::Cars, Difficulty::Easy) => CARS_EASY,
    (GameMode::Cars, Difficulty::Medium) => CARS_MEDIUM,
    (GameMode::Cars, Difficulty::Hard) => CARS_HARD,
  };
  names.iter().map(|n| (*n).to_string()).collect()
}

/// The 2024 grid, as shipped with the first version of the game.
const DRIVERS_EASY: &[&str] = &[
  "Lewis Hamilton",
  "George Russell",
  "Max Verstappen",
  "Sergio Perez",
  "Charles Leclerc",
  "Carlos Sainz",
  "Lando Norris",
  "Oscar Piastri",
  "Fernando Alonso",
  "Lance Stroll",
  "Esteban Ocon",
  "Pierre Gasly",
  "Yuki Tsunoda",
  "Daniel Ricciardo",
  "Valtteri Bottas",
  "Zhou Guanyu",
  "Kevin Magnussen",
  "Nico Hulkenberg",
  "Alexander Albon",
  "Logan Sargeant",
];

// Recently retired and 2000s-era names.
const DRIVERS_MEDIUM: &[&str] = &[
  "Sebastian Vettel",
  "Kimi Raikkonen",
  "Jenson Button",
  "Nico Rosberg",
  "Felipe Massa",
  "Mark Webber",
  "Romain Grosjean",
  "Michael Schumacher",
  "Mika Hakkinen",
  "David Coulthard",
  "Rubens Barrichello",
  "Juan Pablo Montoya",
  "Giancarlo Fisichella",
  "Heikki Kovalainen",
];

// Pre-1990 grids. If you can name these without a search you earn the tier.
const DRIVERS_HARD: &[&str] = &[
  "Jochen Rindt",
  "Denny Hulme",
  "John Surtees",
  "Jo Siffert",
  "Peter Revson",
  "Francois Cevert",
  "Ronnie Peterson",
  "Clay Regazzoni",
  "Gilles Villeneuve",
  "Wolfgang von Trips",
  "Dan Gurney",
  "Jacky Ickx",
  "Carlos Reutemann",
  "Didier Pironi",
  "Jean Behra",
  "Innes Ireland",
];

const CARS_EASY: &[&str] = &[
  "Red Bull RB19",
  "Red Bull RB18",
  "Mercedes W11",
  "Mercedes W14",
  "Ferrari SF-23",
  "Ferrari F1-75",
  "McLaren MCL60",
  "Aston Martin AMR23",
  "Alpine A523",
  "Williams FW45",
  "AlphaTauri AT04",
  "Haas VF-23",
];

const CARS_MEDIUM: &[&str] = &[
  "Ferrari F2004",
  "Ferrari F2002",
  "McLaren MP4/13",
  "McLaren MP4-20",
  "Williams FW14B",
  "Williams FW18",
  "Benetton B195",
  "Renault R25",
  "Brawn BGP 001",
  "Red Bull RB9",
  "Mercedes W05",
  "Ferrari 412 T2",
];

const CARS_HARD: &[&str] = &[
  "Lotus 72",
  "Lotus 79",
  "Tyrrell P34",
  "Brabham BT46B",
  "Maserati 250F",
  "Mercedes W196",
  "Lancia D50",
  "Eagle T1G",
  "Matra MS80",
  "March 701",
  "Hesketh 308",
  "Shadow DN5",
];

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn parse_pool_trims_dedups_and_skips_blanks() {
    let names = parse_pool("  Lewis Hamilton  \n\nMax Verstappen\nLewis Hamilton\n   \nLando Norris\n");
    assert_eq!(names, ["Lewis Hamilton", "Max Verstappen", "Lando Norris"]);
  }

  #[test]
  fn builtin_pools_cover_every_slot_with_distinct_names() {
    let pools = load_pools(None);
    for mode in MODES {
      for tier in TIERS {
        let names = pools.get(mode, tier);
        assert!(names.len() >= OPTION_COUNT, "{mode}/{tier} has only {} names", names.len());
        let distinct: HashSet<&String> = names.iter().collect();
        assert_eq!(distinct.len(), names.len(), "{mode}/{tier} holds duplicates");
      }
    }
  }

  #[test]
  fn file_overlay_replaces_only_its_slot() {
    let dir = std::env::temp_dir().join(format!("pitwall-pools-ok-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("tmp dir");
    std::fs::write(dir.join("drivers.easy.txt"), "A\nB\nC\nD\n").expect("write pool");

    let pools = load_pools(dir.to_str());
    assert_eq!(pools.get(GameMode::Drivers, Difficulty::Easy), ["A", "B", "C", "D"]);
    // Slots without a file keep their seeds.
    assert!(pools.get(GameMode::Cars, Difficulty::Hard).len() >= OPTION_COUNT);

    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn short_pool_file_keeps_the_builtin_list() {
    let dir = std::env::temp_dir().join(format!("pitwall-pools-short-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("tmp dir");
    std::fs::write(dir.join("cars.easy.txt"), "Only One\nOnly Two\n").expect("write pool");

    let pools = load_pools(dir.to_str());
    assert_eq!(pools.get(GameMode::Cars, Difficulty::Easy), CARS_EASY);

    std::fs::remove_dir_all(&dir).ok();
  }
}
