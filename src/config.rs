//! Loading backend configuration (rank rules, pool overlays, store endpoint)
//! from TOML, with env-variable fallbacks for the store section.
//!
//! See `AppConfig` for the expected schema. Everything is optional; the game
//! runs with built-in pools and an in-memory leaderboard when nothing is set.

use serde::Deserialize;
use tracing::{error, info};

use crate::leaderboard::RankRules;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub rules: RankRules,
  #[serde(default)]
  pub pools: PoolsConfig,
  #[serde(default)]
  pub store: Option<StoreConfig>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PoolsConfig {
  /// Directory with `<mode>.<difficulty>.txt` name lists. Missing or bad
  /// files fall back to the built-in seed lists per slot.
  #[serde(default)]
  pub dir: Option<String>,
}

/// Remote leaderboard endpoint. Omit the whole section to keep standings
/// in memory only.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreConfig {
  pub url: String,
  #[serde(default)]
  pub backend: StoreBackendKind,
  // Required by the gist backend, ignored by plain.
  #[serde(default)]
  pub token: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendKind {
  /// Bare JSON document endpoint: GET the document, POST it back.
  Plain,
  /// Gist-style document host: GET a file wrapper, PATCH with token auth.
  Gist,
}
impl Default for StoreBackendKind {
  fn default() -> Self { StoreBackendKind::Plain }
}

impl AppConfig {
  /// Store settings from the `[store]` section, or assembled from the
  /// LEADERBOARD_URL / LEADERBOARD_BACKEND / LEADERBOARD_TOKEN env variables
  /// (how the bot deployments configured it).
  pub fn store_config(&self) -> Option<StoreConfig> {
    if let Some(cfg) = &self.store {
      return Some(cfg.clone());
    }
    let url = std::env::var("LEADERBOARD_URL").ok()?;
    let backend = match std::env::var("LEADERBOARD_BACKEND").as_deref() {
      Ok("gist") => StoreBackendKind::Gist,
      _ => StoreBackendKind::Plain,
    };
    Some(StoreConfig { url, backend, token: std::env::var("LEADERBOARD_TOKEN").ok() })
  }
}

/// Attempt to load `AppConfig` from PITWALL_CONFIG_PATH. On any parsing/IO
/// error, falls back to defaults so a bad config never blocks startup.
pub fn load_config_from_env() -> AppConfig {
  let path = match std::env::var("PITWALL_CONFIG_PATH") {
    Ok(p) => p,
    Err(_) => return AppConfig::default(),
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "pitwall_backend", %path, "Loaded config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "pitwall_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
        AppConfig::default()
      }
    },
    Err(e) => {
      error!(target: "pitwall_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
      AppConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::leaderboard::MergeKey;

  #[test]
  fn every_section_is_optional() {
    let cfg: AppConfig = toml::from_str("").expect("empty config");
    assert_eq!(cfg.rules.top_n, 10);
    assert_eq!(cfg.rules.per_user_cap, 3);
    assert_eq!(cfg.rules.merge_key, MergeKey::UsernameDifficulty);
    assert!(cfg.pools.dir.is_none());
    assert!(cfg.store.is_none());
  }

  #[test]
  fn full_config_parses() {
    let cfg: AppConfig = toml::from_str(
      r#"
[rules]
top_n = 5
per_user_cap = 1
merge_key = "username"

[pools]
dir = "./pools"

[store]
url = "https://kv.example.com/f1-leaderboard"
backend = "gist"
token = "t0ken"
"#,
    )
    .expect("config");
    assert_eq!(cfg.rules.top_n, 5);
    assert_eq!(cfg.rules.per_user_cap, 1);
    assert_eq!(cfg.rules.merge_key, MergeKey::Username);
    assert_eq!(cfg.pools.dir.as_deref(), Some("./pools"));
    let store = cfg.store.expect("store section");
    assert_eq!(store.backend, StoreBackendKind::Gist);
    assert_eq!(store.token.as_deref(), Some("t0ken"));
  }
}
