//! Remote leaderboard store client.
//!
//! The store is an opaque JSON document endpoint: GET returns the whole
//! leaderboard document and a write replaces it wholesale. Two wire variants
//! survive from the game's deployments: a bare key-value endpoint (GET +
//! POST, no auth) and the original gist-style document host (GET +
//! authenticated PATCH around a one-file wrapper). No retries and no
//! optimistic concurrency; concurrent writers can clobber each other and the
//! last write wins.
//!
//! NOTE: We never log the auth token and we keep payload truncations short.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{StoreBackendKind, StoreConfig};
use crate::domain::LeaderboardDoc;
use crate::util::trunc_for_log;

const CLIENT_USER_AGENT: &str = "pitwall-backend/0.1";
/// File name inside the gist wrapper, kept from the first deployment.
const GIST_FILE: &str = "leaderboard.json";

#[derive(Clone)]
enum StoreBackend {
  Plain,
  Gist { token: String },
}

#[derive(Clone)]
pub struct ScoreStore {
  client: reqwest::Client,
  url: String,
  backend: StoreBackend,
}

impl ScoreStore {
  /// Construct the client from config; None keeps the leaderboard in memory.
  pub fn from_config(cfg: Option<&StoreConfig>) -> Option<Self> {
    let cfg = cfg?;
    let backend = match cfg.backend {
      StoreBackendKind::Plain => StoreBackend::Plain,
      StoreBackendKind::Gist => match &cfg.token {
        Some(token) if !token.is_empty() => StoreBackend::Gist { token: token.clone() },
        _ => {
          error!(target: "quiz", "Gist store configured without a token; leaderboard stays in memory");
          return None;
        }
      },
    };

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, url: cfg.url.clone(), backend })
  }

  /// Fetch the whole leaderboard document.
  #[instrument(level = "info", skip(self), fields(url = %self.url))]
  pub async fn load(&self) -> Result<LeaderboardDoc, String> {
    let res = self.get_request().send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_store_error(&body).unwrap_or(body);
      return Err(format!("Store HTTP {}: {}", status, trunc_for_log(&msg, 200)));
    }

    let doc = match &self.backend {
      StoreBackend::Plain => res.json::<LeaderboardDoc>().await.map_err(|e| e.to_string())?,
      StoreBackend::Gist { .. } => {
        let wrapper: GistDocument = res.json().await.map_err(|e| e.to_string())?;
        parse_gist_document(&wrapper)?
      }
    };
    info!(target: "quiz", drivers = doc.drivers.len(), cars = doc.cars.len(), "Leaderboard loaded");
    Ok(doc)
  }

  /// Overwrite the remote document with `doc`.
  #[instrument(level = "info", skip(self, doc), fields(url = %self.url, drivers = doc.drivers.len(), cars = doc.cars.len()))]
  pub async fn persist(&self, doc: &LeaderboardDoc) -> Result<(), String> {
    let res = match &self.backend {
      StoreBackend::Plain => {
        self.client.post(&self.url)
          .header(USER_AGENT, CLIENT_USER_AGENT)
          .header(CONTENT_TYPE, "application/json")
          .json(doc).send().await
      }
      StoreBackend::Gist { token } => {
        let payload = gist_payload(doc)?;
        self.client.patch(&self.url)
          .header(USER_AGENT, CLIENT_USER_AGENT)
          .header(CONTENT_TYPE, "application/json")
          .header(AUTHORIZATION, format!("token {}", token))
          .json(&payload).send().await
      }
    }
    .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_store_error(&body).unwrap_or(body);
      return Err(format!("Store HTTP {}: {}", status, trunc_for_log(&msg, 200)));
    }

    info!(target: "quiz", "Leaderboard persisted");
    Ok(())
  }

  fn get_request(&self) -> reqwest::RequestBuilder {
    let req = self.client.get(&self.url).header(USER_AGENT, CLIENT_USER_AGENT);
    match &self.backend {
      StoreBackend::Plain => req,
      StoreBackend::Gist { token } => req.header(AUTHORIZATION, format!("token {}", token)),
    }
  }
}

// --- Gist wire DTOs ---

#[derive(Deserialize)]
struct GistDocument {
  files: HashMap<String, GistFileIn>,
}
#[derive(Deserialize)]
struct GistFileIn { content: String }

#[derive(Serialize)]
struct GistPayload {
  files: HashMap<String, GistFileOut>,
}
#[derive(Serialize)]
struct GistFileOut { content: String }

fn parse_gist_document(wrapper: &GistDocument) -> Result<LeaderboardDoc, String> {
  let file = wrapper
    .files
    .get(GIST_FILE)
    .ok_or_else(|| format!("Gist has no {} file", GIST_FILE))?;
  serde_json::from_str::<LeaderboardDoc>(&file.content)
    .map_err(|e| format!("Gist content parse error: {}", e))
}

fn gist_payload(doc: &LeaderboardDoc) -> Result<GistPayload, String> {
  let content = serde_json::to_string(doc).map_err(|e| e.to_string())?;
  let mut files = HashMap::new();
  files.insert(GIST_FILE.to_string(), GistFileOut { content });
  Ok(GistPayload { files })
}

/// Try to extract a clean error message from a store error body.
fn extract_store_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ScoreEntry;

  #[test]
  fn gist_wrapper_carries_the_whole_document() {
    let doc = LeaderboardDoc {
      drivers: vec![ScoreEntry { username: "alice".into(), score: 7, difficulty: None }],
      cars: vec![],
    };
    let payload = gist_payload(&doc).expect("payload");
    let json = serde_json::to_string(&payload).expect("json");
    assert!(json.contains("leaderboard.json"));

    let wrapper: GistDocument = serde_json::from_str(&json).expect("wrapper");
    let parsed = parse_gist_document(&wrapper).expect("doc");
    assert_eq!(parsed, doc);
  }

  #[test]
  fn gist_without_the_leaderboard_file_is_rejected() {
    let wrapper: GistDocument =
      serde_json::from_str(r#"{"files":{"notes.txt":{"content":"hi"}}}"#).expect("wrapper");
    let err = parse_gist_document(&wrapper).expect_err("missing file");
    assert!(err.contains("leaderboard.json"));
  }

  #[test]
  fn error_bodies_surface_their_message() {
    assert_eq!(
      extract_store_error(r#"{"message":"Bad credentials"}"#),
      Some("Bad credentials".to_string())
    );
    assert_eq!(extract_store_error("<html>nope</html>"), None);
  }

  #[test]
  fn document_missing_a_mode_key_is_malformed() {
    assert!(serde_json::from_str::<LeaderboardDoc>(r#"{"drivers":[]}"#).is_err());
    assert!(serde_json::from_str::<LeaderboardDoc>(r#"{"drivers":[],"cars":[]}"#).is_ok());
  }
}
