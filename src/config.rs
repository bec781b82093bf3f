//! Player configuration: optional TOML file, then environment overrides.
//!
//! See `PlayerConfig` for the expected schema. Every key is optional.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
  /// Listen port for the player itself.
  pub port: u16,
  /// Base URL of the course generator, e.g. "http://localhost:8000".
  pub backend_url: String,
  pub upload_path: String,
  pub request_timeout_secs: u64,
  /// How long the celebration stays up after the last module is completed.
  pub celebration_ms: u64,
  pub max_upload_bytes: usize,
  pub static_dir: String,
}

impl Default for PlayerConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      backend_url: "http://localhost:8000".into(),
      upload_path: "/test-upload".into(),
      request_timeout_secs: 120,
      celebration_ms: 3000,
      max_upload_bytes: 25 * 1024 * 1024,
      static_dir: "./static".into(),
    }
  }
}

impl PlayerConfig {
  /// File from COURSE_PLAYER_CONFIG (if any), then env variables on top.
  pub fn load() -> Self {
    let mut cfg = load_config_file_from_env().unwrap_or_default();
    cfg.apply_env(|key| std::env::var(key).ok());
    cfg
  }

  pub fn upload_url(&self) -> String {
    format!(
      "{}/{}",
      self.backend_url.trim_end_matches('/'),
      self.upload_path.trim_start_matches('/')
    )
  }

  pub fn celebration_duration(&self) -> Duration {
    Duration::from_millis(self.celebration_ms)
  }

  /// Override fields from `lookup`; unparsable numbers are logged and skipped.
  fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("COURSE_BACKEND_URL") { self.backend_url = v; }
    if let Some(v) = lookup("COURSE_UPLOAD_PATH") { self.upload_path = v; }
    if let Some(v) = lookup("STATIC_DIR") { self.static_dir = v; }
    parse_into(&lookup, "PORT", &mut self.port);
    parse_into(&lookup, "COURSE_REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs);
    parse_into(&lookup, "CELEBRATION_MS", &mut self.celebration_ms);
    parse_into(&lookup, "MAX_UPLOAD_BYTES", &mut self.max_upload_bytes);
  }
}

fn parse_into<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
  let Some(raw) = lookup(key) else { return };
  match raw.trim().parse::<T>() {
    Ok(v) => *slot = v,
    Err(_) => error!(target: "course_player", %key, value = %raw, "Ignoring unparsable env override"),
  }
}

/// Attempt to load `PlayerConfig` from COURSE_PLAYER_CONFIG. On any parsing/IO error, returns None.
pub fn load_config_file_from_env() -> Option<PlayerConfig> {
  let path = std::env::var("COURSE_PLAYER_CONFIG").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<PlayerConfig>(&s) {
      Ok(cfg) => {
        info!(target: "course_player", %path, "Loaded player config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "course_player", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "course_player", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
