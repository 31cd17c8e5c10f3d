//! Server configuration: an optional TOML file layered under `ROSTER_`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use roster_api::{ApiConfig, MailConfig};
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  #[serde(default)]
  pub admin_emails:       Vec<String>,
  #[serde(default)]
  pub utc_offset_minutes: i32,
  #[serde(default)]
  pub mail:               MailConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/roster/roster.db") }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay the environment, e.g.
  /// `ROSTER_PORT=9000` or `ROSTER_MAIL__PROVIDER=emailjs`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder().add_source(config::File::from(path).required(false)),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    let settings = builder
      .add_source(
        config::Environment::with_prefix("ROSTER")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("admin_emails"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      admin_emails:       self.admin_emails.clone(),
      utc_offset_minutes: self.utc_offset_minutes,
    }
  }

  /// The store path with a leading `~` expanded to the home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    ServerConfig::from_builder(
      config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
    .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert!(cfg.admin_emails.is_empty());
    assert_eq!(cfg.utc_offset_minutes, 0);
    assert!(matches!(cfg.mail, MailConfig::Log));
  }

  #[test]
  fn full_file_round_trips_into_api_config() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 9000
        store_path = "/var/lib/roster.db"
        admin_emails = ["hr@example.com"]
        utc_offset_minutes = 330

        [mail]
        provider = "emailjs"
        service_id = "svc"
        public_key = "pk"
        welcome_template = "tpl_welcome"
        reset_template = "tpl_reset"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("/var/lib/roster.db"));
    assert!(matches!(cfg.mail, MailConfig::EmailJs(_)));

    let api = cfg.api_config();
    assert!(api.is_admin("hr@example.com"));
    assert!(!api.is_admin("HR@example.com"));
    assert_eq!(api.timezone().local_minus_utc(), 330 * 60);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/r.db")), PathBuf::from(home).join("r.db"));
    assert_eq!(expand_tilde(Path::new("/abs/r.db")), PathBuf::from("/abs/r.db"));
  }
}
