//! Notification senders: [`Mailer::Log`] for development and
//! [`Mailer::EmailJs`] for delivery through an EmailJS-compatible endpoint.

use std::{collections::BTreeMap, time::Duration};

use roster_core::notify::{DeliveryReceipt, Notifier, Template};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Configuration ────────────────────────────────────────────────────────────

/// Mail settings, selected by `provider`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum MailConfig {
  /// Log the message instead of sending it.
  #[default]
  Log,
  EmailJs(EmailJsConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailJsConfig {
  #[serde(default = "default_endpoint")]
  pub endpoint:          String,
  pub service_id:        String,
  /// The account's public key, sent as `user_id`.
  pub public_key:        String,
  pub welcome_template:  String,
  pub reset_template:    String,
}

fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_owned() }

impl EmailJsConfig {
  fn template_id(&self, template: Template) -> &str {
    match template {
      Template::Welcome => &self.welcome_template,
      Template::PasswordReset => &self.reset_template,
    }
  }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MailError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("mail provider answered {status}: {body}")]
  Rejected { status: u16, body: String },
}

// ─── Mailer ───────────────────────────────────────────────────────────────────

pub enum Mailer {
  Log,
  EmailJs { client: reqwest::Client, config: EmailJsConfig },
}

#[derive(Serialize)]
struct EmailJsRequest<'a> {
  service_id:      &'a str,
  template_id:     &'a str,
  user_id:         &'a str,
  template_params: &'a BTreeMap<String, String>,
}

impl Mailer {
  pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
    match config {
      MailConfig::Log => Ok(Self::Log),
      MailConfig::EmailJs(config) => {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::EmailJs { client, config: config.clone() })
      }
    }
  }
}

impl Notifier for Mailer {
  type Error = MailError;

  async fn send(
    &self,
    template: Template,
    recipient: &str,
    variables: &BTreeMap<String, String>,
  ) -> Result<DeliveryReceipt, MailError> {
    match self {
      Self::Log => {
        // Variables may hold credentials; only their names are logged.
        let keys = variables.keys().cloned().collect::<Vec<_>>().join(",");
        tracing::info!(%template, recipient, variables = %keys, "mail (log only)");
        Ok(DeliveryReceipt { provider: "log".into(), status: "logged".into() })
      }
      Self::EmailJs { client, config } => {
        let body = EmailJsRequest {
          service_id:      &config.service_id,
          template_id:     config.template_id(template),
          user_id:         &config.public_key,
          template_params: variables,
        };

        let resp = client.post(&config.endpoint).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
          return Err(MailError::Rejected { status: status.as_u16(), body: text });
        }
        Ok(DeliveryReceipt { provider: "emailjs".into(), status: text })
      }
    }
  }
}
