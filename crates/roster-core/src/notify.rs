//! Out-of-band notifications (welcome and password-reset emails).
//!
//! Delivery is best-effort: a failed send is recorded in a [`Delivery`] and
//! logged, never propagated as an operation error.

use std::{collections::BTreeMap, future::Future};

use serde::{Deserialize, Serialize};

/// Logical message templates. Senders map these to provider template ids.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Template {
  /// Sent once per new account, carrying the login email and password.
  Welcome,
  PasswordReset,
}

/// Acknowledgement returned by a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
  /// Sender name, e.g. `"log"` or `"emailjs"`.
  pub provider: String,
  /// Provider-specific status text.
  pub status:   String,
}

/// Abstraction over a notification sender.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    template: Template,
    recipient: &'a str,
    variables: &'a BTreeMap<String, String>,
  ) -> impl Future<Output = Result<DeliveryReceipt, Self::Error>> + Send + 'a;
}

/// What happened to a notification attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
  Sent { receipt: DeliveryReceipt },
  Failed { reason: String },
  NotAttempted,
}

impl Delivery {
  /// Send through `notifier`, folding any error into [`Delivery::Failed`].
  pub async fn attempt<N: Notifier>(
    notifier: &N,
    template: Template,
    recipient: &str,
    variables: &BTreeMap<String, String>,
  ) -> Self {
    match notifier.send(template, recipient, variables).await {
      Ok(receipt) => {
        tracing::info!(%template, recipient, provider = %receipt.provider, "notification sent");
        Self::Sent { receipt }
      }
      Err(e) => {
        tracing::warn!(%template, recipient, error = %e, "notification delivery failed");
        Self::Failed { reason: e.to_string() }
      }
    }
  }

  pub fn is_sent(&self) -> bool { matches!(self, Self::Sent { .. }) }
}
