//! The identity-provider half of [`SqliteStore`]: accounts, sign-in
//! lock-out, and password reset tokens.

use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use rusqlite::OptionalExtension as _;
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use roster_core::{
  identity::{Account, AuthFailure, AuthOutcome, IdentityProvider, PasswordReset},
  password::{hash_password, verify_password},
};

use crate::{
  Result, SqliteStore,
  encode::{ACCOUNT_COLUMNS, RawAccount, encode_dt, encode_uuid},
};

/// Consecutive failed sign-ins before an account is locked.
pub(crate) const MAX_FAILED_ATTEMPTS: u32 = 5;

/// How long a locked account refuses sign-in.
pub(crate) fn lockout_period() -> Duration { Duration::minutes(15) }

/// How long an issued reset token stays valid.
pub(crate) fn reset_token_ttl() -> Duration { Duration::hours(1) }

const RESET_TOKEN_BYTES: usize = 32;

fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn generate_token() -> String {
  let mut bytes = [0u8; RESET_TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

impl SqliteStore {
  async fn account_by_email(&self, email: &str) -> Result<Option<RawAccount>> {
    let email = email.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
              rusqlite::params![email],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }

  /// Persist the lock-out counters for an account.
  async fn set_attempts(
    &self,
    account_id: &str,
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
  ) -> Result<()> {
    let id_str     = account_id.to_owned();
    let locked_str = locked_until.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts SET failed_attempts = ?2, locked_until = ?3 WHERE account_id = ?1",
          rusqlite::params![id_str, failed_attempts, locked_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_password_hash(&self, account_id: &str, password_hash: String) -> Result<()> {
    let id_str = account_id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts SET password_hash = ?2 WHERE account_id = ?1",
          rusqlite::params![id_str, password_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn is_locked(raw: &RawAccount, now: DateTime<Utc>) -> Result<bool> {
  Ok(raw.locked_until()?.is_some_and(|until| until > now))
}

// ─── IdentityProvider impl ───────────────────────────────────────────────────

impl IdentityProvider for SqliteStore {
  type Error = crate::Error;

  async fn account_exists(&self, email: &str) -> Result<bool> {
    Ok(self.account_by_email(email).await?.is_some())
  }

  async fn create_account(&self, email: &str, password: &str) -> Result<Option<Account>> {
    let account = Account {
      account_id: Uuid::new_v4(),
      email:      email.to_owned(),
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(account.account_id);
    let email_str = account.email.clone();
    let at_str    = encode_dt(account.created_at);
    let hash      = hash_password(password)?;

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO accounts (account_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (email) DO NOTHING",
          rusqlite::params![id_str, email_str, hash, at_str],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Ok(None);
    }
    tracing::info!(email, account_id = %account.account_id, "account created");
    Ok(Some(account))
  }

  async fn sign_in(&self, email: &str, password: &str) -> Result<AuthOutcome<Account>> {
    let now = Utc::now();
    let Some(raw) = self.account_by_email(email).await? else {
      return Ok(Err(AuthFailure::InvalidCredentials));
    };

    if is_locked(&raw, now)? {
      return Ok(Err(AuthFailure::TooManyAttempts));
    }

    if verify_password(password, &raw.password_hash) {
      if raw.failed_attempts > 0 || raw.locked_until.is_some() {
        self.set_attempts(&raw.account_id, 0, None).await?;
      }
      return Ok(Ok(raw.account()?));
    }

    let attempts = raw.failed_attempts + 1;
    if attempts >= MAX_FAILED_ATTEMPTS {
      let until = now + lockout_period();
      self.set_attempts(&raw.account_id, 0, Some(until)).await?;
      tracing::warn!(email, %until, "account locked after repeated sign-in failures");
      return Ok(Err(AuthFailure::TooManyAttempts));
    }

    self.set_attempts(&raw.account_id, attempts, None).await?;
    Ok(Err(AuthFailure::InvalidCredentials))
  }

  async fn send_password_reset(&self, email: &str) -> Result<Option<PasswordReset>> {
    let Some(raw) = self.account_by_email(email).await? else {
      return Ok(None);
    };

    let token      = generate_token();
    let expires_at = Utc::now() + reset_token_ttl();

    let digest      = token_digest(&token);
    let id_str      = raw.account_id.clone();
    let expires_str = encode_dt(expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO password_resets (token_digest, account_id, expires_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![digest, id_str, expires_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(PasswordReset {
      account_id: raw.account()?.account_id,
      email: raw.email,
      token,
      expires_at,
    }))
  }

  async fn complete_password_reset(
    &self,
    token: &str,
    new_password: &str,
  ) -> Result<AuthOutcome<()>> {
    let digest  = token_digest(token);
    let now_str = encode_dt(Utc::now());
    let hash    = hash_password(new_password)?;

    // Claiming the token and replacing the password commit together, so a
    // token is spent exactly once.
    let consumed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let account_id: Option<String> = tx
          .query_row(
            "UPDATE password_resets SET used_at = ?2
             WHERE token_digest = ?1 AND used_at IS NULL AND expires_at > ?2
             RETURNING account_id",
            rusqlite::params![digest, now_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(account_id) = account_id else {
          return Ok(false);
        };

        tx.execute(
          "UPDATE accounts
           SET password_hash = ?2, failed_attempts = 0, locked_until = NULL
           WHERE account_id = ?1",
          rusqlite::params![account_id, hash],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !consumed {
      return Ok(Err(AuthFailure::InvalidResetToken));
    }
    tracing::info!("password reset completed");
    Ok(Ok(()))
  }

  async fn change_password(
    &self,
    email: &str,
    current_password: &str,
    new_password: &str,
  ) -> Result<AuthOutcome<()>> {
    let Some(raw) = self.account_by_email(email).await? else {
      return Ok(Err(AuthFailure::InvalidCredentials));
    };
    if is_locked(&raw, Utc::now())? {
      return Ok(Err(AuthFailure::TooManyAttempts));
    }
    if !verify_password(current_password, &raw.password_hash) {
      return Ok(Err(AuthFailure::InvalidCredentials));
    }

    self
      .set_password_hash(&raw.account_id, hash_password(new_password)?)
      .await?;
    Ok(Ok(()))
  }
}
