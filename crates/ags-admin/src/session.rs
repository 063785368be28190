//! Token issuance and the lazy once-per-run authentication guard.
//!
//! # Design
//!
//! - The session owns the only token for a run; every other operation borrows
//!   it explicitly instead of reading ambient state.
//! - A held token is reused without a network call until its client-side
//!   lifetime (`issued_at + expiration_minutes`) is nearly spent, at which point
//!   the credential source is asked again.
//! - Passwords live only as long as the `generateToken` request.

use std::fmt::{self, Debug, Formatter};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{AdminClient, error_messages};
use crate::error::{AdminError, AdminResult};

/// Tokens are considered stale this long before their nominal expiry, or
/// halfway through their lifetime when that comes later.
const FRESHNESS_MARGIN_SECS: i64 = 60;

/// Operator credentials for one authentication attempt.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Pair a username with its password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Account name being authenticated.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies credentials whenever the session needs a new token.
pub trait CredentialSource {
    /// Produce credentials for the next authentication attempt.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Credentials`] when the operator input cannot be read.
    fn credentials(&mut self) -> AdminResult<Credentials>;
}

/// Fixed credentials, for automation and tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    /// Wrap a fixed username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials::new(username, password))
    }
}

impl CredentialSource for StaticCredentials {
    fn credentials(&mut self) -> AdminResult<Credentials> {
        Ok(self.0.clone())
    }
}

/// Admin token plus the client-side bookkeeping needed to judge freshness.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    value: String,
    issued_at: DateTime<Utc>,
    expiration_minutes: u32,
}

impl SessionToken {
    /// Token issued at an explicit instant.
    #[must_use]
    pub fn new(value: impl Into<String>, issued_at: DateTime<Utc>, expiration_minutes: u32) -> Self {
        Self {
            value: value.into(),
            issued_at,
            expiration_minutes,
        }
    }

    /// Token issued now.
    #[must_use]
    pub fn issued_now(value: impl Into<String>, expiration_minutes: u32) -> Self {
        Self::new(value, Utc::now(), expiration_minutes)
    }

    /// Opaque token string sent with every admin call.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Instant the token was obtained.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Requested lifetime in minutes.
    #[must_use]
    pub const fn expiration_minutes(&self) -> u32 {
        self.expiration_minutes
    }

    /// Nominal expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::minutes(i64::from(self.expiration_minutes))
    }

    /// Whether the token should no longer be used at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + self.freshness_margin() >= self.expires_at()
    }

    fn freshness_margin(&self) -> Duration {
        let half_life = i64::from(self.expiration_minutes) * 30;
        Duration::seconds(FRESHNESS_MARGIN_SECS.min(half_life))
    }
}

impl Debug for SessionToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expiration_minutes", &self.expiration_minutes)
            .finish()
    }
}

/// Holds the run's token and re-authenticates lazily.
#[derive(Debug)]
pub struct Session<S> {
    client: AdminClient,
    source: S,
    token: Option<SessionToken>,
}

impl<S: CredentialSource> Session<S> {
    /// Session with no token yet.
    #[must_use]
    pub const fn new(client: AdminClient, source: S) -> Self {
        Self {
            client,
            source,
            token: None,
        }
    }

    /// Seed the session with an already issued token.
    #[must_use]
    pub fn with_token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Client used for every call made on behalf of this session.
    #[must_use]
    pub const fn client(&self) -> &AdminClient {
        &self.client
    }

    /// Currently held token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Exchange credentials for a token via `generateToken`.
    ///
    /// The session's held token is left untouched; use
    /// [`Session::ensure_token`] to store one.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Auth`] when the reply has no `token` field and
    /// transport or decode errors when the server cannot be reached.
    pub async fn authenticate(&self, credentials: Credentials) -> AdminResult<SessionToken> {
        let minutes = self.client.config().token_expiration_minutes;
        let expiration = minutes.to_string();
        let Credentials { username, password } = credentials;
        let form = [
            ("username", username.as_str()),
            ("password", password.as_str()),
            ("expiration", expiration.as_str()),
            ("client", "requestip"),
            ("f", "json"),
        ];
        let reply = self.client.post_json("generateToken", &form).await?;

        match reply.get("token").and_then(Value::as_str) {
            Some(value) if !value.is_empty() => {
                info!(username = %username, expiration_minutes = minutes, "admin token issued");
                Ok(SessionToken::issued_now(value, minutes))
            }
            _ => Err(AdminError::Auth {
                reason: error_messages(&reply)
                    .unwrap_or_else(|| "response carried no token".to_string()),
            }),
        }
    }

    /// Return the held token, authenticating first when none is held or the
    /// held one is stale.
    ///
    /// # Errors
    ///
    /// Propagates credential collection and authentication failures.
    pub async fn ensure_token(&mut self) -> AdminResult<SessionToken> {
        self.ensure_token_at(Utc::now()).await
    }

    /// [`Session::ensure_token`] evaluated against an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Propagates credential collection and authentication failures.
    pub async fn ensure_token_at(&mut self, now: DateTime<Utc>) -> AdminResult<SessionToken> {
        if let Some(token) = &self.token {
            if !token.is_expired_at(now) {
                return Ok(token.clone());
            }
            debug!(expired_at = %token.expires_at(), "held token is stale; re-authenticating");
        }
        let credentials = self.source.credentials()?;
        let token = self.authenticate(credentials).await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Forget the held token so the next guard re-authenticates.
    pub fn invalidate(&mut self) {
        if self.token.take().is_some() {
            debug!("session token invalidated");
        }
    }
}
