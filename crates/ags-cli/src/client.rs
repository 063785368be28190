//! CLI error type and the per-run application context.

use std::fmt::{self, Display, Formatter};
use std::io;

use ags_admin::{AdminClient, AdminError, CredentialSource, Session, SessionToken};
use anyhow::anyhow;

use crate::cli::OutputFormat;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }

    /// Whether the failure means the held token is no longer usable.
    pub(crate) fn is_auth(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Failure(error) => matches!(
                error.downcast_ref::<AdminError>(),
                Some(AdminError::Auth { .. })
            ),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<AdminError> for CliError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::InvalidConfig { .. } | AdminError::InvalidServicePath { .. } => {
                Self::Validation(err.to_string())
            }
            other => Self::Failure(anyhow::Error::new(other)),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Failure(anyhow!(err).context("console I/O failed"))
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext<S> {
    pub(crate) session: Session<S>,
    pub(crate) output: OutputFormat,
}

impl<S: CredentialSource> AppContext<S> {
    pub(crate) const fn new(session: Session<S>, output: OutputFormat) -> Self {
        Self { session, output }
    }

    /// Token for the next admin call, authenticating when needed.
    pub(crate) async fn token(&mut self) -> CliResult<SessionToken> {
        Ok(self.session.ensure_token().await?)
    }

    pub(crate) const fn client(&self) -> &AdminClient {
        self.session.client()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_validation_errors_map_to_exit_code_two() {
        let err = CliError::from(AdminError::InvalidServicePath {
            value: "Roads".into(),
            reason: "missing service type",
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "invalid service path 'Roads': missing service type"
        );
        assert!(!err.is_auth());
    }

    #[test]
    fn auth_errors_are_failures_that_can_be_recognised() {
        let err = CliError::from(AdminError::Auth {
            reason: "token rejected by server (code 498)".into(),
        });
        assert_eq!(err.exit_code(), 3);
        assert!(err.is_auth());
        assert!(err.display_message().contains("code 498"));
    }

    #[test]
    fn io_errors_keep_their_cause() {
        let err = CliError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.display_message(), "console I/O failed: pipe closed");
        assert!(!CliError::validation("bad").is_auth());
    }
}
