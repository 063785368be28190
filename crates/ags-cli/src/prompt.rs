//! Operator input: server host, username and password.
//!
//! Passwords are read without echo when stdin is a terminal and otherwise
//! come from `AGS_PASSWORD`; they are handed to the session and dropped once
//! the token request is sent.

use std::io::{self, BufRead, IsTerminal, Write};

use ags_admin::{AdminError, AdminResult, CredentialSource, Credentials};

use crate::client::{CliError, CliResult};

/// Collects credentials from flags, the environment or the terminal.
pub(crate) struct PromptCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl PromptCredentials {
    pub(crate) fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username: username.filter(|value| !value.trim().is_empty()),
            password: password.filter(|value| !value.is_empty()),
        }
    }

    fn username(&mut self) -> AdminResult<String> {
        if let Some(username) = &self.username {
            return Ok(username.clone());
        }
        let entered = read_line("Username ", &mut io::stdin().lock(), &mut io::stdout())
            .map_err(|source| AdminError::Credentials { source })?;
        let username = non_empty(entered, "username")?;
        self.username = Some(username.clone());
        Ok(username)
    }

    fn password(&self) -> AdminResult<String> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        if io::stdin().is_terminal() {
            let entered = rpassword::prompt_password("Password ")
                .map_err(|source| AdminError::Credentials { source })?;
            non_empty(entered, "password")
        } else {
            Err(AdminError::Credentials {
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    "password required; set AGS_PASSWORD when running non-interactively",
                ),
            })
        }
    }
}

impl CredentialSource for PromptCredentials {
    fn credentials(&mut self) -> AdminResult<Credentials> {
        let username = self.username()?;
        let password = self.password()?;
        Ok(Credentials::new(username, password))
    }
}

/// Host from the flag or environment, prompting when neither supplied one.
pub(crate) fn resolve_host(supplied: Option<&str>) -> CliResult<String> {
    if let Some(host) = supplied.map(str::trim).filter(|host| !host.is_empty()) {
        return Ok(host.to_string());
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "server host is required (flag --server or AGS_SERVER)",
        ));
    }
    let entered = read_line("Server ", &mut io::stdin().lock(), &mut io::stdout())?;
    let host = entered.trim();
    if host.is_empty() {
        return Err(CliError::validation("server host cannot be empty"));
    }
    Ok(host.to_string())
}

/// Print `label`, then read one line with the trailing newline removed.
pub(crate) fn read_line<R: BufRead, W: Write>(
    label: &str,
    input: &mut R,
    out: &mut W,
) -> io::Result<String> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before a value was entered",
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn non_empty(value: String, field: &str) -> AdminResult<String> {
    if value.trim().is_empty() {
        Err(AdminError::Credentials {
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{field} cannot be empty"),
            ),
        })
    } else {
        Ok(value)
    }
}
