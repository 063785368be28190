//! HTTP transport shared by every admin call.
//!
//! Every admin operation is a form-encoded POST carrying `f=json` and, once
//! authenticated, the session token. Replies are JSON documents; error replies
//! come back with HTTP 200 and either an `error` object or `status: "error"`.

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::session::SessionToken;

/// Server codes signalling an expired or unknown token.
const TOKEN_REJECTED_CODES: [i64; 2] = [498, 499];

/// Thin wrapper over `reqwest::Client` bound to one admin root.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    config: AdminConfig,
}

impl AdminClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::ClientBuild`] when the TLS backend cannot be
    /// initialised.
    pub fn new(config: AdminConfig) -> AdminResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if config.accept_invalid_certs {
            warn!(
                host = %config.host,
                "TLS certificate verification disabled for admin endpoint"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|source| AdminError::ClientBuild { source })?;
        Ok(Self { http, config })
    }

    /// Configuration the client was built from.
    #[must_use]
    pub const fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Resolve `path` against the admin root.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidUrl`] when the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> AdminResult<Url> {
        self.config
            .admin_url
            .join(path)
            .map_err(|source| AdminError::InvalidUrl {
                path: path.to_string(),
                source,
            })
    }

    /// POST `form` to `path` and return the raw body, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Transport`] when no response arrives or the body
    /// cannot be read.
    pub async fn post_raw(&self, path: &str, form: &[(&str, &str)]) -> AdminResult<String> {
        let url = self.endpoint(path)?;
        debug!(endpoint = path, "admin request");
        let response = self
            .http
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(|source| AdminError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AdminError::Transport {
                url: url.to_string(),
                source,
            })?;
        debug!(endpoint = path, status = status.as_u16(), "admin response");
        Ok(body)
    }

    /// POST `form` to `path` and decode the reply as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Transport`] or [`AdminError::Decode`].
    pub async fn post_json(&self, path: &str, form: &[(&str, &str)]) -> AdminResult<Value> {
        let body = self.post_raw(path, form).await?;
        serde_json::from_str(&body).map_err(|source| AdminError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }

    /// Authenticated read-only call; error payloads become errors.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Auth`] when the server rejects the token and
    /// [`AdminError::Operation`] for any other error payload.
    pub async fn call(&self, path: &str, token: &SessionToken) -> AdminResult<Value> {
        let value = self.post_json(path, &token_form(token)).await?;
        if let Some(err) = token_rejection(&value) {
            return Err(err);
        }
        if is_error_payload(&value) {
            return Err(AdminError::Operation {
                endpoint: path.to_string(),
                body: value.to_string(),
            });
        }
        Ok(value)
    }
}

/// The `f=json` + `token` pair every authenticated call sends.
#[must_use]
pub(crate) fn token_form(token: &SessionToken) -> [(&'static str, &str); 2] {
    [("f", "json"), ("token", token.value())]
}

/// [`AdminError::Auth`] when the reply says the token is expired or unknown.
#[must_use]
pub(crate) fn token_rejection(value: &Value) -> Option<AdminError> {
    error_code(value)
        .filter(|code| TOKEN_REJECTED_CODES.contains(code))
        .map(|code| AdminError::Auth {
            reason: format!("token rejected by server (code {code})"),
        })
}

/// Whether a reply carries an `error` object or an `error` status.
#[must_use]
pub(crate) fn is_error_payload(value: &Value) -> bool {
    value.get("error").is_some()
        || value
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status.eq_ignore_ascii_case("error"))
}

/// Numeric error code from either error shape.
#[must_use]
pub(crate) fn error_code(value: &Value) -> Option<i64> {
    value
        .get("error")
        .and_then(|error| error.get("code"))
        .or_else(|| value.get("code"))
        .and_then(Value::as_i64)
}

/// Joined `messages` array (or `error.message`) of an error reply.
#[must_use]
pub(crate) fn error_messages(value: &Value) -> Option<String> {
    let messages = value
        .get("messages")
        .or_else(|| value.get("error").and_then(|error| error.get("details")))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|joined| !joined.is_empty());
    messages.or_else(|| {
        value
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> AdminClient {
        let url = Url::parse(&format!("{}/arcgis/admin/", server.base_url())).expect("valid URL");
        let config = AdminConfig::for_host("127.0.0.1")
            .expect("valid host")
            .with_admin_url(url);
        AdminClient::new(config).expect("client builds")
    }

    #[test]
    fn endpoint_joins_below_admin_root() {
        let config = AdminConfig::for_host("gis").expect("valid host");
        let client = AdminClient::new(config).expect("client builds");
        let url = client.endpoint("services/Maps").expect("joins");
        assert_eq!(url.as_str(), "https://gis:6443/arcgis/admin/services/Maps");
    }

    #[test]
    fn accept_invalid_certs_builds_client() {
        let config = AdminConfig::for_host("gis")
            .expect("valid host")
            .with_accept_invalid_certs(true);
        let client = AdminClient::new(config).expect("client builds");
        assert!(client.config().accept_invalid_certs);
    }

    #[test]
    fn error_payload_shapes_are_recognised() {
        let nested = json!({"error": {"code": 498, "message": "Invalid token.", "details": []}});
        assert!(is_error_payload(&nested));
        assert_eq!(error_code(&nested), Some(498));
        assert_eq!(error_messages(&nested).as_deref(), Some("Invalid token."));

        let flat = json!({"status": "error", "messages": ["Unable to generate token."], "code": 400});
        assert!(is_error_payload(&flat));
        assert_eq!(error_code(&flat), Some(400));
        assert_eq!(
            error_messages(&flat).as_deref(),
            Some("Unable to generate token.")
        );

        assert!(!is_error_payload(&json!({"status": "success"})));
    }

    #[tokio::test]
    async fn call_posts_token_form() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/arcgis/admin/info")
                .form_urlencoded_tuple("f", "json")
                .form_urlencoded_tuple("token", "tok-1");
            then.status(200)
                .json_body(json!({"currentversion": "11.1", "currentbuild": "41722"}));
        });

        let client = client_for(&server);
        let token = SessionToken::issued_now("tok-1", 60);
        let value = client.call("info", &token).await.expect("call succeeds");
        assert_eq!(value["currentversion"], "11.1");
        mock.assert();
    }

    #[tokio::test]
    async fn call_maps_rejected_token_to_auth_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/clusters");
            then.status(200)
                .json_body(json!({"error": {"code": 498, "message": "Invalid token."}}));
        });

        let client = client_for(&server);
        let token = SessionToken::issued_now("stale", 60);
        let err = client
            .call("clusters", &token)
            .await
            .expect_err("rejected token");
        assert!(matches!(err, AdminError::Auth { .. }));
    }

    #[tokio::test]
    async fn call_surfaces_error_payload_as_operation_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/logs/settings");
            then.status(200)
                .json_body(json!({"status": "error", "messages": ["denied"], "code": 403}));
        });

        let client = client_for(&server);
        let token = SessionToken::issued_now("tok", 60);
        let err = client
            .call("logs/settings", &token)
            .await
            .expect_err("error payload");
        match err {
            AdminError::Operation { endpoint, body } => {
                assert_eq!(endpoint, "logs/settings");
                assert!(body.contains("denied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let url = Url::parse("http://127.0.0.1:9/arcgis/admin/").expect("valid URL");
        let config = AdminConfig::for_host("127.0.0.1")
            .expect("valid host")
            .with_admin_url(url);
        let client = AdminClient::new(config).expect("client builds");
        let err = client.post_raw("info", &[("f", "json")]).await.expect_err("no server");
        assert!(err.is_transport());
    }
}
