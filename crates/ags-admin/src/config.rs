//! Endpoint and transport settings for one admin server.

use std::time::Duration;

use url::Url;

use crate::error::{AdminError, AdminResult};

/// Port serving the public REST directory.
pub const DEFAULT_HTTP_PORT: u16 = 6080;
/// Port serving the encrypted admin endpoint.
pub const DEFAULT_HTTPS_PORT: u16 = 6443;
/// Token lifetime requested from `generateToken`, in minutes.
pub const DEFAULT_TOKEN_EXPIRATION_MINUTES: u32 = 60;

/// Connection settings for the admin REST API.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Server host name or address.
    pub host: String,
    /// Port of the public REST directory.
    pub http_port: u16,
    /// Port of the admin endpoint.
    pub https_port: u16,
    /// Admin root, always ending in `/`.
    pub admin_url: Url,
    /// Skip TLS certificate verification. Opt-in for self-signed admin servers.
    pub accept_invalid_certs: bool,
    /// Token lifetime requested at authentication.
    pub token_expiration_minutes: u32,
    /// Per-request timeout; `None` leaves the HTTP client default.
    pub request_timeout: Option<Duration>,
}

impl AdminConfig {
    /// Build the default configuration for `host`, targeting
    /// `https://{host}:6443/arcgis/admin/`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidConfig`] when the host is empty and
    /// [`AdminError::InvalidUrl`] when it does not form a valid URL.
    pub fn for_host(host: &str) -> AdminResult<Self> {
        Self::for_host_with_port(host, DEFAULT_HTTPS_PORT)
    }

    /// Same as [`AdminConfig::for_host`] with a custom admin port.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidConfig`] for an empty host or a zero port.
    pub fn for_host_with_port(host: &str, https_port: u16) -> AdminResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(AdminError::InvalidConfig {
                field: "host",
                reason: "must not be empty",
            });
        }
        if https_port == 0 {
            return Err(AdminError::InvalidConfig {
                field: "https_port",
                reason: "must be between 1 and 65535",
            });
        }
        let raw = format!("https://{host}:{https_port}/arcgis/admin/");
        let admin_url = Url::parse(&raw).map_err(|source| AdminError::InvalidUrl {
            path: raw.clone(),
            source,
        })?;
        Ok(Self {
            host: host.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            https_port,
            admin_url,
            accept_invalid_certs: false,
            token_expiration_minutes: DEFAULT_TOKEN_EXPIRATION_MINUTES,
            request_timeout: None,
        })
    }

    /// Point the configuration at an explicit admin root.
    #[must_use]
    pub fn with_admin_url(mut self, mut url: Url) -> Self {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.admin_url = url;
        self
    }

    /// Opt in to accepting self-signed or otherwise unverifiable certificates.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Override the port of the public REST directory.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidConfig`] when `port` is zero.
    pub fn with_http_port(mut self, port: u16) -> AdminResult<Self> {
        if port == 0 {
            return Err(AdminError::InvalidConfig {
                field: "http_port",
                reason: "must be between 1 and 65535",
            });
        }
        self.http_port = port;
        Ok(self)
    }

    /// Override the requested token lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidConfig`] when `minutes` is zero.
    pub fn with_token_expiration(mut self, minutes: u32) -> AdminResult<Self> {
        if minutes == 0 {
            return Err(AdminError::InvalidConfig {
                field: "token_expiration_minutes",
                reason: "must be at least one minute",
            });
        }
        self.token_expiration_minutes = minutes;
        Ok(self)
    }

    /// Set a per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Public REST services directory, served over plain HTTP.
    #[must_use]
    pub fn services_directory_url(&self) -> String {
        format!(
            "http://{}:{}/arcgis/rest/services/",
            self.host, self.http_port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_host_targets_secure_admin_root() -> AdminResult<()> {
        let config = AdminConfig::for_host("gis.example.org")?;
        assert_eq!(
            config.admin_url.as_str(),
            "https://gis.example.org:6443/arcgis/admin/"
        );
        assert_eq!(
            config.services_directory_url(),
            "http://gis.example.org:6080/arcgis/rest/services/"
        );
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.token_expiration_minutes, 60);
        Ok(())
    }

    #[test]
    fn for_host_rejects_blank_host_and_zero_port() {
        assert!(matches!(
            AdminConfig::for_host("   "),
            Err(AdminError::InvalidConfig { field: "host", .. })
        ));
        assert!(matches!(
            AdminConfig::for_host_with_port("gis", 0),
            Err(AdminError::InvalidConfig {
                field: "https_port",
                ..
            })
        ));
    }

    #[test]
    fn with_admin_url_appends_trailing_slash() -> AdminResult<()> {
        let url = Url::parse("http://127.0.0.1:9000/arcgis/admin").expect("valid URL");
        let config = AdminConfig::for_host("local")?.with_admin_url(url);
        assert_eq!(config.admin_url.as_str(), "http://127.0.0.1:9000/arcgis/admin/");
        Ok(())
    }

    #[test]
    fn zero_token_expiration_is_rejected() -> AdminResult<()> {
        let config = AdminConfig::for_host("gis")?;
        assert!(config.clone().with_token_expiration(0).is_err());
        assert_eq!(config.with_token_expiration(15)?.token_expiration_minutes, 15);
        Ok(())
    }

    #[test]
    fn http_port_feeds_the_services_directory() -> AdminResult<()> {
        let config = AdminConfig::for_host("gis")?;
        assert!(matches!(
            config.clone().with_http_port(0),
            Err(AdminError::InvalidConfig {
                field: "http_port",
                ..
            })
        ));
        assert_eq!(
            config.with_http_port(8080)?.services_directory_url(),
            "http://gis:8080/arcgis/rest/services/"
        );
        Ok(())
    }
}
