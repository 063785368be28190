//! Multi-call server report.
//!
//! The report is assembled from independent read-only calls (clusters and
//! their machines, version, log level, license). A call that fails leaves its
//! section marked unavailable and the remaining calls still run; only a
//! rejected token aborts the whole report so the caller can re-authenticate.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::AdminClient;
use crate::error::{AdminError, AdminResult};
use crate::session::SessionToken;

/// One independently fetched piece of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fragment<T> {
    /// The call succeeded.
    Available(T),
    /// The call failed; carries the error chain.
    Unavailable(String),
}

/// A cluster and the machines it hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterReport {
    /// Cluster name.
    pub name: String,
    /// Configured state (`STARTED`, `STOPPED`).
    pub configured_state: String,
    /// Member machines in server order.
    pub machines: Vec<MachineReport>,
}

/// A machine's configured state and platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineReport {
    /// Machine name as listed by its cluster.
    pub name: String,
    /// Details fetched from `machines/{name}`.
    pub details: Fragment<MachineDetails>,
}

/// Fields read from a machine document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDetails {
    /// Configured state of the machine.
    #[serde(default)]
    pub configured_state: String,
    /// Operating platform.
    #[serde(default)]
    pub platform: String,
}

/// Server version and build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    /// `currentversion` as reported.
    pub version: String,
    /// `currentbuild` as reported.
    pub build: String,
}

/// License edition, level, expiry and extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseReport {
    /// Edition name.
    pub edition: String,
    /// Level name.
    pub level: String,
    /// Whether the edition has an expiry at all.
    pub can_expire: bool,
    /// Expiry date when the edition can expire and the server reported a
    /// usable one.
    pub expires_on: Option<NaiveDate>,
    /// Licensed extension names.
    pub extensions: Vec<String>,
}

/// The composed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerReport {
    /// Clusters with their machines.
    pub clusters: Fragment<Vec<ClusterReport>>,
    /// Version and build.
    pub version: Fragment<VersionInfo>,
    /// Current log level.
    pub log_level: Fragment<String>,
    /// License details.
    pub license: Fragment<LicenseReport>,
}

#[derive(Debug, Deserialize)]
struct ClusterList {
    #[serde(default)]
    clusters: Vec<ClusterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterEntry {
    cluster_name: String,
    #[serde(default)]
    configured_state: String,
    #[serde(default)]
    machine_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InfoReply {
    currentversion: Value,
    currentbuild: Value,
}

#[derive(Debug, Deserialize)]
struct LogSettingsReply {
    settings: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogSettings {
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct LicenseReply {
    edition: Edition,
    level: Named,
    #[serde(default)]
    extensions: Vec<Named>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Edition {
    name: String,
    #[serde(default)]
    can_expire: bool,
    #[serde(default)]
    expiration: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

/// Fetch every fragment in turn and compose the report.
///
/// # Errors
///
/// Returns [`AdminError::Auth`] when the server rejects the token; every other
/// failure degrades the affected section.
pub async fn build_report(client: &AdminClient, token: &SessionToken) -> AdminResult<ServerReport> {
    let clusters = fragment(fetch_clusters(client, token).await)?;
    let version = fragment(fetch::<InfoReply>(client, token, "info").await.map(|info| {
        VersionInfo {
            version: plain(&info.currentversion),
            build: plain(&info.currentbuild),
        }
    }))?;
    let log_level = fragment(
        fetch::<LogSettingsReply>(client, token, "logs/settings")
            .await
            .map(|reply| reply.settings.log_level),
    )?;
    let license = fragment(
        fetch::<LicenseReply>(client, token, "system/licenses")
            .await
            .map(license_report),
    )?;
    debug!("server report assembled");
    Ok(ServerReport {
        clusters,
        version,
        log_level,
        license,
    })
}

async fn fetch_clusters(
    client: &AdminClient,
    token: &SessionToken,
) -> AdminResult<Vec<ClusterReport>> {
    let list = fetch::<ClusterList>(client, token, "clusters").await?;
    let mut clusters = Vec::with_capacity(list.clusters.len());
    for entry in list.clusters {
        let mut machines = Vec::with_capacity(entry.machine_names.len());
        for name in entry.machine_names {
            let details = fragment(
                fetch::<MachineDetails>(client, token, &format!("machines/{name}")).await,
            )?;
            machines.push(MachineReport { name, details });
        }
        clusters.push(ClusterReport {
            name: entry.cluster_name,
            configured_state: entry.configured_state,
            machines,
        });
    }
    Ok(clusters)
}

async fn fetch<T: DeserializeOwned>(
    client: &AdminClient,
    token: &SessionToken,
    path: &str,
) -> AdminResult<T> {
    let value = client.call(path, token).await?;
    serde_json::from_value(value).map_err(|source| AdminError::Decode {
        endpoint: path.to_string(),
        source,
    })
}

fn fragment<T>(result: AdminResult<T>) -> AdminResult<Fragment<T>> {
    match result {
        Ok(value) => Ok(Fragment::Available(value)),
        Err(err @ AdminError::Auth { .. }) => Err(err),
        Err(err) => {
            warn!(error = %err.chain(), "report fragment unavailable");
            Ok(Fragment::Unavailable(err.chain()))
        }
    }
}

fn license_report(reply: LicenseReply) -> LicenseReport {
    let expires_on = if reply.edition.can_expire {
        reply.edition.expiration.and_then(expiration_date)
    } else {
        None
    };
    LicenseReport {
        edition: reply.edition.name,
        level: reply.level.name,
        can_expire: reply.edition.can_expire,
        expires_on,
        extensions: reply.extensions.into_iter().map(|ext| ext.name).collect(),
    }
}

/// UTC calendar date of an epoch-millisecond timestamp, truncated to the day.
#[must_use]
pub fn expiration_date(epoch_millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch_millis.div_euclid(1000), 0).map(|moment| moment.date_naive())
}

fn plain(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

impl Display for ServerReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.clusters {
            Fragment::Available(clusters) if clusters.is_empty() => {
                writeln!(f, "No clusters found")?;
                writeln!(f)?;
            }
            Fragment::Available(clusters) => {
                for cluster in clusters {
                    writeln!(f, "Cluster: {} is {}", cluster.name, cluster.configured_state)?;
                    if cluster.machines.is_empty() {
                        writeln!(f, "    No machines associated with cluster")?;
                    }
                    for machine in &cluster.machines {
                        match &machine.details {
                            Fragment::Available(details) => writeln!(
                                f,
                                "    Machine: {} is {}. (Platform: {})",
                                machine.name, details.configured_state, details.platform
                            )?,
                            Fragment::Unavailable(error) => {
                                writeln!(f, "    Machine: {} unavailable: {error}", machine.name)?;
                            }
                        }
                    }
                }
            }
            Fragment::Unavailable(error) => writeln!(f, "Clusters unavailable: {error}")?,
        }

        writeln!(f)?;
        match &self.version {
            Fragment::Available(info) => {
                writeln!(f, "Version: {}", info.version)?;
                writeln!(f, "Build:   {}", info.build)?;
            }
            Fragment::Unavailable(error) => writeln!(f, "Version unavailable: {error}")?,
        }
        writeln!(f)?;

        match &self.log_level {
            Fragment::Available(level) => writeln!(f, "Log level: {level}")?,
            Fragment::Unavailable(error) => writeln!(f, "Log level unavailable: {error}")?,
        }
        writeln!(f)?;

        match &self.license {
            Fragment::Available(license) => {
                writeln!(f, "License is: {} / {}", license.edition, license.level)?;
                match (license.can_expire, license.expires_on) {
                    (true, Some(date)) => {
                        writeln!(f, "License set to expire: {}", date.format("%Y-%m-%d"))?;
                    }
                    (true, None) => writeln!(f, "License set to expire: unknown")?,
                    (false, _) => writeln!(f, "License does not expire")?,
                }
                if license.extensions.is_empty() {
                    writeln!(f, "No available extensions")?;
                } else {
                    writeln!(f, "Available Extensions........")?;
                    for name in &license.extensions {
                        writeln!(f, "extension:  {name}")?;
                    }
                }
            }
            Fragment::Unavailable(error) => writeln!(f, "License unavailable: {error}")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use httpmock::prelude::*;
    use reqwest::Url;
    use serde_json::json;

    fn client_for(server: &MockServer) -> AdminClient {
        let url = Url::parse(&format!("{}/arcgis/admin/", server.base_url())).expect("valid URL");
        let config = AdminConfig::for_host("127.0.0.1")
            .expect("valid host")
            .with_admin_url(url);
        AdminClient::new(config).expect("client builds")
    }

    fn mount_common(server: &MockServer, license: &Value) {
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/info");
            then.status(200)
                .json_body(json!({"currentversion": 10.3, "currentbuild": "4322"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/logs/settings");
            then.status(200)
                .json_body(json!({"settings": {"logLevel": "WARNING", "maxLogFileAge": 90}}));
        });
        let license = license.clone();
        server.mock(move |when, then| {
            when.method(POST).path("/arcgis/admin/system/licenses");
            then.status(200).json_body(license);
        });
    }

    #[test]
    fn expiration_date_truncates_to_utc_day() {
        let date = expiration_date(1_700_000_000_000).expect("in range");
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2023-11-14");
        assert_eq!(
            expiration_date(86_399_999).map(|d| d.to_string()).as_deref(),
            Some("1970-01-01")
        );
    }

    #[tokio::test]
    async fn empty_cluster_list_renders_fallback_without_machines() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/clusters");
            then.status(200).json_body(json!({"clusters": []}));
        });
        mount_common(
            &server,
            &json!({
                "edition": {"name": "Advanced", "canExpire": false},
                "level": {"name": "Enterprise"},
                "extensions": []
            }),
        );

        let token = SessionToken::issued_now("tok", 60);
        let report = build_report(&client_for(&server), &token)
            .await
            .expect("report");
        let text = report.to_string();

        assert!(text.contains("No clusters found"));
        assert!(!text.contains("Machine:"));
        assert!(text.contains("Version: 10.3\nBuild:   4322\n"));
        assert!(text.contains("Log level: WARNING"));
        assert!(text.contains("License is: Advanced / Enterprise\nLicense does not expire\n"));
        assert!(text.ends_with("No available extensions\n"));
    }

    #[tokio::test]
    async fn clusters_machines_and_expiring_license_render() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/clusters");
            then.status(200).json_body(json!({"clusters": [
                {"clusterName": "default", "configuredState": "STARTED", "machineNames": ["GIS01", "GIS02"]},
                {"clusterName": "spare", "configuredState": "STOPPED", "machineNames": []}
            ]}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/machines/GIS01");
            then.status(200)
                .json_body(json!({"configuredState": "STARTED", "platform": "Windows"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/machines/GIS02");
            then.status(200)
                .json_body(json!({"status": "error", "messages": ["Machine offline"]}));
        });
        mount_common(
            &server,
            &json!({
                "edition": {"name": "Standard", "canExpire": true, "expiration": 1_700_000_000_000_i64},
                "level": {"name": "Workgroup"},
                "extensions": [{"name": "Spatial"}, {"name": "Network"}]
            }),
        );

        let token = SessionToken::issued_now("tok", 60);
        let text = build_report(&client_for(&server), &token)
            .await
            .expect("report")
            .to_string();

        assert!(text.starts_with("Cluster: default is STARTED\n    Machine: GIS01 is STARTED. (Platform: Windows)\n"));
        assert!(text.contains("    Machine: GIS02 unavailable: "));
        assert!(text.contains("Cluster: spare is STOPPED\n    No machines associated with cluster\n"));
        assert!(text.contains("License set to expire: 2023-11-14\n"));
        assert!(text.contains("Available Extensions........\nextension:  Spatial\nextension:  Network\n"));
    }

    #[tokio::test]
    async fn expiring_license_without_a_usable_date_is_unknown() {
        for edition in [
            json!({"name": "Standard", "canExpire": true}),
            json!({"name": "Standard", "canExpire": true, "expiration": i64::MAX}),
        ] {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(POST).path("/arcgis/admin/clusters");
                then.status(200).json_body(json!({"clusters": []}));
            });
            mount_common(
                &server,
                &json!({"edition": edition, "level": {"name": "Workgroup"}, "extensions": []}),
            );

            let token = SessionToken::issued_now("tok", 60);
            let report = build_report(&client_for(&server), &token)
                .await
                .expect("report");
            let text = report.to_string();

            assert!(text.contains("License set to expire: unknown\n"), "{text}");
            assert!(!text.contains("License does not expire"));
        }
    }

    #[tokio::test]
    async fn failed_fragment_does_not_abort_report() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/clusters");
            then.status(200).body("not json");
        });
        mount_common(
            &server,
            &json!({
                "edition": {"name": "Advanced", "canExpire": false},
                "level": {"name": "Enterprise"}
            }),
        );

        let token = SessionToken::issued_now("tok", 60);
        let report = build_report(&client_for(&server), &token)
            .await
            .expect("report");

        assert!(matches!(report.clusters, Fragment::Unavailable(_)));
        assert!(matches!(report.version, Fragment::Available(_)));
        assert!(report.to_string().starts_with("Clusters unavailable: "));
    }

    #[tokio::test]
    async fn rejected_token_aborts_report() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/arcgis/admin/clusters");
            then.status(200)
                .json_body(json!({"error": {"code": 498, "message": "Invalid token."}}));
        });

        let token = SessionToken::issued_now("stale", 60);
        let err = build_report(&client_for(&server), &token)
            .await
            .expect_err("auth failure");
        assert!(matches!(err, AdminError::Auth { .. }));
    }
}
