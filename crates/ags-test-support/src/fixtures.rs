//! Canned admin-server documents mounted on a [`MockServer`].
//!
//! The fixture site has two root services, a `Maps` and a `Hydro` folder and
//! the reserved `System` and `Utilities` folders. Listings for the reserved
//! folders are mounted too, so suites can assert they are never requested.

use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{Value, json};
use url::Url;

/// Token issued by [`AdminSite::mount_token`].
pub const FIXTURE_TOKEN: &str = "fixture-token";

/// Non-reserved services in the order discovery is expected to return them.
pub const EXPECTED_SERVICES: [&str; 5] = [
    "SampleWorldCities.MapServer",
    "PrintingTools.GPServer",
    "Maps/Roads.MapServer",
    "Maps/Parcels.FeatureServer",
    "Hydro/Rivers.MapServer",
];

/// Admin path prefix served by the mock.
const ADMIN_PREFIX: &str = "/arcgis/admin";

/// Mocks for the folder listings mounted by [`AdminSite::mount_catalog`].
pub struct CatalogMocks<'a> {
    /// Root listing.
    pub root: Mock<'a>,
    /// `Maps` and `Hydro` listings.
    pub folders: Vec<Mock<'a>>,
    /// `System` and `Utilities` listings; expected to stay untouched.
    pub reserved: Vec<Mock<'a>>,
}

/// Mocks for the documents mounted by [`AdminSite::mount_report`].
pub struct ReportMocks<'a> {
    /// `clusters` listing.
    pub clusters: Mock<'a>,
    /// One mock per machine.
    pub machines: Vec<Mock<'a>>,
    /// `info`.
    pub info: Mock<'a>,
    /// `logs/settings`.
    pub log_settings: Mock<'a>,
    /// `system/licenses`.
    pub licenses: Mock<'a>,
}

/// Mock admin server preloaded on demand with fixture documents.
pub struct AdminSite {
    server: MockServer,
}

impl AdminSite {
    /// Start an empty mock server.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    /// Underlying server, for suite-specific mocks.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// Admin root URL with a trailing slash.
    ///
    /// # Panics
    ///
    /// Panics if the mock server reports an unparsable base URL.
    #[must_use]
    pub fn admin_url(&self) -> Url {
        Url::parse(&format!("{}{ADMIN_PREFIX}/", self.server.base_url()))
            .expect("mock server base URL is valid")
    }

    /// Accept any credentials and issue [`FIXTURE_TOKEN`].
    pub fn mount_token(&self) -> Mock<'_> {
        self.server.mock(|when, then| {
            when.method(POST).path(admin_path("generateToken"));
            then.status(200).json_body(json!({
                "token": FIXTURE_TOKEN,
                "expires": 1_700_003_600_000_i64
            }));
        })
    }

    /// Refuse every credential with the server's usual message.
    pub fn mount_token_rejection(&self) -> Mock<'_> {
        self.server.mock(|when, then| {
            when.method(POST).path(admin_path("generateToken"));
            then.status(200).json_body(json!({
                "status": "error",
                "messages": ["Unable to generate token."],
                "code": 400
            }));
        })
    }

    /// Mount the root listing and every folder listing.
    pub fn mount_catalog(&self) -> CatalogMocks<'_> {
        let root = self.listing(
            "services",
            json!({
                "folders": ["Maps", "System", "Hydro", "Utilities"],
                "services": [
                    service("/", "SampleWorldCities", "MapServer"),
                    service("/", "PrintingTools", "GPServer")
                ]
            }),
        );
        let folders = vec![
            self.listing(
                "services/Maps",
                json!({
                    "folders": [],
                    "services": [
                        service("Maps", "Roads", "MapServer"),
                        service("Maps", "Parcels", "FeatureServer")
                    ]
                }),
            ),
            self.listing(
                "services/Hydro",
                json!({
                    "folders": [],
                    "services": [service("Hydro", "Rivers", "MapServer")]
                }),
            ),
        ];
        let reserved = vec![
            self.listing(
                "services/System",
                json!({
                    "folders": [],
                    "services": [service("System", "CachingTools", "GPServer")]
                }),
            ),
            self.listing(
                "services/Utilities",
                json!({
                    "folders": [],
                    "services": [service("Utilities", "Geometry", "GeometryServer")]
                }),
            ),
        ];
        CatalogMocks {
            root,
            folders,
            reserved,
        }
    }

    /// Answer `operation` on every expected service, refusing the resource
    /// paths listed in `refused`.
    pub fn mount_lifecycle(&self, operation: &str, refused: &[&str]) -> Vec<Mock<'_>> {
        EXPECTED_SERVICES
            .iter()
            .map(|resource| {
                let path = admin_path(&format!("services/{resource}/{operation}"));
                let body = if refused.contains(resource) {
                    json!({
                        "status": "error",
                        "messages": [format!("Service '{resource}' is locked by another operation.")]
                    })
                } else {
                    json!({"status": "success"})
                };
                self.server.mock(|when, then| {
                    when.method(POST)
                        .path(path)
                        .form_urlencoded_tuple("token", FIXTURE_TOKEN);
                    then.status(200).json_body(body);
                })
            })
            .collect()
    }

    /// Mount one cluster with two machines, version info, log settings and an
    /// expiring license with two extensions.
    pub fn mount_report(&self) -> ReportMocks<'_> {
        let clusters = self.listing(
            "clusters",
            json!({
                "clusters": [{
                    "clusterName": "default",
                    "configuredState": "STARTED",
                    "machineNames": ["GIS01.EXAMPLE.COM", "GIS02.EXAMPLE.COM"]
                }]
            }),
        );
        let machines = ["GIS01.EXAMPLE.COM", "GIS02.EXAMPLE.COM"]
            .iter()
            .map(|name| {
                self.listing(
                    &format!("machines/{name}"),
                    json!({
                        "machineName": name,
                        "configuredState": "STARTED",
                        "platform": "Windows"
                    }),
                )
            })
            .collect();
        let info = self.listing(
            "info",
            json!({"currentversion": 10.9, "currentbuild": "10.9.1.28388", "fullVersion": "10.9.1"}),
        );
        let log_settings = self.listing(
            "logs/settings",
            json!({"settings": {"logLevel": "WARNING", "maxErrorReportsCount": 10}}),
        );
        let licenses = self.listing(
            "system/licenses",
            json!({
                "edition": {"name": "Advanced", "canExpire": true, "expiration": 1_700_000_000_000_i64},
                "level": {"name": "Standard"},
                "extensions": [{"name": "Spatial"}, {"name": "Network"}]
            }),
        );
        ReportMocks {
            clusters,
            machines,
            info,
            log_settings,
            licenses,
        }
    }

    fn listing(&self, path: &str, body: Value) -> Mock<'_> {
        let path = admin_path(path);
        self.server.mock(|when, then| {
            when.method(POST)
                .path(path)
                .form_urlencoded_tuple("f", "json");
            then.status(200).json_body(body);
        })
    }
}

/// Service entry as it appears in a folder listing.
#[must_use]
pub fn service(folder: &str, name: &str, kind: &str) -> Value {
    json!({"folderName": folder, "serviceName": name, "type": kind})
}

fn admin_path(path: &str) -> String {
    format!("{ADMIN_PREFIX}/{path}")
}
