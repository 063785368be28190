//! Folder-aware service discovery.
//!
//! The admin root lists the services deployed at the top level together with
//! the names of every folder. Each folder is then listed in server order and
//! appended, skipping the platform-owned folders in [`RESERVED_FOLDERS`].

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{AdminClient, is_error_payload, token_form, token_rejection};
use crate::error::{AdminError, AdminResult};
use crate::lifecycle::LifecycleOperation;
use crate::session::SessionToken;

/// Folder name the server reports for top-level services.
pub const ROOT_FOLDER: &str = "/";

/// Platform folders operators must never touch.
pub const RESERVED_FOLDERS: [&str; 2] = ["System", "Utilities"];

/// The `(folder, name, type)` triple identifying one deployed service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Service name without its type suffix.
    pub service_name: String,
    /// Service type such as `MapServer` or `GPServer`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Owning folder; [`ROOT_FOLDER`] for top-level services.
    #[serde(default = "root_folder")]
    pub folder_name: String,
}

fn root_folder() -> String {
    ROOT_FOLDER.to_string()
}

impl ServiceDescriptor {
    /// Describe a service by its parts. An empty folder means the root.
    #[must_use]
    pub fn new(
        folder_name: impl Into<String>,
        service_name: impl Into<String>,
        service_type: impl Into<String>,
    ) -> Self {
        let folder_name = folder_name.into();
        Self {
            service_name: service_name.into(),
            service_type: service_type.into(),
            folder_name: if folder_name.is_empty() {
                root_folder()
            } else {
                folder_name
            },
        }
    }

    /// Parse `folder/name.Type` or `name.Type`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidServicePath`] when a part is missing or
    /// the path nests more than one folder.
    pub fn parse(path: &str) -> AdminResult<Self> {
        let invalid = |reason| AdminError::InvalidServicePath {
            value: path.to_string(),
            reason,
        };
        let trimmed = path.trim().trim_start_matches('/');
        let (folder, leaf) = match trimmed.split_once('/') {
            Some((_, rest)) if rest.contains('/') => {
                return Err(invalid("nested folders are not supported"));
            }
            Some(("", _)) => return Err(invalid("empty folder")),
            Some((folder, leaf)) => (folder, leaf),
            None => ("", trimmed),
        };
        let (name, kind) = leaf
            .rsplit_once('.')
            .ok_or_else(|| invalid("missing service type"))?;
        if name.is_empty() {
            return Err(invalid("empty service name"));
        }
        if kind.is_empty() {
            return Err(invalid("missing service type"));
        }
        Ok(Self::new(folder, name, kind))
    }

    /// Whether the service sits at the top level.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.folder_name.is_empty() || self.folder_name == ROOT_FOLDER
    }

    /// `folder/name.Type`, or `name.Type` at the root.
    #[must_use]
    pub fn resource_path(&self) -> String {
        if self.is_root() {
            format!("{}.{}", self.service_name, self.service_type)
        } else {
            format!(
                "{}/{}.{}",
                self.folder_name, self.service_name, self.service_type
            )
        }
    }

    /// Admin-relative path of a lifecycle operation on this service.
    #[must_use]
    pub fn operation_path(&self, operation: LifecycleOperation) -> String {
        format!("services/{}/{}", self.resource_path(), operation.as_str())
    }
}

impl Display for ServiceDescriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.resource_path())
    }
}

/// Configured and live state of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// State the service is configured to be in (`STARTED`, `STOPPED`).
    #[serde(default)]
    pub configured_state: String,
    /// State the service is actually in across the cluster.
    #[serde(default)]
    pub real_time_state: String,
}

#[derive(Debug, Deserialize)]
struct FolderListing {
    #[serde(default)]
    folders: Vec<String>,
    services: Vec<ServiceDescriptor>,
}

/// Discover every operable service: the root's services first, then each
/// non-reserved folder's services in the order the server lists folders.
///
/// An error payload at the root yields an empty catalog, unless it is a token
/// rejection.
///
/// # Errors
///
/// Returns [`AdminError::Auth`] when the server rejects the token,
/// [`AdminError::Catalog`] for malformed listings or a folder whose
/// listing carries an error payload, and transport errors unchanged.
pub async fn list_services(
    client: &AdminClient,
    token: &SessionToken,
) -> AdminResult<Vec<ServiceDescriptor>> {
    let root = client.post_json("services", &token_form(token)).await?;
    if let Some(err) = token_rejection(&root) {
        return Err(err);
    }
    if is_error_payload(&root) {
        warn!(payload = %root, "root catalog returned an error; treating as empty");
        return Ok(Vec::new());
    }
    let FolderListing {
        folders,
        mut services,
    } = decode_listing(ROOT_FOLDER, root)?;

    for reserved in RESERVED_FOLDERS {
        if !folders.iter().any(|folder| folder == reserved) {
            debug!(folder = reserved, "reserved folder not present on server");
        }
    }

    for folder in folders
        .iter()
        .filter(|folder| !RESERVED_FOLDERS.contains(&folder.as_str()))
    {
        let listing = client
            .call(&format!("services/{folder}"), token)
            .await
            .map_err(|err| match err {
                AdminError::Operation { body, .. } => AdminError::Catalog {
                    folder: folder.clone(),
                    detail: body,
                },
                other => other,
            })?;
        let listing = decode_listing(folder, listing)?;
        debug!(folder = %folder, count = listing.services.len(), "folder listed");
        services.extend(listing.services);
    }

    info!(count = services.len(), "catalog discovered");
    Ok(services)
}

/// Fetch the configured and real-time state of one service.
///
/// # Errors
///
/// Returns the client's errors, or [`AdminError::Decode`] when the reply does
/// not describe a status.
pub async fn service_status(
    client: &AdminClient,
    token: &SessionToken,
    service: &ServiceDescriptor,
) -> AdminResult<ServiceStatus> {
    let path = format!("services/{}/status", service.resource_path());
    let value = client.call(&path, token).await?;
    serde_json::from_value(value).map_err(|source| AdminError::Decode {
        endpoint: path,
        source,
    })
}

fn decode_listing(folder: &str, value: Value) -> AdminResult<FolderListing> {
    let detail = value.to_string();
    let mut listing: FolderListing =
        serde_json::from_value(value).map_err(|err| AdminError::Catalog {
            folder: folder.to_string(),
            detail: format!("{err}: {detail}"),
        })?;
    if folder != ROOT_FOLDER {
        for service in &mut listing.services {
            if service.is_root() {
                service.folder_name = folder.to_string();
            }
        }
    }
    Ok(listing)
}
