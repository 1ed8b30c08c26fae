//! Workspaces API endpoints.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::{key_segment, ODataQuery};
use cdsync_core::types::Workspace;
use serde::Serialize;

/// Workspaces API for the workspaces grouping jobs and connections.
pub struct WorkspacesApi<'a> {
    client: &'a SyncClient,
}

impl<'a> WorkspacesApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List workspaces.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<Workspace>> {
        super::fetch_list(self.client, "/workspaces", &query).await
    }

    /// Count workspaces, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/workspaces", filter).await
    }

    /// Get a workspace by name.
    pub async fn get(&self, name: &str) -> SyncResult<Workspace> {
        self.client
            .http
            .get(&format!("/workspaces{}", key_segment(name)))
            .await
    }

    /// Create a new workspace.
    pub async fn create(&self, name: &str) -> SyncResult<Workspace> {
        let request = WorkspaceNameRequest {
            name: name.to_string(),
        };
        self.client.http.post("/workspaces", &request).await
    }

    /// Rename a workspace.
    pub async fn update(&self, name: &str, new_name: &str) -> SyncResult<Workspace> {
        let request = WorkspaceNameRequest {
            name: new_name.to_string(),
        };
        self.client
            .http
            .put(&format!("/workspaces{}", key_segment(name)), &request)
            .await
    }

    /// Delete a workspace.
    pub async fn delete(&self, name: &str) -> SyncResult<()> {
        self.client
            .http
            .delete(&format!("/workspaces{}", key_segment(name)))
            .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WorkspaceNameRequest {
    name: String,
}
