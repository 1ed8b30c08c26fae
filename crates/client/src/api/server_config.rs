//! Server-configuration API endpoints.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::{key_segment, ODataQuery};
use cdsync_core::types::ServerProperty;
use serde::Serialize;

/// Server-configuration API over `/configurations`.
pub struct ServerConfigApi<'a> {
    client: &'a SyncClient,
}

impl<'a> ServerConfigApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List server configuration properties.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<ServerProperty>> {
        super::fetch_list(self.client, "/configurations", &query).await
    }

    /// Get a configuration property by name.
    pub async fn get(&self, name: &str) -> SyncResult<ServerProperty> {
        self.client
            .http
            .get(&format!("/configurations{}", key_segment(name)))
            .await
    }

    /// Update a configuration property.
    pub async fn update(&self, name: &str, value: &str) -> SyncResult<ServerProperty> {
        let request = UpdatePropertyRequest {
            value: value.to_string(),
        };
        self.client
            .http
            .put(&format!("/configurations{}", key_segment(name)), &request)
            .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpdatePropertyRequest {
    value: String,
}
