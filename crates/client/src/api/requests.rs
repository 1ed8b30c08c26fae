//! Request-log API endpoints.
//!
//! Request-log entries are keyed by a numeric id, which appears unquoted
//! in the resource path.

use crate::client::SyncClient;
use crate::error::{SyncError, SyncResult};
use cdsync_core::odata::ODataQuery;
use cdsync_core::types::RequestLog;

/// Requests API over the server's HTTP request log.
pub struct RequestsApi<'a> {
    client: &'a SyncClient,
}

impl<'a> RequestsApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List request-log entries.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<RequestLog>> {
        super::fetch_list(self.client, "/requests", &query).await
    }

    /// Count request-log entries, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/requests", filter).await
    }

    /// Get a request-log entry by id.
    pub async fn get(&self, id: &str) -> SyncResult<RequestLog> {
        self.client
            .http
            .get(&format!("/requests({})", numeric_id(id)?))
            .await
    }

    /// Delete a request-log entry.
    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        self.client
            .http
            .delete(&format!("/requests({})", numeric_id(id)?))
            .await
    }
}

fn numeric_id(id: &str) -> SyncResult<&str> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(id)
    } else {
        Err(SyncError::InvalidInput(format!(
            "request id must be numeric, got '{id}'"
        )))
    }
}
