//! Execution-history API endpoints.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::ODataQuery;
use cdsync_core::types::HistoryRecord;

/// History API over past job executions.
pub struct HistoryApi<'a> {
    client: &'a SyncClient,
}

impl<'a> HistoryApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List history records.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<HistoryRecord>> {
        super::fetch_list(self.client, "/history", &query).await
    }

    /// Count history records, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/history", filter).await
    }
}
