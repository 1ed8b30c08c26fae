//! Transformations API endpoints.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::{key_segment, ODataQuery};
use cdsync_core::types::Transformation;

/// Transformations API for post-load SQL run against a destination.
pub struct TransformationsApi<'a> {
    client: &'a SyncClient,
}

impl<'a> TransformationsApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List transformations.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<Transformation>> {
        super::fetch_list(self.client, "/transformations", &query).await
    }

    /// Count transformations, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/transformations", filter).await
    }

    /// Get a transformation by name.
    pub async fn get(&self, name: &str) -> SyncResult<Transformation> {
        self.client
            .http
            .get(&format!("/transformations{}", key_segment(name)))
            .await
    }

    /// Create a new transformation.
    pub async fn create(&self, transformation: &Transformation) -> SyncResult<Transformation> {
        self.client.http.post("/transformations", transformation).await
    }

    /// Update an existing transformation.
    pub async fn update(
        &self,
        name: &str,
        transformation: &Transformation,
    ) -> SyncResult<Transformation> {
        self.client
            .http
            .put(
                &format!("/transformations{}", key_segment(name)),
                transformation,
            )
            .await
    }

    /// Delete a transformation.
    pub async fn delete(&self, name: &str) -> SyncResult<()> {
        self.client
            .http
            .delete(&format!("/transformations{}", key_segment(name)))
            .await
    }
}
