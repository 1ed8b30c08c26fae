//! Users API endpoints.
//!
//! The Sync API exposes no user deletion; accounts are deactivated by
//! updating `Active` instead.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::{key_segment, ODataQuery};
use cdsync_core::types::User;

/// Users API for server accounts.
pub struct UsersApi<'a> {
    client: &'a SyncClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List users.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<User>> {
        super::fetch_list(self.client, "/users", &query).await
    }

    /// Count users, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/users", filter).await
    }

    /// Get a user by name.
    pub async fn get(&self, name: &str) -> SyncResult<User> {
        self.client
            .http
            .get(&format!("/users{}", key_segment(name)))
            .await
    }

    /// Create a new user.
    pub async fn create(&self, user: &User) -> SyncResult<User> {
        self.client.http.post("/users", user).await
    }

    /// Update an existing user.
    pub async fn update(&self, name: &str, user: &User) -> SyncResult<User> {
        self.client
            .http
            .put(&format!("/users{}", key_segment(name)), user)
            .await
    }
}
