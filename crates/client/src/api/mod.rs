//! Per-resource API facades.
//!
//! Each facade borrows the client and maps a resource type onto its OData
//! collection plus any RPC-style action endpoints.

pub mod certificates;
pub mod connections;
pub mod history;
pub mod jobs;
pub mod requests;
pub mod server_config;
pub mod tasks;
pub mod transformations;
pub mod users;
pub mod workspaces;

pub use certificates::CertificatesApi;
pub use connections::{ConnectionTestResult, ConnectionsApi};
pub use history::HistoryApi;
pub use jobs::JobsApi;
pub use requests::RequestsApi;
pub use server_config::ServerConfigApi;
pub use tasks::TasksApi;
pub use transformations::TransformationsApi;
pub use users::UsersApi;
pub use workspaces::WorkspacesApi;

use crate::client::SyncClient;
use crate::error::{SyncError, SyncResult};
use cdsync_core::odata::{parse_count, ODataList, ODataQuery};
use serde::de::DeserializeOwned;

/// Fetch an OData collection and unwrap the `value` envelope.
pub(crate) async fn fetch_list<T: DeserializeOwned>(
    client: &SyncClient,
    path: &str,
    query: &ODataQuery,
) -> SyncResult<Vec<T>> {
    let response: ODataList<T> = if query.is_empty() {
        client.http.get(path).await?
    } else {
        client.http.get_with_query(path, query).await?
    };
    Ok(response.into_inner())
}

/// Fetch a `/$count` endpoint, tolerating bare and quoted integer bodies.
pub(crate) async fn fetch_count(
    client: &SyncClient,
    collection: &str,
    filter: Option<&str>,
) -> SyncResult<u64> {
    let path = format!("{collection}/$count");
    let body = match filter {
        Some(filter) => {
            client
                .http
                .get_text_with_query(&path, &[("$filter", filter)])
                .await?
        }
        None => client.http.get_text(&path).await?,
    };
    parse_count(&body).ok_or_else(|| {
        SyncError::UnexpectedResponse(format!("count endpoint returned {body:?}"))
    })
}

/// Take the first element of an action response envelope.
pub(crate) fn single<T>(mut items: Vec<T>, action: &str) -> SyncResult<T> {
    if items.is_empty() {
        return Err(SyncError::UnexpectedResponse(format!(
            "empty response from {action}"
        )));
    }
    Ok(items.remove(0))
}
