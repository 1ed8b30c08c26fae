//! Connections API endpoints.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::{key_segment, ODataQuery};
use cdsync_core::serde_util::stringly_bool;
use cdsync_core::types::Connection;
use serde::{Deserialize, Serialize};

/// Connections API for managing source and destination connections.
pub struct ConnectionsApi<'a> {
    client: &'a SyncClient,
}

impl<'a> ConnectionsApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List connections.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<Connection>> {
        super::fetch_list(self.client, "/connections", &query).await
    }

    /// Count connections, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/connections", filter).await
    }

    /// Get a connection by name.
    pub async fn get(&self, name: &str) -> SyncResult<Connection> {
        self.client
            .http
            .get(&format!("/connections{}", key_segment(name)))
            .await
    }

    /// Create a new connection.
    pub async fn create(&self, connection: &Connection) -> SyncResult<Connection> {
        self.client.http.post("/connections", connection).await
    }

    /// Update an existing connection.
    pub async fn update(&self, name: &str, connection: &Connection) -> SyncResult<Connection> {
        self.client
            .http
            .put(&format!("/connections{}", key_segment(name)), connection)
            .await
    }

    /// Delete a connection.
    pub async fn delete(&self, name: &str) -> SyncResult<()> {
        self.client
            .http
            .delete(&format!("/connections{}", key_segment(name)))
            .await
    }

    /// Test that a connection can reach its data source.
    pub async fn test(&self, name: &str) -> SyncResult<ConnectionTestResult> {
        let request = TestConnectionRequest {
            connection_name: name.to_string(),
        };
        let response: cdsync_core::ODataList<ConnectionTestResult> =
            self.client.http.post("/testConnection", &request).await?;
        super::single(response.into_inner(), "testConnection")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TestConnectionRequest {
    connection_name: String,
}

/// Outcome of a `testConnection` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionTestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SyncClient {
        SyncClient::builder()
            .base_url(server.uri())
            .auth_token("tok")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn list_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/connections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    {"Name": "crm", "ProviderName": "Salesforce"},
                    {"Name": "warehouse", "ProviderName": "Snowflake"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let connections = client.connections().list(ODataQuery::new()).await.unwrap();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].name, "crm");
        assert_eq!(connections[1].provider_name.as_deref(), Some("Snowflake"));
    }

    #[tokio::test]
    async fn list_forwards_odata_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/connections"))
            .and(query_param("$filter", "Name eq 'crm'"))
            .and(query_param("$top", "5"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})),
            )
            .mount(&server)
            .await;

        let client = client(&server).await;
        let query = ODataQuery::new().filter("Name eq 'crm'").top(5);
        let connections = client.connections().list(query).await.unwrap();
        assert!(connections.is_empty());
    }

    #[tokio::test]
    async fn get_addresses_by_quoted_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/connections('crm')"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"Name": "crm"})),
            )
            .mount(&server)
            .await;

        let client = client(&server).await;
        let connection = client.connections().get("crm").await.unwrap();
        assert_eq!(connection.name, "crm");
    }

    #[tokio::test]
    async fn test_posts_pascal_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/testConnection"))
            .and(body_json(serde_json::json!({"ConnectionName": "crm"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"ConnectionName": "crm", "Success": "true"}]
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let result = client.connections().test("crm").await.unwrap();
        assert_eq!(result.success, Some(true));
    }

    #[tokio::test]
    async fn count_parses_bare_integer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/connections/$count"))
            .respond_with(ResponseTemplate::new(200).set_body_string("3"))
            .mount(&server)
            .await;

        let client = client(&server).await;
        assert_eq!(client.connections().count(None).await.unwrap(), 3);
    }
}
