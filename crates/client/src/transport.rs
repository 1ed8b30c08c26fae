//! HTTP transport layer for the Sync client.
//!
//! All requests flow through [`HttpTransport`], which owns the reqwest
//! client, applies authentication headers, injects the active workspace
//! override, and retries transient failures.

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use base64::Engine as _;
use cdsync_core::AuthCredentials;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Slot holding the workspace override shared between the client and any
/// live [`crate::workspace::WorkspaceScope`] guards.
pub(crate) type WorkspaceSlot = Arc<Mutex<Option<String>>>;

/// HTTP transport for making Sync API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
    workspace: WorkspaceSlot,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>, workspace: WorkspaceSlot) -> SyncResult<Self> {
        let mut headers = header::HeaderMap::new();

        match &config.auth {
            Some(AuthCredentials::Token(token)) => {
                let mut value =
                    header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                        SyncError::Config("auth token contains invalid header characters".into())
                    })?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            Some(AuthCredentials::Basic { username, password }) => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                let mut value = header::HeaderValue::from_str(&format!("Basic {encoded}"))
                    .map_err(|_| {
                        SyncError::Config("credentials contain invalid header characters".into())
                    })?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            None => {}
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(SyncError::Http)?;

        Ok(Self {
            client,
            config,
            workspace,
        })
    }

    /// Build a URL by appending `path` to the API root.
    ///
    /// `Url::join` would discard the `/api.rsc` suffix of the base, so the
    /// path is appended textually instead.
    fn build_url(&self, path: &str) -> SyncResult<url::Url> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(url::Url::parse(&format!("{base}/{path}"))?)
    }

    /// Attach the active workspace override as a query parameter, if any.
    fn scope_workspace(&self, builder: RequestBuilder) -> RequestBuilder {
        let workspace = self.workspace.lock().expect("workspace slot poisoned");
        match workspace.as_deref() {
            Some(ws) => builder.query(&[("workspaceId", ws)]),
            None => builder,
        }
    }

    /// Execute a request with retries on transient failures.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> SyncResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| SyncError::Config("request cannot be cloned".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if attempts < retry_config.max_retries
                        && retry_config.should_retry_status(status)
                    {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(SyncError::from_response(status, &body));
                }
                Err(e) => {
                    if attempts < retry_config.max_retries && e.is_timeout() {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "request timed out, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(SyncError::from_transport(e));
                }
            }
        }
    }

    async fn json_body<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
        let body = response.text().await.map_err(SyncError::from_transport)?;
        serde_json::from_str(&body).map_err(|e| {
            SyncError::UnexpectedResponse(format!(
                "{e} in body: {}",
                body.chars().take(200).collect::<String>()
            ))
        })
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self
            .execute_with_retry(self.scope_workspace(self.client.get(url)))
            .await?;
        Self::json_body(response).await
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> SyncResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request with query");

        let response = self
            .execute_with_retry(self.scope_workspace(self.client.get(url).query(query)))
            .await?;
        Self::json_body(response).await
    }

    /// Execute a GET request and return the raw body text.
    ///
    /// `$count` endpoints answer with a bare integer, not JSON.
    pub async fn get_text(&self, path: &str) -> SyncResult<String> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request (text)");

        let response = self
            .execute_with_retry(self.scope_workspace(self.client.get(url)))
            .await?;
        response.text().await.map_err(SyncError::from_transport)
    }

    /// Execute a GET request with query parameters, returning raw body text.
    pub async fn get_text_with_query<Q: Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> SyncResult<String> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request (text, with query)");

        let response = self
            .execute_with_retry(self.scope_workspace(self.client.get(url).query(query)))
            .await?;
        response.text().await.map_err(SyncError::from_transport)
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> SyncResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .execute_with_retry(self.scope_workspace(self.client.post(url).json(body)))
            .await?;
        Self::json_body(response).await
    }

    /// Execute a POST request, ignoring the response body.
    pub async fn post_no_response<B: Serialize>(&self, path: &str, body: &B) -> SyncResult<()> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request (no response)");

        self.execute_with_retry(self.scope_workspace(self.client.post(url).json(body)))
            .await?;
        Ok(())
    }

    /// Execute a PUT request.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> SyncResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "PUT request");

        let response = self
            .execute_with_retry(self.scope_workspace(self.client.put(url).json(body)))
            .await?;
        Self::json_body(response).await
    }

    /// Execute a DELETE request, ignoring any response body.
    pub async fn delete(&self, path: &str) -> SyncResult<()> {
        let url = self.build_url(path)?;
        debug!(url = %url, "DELETE request");

        self.execute_with_retry(self.scope_workspace(self.client.delete(url)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestResponse {
        message: String,
        value: i32,
    }

    #[derive(Debug, Serialize)]
    struct TestRequest {
        name: String,
    }

    fn create_config(base_url: &str) -> Arc<ClientConfig> {
        Arc::new(ClientConfig {
            base_url: url::Url::parse(base_url).unwrap(),
            auth: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::no_retry(),
        })
    }

    fn transport(config: Arc<ClientConfig>) -> HttpTransport {
        HttpTransport::new(config, Arc::new(Mutex::new(None))).unwrap()
    }

    #[tokio::test]
    async fn get_request_deserializes_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                message: "success".to_string(),
                value: 42,
            }))
            .mount(&server)
            .await;

        let transport = transport(create_config(&server.uri()));
        let result: TestResponse = transport.get("/jobs").await.unwrap();
        assert_eq!(result.message, "success");
        assert_eq!(result.value, 42);
    }

    #[tokio::test]
    async fn bearer_token_header_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(header("Authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                message: "authorized".to_string(),
                value: 1,
            }))
            .mount(&server)
            .await;

        let config = Arc::new(ClientConfig {
            auth: Some(AuthCredentials::Token("tok-123".to_string())),
            ..(*create_config(&server.uri())).clone()
        });
        let transport = transport(config);
        let result: TestResponse = transport.get("/jobs").await.unwrap();
        assert_eq!(result.message, "authorized");
    }

    #[tokio::test]
    async fn basic_auth_header_is_sent() {
        let server = MockServer::start().await;

        // base64("admin:s3cret")
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(header("Authorization", "Basic YWRtaW46czNjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                message: "authorized".to_string(),
                value: 1,
            }))
            .mount(&server)
            .await;

        let config = Arc::new(ClientConfig {
            auth: Some(AuthCredentials::Basic {
                username: "admin".to_string(),
                password: "s3cret".to_string(),
            }),
            ..(*create_config(&server.uri())).clone()
        });
        let transport = transport(config);
        let result: TestResponse = transport.get("/jobs").await.unwrap();
        assert_eq!(result.message, "authorized");
    }

    #[tokio::test]
    async fn workspace_override_injects_query_param() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(query_param("workspaceId", "ws-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                message: "scoped".to_string(),
                value: 2,
            }))
            .mount(&server)
            .await;

        let config = create_config(&server.uri());
        let slot: WorkspaceSlot = Arc::new(Mutex::new(Some("ws-2".to_string())));
        let transport = HttpTransport::new(config, slot).unwrap();

        let result: TestResponse = transport.get("/jobs").await.unwrap();
        assert_eq!(result.message, "scoped");
    }

    #[tokio::test]
    async fn post_request_sends_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/executeJob"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                message: "created".to_string(),
                value: 1,
            }))
            .mount(&server)
            .await;

        let transport = transport(create_config(&server.uri()));
        let request = TestRequest {
            name: "nightly".to_string(),
        };
        let result: TestResponse = transport.post("/executeJob", &request).await.unwrap();
        assert_eq!(result.message, "created");
    }

    #[tokio::test]
    async fn get_text_returns_raw_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/jobs/$count"))
            .respond_with(ResponseTemplate::new(200).set_body_string("17"))
            .mount(&server)
            .await;

        let transport = transport(create_config(&server.uri()));
        let body = transport.get_text("/jobs/$count").await.unwrap();
        assert_eq!(body, "17");
    }

    #[tokio::test]
    async fn retries_on_503_then_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                message: "recovered".to_string(),
                value: 3,
            }))
            .mount(&server)
            .await;

        let config = Arc::new(ClientConfig {
            retry_config: RetryConfig {
                max_retries: 2,
                initial_backoff: Duration::from_millis(1),
                ..Default::default()
            },
            ..(*create_config(&server.uri())).clone()
        });
        let transport = transport(config);
        let result: TestResponse = transport.get("/jobs").await.unwrap();
        assert_eq!(result.message, "recovered");
    }

    #[tokio::test]
    async fn error_status_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": {"message": "bad $filter"}})),
            )
            .mount(&server)
            .await;

        let transport = transport(create_config(&server.uri()));
        let result: SyncResult<TestResponse> = transport.get("/jobs").await;
        match result {
            Err(SyncError::Api {
                status, message, ..
            }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad $filter");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn base_url_suffix_is_preserved() {
        let config = create_config("http://localhost:8181/api.rsc");
        let transport = transport(config);

        let url = transport.build_url("/jobs").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8181/api.rsc/jobs");

        let url = transport.build_url("jobs/$count").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8181/api.rsc/jobs/$count");
    }
}
