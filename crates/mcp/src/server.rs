//! JSON-RPC dispatch for the MCP surface.
//!
//! `McpService` is transport-agnostic: stdio and HTTP both feed parsed
//! requests into [`McpService::handle_request`] and forward whatever comes
//! back. Notifications return `None` and must not produce a response line.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, PROTOCOL_VERSION,
};
use crate::tools::{self, ArgumentError, ToolRegistry};
use cdsync_client::SyncClient;
use cdsync_core::validate::ValidationError;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Server-side happenings surfaced to HTTP stream subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LifecycleEvent {
    ServerStarted,
    #[serde(rename_all = "camelCase")]
    ToolCalled { tool: String, is_error: bool },
    #[serde(rename_all = "camelCase")]
    JobExecuted { job_name: String },
    #[serde(rename_all = "camelCase")]
    JobCancelled { job_name: String },
}

/// MCP service: tool registry plus a lifecycle event channel.
pub struct McpService {
    registry: ToolRegistry,
    events: broadcast::Sender<LifecycleEvent>,
}

impl McpService {
    /// Build a service with every Sync tool registered against `client`.
    pub fn new(client: SyncClient) -> Self {
        let mut registry = ToolRegistry::new();
        tools::register_all(&mut registry, &client);
        let (events, _) = broadcast::channel(64);
        Self { registry, events }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    /// Announce that a transport is up and serving.
    pub fn announce_started(&self) {
        let _ = self.events.send(LifecycleEvent::ServerStarted);
    }

    /// Dispatch one JSON-RPC request. Notifications yield `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        let id = request.id.clone().unwrap_or(serde_json::Value::Null);

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => self.list_tools(id),
            "tools/call" => self.call_tool(id, request.params).await,
            method => {
                warn!(method, "method not found");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(method))
            }
        };
        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => info!("client completed initialization"),
            method => debug!(method, "ignoring notification"),
        }
    }

    fn initialize(
        &self,
        id: serde_json::Value,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let params: InitializeParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };
        info!(
            client = %params.client_info.name,
            client_version = params.client_info.version.as_deref().unwrap_or("unknown"),
            requested_protocol = %params.protocol_version,
            "initialize"
        );

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: ToolsCapability {
                        list_changed: false,
                    },
                },
                server_info: ServerInfo {
                    name: "cdsync-mcp".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        )
    }

    fn list_tools(&self, id: serde_json::Value) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            ListToolsResult {
                tools: self.registry.list_schemas(),
            },
        )
    }

    async fn call_tool(
        &self,
        id: serde_json::Value,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let params: CallToolParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        let Some(tool) = self.registry.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("unknown tool '{}'", params.name)),
            );
        };

        debug!(tool = %params.name, "tools/call");
        match tool.execute(params.arguments.clone()).await {
            Ok(result) => {
                self.emit_call_events(&params, &result);
                JsonRpcResponse::success(id, result)
            }
            Err(e) => {
                let error = if e.is::<ArgumentError>() || e.is::<ValidationError>() {
                    JsonRpcError::invalid_params(e.to_string())
                } else {
                    JsonRpcError::internal_error(e.to_string())
                };
                warn!(tool = %params.name, error = %error.message, "tool call failed");
                JsonRpcResponse::error(id, error)
            }
        }
    }

    fn emit_call_events(&self, params: &CallToolParams, result: &CallToolResult) {
        let is_error = result.is_error.unwrap_or(false);
        let _ = self.events.send(LifecycleEvent::ToolCalled {
            tool: params.name.clone(),
            is_error,
        });
        if is_error {
            return;
        }
        let job_name = params.arguments.get("jobName").and_then(|v| v.as_str());
        match (params.name.as_str(), job_name) {
            ("execute_job", Some(job_name)) => {
                let _ = self.events.send(LifecycleEvent::JobExecuted {
                    job_name: job_name.to_string(),
                });
            }
            ("cancel_job", Some(job_name)) => {
                let _ = self.events.send(LifecycleEvent::JobCancelled {
                    job_name: job_name.to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    let params = params.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid params: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service(server: &MockServer) -> McpService {
        let client = SyncClient::builder()
            .base_url(server.uri())
            .auth_token("tok")
            .build()
            .unwrap();
        McpService::new(client)
    }

    fn request(method: &str, params: serde_json::Value) -> JsonRpcRequest {
        JsonRpcRequest::new(1, method, params)
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(request(
                "initialize",
                serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "inspector"}
                }),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "cdsync-mcp");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn tools_list_is_complete_and_sorted() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(request("tools/list", serde_json::json!({})))
            .await
            .unwrap();

        let tools = response.result.unwrap()["tools"].clone();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 21);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"execute_job"));
        assert!(names.contains(&"write_sync_config"));
    }

    #[tokio::test]
    async fn ping_answers_empty_object() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(request("ping", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.result.unwrap(), serde_json::json!({}));
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(JsonRpcRequest::notification(
                "notifications/initialized",
                serde_json::json!({}),
            ))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(request("resources/list", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(request(
                "tools/call",
                serde_json::json!({"name": "read_widgets", "arguments": {}}),
            ))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("read_widgets"));
    }

    #[tokio::test]
    async fn argument_errors_map_to_invalid_params() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(request(
                "tools/call",
                serde_json::json!({
                    "name": "read_jobs",
                    "arguments": {"action": "get"}
                }),
            ))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("'jobName' is required"));
    }

    #[tokio::test]
    async fn validation_errors_map_to_invalid_params() {
        let server = MockServer::start().await;
        let service = service(&server).await;
        let response = service
            .handle_request(request(
                "tools/call",
                serde_json::json!({
                    "name": "read_jobs",
                    "arguments": {"action": "get", "jobName": "x;rm"}
                }),
            ))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("invalid jobName"));
    }

    #[tokio::test]
    async fn upstream_failure_keeps_jsonrpc_success_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs('gone')"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let service = service(&server).await;
        let response = service
            .handle_request(request(
                "tools/call",
                serde_json::json!({
                    "name": "read_jobs",
                    "arguments": {"action": "get", "jobName": "gone"}
                }),
            ))
            .await
            .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn execute_job_emits_lifecycle_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/executeJob"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"JobName": "nightly_load", "Status": "Success"}]
            })))
            .mount(&server)
            .await;

        let service = service(&server).await;
        let mut events = service.subscribe();
        let response = service
            .handle_request(request(
                "tools/call",
                serde_json::json!({
                    "name": "execute_job",
                    "arguments": {"jobName": "nightly_load"}
                }),
            ))
            .await
            .unwrap();
        assert!(response.error.is_none());

        let first = events.recv().await.unwrap();
        assert!(matches!(
            first,
            LifecycleEvent::ToolCalled { ref tool, is_error: false } if tool == "execute_job"
        ));
        let second = events.recv().await.unwrap();
        assert!(matches!(
            second,
            LifecycleEvent::JobExecuted { ref job_name } if job_name == "nightly_load"
        ));
    }
}
