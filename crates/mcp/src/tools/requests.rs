//! Request-log tools.

use super::{
    fail, json_schema_enum, json_schema_integer, json_schema_object, json_schema_string, ok_json,
    ok_text, parse_args, require, unknown_action, ArgumentError, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use serde::Deserialize;

/// Request-log operations, including pruning single entries.
pub struct ReadRequestsTool {
    client: SyncClient,
}

impl ReadRequestsTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadRequestsArgs {
    action: String,
    id: Option<String>,
    #[serde(flatten)]
    list: ListParams,
}

fn require_id(value: &Option<String>, action: &str) -> Result<String, ArgumentError> {
    let id = require(value, "id", action)?;
    if id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(id.to_string())
    } else {
        Err(ArgumentError(format!("invalid id: '{id}' is not numeric")))
    }
}

#[async_trait::async_trait]
impl Tool for ReadRequestsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_requests".to_string(),
            description:
                "Inspect the CData Sync request log: list or count entries, fetch one by id, or \
                 delete an entry."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["list", "count", "get", "delete"],
                        "Operation to perform"
                    ),
                    "id": json_schema_string(
                        "Numeric request-log entry id (required for get/delete)"
                    ),
                    "filter": json_schema_string("OData $filter expression"),
                    "select": json_schema_string("OData $select column list"),
                    "orderby": json_schema_string("OData $orderby expression"),
                    "top": json_schema_integer("Maximum rows to return"),
                    "skip": json_schema_integer("Rows to skip"),
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ReadRequestsArgs = parse_args(arguments)?;

        match args.action.as_str() {
            "list" => match self.client.requests().list(args.list.to_query()).await {
                Ok(entries) => ok_json(&entries),
                Err(e) => fail(&e),
            },
            "count" => match self
                .client
                .requests()
                .count(args.list.filter.as_deref())
                .await
            {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            "get" => {
                let id = require_id(&args.id, "get")?;
                match self.client.requests().get(&id).await {
                    Ok(entry) => ok_json(&entry),
                    Err(e) => fail(&e),
                }
            }
            "delete" => {
                let id = require_id(&args.id, "delete")?;
                match self.client.requests().delete(&id).await {
                    Ok(()) => ok_text(format!("Deleted request-log entry {id}")),
                    Err(e) => fail(&e),
                }
            }
            other => {
                Err(unknown_action("read_requests", other, &["list", "count", "get", "delete"])
                    .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SyncClient {
        SyncClient::builder()
            .base_url(server.uri())
            .auth_token("tok")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn get_uses_unquoted_numeric_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/requests(4711)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": 4711,
                "Method": "GET",
                "URL": "/api.rsc/jobs"
            })))
            .mount(&server)
            .await;

        let tool = ReadRequestsTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({"action": "get", "id": "4711"}))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("\"Id\": \"4711\""));
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected_before_http() {
        let server = MockServer::start().await;
        let tool = ReadRequestsTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({"action": "delete", "id": "1) or (1=1"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is not numeric"));
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }
}
