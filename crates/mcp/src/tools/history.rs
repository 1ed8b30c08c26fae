//! Execution-history tools.

use super::{
    fail, json_schema_enum, json_schema_integer, json_schema_object, json_schema_string, ok_json,
    ok_text, parse_args, scope_workspace, unknown_action, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use serde::Deserialize;

/// Read-only view over the job execution history log.
pub struct ReadHistoryTool {
    client: SyncClient,
}

impl ReadHistoryTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadHistoryArgs {
    action: String,
    #[serde(flatten)]
    list: ListParams,
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ReadHistoryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_history".to_string(),
            description:
                "Read CData Sync job execution history across all jobs. Filter with OData, e.g. \
                 filter=\"JobName eq 'nightly_load'\" or \"Status eq 'FAILED'\"."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(&["list", "count"], "Operation to perform"),
                    "filter": json_schema_string("OData $filter expression"),
                    "select": json_schema_string("OData $select column list"),
                    "orderby": json_schema_string(
                        "OData $orderby expression, e.g. 'RunStartDate desc'"
                    ),
                    "top": json_schema_integer("Maximum rows to return"),
                    "skip": json_schema_integer("Rows to skip"),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ReadHistoryArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        match args.action.as_str() {
            "list" => match self.client.history().list(args.list.to_query()).await {
                Ok(records) => ok_json(&records),
                Err(e) => fail(&e),
            },
            "count" => match self
                .client
                .history()
                .count(args.list.filter.as_deref())
                .await
            {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            other => Err(unknown_action("read_history", other, &["list", "count"]).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SyncClient {
        SyncClient::builder()
            .base_url(server.uri())
            .auth_token("tok")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn list_forwards_odata_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .and(query_param("$filter", "Status eq 'FAILED'"))
            .and(query_param("$orderby", "RunStartDate desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"JobName": "nightly_load", "Status": "FAILED"}]
            })))
            .mount(&server)
            .await;

        let tool = ReadHistoryTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({
                "action": "list",
                "filter": "Status eq 'FAILED'",
                "orderby": "RunStartDate desc"
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn count_returns_plain_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/$count"))
            .respond_with(ResponseTemplate::new(200).set_body_string("42"))
            .mount(&server)
            .await;

        let tool = ReadHistoryTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({"action": "count"}))
            .await
            .unwrap();
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert_eq!(text, "42");
    }
}
