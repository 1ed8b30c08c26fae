//! Workspace tools.

use super::{
    fail, json_schema_enum, json_schema_integer, json_schema_object, json_schema_pattern,
    json_schema_string, ok_json, ok_text, parse_args, require, unknown_action, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side workspace operations.
pub struct ReadWorkspacesTool {
    client: SyncClient,
}

impl ReadWorkspacesTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadWorkspacesArgs {
    action: String,
    name: Option<String>,
    #[serde(flatten)]
    list: ListParams,
}

#[async_trait::async_trait]
impl Tool for ReadWorkspacesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_workspaces".to_string(),
            description: "Read CData Sync workspaces: list or count them, or fetch one by name."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["list", "count", "get"],
                        "Operation to perform"
                    ),
                    "name": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Workspace name (required for get)"
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
        let args: ReadWorkspacesArgs = parse_args(arguments)?;

        match args.action.as_str() {
            "list" => match self.client.workspaces().list(args.list.to_query()).await {
                Ok(workspaces) => ok_json(&workspaces),
                Err(e) => fail(&e),
            },
            "count" => match self
                .client
                .workspaces()
                .count(args.list.filter.as_deref())
                .await
            {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            "get" => {
                let name = require(&args.name, "name", "get")?;
                validate::resource_name("name", name)?;
                match self.client.workspaces().get(name).await {
                    Ok(workspace) => ok_json(&workspace),
                    Err(e) => fail(&e),
                }
            }
            other => {
                Err(unknown_action("read_workspaces", other, &["list", "count", "get"]).into())
            }
        }
    }
}

/// Write-side workspace operations.
pub struct WriteWorkspacesTool {
    client: SyncClient,
}

impl WriteWorkspacesTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteWorkspacesArgs {
    action: String,
    name: Option<String>,
    new_name: Option<String>,
}

#[async_trait::async_trait]
impl Tool for WriteWorkspacesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_workspaces".to_string(),
            description: "Create, rename, or delete a CData Sync workspace.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["create", "update", "delete"],
                        "Operation to perform"
                    ),
                    "name": json_schema_pattern(RESOURCE_NAME_PATTERN, "Workspace name"),
                    "newName": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "New workspace name (required for update)"
                    ),
                }),
                vec!["action", "name"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteWorkspacesArgs = parse_args(arguments)?;

        let name = require(&args.name, "name", &args.action)?;
        validate::resource_name("name", name)?;

        match args.action.as_str() {
            "create" => match self.client.workspaces().create(name).await {
                Ok(workspace) => ok_json(&workspace),
                Err(e) => fail(&e),
            },
            "update" => {
                let new_name = require(&args.new_name, "newName", "update")?;
                validate::resource_name("newName", new_name)?;
                match self.client.workspaces().update(name, new_name).await {
                    Ok(workspace) => ok_json(&workspace),
                    Err(e) => fail(&e),
                }
            }
            "delete" => match self.client.workspaces().delete(name).await {
                Ok(()) => ok_text(format!("Deleted workspace '{name}'")),
                Err(e) => fail(&e),
            },
            other => {
                Err(unknown_action("write_workspaces", other, &["create", "update", "delete"])
                    .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SyncClient {
        SyncClient::builder()
            .base_url(server.uri())
            .auth_token("tok")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn rename_puts_new_name_at_old_key() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/workspaces('staging')"))
            .and(body_json(serde_json::json!({"Name": "production"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": 3,
                "Name": "production"
            })))
            .mount(&server)
            .await;

        let tool = WriteWorkspacesTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({
                "action": "update",
                "name": "staging",
                "newName": "production"
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("\"Id\": \"3\""));
    }

    #[tokio::test]
    async fn update_requires_new_name() {
        let server = MockServer::start().await;
        let tool = WriteWorkspacesTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({"action": "update", "name": "staging"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'newName' is required"));
    }
}
