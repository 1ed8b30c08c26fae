//! Server-configuration tools.

use super::{
    fail, json_schema_enum, json_schema_integer, json_schema_object, json_schema_pattern,
    json_schema_string, ok_json, parse_args, require, unknown_action, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side server-configuration operations.
pub struct ReadSyncConfigTool {
    client: SyncClient,
}

impl ReadSyncConfigTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadSyncConfigArgs {
    action: String,
    name: Option<String>,
    #[serde(flatten)]
    list: ListParams,
}

#[async_trait::async_trait]
impl Tool for ReadSyncConfigTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_sync_config".to_string(),
            description:
                "Read CData Sync server configuration properties: list them all or fetch one by \
                 name."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(&["list", "get"], "Operation to perform"),
                    "name": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Property name (required for get)"
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
        let args: ReadSyncConfigArgs = parse_args(arguments)?;

        match args.action.as_str() {
            "list" => match self.client.server_config().list(args.list.to_query()).await {
                Ok(properties) => ok_json(&properties),
                Err(e) => fail(&e),
            },
            "get" => {
                let name = require(&args.name, "name", "get")?;
                validate::resource_name("name", name)?;
                match self.client.server_config().get(name).await {
                    Ok(property) => ok_json(&property),
                    Err(e) => fail(&e),
                }
            }
            other => Err(unknown_action("read_sync_config", other, &["list", "get"]).into()),
        }
    }
}

/// Write-side server-configuration operations.
pub struct WriteSyncConfigTool {
    client: SyncClient,
}

impl WriteSyncConfigTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteSyncConfigArgs {
    action: String,
    name: Option<String>,
    value: Option<String>,
}

#[async_trait::async_trait]
impl Tool for WriteSyncConfigTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_sync_config".to_string(),
            description: "Update a CData Sync server configuration property.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(&["update"], "Operation to perform"),
                    "name": json_schema_pattern(RESOURCE_NAME_PATTERN, "Property name"),
                    "value": json_schema_string("New property value"),
                }),
                vec!["action", "name", "value"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteSyncConfigArgs = parse_args(arguments)?;

        match args.action.as_str() {
            "update" => {
                let name = require(&args.name, "name", "update")?;
                validate::resource_name("name", name)?;
                let value = require(&args.value, "value", "update")?;
                match self.client.server_config().update(name, value).await {
                    Ok(property) => ok_json(&property),
                    Err(e) => fail(&e),
                }
            }
            other => Err(unknown_action("write_sync_config", other, &["update"]).into()),
        }
    }
}
