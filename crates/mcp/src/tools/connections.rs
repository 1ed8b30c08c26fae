//! Connection tools.

use super::{
    fail, json_schema_enum, json_schema_integer, json_schema_object, json_schema_pattern,
    json_schema_string, ok_json, ok_text, parse_args, require, scope_workspace, unknown_action,
    ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use cdsync_core::types::Connection;
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side connection operations.
pub struct ReadConnectionsTool {
    client: SyncClient,
}

impl ReadConnectionsTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadConnectionsArgs {
    action: String,
    name: Option<String>,
    #[serde(flatten)]
    list: ListParams,
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ReadConnectionsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_connections".to_string(),
            description:
                "Read CData Sync connections: list or count them, fetch one by name, or test \
                 that a connection can reach its data source."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["list", "count", "get", "test"],
                        "Operation to perform"
                    ),
                    "name": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Connection name (required for get/test)"
                    ),
                    "filter": json_schema_string("OData $filter expression"),
                    "select": json_schema_string("OData $select column list"),
                    "orderby": json_schema_string("OData $orderby expression"),
                    "top": json_schema_integer("Maximum rows to return"),
                    "skip": json_schema_integer("Rows to skip"),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ReadConnectionsArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        match args.action.as_str() {
            "list" => match self.client.connections().list(args.list.to_query()).await {
                Ok(connections) => ok_json(&connections),
                Err(e) => fail(&e),
            },
            "count" => match self
                .client
                .connections()
                .count(args.list.filter.as_deref())
                .await
            {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            "get" => {
                let name = require(&args.name, "name", "get")?;
                validate::resource_name("name", name)?;
                match self.client.connections().get(name).await {
                    Ok(connection) => ok_json(&connection),
                    Err(e) => fail(&e),
                }
            }
            "test" => {
                let name = require(&args.name, "name", "test")?;
                validate::resource_name("name", name)?;
                match self.client.connections().test(name).await {
                    Ok(result) => ok_json(&result),
                    Err(e) => fail(&e),
                }
            }
            other => {
                Err(unknown_action("read_connections", other, &["list", "count", "get", "test"])
                    .into())
            }
        }
    }
}

/// Write-side connection operations.
pub struct WriteConnectionsTool {
    client: SyncClient,
}

impl WriteConnectionsTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteConnectionsArgs {
    action: String,
    name: Option<String>,
    provider_name: Option<String>,
    connection_string: Option<String>,
    verbosity: Option<String>,
    workspace_id: Option<String>,
}

impl WriteConnectionsArgs {
    fn record(&self, name: &str) -> Connection {
        Connection {
            name: name.to_string(),
            provider_name: self.provider_name.clone(),
            connection_string: self.connection_string.clone(),
            verbosity: self.verbosity.clone(),
            connection_state: None,
        }
    }
}

#[async_trait::async_trait]
impl Tool for WriteConnectionsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_connections".to_string(),
            description: "Create, update, or delete a CData Sync connection.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["create", "update", "delete"],
                        "Operation to perform"
                    ),
                    "name": json_schema_pattern(RESOURCE_NAME_PATTERN, "Connection name"),
                    "providerName": json_schema_string(
                        "Driver name, e.g. 'CData Salesforce' (required for create)"
                    ),
                    "connectionString": json_schema_string(
                        "Provider connection string (required for create)"
                    ),
                    "verbosity": json_schema_string("Log verbosity level, 1-5"),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["action", "name"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteConnectionsArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        let name = require(&args.name, "name", &args.action)?;
        validate::resource_name("name", name)?;

        match args.action.as_str() {
            "create" => {
                require(&args.provider_name, "providerName", "create")?;
                require(&args.connection_string, "connectionString", "create")?;
                match self.client.connections().create(&args.record(name)).await {
                    Ok(connection) => ok_json(&connection),
                    Err(e) => fail(&e),
                }
            }
            "update" => match self
                .client
                .connections()
                .update(name, &args.record(name))
                .await
            {
                Ok(connection) => ok_json(&connection),
                Err(e) => fail(&e),
            },
            "delete" => match self.client.connections().delete(name).await {
                Ok(()) => ok_text(format!("Deleted connection '{name}'")),
                Err(e) => fail(&e),
            },
            other => {
                Err(unknown_action("write_connections", other, &["create", "update", "delete"])
                    .into())
            }
        }
    }
}
