//! MCP tools over the Sync API.
//!
//! Read tools multiplex on an `action` argument; write tools on
//! create/update/delete. Required arguments are checked per action before
//! any HTTP call, so a malformed request never reaches the Sync server.

pub mod certificates;
pub mod connections;
pub mod history;
pub mod jobs;
pub mod requests;
mod registry;
pub mod sync_config;
pub mod tasks;
pub mod transformations;
pub mod users;
pub mod workspaces;

pub use registry::{
    json_schema_array, json_schema_enum, json_schema_flag, json_schema_integer,
    json_schema_object, json_schema_pattern, json_schema_string, Tool, ToolRegistry,
};

use crate::protocol::CallToolResult;
use anyhow::Result;
use cdsync_client::{SyncClient, SyncError};
use cdsync_core::ODataQuery;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// Register every Sync tool against one shared client.
pub fn register_all(registry: &mut ToolRegistry, client: &SyncClient) {
    registry.register(Arc::new(connections::ReadConnectionsTool::new(client.clone())));
    registry.register(Arc::new(connections::WriteConnectionsTool::new(client.clone())));
    registry.register(Arc::new(jobs::ReadJobsTool::new(client.clone())));
    registry.register(Arc::new(jobs::WriteJobsTool::new(client.clone())));
    registry.register(Arc::new(jobs::ExecuteJobTool::new(client.clone())));
    registry.register(Arc::new(jobs::CancelJobTool::new(client.clone())));
    registry.register(Arc::new(jobs::ExecuteQueryTool::new(client.clone())));
    registry.register(Arc::new(tasks::ReadTasksTool::new(client.clone())));
    registry.register(Arc::new(tasks::WriteTasksTool::new(client.clone())));
    registry.register(Arc::new(transformations::ReadTransformationsTool::new(client.clone())));
    registry.register(Arc::new(transformations::WriteTransformationsTool::new(client.clone())));
    registry.register(Arc::new(users::ReadUsersTool::new(client.clone())));
    registry.register(Arc::new(users::WriteUsersTool::new(client.clone())));
    registry.register(Arc::new(requests::ReadRequestsTool::new(client.clone())));
    registry.register(Arc::new(history::ReadHistoryTool::new(client.clone())));
    registry.register(Arc::new(certificates::ReadCertificatesTool::new(client.clone())));
    registry.register(Arc::new(certificates::WriteCertificatesTool::new(client.clone())));
    registry.register(Arc::new(workspaces::ReadWorkspacesTool::new(client.clone())));
    registry.register(Arc::new(workspaces::WriteWorkspacesTool::new(client.clone())));
    registry.register(Arc::new(sync_config::ReadSyncConfigTool::new(client.clone())));
    registry.register(Arc::new(sync_config::WriteSyncConfigTool::new(client.clone())));
}

/// Argument problem detected before any HTTP call.
///
/// The dispatch service maps this (and `ValidationError`) to JSON-RPC
/// `invalid_params`.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ArgumentError(pub String);

/// Deserialize tool arguments, treating shape mismatches as argument errors.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(
    arguments: serde_json::Value,
) -> Result<T, ArgumentError> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ArgumentError(format!("invalid arguments: {e}")))
}

/// Require an argument for the given action.
pub(crate) fn require<'a>(
    value: &'a Option<String>,
    field: &str,
    action: &str,
) -> Result<&'a str, ArgumentError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ArgumentError(format!("'{field}' is required for action '{action}'")))
}

/// Reject actions outside the tool's contract.
pub(crate) fn unknown_action(tool: &str, action: &str, allowed: &[&str]) -> ArgumentError {
    ArgumentError(format!(
        "unknown action '{action}' for {tool}; expected one of: {}",
        allowed.join(", ")
    ))
}

/// OData passthrough parameters shared by every list action.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListParams {
    pub filter: Option<String>,
    pub select: Option<String>,
    pub orderby: Option<String>,
    pub top: Option<u32>,
    pub skip: Option<u32>,
}

impl ListParams {
    pub fn to_query(&self) -> ODataQuery {
        ODataQuery {
            filter: self.filter.clone(),
            select: self.select.clone(),
            orderby: self.orderby.clone(),
            top: self.top,
            skip: self.skip,
        }
    }
}

/// Accept JSON booleans and `"true"`/`"false"` strings for flag arguments.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Bool(b)) => Ok(Some(b)),
        Some(Raw::Text(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean or \"true\"/\"false\", got \"{other}\""
            ))),
        },
    }
}

/// Render a successful API payload as pretty-printed JSON text.
pub(crate) fn ok_json<T: serde::Serialize>(value: &T) -> Result<CallToolResult> {
    let text = serde_json::to_string_pretty(value)?;
    Ok(CallToolResult::text(text))
}

/// Render a plain confirmation message.
pub(crate) fn ok_text(message: impl Into<String>) -> Result<CallToolResult> {
    Ok(CallToolResult::text(message))
}

/// Render a Sync API failure as a tool error, appending remediation text.
pub(crate) fn fail(err: &SyncError) -> Result<CallToolResult> {
    let mut text = format!("Error: {err}");
    if let Some(remedy) = err.remediation() {
        text.push_str("\n\n");
        text.push_str(remedy);
    }
    Ok(CallToolResult::error(text))
}

/// Scope the client to the request's workspace, if one was given.
pub(crate) fn scope_workspace(
    client: &SyncClient,
    workspace_id: &Option<String>,
) -> Option<cdsync_client::WorkspaceScope> {
    workspace_id
        .as_ref()
        .map(|ws| client.with_workspace(Some(ws.clone())))
}
