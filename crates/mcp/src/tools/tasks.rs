//! Task tools for the queries inside a job.

use super::{
    fail, json_schema_enum, json_schema_integer, json_schema_object, json_schema_pattern,
    json_schema_string, ok_json, ok_text, parse_args, require, scope_workspace, unknown_action,
    ArgumentError, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use cdsync_core::types::Task;
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side task operations.
pub struct ReadTasksTool {
    client: SyncClient,
}

impl ReadTasksTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadTasksArgs {
    action: String,
    job_name: Option<String>,
    index: Option<String>,
    #[serde(flatten)]
    list: ListParams,
    workspace_id: Option<String>,
}

/// Task indexes are interpolated into the OData key unquoted, so anything
/// other than digits is rejected up front.
fn require_index(value: &Option<String>, action: &str) -> Result<String, ArgumentError> {
    let index = require(value, "index", action)?;
    if index.bytes().all(|b| b.is_ascii_digit()) {
        Ok(index.to_string())
    } else {
        Err(ArgumentError(format!(
            "invalid index: '{index}' is not a non-negative integer"
        )))
    }
}

#[async_trait::async_trait]
impl Tool for ReadTasksTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_tasks".to_string(),
            description:
                "Read CData Sync tasks (the individual queries inside a job): list or count \
                 them, or fetch one by job name and index."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["list", "count", "get"],
                        "Operation to perform"
                    ),
                    "jobName": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Job the task belongs to (required for get)"
                    ),
                    "index": json_schema_string(
                        "Task index within the job (required for get)"
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
        let args: ReadTasksArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        match args.action.as_str() {
            "list" => match self.client.tasks().list(args.list.to_query()).await {
                Ok(tasks) => ok_json(&tasks),
                Err(e) => fail(&e),
            },
            "count" => match self.client.tasks().count(args.list.filter.as_deref()).await {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            "get" => {
                let name = require(&args.job_name, "jobName", "get")?;
                validate::resource_name("jobName", name)?;
                let index = require_index(&args.index, "get")?;
                match self.client.tasks().get(name, &index).await {
                    Ok(task) => ok_json(&task),
                    Err(e) => fail(&e),
                }
            }
            other => Err(unknown_action("read_tasks", other, &["list", "count", "get"]).into()),
        }
    }
}

/// Write-side task operations.
pub struct WriteTasksTool {
    client: SyncClient,
}

impl WriteTasksTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteTasksArgs {
    action: String,
    job_name: Option<String>,
    index: Option<String>,
    query: Option<String>,
    table: Option<String>,
    workspace_id: Option<String>,
}

impl WriteTasksArgs {
    fn record(&self, job_name: &str, index: Option<String>) -> Task {
        Task {
            job_name: job_name.to_string(),
            index,
            query: self.query.clone(),
            table: self.table.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for WriteTasksTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_tasks".to_string(),
            description: "Add a query to a CData Sync job, or update or remove one by index."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["create", "update", "delete"],
                        "Operation to perform"
                    ),
                    "jobName": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Job the task belongs to"
                    ),
                    "index": json_schema_string(
                        "Task index within the job (required for update/delete)"
                    ),
                    "query": json_schema_string(
                        "Replication query text (required for create)"
                    ),
                    "table": json_schema_string("Destination table name override"),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["action", "jobName"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteTasksArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        let name = require(&args.job_name, "jobName", &args.action)?;
        validate::resource_name("jobName", name)?;

        match args.action.as_str() {
            "create" => {
                require(&args.query, "query", "create")?;
                match self.client.tasks().create(&args.record(name, None)).await {
                    Ok(task) => ok_json(&task),
                    Err(e) => fail(&e),
                }
            }
            "update" => {
                let index = require_index(&args.index, "update")?;
                let record = args.record(name, Some(index.clone()));
                match self.client.tasks().update(name, &index, &record).await {
                    Ok(task) => ok_json(&task),
                    Err(e) => fail(&e),
                }
            }
            "delete" => {
                let index = require_index(&args.index, "delete")?;
                match self.client.tasks().delete(name, &index).await {
                    Ok(()) => ok_text(format!("Deleted task {index} from job '{name}'")),
                    Err(e) => fail(&e),
                }
            }
            other => {
                Err(unknown_action("write_tasks", other, &["create", "update", "delete"]).into())
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
    async fn get_addresses_composite_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks(JobName='nightly_load',Index=1)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "JobName": "nightly_load",
                "Index": 1,
                "Query": "REPLICATE Accounts"
            })))
            .mount(&server)
            .await;

        let tool = ReadTasksTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({
                "action": "get",
                "jobName": "nightly_load",
                "index": "1"
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn non_numeric_index_is_rejected_before_http() {
        let server = MockServer::start().await;
        let tool = WriteTasksTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({
                "action": "delete",
                "jobName": "nightly_load",
                "index": "1) or (1=1"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a non-negative integer"));
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_posts_task_without_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(body_json(serde_json::json!({
                "JobName": "nightly_load",
                "Query": "REPLICATE Contacts"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "JobName": "nightly_load",
                "Index": 2,
                "Query": "REPLICATE Contacts"
            })))
            .mount(&server)
            .await;

        let tool = WriteTasksTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({
                "action": "create",
                "jobName": "nightly_load",
                "query": "REPLICATE Contacts"
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("\"Index\": \"2\""));
    }
}
