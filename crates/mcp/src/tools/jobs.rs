//! Job tools: CRUD, execution, cancellation, and ad-hoc queries.

use super::{
    fail, flag, json_schema_array, json_schema_enum, json_schema_flag, json_schema_integer,
    json_schema_object, json_schema_pattern, json_schema_string, ok_json, ok_text, parse_args,
    require, scope_workspace, unknown_action, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use cdsync_core::types::Job;
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side job operations, including status, history, and logs.
pub struct ReadJobsTool {
    client: SyncClient,
}

impl ReadJobsTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadJobsArgs {
    action: String,
    job_name: Option<String>,
    days: Option<u32>,
    #[serde(flatten)]
    list: ListParams,
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ReadJobsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_jobs".to_string(),
            description:
                "Read CData Sync jobs: list or count them, fetch one by name, check whether a \
                 job is running, and retrieve its execution history or log text."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["list", "count", "get", "status", "history", "logs"],
                        "Operation to perform"
                    ),
                    "jobName": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Job name (required for get/status/history/logs)"
                    ),
                    "days": json_schema_integer("How many days of logs to fetch (logs only)"),
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
        let args: ReadJobsArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        match args.action.as_str() {
            "list" => match self.client.jobs().list(args.list.to_query()).await {
                Ok(jobs) => ok_json(&jobs),
                Err(e) => fail(&e),
            },
            "count" => match self.client.jobs().count(args.list.filter.as_deref()).await {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            "get" => {
                let name = require(&args.job_name, "jobName", "get")?;
                validate::resource_name("jobName", name)?;
                match self.client.jobs().get(name).await {
                    Ok(job) => ok_json(&job),
                    Err(e) => fail(&e),
                }
            }
            "status" => {
                let name = require(&args.job_name, "jobName", "status")?;
                validate::resource_name("jobName", name)?;
                match self.client.jobs().status(name).await {
                    Ok(status) => ok_json(&status),
                    Err(e) => fail(&e),
                }
            }
            "history" => {
                let name = require(&args.job_name, "jobName", "history")?;
                validate::resource_name("jobName", name)?;
                match self.client.jobs().history(name, args.list.top).await {
                    Ok(records) => ok_json(&records),
                    Err(e) => fail(&e),
                }
            }
            "logs" => {
                let name = require(&args.job_name, "jobName", "logs")?;
                validate::resource_name("jobName", name)?;
                match self.client.jobs().logs(name, args.days).await {
                    Ok(log) => ok_json(&log),
                    Err(e) => fail(&e),
                }
            }
            other => Err(unknown_action(
                "read_jobs",
                other,
                &["list", "count", "get", "status", "history", "logs"],
            )
            .into()),
        }
    }
}

/// Write-side job operations.
pub struct WriteJobsTool {
    client: SyncClient,
}

impl WriteJobsTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteJobsArgs {
    action: String,
    job_name: Option<String>,
    source: Option<String>,
    destination: Option<String>,
    #[serde(default)]
    queries: Vec<String>,
    #[serde(default, deserialize_with = "flag")]
    scheduled: Option<bool>,
    scheduled_cron: Option<String>,
    notify_email_to: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    send_email_notification: Option<bool>,
    verbosity: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    truncate_table_data: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    drop_table: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    continue_on_error: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    alter_schema: Option<bool>,
    batch_size: Option<String>,
    command_timeout: Option<String>,
    table_name_prefix: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
    workspace_id: Option<String>,
}

impl WriteJobsArgs {
    fn record(&self, name: &str) -> Job {
        Job {
            job_name: name.to_string(),
            source: self.source.clone(),
            destination: self.destination.clone(),
            queries: self.queries.clone(),
            scheduled: self.scheduled,
            scheduled_cron: self.scheduled_cron.clone(),
            notify_email_to: self.notify_email_to.clone(),
            send_email_notification: self.send_email_notification,
            verbosity: self.verbosity.clone(),
            truncate_table_data: self.truncate_table_data,
            drop_table: self.drop_table,
            continue_on_error: self.continue_on_error,
            alter_schema: self.alter_schema,
            batch_size: self.batch_size.clone(),
            command_timeout: self.command_timeout.clone(),
            table_name_prefix: self.table_name_prefix.clone(),
            job_type: self.job_type.clone(),
            workspace_id: None,
        }
    }
}

#[async_trait::async_trait]
impl Tool for WriteJobsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_jobs".to_string(),
            description: "Create, update, or delete a CData Sync job.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["create", "update", "delete"],
                        "Operation to perform"
                    ),
                    "jobName": json_schema_pattern(RESOURCE_NAME_PATTERN, "Job name"),
                    "source": json_schema_string(
                        "Source connection name (required for create)"
                    ),
                    "destination": json_schema_string(
                        "Destination connection name (required for create)"
                    ),
                    "queries": json_schema_array(
                        json_schema_string("Replication query"),
                        "Replication queries, e.g. 'REPLICATE Accounts'"
                    ),
                    "scheduled": json_schema_flag("Whether the job runs on a schedule"),
                    "scheduledCron": json_schema_string(
                        "Cron expression for the schedule, e.g. '0 2 * * *'"
                    ),
                    "notifyEmailTo": json_schema_string("Notification recipient address"),
                    "sendEmailNotification": json_schema_flag(
                        "Send an email after each run"
                    ),
                    "verbosity": json_schema_string("Log verbosity level, 1-5"),
                    "truncateTableData": json_schema_flag(
                        "Truncate destination tables before loading"
                    ),
                    "dropTable": json_schema_flag("Drop and recreate destination tables"),
                    "continueOnError": json_schema_flag("Keep going when a query fails"),
                    "alterSchema": json_schema_flag(
                        "Alter destination schema to match the source"
                    ),
                    "batchSize": json_schema_string("Rows per insert batch"),
                    "commandTimeout": json_schema_string("Per-command timeout in seconds"),
                    "tableNamePrefix": json_schema_string("Prefix for destination table names"),
                    "type": json_schema_string("Job type, e.g. 'Standard'"),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["action", "jobName"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteJobsArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        let name = require(&args.job_name, "jobName", &args.action)?;
        validate::resource_name("jobName", name)?;
        if let Some(cron) = args.scheduled_cron.as_deref() {
            validate::cron_expression(cron)?;
        }

        match args.action.as_str() {
            "create" => {
                require(&args.source, "source", "create")?;
                require(&args.destination, "destination", "create")?;
                match self.client.jobs().create(&args.record(name)).await {
                    Ok(job) => ok_json(&job),
                    Err(e) => fail(&e),
                }
            }
            "update" => match self.client.jobs().update(name, &args.record(name)).await {
                Ok(job) => ok_json(&job),
                Err(e) => fail(&e),
            },
            "delete" => match self.client.jobs().delete(name).await {
                Ok(()) => ok_text(format!("Deleted job '{name}'")),
                Err(e) => fail(&e),
            },
            other => {
                Err(unknown_action("write_jobs", other, &["create", "update", "delete"]).into())
            }
        }
    }
}

/// Run a job and report its per-query results.
pub struct ExecuteJobTool {
    client: SyncClient,
}

impl ExecuteJobTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteJobArgs {
    job_name: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    wait_for_results: Option<bool>,
    timeout: Option<u32>,
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ExecuteJobTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "execute_job".to_string(),
            description:
                "Run a CData Sync job. By default the call waits for completion and returns \
                 per-query results; pass waitForResults=false to start the job and return \
                 immediately."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "jobName": json_schema_pattern(RESOURCE_NAME_PATTERN, "Job to run"),
                    "waitForResults": json_schema_flag(
                        "Wait for the run to finish (default true)"
                    ),
                    "timeout": json_schema_integer(
                        "Seconds to wait before the server gives up on the run"
                    ),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["jobName"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ExecuteJobArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        let name = require(&args.job_name, "jobName", "execute_job")?;
        validate::resource_name("jobName", name)?;

        let wait = args.wait_for_results.unwrap_or(true);
        match self.client.jobs().execute(name, wait, args.timeout).await {
            Ok(results) => ok_json(&results),
            Err(e) => fail(&e),
        }
    }
}

/// Cancel a running job.
pub struct CancelJobTool {
    client: SyncClient,
}

impl CancelJobTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelJobArgs {
    job_name: Option<String>,
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for CancelJobTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "cancel_job".to_string(),
            description: "Cancel a running CData Sync job.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "jobName": json_schema_pattern(RESOURCE_NAME_PATTERN, "Job to cancel"),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["jobName"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: CancelJobArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        let name = require(&args.job_name, "jobName", "cancel_job")?;
        validate::resource_name("jobName", name)?;

        match self.client.jobs().cancel(name).await {
            Ok(()) => ok_text(format!("Cancellation requested for job '{name}'")),
            Err(e) => fail(&e),
        }
    }
}

/// Run ad-hoc queries in the context of a job's connections.
pub struct ExecuteQueryTool {
    client: SyncClient,
}

impl ExecuteQueryTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteQueryArgs {
    job_name: Option<String>,
    #[serde(default)]
    queries: Vec<String>,
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ExecuteQueryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "execute_query".to_string(),
            description:
                "Run one or more ad-hoc queries using a job's source and destination \
                 connections, without modifying the job definition."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "jobName": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Job whose connections the queries run against"
                    ),
                    "queries": json_schema_array(
                        json_schema_string("Query text"),
                        "Queries to run, e.g. 'REPLICATE Accounts'"
                    ),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["jobName", "queries"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ExecuteQueryArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        let name = require(&args.job_name, "jobName", "execute_query")?;
        validate::resource_name("jobName", name)?;
        if args.queries.is_empty() {
            return Err(super::ArgumentError(
                "'queries' must contain at least one query".to_string(),
            )
            .into());
        }

        match self.client.jobs().execute_query(name, &args.queries).await {
            Ok(results) => ok_json(&results),
            Err(e) => fail(&e),
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
    async fn execute_defaults_to_waiting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/executeJob"))
            .and(body_json(serde_json::json!({
                "JobName": "nightly_load",
                "WaitForResults": "true"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"JobName": "nightly_load", "Status": "Success"}]
            })))
            .mount(&server)
            .await;

        let tool = ExecuteJobTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({"jobName": "nightly_load"}))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("Success"));
    }

    #[tokio::test]
    async fn execute_accepts_string_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/executeJob"))
            .and(body_json(serde_json::json!({
                "JobName": "nightly_load",
                "WaitForResults": "false"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})),
            )
            .mount(&server)
            .await;

        let tool = ExecuteJobTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({
                "jobName": "nightly_load",
                "waitForResults": "false"
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn create_requires_source_and_destination() {
        let server = MockServer::start().await;
        let tool = WriteJobsTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({
                "action": "create",
                "jobName": "j1",
                "source": "crm"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'destination' is required"));
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn bad_cron_is_rejected_before_http() {
        let server = MockServer::start().await;
        let tool = WriteJobsTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({
                "action": "update",
                "jobName": "j1",
                "scheduledCron": "not a cron"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid cron expression"));
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_sends_pascal_case_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .and(body_json(serde_json::json!({
                "JobName": "j1",
                "Source": "crm",
                "Destination": "warehouse",
                "Queries": ["REPLICATE Accounts"],
                "Scheduled": "true",
                "ScheduledCron": "0 2 * * *"
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"JobName": "j1"})),
            )
            .mount(&server)
            .await;

        let tool = WriteJobsTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({
                "action": "create",
                "jobName": "j1",
                "source": "crm",
                "destination": "warehouse",
                "queries": ["REPLICATE Accounts"],
                "scheduled": true,
                "scheduledCron": "0 2 * * *"
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn execute_query_rejects_empty_list() {
        let server = MockServer::start().await;
        let tool = ExecuteQueryTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({"jobName": "j1", "queries": []}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at least one query"));
    }

    #[tokio::test]
    async fn cancel_reports_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cancelJob"))
            .and(body_json(serde_json::json!({"JobName": "nightly_load"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let tool = CancelJobTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({"jobName": "nightly_load"}))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("nightly_load"));
    }
}
