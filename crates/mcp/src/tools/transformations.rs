//! Transformation tools.

use super::{
    fail, flag, json_schema_array, json_schema_enum, json_schema_flag, json_schema_integer,
    json_schema_object, json_schema_pattern, json_schema_string, ok_json, ok_text, parse_args,
    require, scope_workspace, unknown_action, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use cdsync_core::types::Transformation;
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side transformation operations.
pub struct ReadTransformationsTool {
    client: SyncClient,
}

impl ReadTransformationsTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadTransformationsArgs {
    action: String,
    transformation_name: Option<String>,
    #[serde(flatten)]
    list: ListParams,
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ReadTransformationsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_transformations".to_string(),
            description:
                "Read CData Sync transformations (post-load SQL run on a destination): list or \
                 count them, or fetch one by name."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["list", "count", "get"],
                        "Operation to perform"
                    ),
                    "transformationName": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Transformation name (required for get)"
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
        let args: ReadTransformationsArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        match args.action.as_str() {
            "list" => match self
                .client
                .transformations()
                .list(args.list.to_query())
                .await
            {
                Ok(transformations) => ok_json(&transformations),
                Err(e) => fail(&e),
            },
            "count" => match self
                .client
                .transformations()
                .count(args.list.filter.as_deref())
                .await
            {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            "get" => {
                let name = require(&args.transformation_name, "transformationName", "get")?;
                validate::resource_name("transformationName", name)?;
                match self.client.transformations().get(name).await {
                    Ok(transformation) => ok_json(&transformation),
                    Err(e) => fail(&e),
                }
            }
            other => {
                Err(unknown_action("read_transformations", other, &["list", "count", "get"])
                    .into())
            }
        }
    }
}

/// Write-side transformation operations.
pub struct WriteTransformationsTool {
    client: SyncClient,
}

impl WriteTransformationsTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteTransformationsArgs {
    action: String,
    transformation_name: Option<String>,
    connection: Option<String>,
    #[serde(default)]
    queries: Vec<String>,
    transformation_trigger_mode: Option<String>,
    scheduled_cron: Option<String>,
    trigger_after_job: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    send_email_notification: Option<bool>,
    notify_email_to: Option<String>,
    workspace_id: Option<String>,
}

impl WriteTransformationsArgs {
    fn record(&self, name: &str) -> Transformation {
        Transformation {
            transformation_name: name.to_string(),
            connection: self.connection.clone(),
            queries: self.queries.clone(),
            transformation_trigger_mode: self.transformation_trigger_mode.clone(),
            scheduled_cron: self.scheduled_cron.clone(),
            trigger_after_job: self.trigger_after_job.clone(),
            send_email_notification: self.send_email_notification,
            notify_email_to: self.notify_email_to.clone(),
            workspace_id: None,
        }
    }
}

#[async_trait::async_trait]
impl Tool for WriteTransformationsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_transformations".to_string(),
            description: "Create, update, or delete a CData Sync transformation.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["create", "update", "delete"],
                        "Operation to perform"
                    ),
                    "transformationName": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Transformation name"
                    ),
                    "connection": json_schema_string(
                        "Destination connection the SQL runs against (required for create)"
                    ),
                    "queries": json_schema_array(
                        json_schema_string("SQL statement"),
                        "SQL statements to run, in order"
                    ),
                    "transformationTriggerMode": json_schema_enum(
                        &["None", "Scheduled", "AfterJob"],
                        "What starts the transformation"
                    ),
                    "scheduledCron": json_schema_string(
                        "Cron expression (Scheduled trigger mode)"
                    ),
                    "triggerAfterJob": json_schema_string(
                        "Job whose completion triggers this (AfterJob trigger mode)"
                    ),
                    "sendEmailNotification": json_schema_flag("Send an email after each run"),
                    "notifyEmailTo": json_schema_string("Notification recipient address"),
                    "workspaceId": json_schema_string("Workspace to scope the call to"),
                }),
                vec!["action", "transformationName"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteTransformationsArgs = parse_args(arguments)?;
        let _scope = scope_workspace(&self.client, &args.workspace_id);

        let name = require(&args.transformation_name, "transformationName", &args.action)?;
        validate::resource_name("transformationName", name)?;
        if let Some(cron) = args.scheduled_cron.as_deref() {
            validate::cron_expression(cron)?;
        }

        match args.action.as_str() {
            "create" => {
                require(&args.connection, "connection", "create")?;
                match self
                    .client
                    .transformations()
                    .create(&args.record(name))
                    .await
                {
                    Ok(transformation) => ok_json(&transformation),
                    Err(e) => fail(&e),
                }
            }
            "update" => match self
                .client
                .transformations()
                .update(name, &args.record(name))
                .await
            {
                Ok(transformation) => ok_json(&transformation),
                Err(e) => fail(&e),
            },
            "delete" => match self.client.transformations().delete(name).await {
                Ok(()) => ok_text(format!("Deleted transformation '{name}'")),
                Err(e) => fail(&e),
            },
            other => Err(unknown_action(
                "write_transformations",
                other,
                &["create", "update", "delete"],
            )
            .into()),
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
    async fn create_sends_trigger_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transformations"))
            .and(body_json(serde_json::json!({
                "TransformationName": "rollup",
                "Connection": "warehouse",
                "Queries": ["INSERT INTO daily SELECT * FROM staging"],
                "TransformationTriggerMode": "AfterJob",
                "TriggerAfterJob": "nightly_load"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "TransformationName": "rollup"
            })))
            .mount(&server)
            .await;

        let tool = WriteTransformationsTool::new(client(&server).await);
        let result = tool
            .execute(serde_json::json!({
                "action": "create",
                "transformationName": "rollup",
                "connection": "warehouse",
                "queries": ["INSERT INTO daily SELECT * FROM staging"],
                "transformationTriggerMode": "AfterJob",
                "triggerAfterJob": "nightly_load"
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn create_requires_connection() {
        let server = MockServer::start().await;
        let tool = WriteTransformationsTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({
                "action": "create",
                "transformationName": "rollup"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'connection' is required"));
    }

    #[tokio::test]
    async fn scheduled_cron_is_validated() {
        let server = MockServer::start().await;
        let tool = WriteTransformationsTool::new(client(&server).await);
        let err = tool
            .execute(serde_json::json!({
                "action": "update",
                "transformationName": "rollup",
                "scheduledCron": "99 * * * *"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid cron expression"));
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }
}
