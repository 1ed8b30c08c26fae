use crate::serde_util::{string_id, stringly_bool};
use serde::{Deserialize, Serialize};

/// A source or destination connection registered on the Sync server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Connection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_state: Option<String>,
}

/// An ETL job definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_email_to: Option<String>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub send_email_notification: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub truncate_table_data: Option<bool>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub drop_table: Option<bool>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub continue_on_error: Option<bool>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub alter_schema: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name_prefix: Option<String>,
    #[serde(default, rename = "Type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub workspace_id: Option<String>,
}

/// A single task (query) inside a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    pub job_name: String,
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// A SQL transformation run against a destination connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transformation {
    pub transformation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
    /// `None`, `Scheduled`, or `AfterJob`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_trigger_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_after_job: Option<String>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub send_email_notification: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_email_to: Option<String>,
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub workspace_id: Option<String>,
}

/// A Sync server user account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub user: String,
    /// Only present on create/update requests, never echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<String>,
    #[serde(
        default,
        with = "stringly_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_id: Option<String>,
}

/// One entry from the server's request log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestLog {
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, rename = "RemoteIP", skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One job execution from the history log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryRecord {
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub records_affected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

/// An SSL/TLS certificate installed on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Certificate {
    pub name: String,
    /// Base64-encoded certificate data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

/// A workspace grouping jobs and connections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Workspace {
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
}

/// A single server configuration property.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerProperty {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Status snapshot returned by `getJobStatus`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobStatus {
    pub job_name: String,
    /// `RUNNING` or `NOT RUNNING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_date: Option<String>,
}

/// Per-query outcome of an `executeJob` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobExecutionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub records_affected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

/// Outcome of an ad-hoc `executeQuery` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(
        default,
        with = "string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub records_affected: Option<String>,
}

/// Log text returned by `getJobLogs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}
