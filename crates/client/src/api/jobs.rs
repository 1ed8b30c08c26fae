//! Jobs API endpoints.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::{key_segment, key_value, ODataList, ODataQuery};
use cdsync_core::serde_util::stringly_bool;
use cdsync_core::types::{HistoryRecord, Job, JobExecutionResult, JobLog, JobStatus, QueryResult};
use serde::Serialize;

/// Jobs API for defining and running ETL jobs.
pub struct JobsApi<'a> {
    client: &'a SyncClient,
}

impl<'a> JobsApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List jobs.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<Job>> {
        super::fetch_list(self.client, "/jobs", &query).await
    }

    /// Count jobs, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/jobs", filter).await
    }

    /// Get a job by name.
    pub async fn get(&self, name: &str) -> SyncResult<Job> {
        self.client
            .http
            .get(&format!("/jobs{}", key_segment(name)))
            .await
    }

    /// Create a new job.
    pub async fn create(&self, job: &Job) -> SyncResult<Job> {
        self.client.http.post("/jobs", job).await
    }

    /// Update an existing job.
    pub async fn update(&self, name: &str, job: &Job) -> SyncResult<Job> {
        self.client
            .http
            .put(&format!("/jobs{}", key_segment(name)), job)
            .await
    }

    /// Delete a job.
    pub async fn delete(&self, name: &str) -> SyncResult<()> {
        self.client
            .http
            .delete(&format!("/jobs{}", key_segment(name)))
            .await
    }

    /// Run a job, optionally waiting for its per-query results.
    ///
    /// With `wait_for_results` false the server acknowledges the start and
    /// the result rows carry no row counts.
    pub async fn execute(
        &self,
        name: &str,
        wait_for_results: bool,
        timeout_secs: Option<u32>,
    ) -> SyncResult<Vec<JobExecutionResult>> {
        let request = ExecuteJobRequest {
            job_name: name.to_string(),
            wait_for_results: Some(wait_for_results),
            timeout: timeout_secs,
        };
        let response: ODataList<JobExecutionResult> =
            self.client.http.post("/executeJob", &request).await?;
        Ok(response.into_inner())
    }

    /// Cancel a running job.
    pub async fn cancel(&self, name: &str) -> SyncResult<()> {
        let request = JobNameRequest {
            job_name: name.to_string(),
        };
        self.client.http.post_no_response("/cancelJob", &request).await
    }

    /// Get the current run status of a job.
    pub async fn status(&self, name: &str) -> SyncResult<JobStatus> {
        let request = JobNameRequest {
            job_name: name.to_string(),
        };
        let response: ODataList<JobStatus> =
            self.client.http.post("/getJobStatus", &request).await?;
        super::single(response.into_inner(), "getJobStatus")
    }

    /// Get the log text for a job's recent runs.
    pub async fn logs(&self, name: &str, days: Option<u32>) -> SyncResult<JobLog> {
        let request = GetJobLogsRequest {
            job_name: name.to_string(),
            days,
        };
        let response: ODataList<JobLog> =
            self.client.http.post("/getJobLogs", &request).await?;
        super::single(response.into_inner(), "getJobLogs")
    }

    /// Run ad-hoc queries in the context of a job's connections.
    pub async fn execute_query(
        &self,
        name: &str,
        queries: &[String],
    ) -> SyncResult<Vec<QueryResult>> {
        let request = ExecuteQueryRequest {
            job_name: name.to_string(),
            queries: queries.to_vec(),
        };
        let response: ODataList<QueryResult> =
            self.client.http.post("/executeQuery", &request).await?;
        Ok(response.into_inner())
    }

    /// Execution history for one job, newest first.
    pub async fn history(&self, name: &str, top: Option<u32>) -> SyncResult<Vec<HistoryRecord>> {
        let mut query = ODataQuery::new()
            .filter(format!("JobName eq '{}'", key_value(name)))
            .orderby("RunStartDate desc");
        if let Some(top) = top {
            query = query.top(top);
        }
        super::fetch_list(self.client, "/history", &query).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JobNameRequest {
    job_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExecuteJobRequest {
    job_name: String,
    #[serde(with = "stringly_bool", skip_serializing_if = "Option::is_none")]
    wait_for_results: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetJobLogsRequest {
    job_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExecuteQueryRequest {
    job_name: String,
    queries: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SyncClient {
        SyncClient::builder()
            .base_url(server.uri())
            .auth_token("tok")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn execute_sends_stringly_wait_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/executeJob"))
            .and(body_json(serde_json::json!({
                "JobName": "nightly_load",
                "WaitForResults": "true",
                "Timeout": 120
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{
                    "JobName": "nightly_load",
                    "Query": "REPLICATE Accounts",
                    "Status": "Success",
                    "RecordsAffected": 1200
                }]
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let results = client
            .jobs()
            .execute("nightly_load", true, Some(120))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status.as_deref(), Some("Success"));
        assert_eq!(results[0].records_affected.as_deref(), Some("1200"));
    }

    #[tokio::test]
    async fn status_unwraps_first_element() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getJobStatus"))
            .and(body_json(serde_json::json!({"JobName": "nightly_load"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"JobName": "nightly_load", "Status": "RUNNING"}]
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let status = client.jobs().status("nightly_load").await.unwrap();
        assert_eq!(status.status.as_deref(), Some("RUNNING"));
    }

    #[tokio::test]
    async fn status_rejects_empty_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getJobStatus"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})),
            )
            .mount(&server)
            .await;

        let client = client(&server).await;
        let result = client.jobs().status("gone").await;
        assert!(matches!(
            result,
            Err(crate::error::SyncError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn history_filters_by_job_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .and(query_param("$filter", "JobName eq 'nightly_load'"))
            .and(query_param("$orderby", "RunStartDate desc"))
            .and(query_param("$top", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"JobName": "nightly_load", "Status": "Success"}]
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let records = client
            .jobs()
            .history("nightly_load", Some(10))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn get_encodes_spaces_in_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs('CRM%20to%20Warehouse')"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"JobName": "CRM to Warehouse"})),
            )
            .mount(&server)
            .await;

        let client = client(&server).await;
        let job = client.jobs().get("CRM to Warehouse").await.unwrap();
        assert_eq!(job.job_name, "CRM to Warehouse");
    }
}
