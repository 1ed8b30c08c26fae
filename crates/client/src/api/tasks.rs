//! Tasks API endpoints.
//!
//! Tasks are addressed by the composite key `(JobName='...',Index=N)`.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::{key_value, ODataQuery};
use cdsync_core::types::Task;

/// Tasks API for the queries inside a job.
pub struct TasksApi<'a> {
    client: &'a SyncClient,
}

impl<'a> TasksApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List tasks.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<Task>> {
        super::fetch_list(self.client, "/tasks", &query).await
    }

    /// Count tasks, optionally filtered.
    pub async fn count(&self, filter: Option<&str>) -> SyncResult<u64> {
        super::fetch_count(self.client, "/tasks", filter).await
    }

    /// Get a task by job name and index.
    pub async fn get(&self, job_name: &str, index: &str) -> SyncResult<Task> {
        self.client
            .http
            .get(&format!("/tasks{}", task_key(job_name, index)))
            .await
    }

    /// Add a task to a job.
    pub async fn create(&self, task: &Task) -> SyncResult<Task> {
        self.client.http.post("/tasks", task).await
    }

    /// Update an existing task.
    pub async fn update(&self, job_name: &str, index: &str, task: &Task) -> SyncResult<Task> {
        self.client
            .http
            .put(&format!("/tasks{}", task_key(job_name, index)), task)
            .await
    }

    /// Remove a task from a job.
    pub async fn delete(&self, job_name: &str, index: &str) -> SyncResult<()> {
        self.client
            .http
            .delete(&format!("/tasks{}", task_key(job_name, index)))
            .await
    }
}

fn task_key(job_name: &str, index: &str) -> String {
    format!("(JobName='{}',Index={})", key_value(job_name), index)
}
