//! # cdsync-client
//!
//! REST client for the CData Sync API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cdsync_client::{SyncClient, SyncResult};
//!
//! #[tokio::main]
//! async fn main() -> SyncResult<()> {
//!     let client = SyncClient::builder()
//!         .base_url("http://localhost:8181/api.rsc")
//!         .auth_token("your-authtoken")
//!         .build()?;
//!
//!     let jobs = client.jobs().list(Default::default()).await?;
//!     println!("Found {} jobs", jobs.len());
//!
//!     let results = client.jobs().execute("nightly_load", true, None).await?;
//!     for result in results {
//!         println!("{:?}: {:?}", result.query, result.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod workspace;

pub use api::certificates::CreateCertificateRequest;
pub use api::connections::ConnectionTestResult;
pub use client::{SyncClient, SyncClientBuilder};
pub use config::{ClientConfig, RetryConfig};
pub use error::{SyncError, SyncResult};
pub use workspace::WorkspaceScope;

// Re-export resource records for convenience
pub use cdsync_core::types::{
    Certificate, Connection, HistoryRecord, Job, JobExecutionResult, JobLog, JobStatus,
    QueryResult, RequestLog, ServerProperty, Task, Transformation, User, Workspace,
};
pub use cdsync_core::{AuthCredentials, ODataQuery};
