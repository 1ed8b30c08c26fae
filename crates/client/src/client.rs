//! Main client for the CData Sync API.

use crate::api::*;
use crate::config::{ClientConfig, RetryConfig};
use crate::error::{SyncError, SyncResult};
use crate::transport::{HttpTransport, WorkspaceSlot};
use crate::workspace::WorkspaceScope;
use cdsync_core::AuthCredentials;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Main client for interacting with the Sync REST API.
#[derive(Clone)]
pub struct SyncClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
    workspace: WorkspaceSlot,
}

impl SyncClient {
    /// Create a new client builder.
    pub fn builder() -> SyncClientBuilder {
        SyncClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig, default_workspace: Option<String>) -> SyncResult<Self> {
        let config = Arc::new(config);
        let workspace: WorkspaceSlot = Arc::new(Mutex::new(default_workspace));
        let http = HttpTransport::new(config.clone(), workspace.clone())?;

        Ok(Self {
            config,
            http,
            workspace,
        })
    }

    /// The configured API root.
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Scope subsequent requests to `workspace` until the guard drops.
    ///
    /// Passing `None` clears any default workspace for the guard's lifetime.
    pub fn with_workspace(&self, workspace: Option<String>) -> WorkspaceScope {
        WorkspaceScope::new(self.workspace.clone(), workspace)
    }

    /// The workspace override currently in effect, if any.
    pub fn current_workspace(&self) -> Option<String> {
        self.workspace.lock().expect("workspace slot poisoned").clone()
    }

    /// Get the connections API.
    pub fn connections(&self) -> ConnectionsApi<'_> {
        ConnectionsApi::new(self)
    }

    /// Get the jobs API.
    pub fn jobs(&self) -> JobsApi<'_> {
        JobsApi::new(self)
    }

    /// Get the tasks API.
    pub fn tasks(&self) -> TasksApi<'_> {
        TasksApi::new(self)
    }

    /// Get the transformations API.
    pub fn transformations(&self) -> TransformationsApi<'_> {
        TransformationsApi::new(self)
    }

    /// Get the users API.
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    /// Get the request-log API.
    pub fn requests(&self) -> RequestsApi<'_> {
        RequestsApi::new(self)
    }

    /// Get the execution-history API.
    pub fn history(&self) -> HistoryApi<'_> {
        HistoryApi::new(self)
    }

    /// Get the certificates API.
    pub fn certificates(&self) -> CertificatesApi<'_> {
        CertificatesApi::new(self)
    }

    /// Get the workspaces API.
    pub fn workspaces(&self) -> WorkspacesApi<'_> {
        WorkspacesApi::new(self)
    }

    /// Get the server-configuration API.
    pub fn server_config(&self) -> ServerConfigApi<'_> {
        ServerConfigApi::new(self)
    }
}

/// Builder for creating a SyncClient.
pub struct SyncClientBuilder {
    base_url: Option<String>,
    auth: Option<AuthCredentials>,
    timeout: Duration,
    retry_config: RetryConfig,
    default_workspace: Option<String>,
}

impl SyncClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            default_workspace: None,
        }
    }

    /// Set the API root, e.g. `http://localhost:8181/api.rsc`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Authenticate with a Sync authtoken.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthCredentials::Token(token.into()));
        self
    }

    /// Authenticate with username and password.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(AuthCredentials::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Set a workspace applied to every request unless overridden.
    pub fn default_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.default_workspace = Some(workspace.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> SyncResult<SyncClient> {
        let base_url_str = self
            .base_url
            .ok_or_else(|| SyncError::Config("base_url is required".to_string()))?;

        let base_url = Url::parse(&base_url_str)?;

        let config = ClientConfig {
            base_url,
            auth: self.auth,
            timeout: self.timeout,
            retry_config: self.retry_config,
        };

        SyncClient::from_config(config, self.default_workspace)
    }
}

impl Default for SyncClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
