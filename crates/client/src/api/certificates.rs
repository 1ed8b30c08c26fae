//! Certificates API endpoints.

use crate::client::SyncClient;
use crate::error::SyncResult;
use cdsync_core::odata::ODataQuery;
use cdsync_core::types::Certificate;
use serde::Serialize;

/// Certificates API for TLS certificates installed on the server.
pub struct CertificatesApi<'a> {
    client: &'a SyncClient,
}

impl<'a> CertificatesApi<'a> {
    pub(crate) fn new(client: &'a SyncClient) -> Self {
        Self { client }
    }

    /// List installed certificates.
    pub async fn list(&self, query: ODataQuery) -> SyncResult<Vec<Certificate>> {
        super::fetch_list(self.client, "/certificates", &query).await
    }

    /// Create a self-signed certificate on the server.
    pub async fn create(&self, request: &CreateCertificateRequest) -> SyncResult<()> {
        self.client
            .http
            .post_no_response("/createCertificate", request)
            .await
    }
}

/// Parameters for `createCertificate`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateCertificateRequest {
    /// File name the certificate is stored under, e.g. `sync.pfx`.
    pub filename: String,
    /// Certificate subject, e.g. `CN=sync.example.com`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Validity in days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,
}
