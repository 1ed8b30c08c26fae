//! TLS certificate tools.

use super::{
    fail, json_schema_enum, json_schema_integer, json_schema_object, json_schema_pattern,
    json_schema_string, ok_json, ok_text, parse_args, require, unknown_action, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::{CreateCertificateRequest, SyncClient};
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side certificate operations.
pub struct ReadCertificatesTool {
    client: SyncClient,
}

impl ReadCertificatesTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadCertificatesArgs {
    action: String,
    #[serde(flatten)]
    list: ListParams,
}

#[async_trait::async_trait]
impl Tool for ReadCertificatesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_certificates".to_string(),
            description: "List the TLS certificates installed on the CData Sync server."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(&["list"], "Operation to perform"),
                    "filter": json_schema_string("OData $filter expression"),
                    "select": json_schema_string("OData $select column list"),
                    "orderby": json_schema_string("OData $orderby expression"),
                    "top": json_schema_integer("Maximum rows to return"),
                    "skip": json_schema_integer("Rows to skip"),
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ReadCertificatesArgs = parse_args(arguments)?;

        match args.action.as_str() {
            "list" => match self.client.certificates().list(args.list.to_query()).await {
                Ok(certificates) => ok_json(&certificates),
                Err(e) => fail(&e),
            },
            other => Err(unknown_action("read_certificates", other, &["list"]).into()),
        }
    }
}

/// Write-side certificate operations.
pub struct WriteCertificatesTool {
    client: SyncClient,
}

impl WriteCertificatesTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteCertificatesArgs {
    action: String,
    filename: Option<String>,
    subject: Option<String>,
    expiration_days: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for WriteCertificatesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_certificates".to_string(),
            description: "Create a self-signed TLS certificate on the CData Sync server."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(&["create"], "Operation to perform"),
                    "filename": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "File name to store the certificate under, e.g. 'sync.pfx'"
                    ),
                    "subject": json_schema_string(
                        "Certificate subject, e.g. 'CN=sync.example.com'"
                    ),
                    "expirationDays": json_schema_integer("Validity period in days"),
                }),
                vec!["action", "filename"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteCertificatesArgs = parse_args(arguments)?;

        match args.action.as_str() {
            "create" => {
                let filename = require(&args.filename, "filename", "create")?;
                validate::resource_name("filename", filename)?;
                let request = CreateCertificateRequest {
                    filename: filename.to_string(),
                    subject: args.subject.clone(),
                    expiration_days: args.expiration_days,
                };
                match self.client.certificates().create(&request).await {
                    Ok(()) => ok_text(format!("Created certificate '{filename}'")),
                    Err(e) => fail(&e),
                }
            }
            other => Err(unknown_action("write_certificates", other, &["create"]).into()),
        }
    }
}
