//! User account tools.
//!
//! The Sync API has no user delete endpoint; accounts are deactivated by
//! updating `Active` instead.

use super::{
    fail, flag, json_schema_enum, json_schema_flag, json_schema_integer, json_schema_object,
    json_schema_pattern, json_schema_string, ok_json, ok_text, parse_args, require,
    unknown_action, ListParams, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use cdsync_client::SyncClient;
use cdsync_core::types::User;
use cdsync_core::validate::{self, RESOURCE_NAME_PATTERN};
use serde::Deserialize;

/// Read-side user operations.
pub struct ReadUsersTool {
    client: SyncClient,
}

impl ReadUsersTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadUsersArgs {
    action: String,
    user: Option<String>,
    #[serde(flatten)]
    list: ListParams,
}

#[async_trait::async_trait]
impl Tool for ReadUsersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_users".to_string(),
            description: "Read CData Sync user accounts: list or count them, or fetch one by \
                          username."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["list", "count", "get"],
                        "Operation to perform"
                    ),
                    "user": json_schema_pattern(
                        RESOURCE_NAME_PATTERN,
                        "Username (required for get)"
                    ),
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
        let args: ReadUsersArgs = parse_args(arguments)?;

        match args.action.as_str() {
            "list" => match self.client.users().list(args.list.to_query()).await {
                Ok(users) => ok_json(&users),
                Err(e) => fail(&e),
            },
            "count" => match self.client.users().count(args.list.filter.as_deref()).await {
                Ok(count) => ok_text(count.to_string()),
                Err(e) => fail(&e),
            },
            "get" => {
                let user = require(&args.user, "user", "get")?;
                validate::resource_name("user", user)?;
                match self.client.users().get(user).await {
                    Ok(account) => ok_json(&account),
                    Err(e) => fail(&e),
                }
            }
            other => Err(unknown_action("read_users", other, &["list", "count", "get"]).into()),
        }
    }
}

/// Write-side user operations.
pub struct WriteUsersTool {
    client: SyncClient,
}

impl WriteUsersTool {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteUsersArgs {
    action: String,
    user: Option<String>,
    password: Option<String>,
    roles: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    active: Option<bool>,
    federation_id: Option<String>,
}

impl WriteUsersArgs {
    fn record(&self, user: &str) -> User {
        User {
            user: user.to_string(),
            password: self.password.clone(),
            roles: self.roles.clone(),
            active: self.active,
            federation_id: self.federation_id.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for WriteUsersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_users".to_string(),
            description:
                "Create or update a CData Sync user account. Deactivate an account by updating \
                 it with active=false; there is no delete."
                    .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "action": json_schema_enum(
                        &["create", "update"],
                        "Operation to perform"
                    ),
                    "user": json_schema_pattern(RESOURCE_NAME_PATTERN, "Username"),
                    "password": json_schema_string("Password (required for create)"),
                    "roles": json_schema_string(
                        "Role list, e.g. 'cdata_admin' or 'cdata_standard'"
                    ),
                    "active": json_schema_flag("Whether the account may sign in"),
                    "federationId": json_schema_string(
                        "SSO federation identifier (UUID)"
                    ),
                }),
                vec!["action", "user"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WriteUsersArgs = parse_args(arguments)?;

        let user = require(&args.user, "user", &args.action)?;
        validate::resource_name("user", user)?;
        if let Some(federation_id) = args.federation_id.as_deref() {
            validate::uuid("federationId", federation_id)?;
        }

        match args.action.as_str() {
            "create" => {
                require(&args.password, "password", "create")?;
                match self.client.users().create(&args.record(user)).await {
                    Ok(account) => ok_json(&account),
                    Err(e) => fail(&e),
                }
            }
            "update" => match self.client.users().update(user, &args.record(user)).await {
                Ok(account) => ok_json(&account),
                Err(e) => fail(&e),
            },
            other => Err(unknown_action("write_users", other, &["create", "update"]).into()),
        }
    }
}
