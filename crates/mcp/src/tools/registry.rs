//! Tool trait, registry, and JSON-Schema helpers.

use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool executor trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// The schema advertised in `tools/list`.
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the given arguments.
    ///
    /// Argument and validation failures return `Err`; upstream API failures
    /// return `Ok` with `is_error` set so the JSON-RPC envelope survives.
    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult>;
}

/// Registry of available tools, listed in name order.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool under its schema name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tool schemas, in name order.
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helpers for building tool input schemas.

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

/// String schema constrained to one of the given values.
pub fn json_schema_enum(values: &[&str], description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

/// String schema constrained by a regex pattern.
pub fn json_schema_pattern(pattern: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "pattern": pattern,
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

/// Boolean that also accepts `"true"`/`"false"` strings.
pub fn json_schema_flag(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": ["boolean", "string"],
        "description": description
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CallToolResult;

    struct FakeTool(&'static str);

    #[async_trait::async_trait]
    impl Tool for FakeTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.0.to_string(),
                description: "fake".to_string(),
                input_schema: json_schema_object(serde_json::json!({}), vec![]),
            }
        }

        async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
            Ok(CallToolResult::text("ok"))
        }
    }

    #[test]
    fn registry_lists_in_name_order() {
        let mut registry = ToolRegistry::new();
        registry.register(std::sync::Arc::new(FakeTool("write_jobs")));
        registry.register(std::sync::Arc::new(FakeTool("read_jobs")));
        registry.register(std::sync::Arc::new(FakeTool("execute_job")));

        let names: Vec<String> = registry
            .list_schemas()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["execute_job", "read_jobs", "write_jobs"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("read_jobs").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn enum_schema_shape() {
        let schema = json_schema_enum(&["list", "get"], "the action");
        assert_eq!(schema["enum"][0], "list");
        assert_eq!(schema["type"], "string");
    }
}
