//! Name-keyed registry of local tools.

use std::collections::HashMap;
use std::sync::Arc;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolDefinition;
use super::validation::validate_arguments;
use crate::error::RelayError;
use crate::types::{FunctionCallRequest, RawArguments};

/// Maps tool names to local callables.
///
/// Registration happens up front; afterwards the registry is shared
/// read-only (typically behind an `Arc`) across concurrent runs.
#[derive(Default)]
pub struct FunctionRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

/// A call whose tool is resolved and whose arguments passed validation.
#[derive(Clone)]
pub struct PreparedCall {
    pub call_id: String,
    pub tool: Arc<dyn Tool>,
    pub args: ToolArguments,
}

impl PreparedCall {
    /// Run the tool. Its own failure surfaces as [`RelayError::ToolExecution`].
    pub async fn execute(&self) -> Result<serde_json::Value, RelayError> {
        let ctx = ToolExecutionContext {
            call_id: self.call_id.clone(),
            tool_name: self.tool.name().to_string(),
            metadata: serde_json::Value::Null,
        };
        self.tool
            .execute(&self.args, &ctx)
            .await
            .map_err(|err| match err {
                err @ (RelayError::ToolExecution { .. } | RelayError::ArgumentError { .. }) => err,
                other => RelayError::tool(self.tool.name(), other.to_string()),
            })
    }
}

impl std::fmt::Debug for PreparedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedCall")
            .field("call_id", &self.call_id)
            .field("tool", &self.tool.name())
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<ToolDefinition, RelayError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<ToolDefinition, RelayError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RelayError::DuplicateTool(name));
        }
        let definition = definition_of(tool.as_ref());
        tracing::debug!(tool = %name, strict = definition.strict, "registered tool");
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(definition)
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, RelayError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| RelayError::UnknownTool(name.to_string()))
    }

    /// Resolve the call's tool and parse and validate its arguments without running anything.
    pub fn prepare(&self, call: &FunctionCallRequest) -> Result<PreparedCall, RelayError> {
        let tool = self.resolve(&call.name)?;
        let args = ToolArguments::parse(&call.name, &call.arguments)?;
        validate_arguments(args.raw(), &tool.parameters().schema)
            .map_err(|violation| RelayError::arguments(&call.name, violation.to_string()))?;
        Ok(PreparedCall {
            call_id: call.call_id.clone(),
            tool,
            args,
        })
    }

    /// Parse, validate and run a tool by name.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: impl Into<RawArguments>,
    ) -> Result<serde_json::Value, RelayError> {
        let call = FunctionCallRequest {
            call_id: String::new(),
            name: name.to_string(),
            arguments: arguments.into(),
        };
        self.prepare(&call)?.execute().await
    }

    /// Definitions of all registered tools, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| definition_of(tool.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

fn definition_of(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters().schema.clone(),
        strict: tool.strict(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{AgentTool, ToolParameters};
    use serde_json::json;

    fn echo() -> AgentTool {
        AgentTool::new(
            "echo",
            "Echo the text back",
            ToolParameters::object().string("text", "Text to echo", true).build(),
            |args, _ctx| async move { Ok(json!({ "text": args.get_str("text")? })) },
        )
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = FunctionRegistry::new();
        registry.register(echo()).unwrap();

        let err = registry.register(echo()).unwrap_err();

        assert!(matches!(err, RelayError::DuplicateTool(ref name) if name == "echo"));
    }

    #[test]
    fn resolve_unknown_is_unknown_tool() {
        let registry = FunctionRegistry::new();
        assert!(matches!(registry.resolve("nope"), Err(RelayError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn invoke_accepts_string_or_structured_arguments() {
        let mut registry = FunctionRegistry::new();
        registry.register(echo()).unwrap();

        let from_text = registry.invoke("echo", r#"{"text":"hola"}"#).await.unwrap();
        let from_value = registry.invoke("echo", json!({ "text": "hola" })).await.unwrap();

        assert_eq!(from_text, json!({ "text": "hola" }));
        assert_eq!(from_text, from_value);
    }

    #[tokio::test]
    async fn invoke_rejects_missing_mistyped_and_extra_arguments() {
        let mut registry = FunctionRegistry::new();
        registry.register(echo()).unwrap();

        for args in [json!({}), json!({ "text": 3 }), json!({ "text": "a", "other": 1 })] {
            let err = registry.invoke("echo", args).await.unwrap_err();
            assert!(matches!(err, RelayError::ArgumentError { .. }), "{err}");
        }
    }

    #[tokio::test]
    async fn tool_failure_surfaces_as_tool_execution() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(AgentTool::new("fail", "", ToolParameters::empty(), |_, _| async {
                Err(RelayError::InvalidState("ledger locked".into()))
            }))
            .unwrap();

        let err = registry.invoke("fail", "{}").await.unwrap_err();

        assert!(matches!(err, RelayError::ToolExecution { ref tool_name, ref message }
            if tool_name == "fail" && message.contains("ledger locked")));
    }

    #[test]
    fn definitions_keep_registration_order() {
        let mut registry = FunctionRegistry::new();
        registry.register(echo()).unwrap();
        registry
            .register(AgentTool::new("zeta", "", ToolParameters::empty(), |_, _| async {
                Ok(json!(null))
            }))
            .unwrap();

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();

        assert_eq!(names, vec!["echo", "zeta"]);
        assert!(registry.definitions()[0].strict);
    }
}
