//! Tool System
//!
//! Tools are registered once at startup and invoked by the orchestrator when
//! the model emits an `<Execute>` tag. The registry is name-keyed and rejects
//! duplicates; it keeps registration order so the catalog shown to the model
//! is stable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{AgentError, Result, ToolError};

/// Parameters passed to a tool
pub type ToolParams = serde_json::Map<String, serde_json::Value>;

/// Payload of an `<Execute>` tag: `{"execute_tool": "...", "params": {...}}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool identifier
    #[serde(rename = "execute_tool")]
    pub tool_name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub params: ToolParams,
}

/// Parameter definition for a tool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Value type (string, number, integer, ...)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Whether the parameter may be omitted
    #[serde(default)]
    pub optional: bool,
}

impl ParamSpec {
    pub fn required(description: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            param_type: param_type.into(),
            optional: false,
        }
    }

    pub fn optional(description: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            param_type: param_type.into(),
            optional: true,
        }
    }
}

/// Tool definition as presented to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub params: BTreeMap<String, ParamSpec>,

    /// Shape of the returned text
    pub return_schema: serde_json::Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: BTreeMap::new(),
            return_schema: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.params.insert(name.into(), spec);
        self
    }

    #[must_use]
    pub fn returns(mut self, schema: serde_json::Value) -> Self {
        self.return_schema = schema;
        self
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's descriptor
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool. The returned text (typically CSV or JSON) is handed
    /// back to the model verbatim.
    async fn execute(&self, params: &ToolParams) -> std::result::Result<String, ToolError>;

    /// Validate arguments before execution
    fn validate(&self, params: &ToolParams) -> std::result::Result<(), ToolError> {
        let descriptor = self.descriptor();

        for (name, spec) in &descriptor.params {
            let present = params.get(name).is_some_and(|v| !v.is_null());
            if !spec.optional && !present {
                return Err(ToolError::MissingParam(name.clone()));
            }
        }

        Ok(())
    }
}

/// Registry for available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.descriptor().name;
        if self.tools.contains_key(&name) {
            tracing::error!(tool = %name, "Tool already registered");
            return Err(AgentError::DuplicateRegistration { kind: "Tool", name });
        }

        tracing::debug!(tool = %name, "Registered tool");
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Register several tools; either all of them are added or none is.
    pub fn register_all<I>(&mut self, tools: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let tools: Vec<(String, Arc<dyn Tool>)> = tools
            .into_iter()
            .map(|t| (t.descriptor().name, t))
            .collect();

        let mut seen = HashSet::new();
        for (name, _) in &tools {
            if self.tools.contains_key(name) || !seen.insert(name.as_str()) {
                tracing::error!(tool = %name, "Tool already registered");
                return Err(AgentError::DuplicateRegistration {
                    kind: "Tool",
                    name: name.clone(),
                });
            }
        }

        tracing::info!("Registering {} tools", tools.len());
        for (name, tool) in tools {
            tracing::debug!(tool = %name, "Registered tool");
            self.order.push(name.clone());
            self.tools.insert(name, tool);
        }
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Dispatch an invocation to its tool.
    ///
    /// Whatever the tool fails with comes back as [`AgentError::ToolExecutionFailed`].
    pub async fn execute(&self, invocation: &ToolInvocation) -> Result<String> {
        let name = &invocation.tool_name;
        let tool = self.get(name).ok_or_else(|| {
            tracing::error!(tool = %name, "Tool not found");
            AgentError::ToolNotFound(name.clone())
        })?;

        tracing::info!(tool = %name, "Executing tool");
        tracing::debug!(tool = %name, params = ?invocation.params, "Tool parameters");

        let outcome = match tool.validate(&invocation.params) {
            Ok(()) => tool.execute(&invocation.params).await,
            Err(e) => Err(e),
        };

        outcome.map_err(|e| {
            tracing::error!(tool = %name, error = %e, "Tool execution failed");
            AgentError::ToolExecutionFailed {
                tool: name.clone(),
                cause: e.to_string(),
            }
        })
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.descriptor())
            .collect()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// JSON array describing every tool, as sent to the model
    pub fn catalog_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.descriptors())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoTool, FailingTool};
    use serde_json::json;

    struct WeatherStub;

    #[async_trait]
    impl Tool for WeatherStub {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("weather", "Get the weather for a given location")
                .param("lat", ParamSpec::required("Latitude", "number"))
                .param("lon", ParamSpec::required("Longitude", "number"))
                .returns(json!({"type": "json"}))
        }

        async fn execute(&self, params: &ToolParams) -> std::result::Result<String, ToolError> {
            Ok(format!("sunny at {},{}", params["lat"], params["lon"]))
        }
    }

    fn invocation(value: serde_json::Value) -> ToolInvocation {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_unregistered_tool_not_found() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute(&invocation(json!({"execute_tool": "weather", "params": {"lat": 1, "lon": 2}})))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(name) if name == "weather"));
    }

    #[tokio::test]
    async fn test_registered_tool_output_verbatim() {
        let mut registry = ToolRegistry::new();
        registry.register(WeatherStub).unwrap();

        let out = registry
            .execute(&invocation(json!({"execute_tool": "weather", "params": {"lat": 1, "lon": 2}})))
            .await
            .unwrap();
        assert_eq!(out, "sunny at 1,2");
    }

    #[tokio::test]
    async fn test_missing_required_param_is_execution_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(WeatherStub).unwrap();

        let err = registry
            .execute(&invocation(json!({"execute_tool": "weather", "params": {"lat": 1}})))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolExecutionFailed { ref tool, .. } if tool == "weather"));
    }

    #[tokio::test]
    async fn test_tool_error_is_wrapped() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool).unwrap();

        let err = registry
            .execute(&invocation(json!({"execute_tool": "broken"})))
            .await
            .unwrap_err();
        match err {
            AgentError::ToolExecutionFailed { tool, cause } => {
                assert_eq!(tool, "broken");
                assert!(cause.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("company_name", "ACME")).unwrap();

        let err = registry
            .register(EchoTool::new("company_name", "Other"))
            .unwrap_err();
        assert!(matches!(err, AgentError::DuplicateRegistration { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["company_name"]);
    }

    #[test]
    fn test_register_all_is_atomic() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("company_name", "ACME")).unwrap();

        let batch: Vec<Arc<dyn Tool>> = vec![
            Arc::new(EchoTool::new("company_lookup", "x")),
            Arc::new(EchoTool::new("company_name", "y")),
        ];
        assert!(registry.register_all(batch).is_err());
        assert_eq!(registry.names(), vec!["company_name"]);

        let batch: Vec<Arc<dyn Tool>> = vec![
            Arc::new(EchoTool::new("a", "x")),
            Arc::new(EchoTool::new("a", "y")),
        ];
        assert!(registry.register_all(batch).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_catalog_lists_tools_in_order() {
        let mut registry = ToolRegistry::new();
        registry.register(WeatherStub).unwrap();
        registry.register(EchoTool::new("company_name", "ACME")).unwrap();

        let catalog: serde_json::Value =
            serde_json::from_str(&registry.catalog_json().unwrap()).unwrap();
        assert_eq!(catalog[0]["name"], "weather");
        assert_eq!(catalog[0]["params"]["lat"]["type"], "number");
        assert_eq!(catalog[0]["params"]["lat"]["optional"], false);
        assert_eq!(catalog[0]["return_schema"]["type"], "json");
        assert_eq!(catalog[1]["name"], "company_name");
    }
}
