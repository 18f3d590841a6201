//! Shared test helpers.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AgentError, Result, ToolError};
use crate::message::Message;
use crate::provider::{CompletionProvider, GenerationOptions};
use crate::tool::{ParamSpec, Tool, ToolDescriptor};

/// One recorded `generate` call.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub system_prompt: String,
    pub options: GenerationOptions,
}

/// A mock provider that returns a sequence of scripted completions.
///
/// Returns a provider error once the script runs out.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        messages: &[Message],
        system_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            system_prompt: system_prompt.to_owned(),
            options: options.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::Provider("script exhausted".into()))
    }
}

/// Tool returning a fixed output, recording the params it was called with.
pub struct EchoTool {
    pub name: &'static str,
    pub output: &'static str,
    pub seen: Mutex<Vec<serde_json::Map<String, serde_json::Value>>>,
}

impl EchoTool {
    pub fn new(name: &'static str, output: &'static str) -> Self {
        Self {
            name,
            output,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name, format!("Echo tool {}", self.name))
            .param("item_number", ParamSpec::optional("Item number", "string"))
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<String, ToolError> {
        self.seen.lock().unwrap().push(params.clone());
        Ok(self.output.to_owned())
    }
}

/// Tool that always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("broken", "Always fails")
    }

    async fn execute(
        &self,
        _params: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<String, ToolError> {
        Err(ToolError::Upstream("connection reset".into()))
    }
}
