//! Scripted chat backend for orchestration tests
//!
//! Responses are consumed in order across all generation entry points, so a
//! test scripts the exact sequence of service replies a turn will see and
//! can assert on the message sequences the code sent.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use advisor_core::{ChatOutcome, Message, ToolCall, ToolDefinition};
use advisor_llm::{ChatBackend, LlmError};

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    script: Mutex<VecDeque<Result<ChatOutcome, LlmError>>>,
    /// Message sequences received, one entry per generation call
    pub calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) {
        self.push(Ok(ChatOutcome::text(text)));
    }

    pub fn push_tool_call(&self, name: &str, arguments: serde_json::Value) {
        self.push_tool_calls(&[(name, arguments)]);
    }

    /// Script one outcome carrying several invocations, each with its own id
    pub fn push_tool_calls(&self, calls: &[(&str, serde_json::Value)]) {
        let entry = self.script.lock().unwrap().len() + 1;
        let tool_calls = calls
            .iter()
            .enumerate()
            .map(|(i, (name, arguments))| {
                let arguments: HashMap<String, serde_json::Value> = arguments
                    .as_object()
                    .map(|obj| obj.clone().into_iter().collect())
                    .unwrap_or_default();
                ToolCall {
                    id: format!("call_{entry}_{}", i + 1),
                    name: name.to_string(),
                    arguments,
                }
            })
            .collect();
        self.push(Ok(ChatOutcome {
            text: String::new(),
            tool_calls,
        }));
    }

    pub fn push_failure(&self) {
        self.push(Err(LlmError::Api("scripted failure".to_string())));
    }

    fn push(&self, entry: Result<ChatOutcome, LlmError>) {
        self.script.lock().unwrap().push_back(entry);
    }

    pub fn calls_made(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, messages: &[Message]) -> Result<ChatOutcome, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Generation("script exhausted".to_string())))
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn generate(&self, messages: &[Message]) -> Result<ChatOutcome, LlmError> {
        self.next(messages)
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ChatOutcome, LlmError> {
        self.next(messages)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
