//! Chat backend trait and the OpenAI-compatible implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use advisor_core::{ChatOutcome, Message, Role, ToolCall, ToolDefinition};

use crate::LlmError;

/// Backend configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API endpoint (e.g. https://api.openai.com/v1)
    pub endpoint: String,
    /// API key (optional for local endpoints)
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Config for a local OpenAI-compatible server (vLLM, Ollama, etc.)
    pub fn local(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Interface to the generative reasoning service.
///
/// `generate` is open-ended; `generate_with_tools` exposes tools the model
/// may call; `extract_structured` forces the model to call one given tool
/// and returns that invocation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generate a response
    async fn generate(&self, messages: &[Message]) -> Result<ChatOutcome, LlmError>;

    /// Generate with tools the model may choose to call
    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ChatOutcome, LlmError>;

    /// Force the model to call `tool` and return the invocation.
    ///
    /// Default goes through `generate_with_tools` and rejects responses
    /// that did not call the tool; backends with native forced tool choice
    /// override this.
    async fn extract_structured(
        &self,
        messages: &[Message],
        tool: &ToolDefinition,
    ) -> Result<ToolCall, LlmError> {
        let outcome = self
            .generate_with_tools(messages, std::slice::from_ref(tool))
            .await?;
        outcome
            .tool_calls
            .into_iter()
            .find(|c| c.name == tool.name)
            .ok_or_else(|| LlmError::MissingToolCall(tool.name.clone()))
    }

    /// Model name
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat-completions backend.
///
/// Works with OpenAI, vLLM and local servers exposing the same API,
/// including native tool calling and forced tool choice.
pub struct OpenAiBackend {
    config: LlmConfig,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() && !config.endpoint.starts_with("http://localhost") {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: Option<ToolChoice>,
    ) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().map(WireTool::from).collect())
            },
            tool_choice,
        }
    }

    async fn execute(&self, request: &ChatRequest) -> Result<ChatOutcome, LlmError> {
        // Retry transient failures with exponential backoff
        let mut backoff = self.config.initial_backoff;
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    ?backoff,
                    attempt,
                    max = self.config.max_retries,
                    "Chat request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_once(request).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string())))
    }

    async fn execute_once(&self, request: &ChatRequest) -> Result<ChatOutcome, LlmError> {
        let mut req = self.client.post(self.chat_url()).json(request);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("HTTP {status}: {error_text}")));
            }
            return Err(LlmError::Api(format!("HTTP {status}: {error_text}")));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        let mut tool_calls = Vec::new();
        for wire_call in choice.message.tool_calls.unwrap_or_default() {
            tool_calls.push(wire_call.into_tool_call()?);
        }

        Ok(ChatOutcome {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn generate(&self, messages: &[Message]) -> Result<ChatOutcome, LlmError> {
        let request = self.build_request(messages, &[], None);
        self.execute(&request).await
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ChatOutcome, LlmError> {
        let request = self.build_request(messages, tools, None);
        self.execute(&request).await
    }

    async fn extract_structured(
        &self,
        messages: &[Message],
        tool: &ToolDefinition,
    ) -> Result<ToolCall, LlmError> {
        let request = self.build_request(
            messages,
            std::slice::from_ref(tool),
            Some(ToolChoice::function(&tool.name)),
        );
        let outcome = self.execute(&request).await?;
        outcome
            .tool_calls
            .into_iter()
            .find(|c| c.name == tool.name)
            .ok_or_else(|| LlmError::MissingToolCall(tool.name.clone()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Chat-completions wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    kind: String,
    function: ToolChoiceFunction,
}

#[derive(Debug, Serialize)]
struct ToolChoiceFunction {
    name: String,
}

impl ToolChoice {
    fn function(name: &str) -> Self {
        Self {
            kind: "function".to_string(),
            function: ToolChoiceFunction {
                name: name.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(msg.tool_calls.iter().map(WireToolCall::from).collect())
        };
        Self {
            role: match msg.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
                Role::Tool => "tool".to_string(),
            },
            content: msg.content.clone(),
            tool_call_id: msg.tool_call_id.clone(),
            tool_calls,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

impl From<&ToolDefinition> for WireTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            kind: "function".to_string(),
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded arguments object
    arguments: String,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: "function".to_string(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments_value().to_string(),
            },
        }
    }
}

impl WireToolCall {
    fn into_tool_call(self) -> Result<ToolCall, LlmError> {
        let arguments = serde_json::from_str(&self.function.arguments).map_err(|e| {
            LlmError::InvalidResponse(format!(
                "Malformed tool arguments for {}: {e}",
                self.function.name
            ))
        })?;
        Ok(ToolCall {
            id: self.id,
            name: self.function.name,
            arguments,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_requires_api_key_for_remote() {
        assert!(OpenAiBackend::new(LlmConfig::default()).is_err());
        assert!(OpenAiBackend::new(LlmConfig::new("sk-xxx", "gpt-4o-mini")).is_ok());
        assert!(OpenAiBackend::new(LlmConfig::local("http://localhost:8000/v1", "llama-3")).is_ok());
    }

    #[test]
    fn test_chat_url() {
        let backend = OpenAiBackend::new(LlmConfig::new("sk-xxx", "gpt-4o-mini")).unwrap();
        assert_eq!(
            backend.chat_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_serializes_tools_and_forced_choice() {
        let backend = OpenAiBackend::new(LlmConfig::new("sk-xxx", "gpt-4o-mini")).unwrap();
        let tool = ToolDefinition::new(
            "product_search",
            "Search the catalog",
            serde_json::json!({"type": "object", "properties": {}}),
        );
        let request = backend.build_request(
            &[Message::user("laptops under 1500")],
            std::slice::from_ref(&tool),
            Some(ToolChoice::function("product_search")),
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tools"][0]["function"]["name"], "product_search");
        assert_eq!(json["tool_choice"]["function"]["name"], "product_search");
    }

    #[test]
    fn test_tool_call_arguments_parsed_from_string() {
        let wire = WireToolCall {
            id: "call_1".to_string(),
            kind: "function".to_string(),
            function: WireFunctionCall {
                name: "product_search".to_string(),
                arguments: r#"{"brand": "Dell", "max_price": 1500}"#.to_string(),
            },
        };
        let call = wire.into_tool_call().unwrap();
        assert_eq!(call.get_str("brand"), Some("Dell"));
        assert_eq!(call.get_i64("max_price"), Some(1500));
    }

    #[test]
    fn test_malformed_tool_arguments_rejected() {
        let wire = WireToolCall {
            id: "call_1".to_string(),
            kind: "function".to_string(),
            function: WireFunctionCall {
                name: "product_search".to_string(),
                arguments: "not json".to_string(),
            },
        };
        assert!(matches!(
            wire.into_tool_call(),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_response_parsing_with_tool_calls() {
        let json = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "product_search",
                            "arguments": "{\"query\": \"gaming laptop\"}"
                        }
                    }]
                }
            }]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let message = &response.choices[0].message;
        assert!(message.content.is_none());
        assert_eq!(message.tool_calls.as_ref().unwrap().len(), 1);
    }
}
