//! Blocking client for the Ollama chat API

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::types::ChatMessage;
use crate::config::LlmConfig;
use crate::errors::LlmError;
use crate::tools::ToolDefinition;

/// A language model that can answer with text or with tool calls
pub trait ChatBackend {
    fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage, LlmError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: Vec<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Wraps a tool definition in Ollama's function-tool envelope
fn function_tool(definition: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": definition.name,
            "description": definition.description,
            "parameters": definition.parameters,
        },
    })
}

pub struct OllamaBackend {
    client: Client,
    url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/api/chat", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ChatBackend for OllamaBackend {
    fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: tools.iter().map(function_tool).collect(),
            stream: false,
        };

        debug!("POST {} ({} messages)", self.url, messages.len());
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = response
            .json()
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(response.message)
    }
}
