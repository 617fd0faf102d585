//! Conversation orchestration
//!
//! Turns a question into an answer by letting a language model call the
//! inverter tools. Only the question and the final answer of each turn are
//! kept in the session history.

pub mod ollama;
pub mod session;
pub mod types;

use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::errors::LlmError;
use crate::synkctl::{CommandRunner, SynkctlRunner};
use crate::tools::{ToolDefinition, ToolRegistry};
pub use ollama::{ChatBackend, OllamaBackend};
pub use session::SessionStore;
pub use types::{ChatMessage, Role, ToolCall};

pub const SYSTEM_PROMPT: &str = "You are an assistant that answers questions about a user's photovoltaic system \
including the inverter, battery, input (e.g. solar panels), grid connection and the load. \
The inverter is manufactured by SunSynk. You do not have access to historic data, \
aggregate data or trends. You can only access current, instantaneous data about the inverter, \
battery, solar panels, grid and load. Answer questions or instructions concisely.";

const REMINDER: &str = "\nRemember: Answer concisely.";

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Removes a leading `<think>...</think>` reasoning block from a model answer.
///
/// An unclosed block means the whole message is reasoning, so nothing is left.
pub fn strip_thinking(message: &str) -> &str {
    let message = message.trim();
    match message.strip_prefix(THINK_OPEN) {
        Some(rest) => match rest.find(THINK_CLOSE) {
            Some(end) => rest[end + THINK_CLOSE.len()..].trim(),
            None => "",
        },
        None => message,
    }
}

pub struct Orchestrator<B, R = SynkctlRunner> {
    backend: B,
    registry: ToolRegistry<R>,
    sessions: SessionStore,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl<B: ChatBackend, R: CommandRunner> Orchestrator<B, R> {
    pub fn new(backend: B, registry: ToolRegistry<R>, config: &LlmConfig) -> Self {
        Self {
            backend,
            registry,
            sessions: SessionStore::new(config.history_limit),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
            max_tool_rounds: config.max_tool_rounds,
        }
    }

    pub fn registry(&self) -> &ToolRegistry<R> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Starts `session` over with an empty history
    pub fn reset(&mut self, session: &str) {
        if self.sessions.clear(session) {
            info!("Cleared history of session {}", session);
        }
    }

    /// Answers `question` in the context of `session`
    pub fn ask(&mut self, session: &str, question: &str) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(self.sessions.history(session).len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.extend_from_slice(self.sessions.history(session));
        messages.push(ChatMessage::user(format!("{}{}", question, REMINDER)));

        let tools: Vec<ToolDefinition> = self.registry.definitions();
        let reply = self.run_tools(&mut messages, &tools)?;

        let answer = strip_thinking(&reply.content).to_string();
        if answer.is_empty() {
            warn!("Model returned no answer text");
        }
        info!("Answered question in session {}", session);

        self.sessions.record(
            session,
            ChatMessage::user(question),
            ChatMessage::assistant(answer.as_str()),
        );
        Ok(answer)
    }

    /// Lets the model call tools until it replies without tool calls
    fn run_tools(
        &self,
        messages: &mut Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage, LlmError> {
        for round in 1..=self.max_tool_rounds {
            let reply = self.backend.chat(messages, tools)?;
            if reply.tool_calls.is_empty() {
                return Ok(reply);
            }

            debug!("Round {}: {} tool call(s)", round, reply.tool_calls.len());
            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in calls {
                let outcome = self
                    .registry
                    .call(&call.function.name, &call.function.arguments);
                messages.push(ChatMessage::tool(call.function.name, outcome.to_json()));
            }
        }

        Err(LlmError::TooManyToolRounds(self.max_tool_rounds))
    }
}
