//! Per-session conversation history

use std::collections::HashMap;

use super::types::ChatMessage;

/// Question/answer history keyed by session identifier
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Vec<ChatMessage>>,
    limit: usize,
}

impl SessionStore {
    /// `limit` caps the messages kept per session; 0 keeps everything
    pub fn new(limit: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            limit,
        }
    }

    pub fn history(&self, session: &str) -> &[ChatMessage] {
        self.sessions
            .get(session)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Appends one exchange, dropping the oldest exchanges beyond the limit.
    ///
    /// Whole question/answer pairs are dropped so the history never starts
    /// with an orphaned answer.
    pub fn record(&mut self, session: &str, question: ChatMessage, answer: ChatMessage) {
        let history = self.sessions.entry(session.to_string()).or_default();
        history.push(question);
        history.push(answer);

        if self.limit > 0 && history.len() > self.limit {
            let excess = (history.len() - self.limit).div_ceil(2) * 2;
            history.drain(..excess);
        }
    }

    /// Forgets the history of `session`. Returns whether there was any.
    pub fn clear(&mut self, session: &str) -> bool {
        self.sessions.remove(session).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
