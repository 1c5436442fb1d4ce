//! Chat Session
//!
//! Context-aware assistant chat running alongside the assessment. Each send
//! carries a rendered snapshot of the current screen and a context mode;
//! while the reply streams, tokens accumulate and the name of the tool the
//! agent is running is tracked for display. A send while a reply is already
//! streaming is a no-op rather than an error.

use dsa_copilot_agents::{AgentClient, AgentError, AgentResult, EventStreamDecoder};
use dsa_copilot_core::StreamEvent;

use crate::models::ChatMessage;
use crate::services::snapshot::ChatContext;

/// Shown when a turn finished without producing a single token.
pub const FALLBACK_EMPTY: &str =
    "I'm sorry, I wasn't able to produce a response. Please try again.";

/// Shown when the request itself failed before any reply streamed.
pub const FALLBACK_CONNECTION: &str =
    "I couldn't reach the assistant service. Please check your connection and try again.";

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    streaming: bool,
    partial: String,
    current_tool: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed turns, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Tokens of the in-flight reply, for live display.
    pub fn partial_response(&self) -> &str {
        &self.partial
    }

    /// Name of the tool the agent is currently running, if any.
    pub fn current_tool(&self) -> Option<&str> {
        self.current_tool.as_deref()
    }

    /// Send a message with the current context snapshot and stream the reply
    /// to completion. Returns the final assistant content, or `None` when a
    /// reply was already streaming and the send was dropped.
    pub async fn send(
        &mut self,
        client: &AgentClient,
        message: &str,
        context: &ChatContext,
    ) -> AgentResult<Option<String>> {
        if self.streaming {
            tracing::debug!("Send ignored: a reply is already streaming");
            return Ok(None);
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(AgentError::invalid_request("Message is required"));
        }

        let snapshot = context.render();
        let mode = context.context_mode();
        match client.chat(message, Some(&snapshot), Some(mode)).await {
            Ok(decoder) => Ok(self.run_turn(message, decoder).await),
            Err(err) => {
                tracing::warn!("Chat request failed: {err}");
                self.messages.push(ChatMessage::user(message));
                self.messages.push(ChatMessage::assistant(FALLBACK_CONNECTION));
                Ok(Some(FALLBACK_CONNECTION.to_string()))
            }
        }
    }

    /// Drive one chat turn over an already-open stream. Exposed so callers
    /// owning their own transport (and tests) can reuse the turn logic.
    pub async fn run_turn(
        &mut self,
        message: &str,
        mut decoder: EventStreamDecoder,
    ) -> Option<String> {
        if self.streaming {
            return None;
        }
        self.streaming = true;
        self.partial.clear();
        self.current_tool = None;
        self.messages.push(ChatMessage::user(message));

        loop {
            match decoder.next_event().await {
                Ok(Some(event)) => match event {
                    StreamEvent::Token { content, .. } => {
                        // First token clears the tool indicator; the reply
                        // has started.
                        self.current_tool = None;
                        self.partial.push_str(&content);
                    }
                    StreamEvent::ToolStart { name, .. } => {
                        self.current_tool = Some(name);
                    }
                    StreamEvent::Done | StreamEvent::Result { .. } => break,
                    StreamEvent::Error { message } => {
                        tracing::warn!("Chat stream reported an error: {message}");
                        break;
                    }
                    _ => {}
                },
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!("Chat stream failed mid-turn: {err}");
                    break;
                }
            }
        }

        let content = if self.partial.trim().is_empty() {
            FALLBACK_EMPTY.to_string()
        } else {
            std::mem::take(&mut self.partial)
        };
        self.messages.push(ChatMessage::assistant(content.clone()));
        self.streaming = false;
        self.partial.clear();
        self.current_tool = None;
        Some(content)
    }

    /// Drop the transcript (new assessment).
    pub fn clear(&mut self) {
        self.messages.clear();
        self.partial.clear();
        self.current_tool = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    fn frames(lines: &[&str]) -> EventStreamDecoder {
        let body: String = lines.iter().map(|l| format!("data: {l}\n")).collect();
        EventStreamDecoder::from_chunks(vec![body.into_bytes()])
    }

    #[tokio::test]
    async fn test_turn_accumulates_tokens() {
        let mut chat = ChatSession::new();
        let decoder = frames(&[
            r#"{"type":"token","content":"The DSA "}"#,
            r#"{"type":"token","content":"applies here."}"#,
            r#"{"type":"done"}"#,
        ]);
        let reply = chat.run_turn("Does the DSA apply?", decoder).await.unwrap();
        assert_eq!(reply, "The DSA applies here.");
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role, ChatRole::User);
        assert_eq!(chat.messages()[1].content, "The DSA applies here.");
        assert!(!chat.is_streaming());
    }

    #[tokio::test]
    async fn test_tool_indicator_cleared_on_first_token() {
        let mut chat = ChatSession::new();
        let decoder = frames(&[
            r#"{"type":"tool_start","name":"dsa_lookup"}"#,
            r#"{"type":"tool_end","name":"dsa_lookup"}"#,
            r#"{"type":"tool_start","name":"web_search"}"#,
            r#"{"type":"token","content":"Answer"}"#,
            r#"{"type":"done"}"#,
        ]);
        // The indicator lives across consecutive tools and dies with the
        // first token; after the turn it is always cleared.
        chat.run_turn("q", decoder).await.unwrap();
        assert!(chat.current_tool().is_none());
    }

    #[tokio::test]
    async fn test_empty_turn_falls_back_to_apology() {
        let mut chat = ChatSession::new();
        let decoder = frames(&[r#"{"type":"done"}"#]);
        let reply = chat.run_turn("q", decoder).await.unwrap();
        assert_eq!(reply, FALLBACK_EMPTY);
        assert_eq!(chat.messages()[1].content, FALLBACK_EMPTY);
    }

    #[tokio::test]
    async fn test_error_event_with_tokens_keeps_tokens() {
        let mut chat = ChatSession::new();
        let decoder = frames(&[
            r#"{"type":"token","content":"Partial answer"}"#,
            r#"{"type":"error","message":"agent crashed"}"#,
        ]);
        let reply = chat.run_turn("q", decoder).await.unwrap();
        assert_eq!(reply, "Partial answer");
    }

    #[tokio::test]
    async fn test_stream_end_without_terminal_finalizes() {
        let mut chat = ChatSession::new();
        let decoder = frames(&[r#"{"type":"token","content":"Half a"}"#]);
        let reply = chat.run_turn("q", decoder).await.unwrap();
        assert_eq!(reply, "Half a");
    }

    #[tokio::test]
    async fn test_send_requires_nonempty_message() {
        let client = AgentClient::new("http://localhost:8001");
        let mut chat = ChatSession::new();
        let ctx = ChatContext {
            phase_label: "Company Identification".to_string(),
            company_name: None,
            view: crate::services::snapshot::PhaseView::Classify,
        };
        let err = chat.send(&client, "   ", &ctx).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest { .. }));
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn test_clear_drops_transcript() {
        let mut chat = ChatSession::new();
        chat.messages.push(ChatMessage::user("hi"));
        chat.clear();
        assert!(chat.messages().is_empty());
    }
}
