//! Agent Stream Event Types
//!
//! Typed representation of the event frames emitted by the DSA Copilot backend
//! agents. Every streaming endpoint (company matcher, company researcher,
//! service categorizer, main agent) speaks the same frame vocabulary, so all
//! consumers share this one discriminated union.
//!
//! Forward compatibility: unknown event tags deserialize into
//! [`StreamEvent::Unknown`] and are ignored by consumers rather than treated
//! as errors.

use serde::{Deserialize, Serialize};

/// One decoded event from an agent stream.
///
/// The backend emits each event as a `"data: " + JSON` line; the `type` field
/// discriminates the variants below. The `node`/`agent`/`chain` fields carry
/// pipeline bookkeeping from the backend's graph runtime and are optional on
/// every variant that has them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// One increment of generated text
    Token {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
    },

    /// A model invocation began (heuristic signal only, no payload)
    LlmStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
    },

    /// A named side-operation (tool) began
    ToolStart {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<String>,
    },

    /// A named side-operation finished; the web-search tool attaches sources
    ToolEnd {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_length: Option<u64>,
        #[serde(default)]
        sources: Vec<SearchSource>,
    },

    /// Backend pipeline entered a named stage
    NodeStart {
        node: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain: Option<String>,
    },

    /// Backend pipeline left a named stage
    NodeEnd {
        node: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain: Option<String>,
    },

    /// Terminal payload of the operation; shape depends on the endpoint
    Result { data: serde_json::Value },

    /// Terminal failure with a display message
    Error { message: String },

    /// Terminal success marker with no payload
    Done,

    /// Any event tag this client does not know about
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// True for the three terminal events. At most one of them ends a given
    /// stream; nothing after a terminal event is meaningful.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Result { .. } | StreamEvent::Error { .. } | StreamEvent::Done
        )
    }
}

/// A single web-search source reported on a `tool_end` event.
///
/// Identity is the URL; the same source re-reported by a later search call
/// must be de-duplicated by consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Whether a tool name refers to the web-search tool.
///
/// The backend names vary (`web_search`, `tavily_search`, ...) so this matches
/// the same way the backend's own metric counters do: a case-insensitive
/// `"search"` substring.
pub fn is_search_tool(name: &str) -> bool {
    name.to_lowercase().contains("search")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let event = StreamEvent::Token {
            content: "Hello".to_string(),
            node: Some("researcher".to_string()),
            agent: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"token\""));
        assert!(json.contains("\"content\":\"Hello\""));

        let parsed: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn test_tool_end_with_sources() {
        let json = r#"{"type":"tool_end","name":"web_search","node":"research","output_length":1024,"sources":[{"title":"Acme","url":"https://acme.de"}]}"#;
        let parsed: StreamEvent = serde_json::from_str(json).unwrap();
        match parsed {
            StreamEvent::ToolEnd { name, sources, .. } => {
                assert_eq!(name, "web_search");
                assert_eq!(sources.len(), 1);
                assert_eq!(sources[0].url, "https://acme.de");
                assert_eq!(sources[0].title.as_deref(), Some("Acme"));
            }
            other => panic!("Expected ToolEnd, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_end_sources_default_empty() {
        let json = r#"{"type":"tool_end","name":"finish_research","node":"research"}"#;
        let parsed: StreamEvent = serde_json::from_str(json).unwrap();
        match parsed {
            StreamEvent::ToolEnd { sources, .. } => assert!(sources.is_empty()),
            other => panic!("Expected ToolEnd, got {:?}", other),
        }
    }

    #[test]
    fn test_done_has_no_payload() {
        let parsed: StreamEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert_eq!(parsed, StreamEvent::Done);
        assert!(parsed.is_terminal());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(StreamEvent::Result {
            data: serde_json::json!({}),
        }
        .is_terminal());
        assert!(StreamEvent::Error {
            message: "boom".to_string(),
        }
        .is_terminal());
        assert!(!StreamEvent::Token {
            content: "x".to_string(),
            node: None,
            agent: None,
        }
        .is_terminal());
        assert!(!StreamEvent::LlmStart {
            node: None,
            agent: None,
        }
        .is_terminal());
    }

    #[test]
    fn test_unknown_tag_is_not_fatal() {
        let parsed: StreamEvent =
            serde_json::from_str(r#"{"type":"heartbeat_v2","weird":true}"#).unwrap();
        assert_eq!(parsed, StreamEvent::Unknown);
        assert!(!parsed.is_terminal());
    }

    #[test]
    fn test_is_search_tool() {
        assert!(is_search_tool("web_search"));
        assert!(is_search_tool("Tavily_Search"));
        assert!(is_search_tool("SEARCH"));
        // "research" contains "search" — the backend's own counters treat it
        // the same way, so this is intentional.
        assert!(is_search_tool("finish_research"));
        assert!(!is_search_tool("scrape_page"));
    }
}
