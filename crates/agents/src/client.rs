//! Agent Client
//!
//! Typed request builders for the four DSA Copilot streaming endpoints.
//! Each call validates its input locally (mirroring the backend's 400s),
//! POSTs the JSON body, checks the response status eagerly, and hands the
//! body to an [`EventStreamDecoder`]. No retry, reconnect, or timeout logic
//! lives here — transport failures surface to the caller, which owns the
//! phase-scoped retry policy.

use serde::Serialize;
use uuid::Uuid;

use crate::decoder::EventStreamDecoder;
use crate::error::{AgentError, AgentResult};

/// Explicit, narrowly-scoped session identity injected into every request.
///
/// The backend keys stream replay and admin tracking off this id. Created
/// per assessment; `reset` mints a fresh id for a new assessment rather than
/// reusing ambient global state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: String,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Mint a fresh session id, abandoning the old one.
    pub fn reset(&mut self) {
        self.session_id = Uuid::new_v4().to_string();
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Context mode for the main agent, steering its specialized behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    ReviewFindings,
    Obligations,
    General,
}

impl ContextMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::ReviewFindings => "review_findings",
            ContextMode::Obligations => "obligations",
            ContextMode::General => "general",
        }
    }
}

#[derive(Debug, Serialize)]
struct CompanyMatcherRequest<'a> {
    company_name: &'a str,
    country_of_establishment: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CompanyResearcherRequest<'a> {
    company_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_domain: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary_long: Option<&'a str>,
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ServiceCategorizerRequest<'a> {
    company_profile: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_domain: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary_long: Option<&'a str>,
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct MainAgentRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    frontend_context: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_mode: Option<ContextMode>,
    session_id: &'a str,
}

/// Streaming client for the DSA Copilot backend agents.
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl AgentClient {
    /// Create a client against the given API base URL (e.g.
    /// "http://localhost:8001"). Trailing slashes are stripped so endpoint
    /// paths concatenate cleanly.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_session(base_url, SessionHandle::new())
    }

    /// Create a client reusing an existing session identity.
    pub fn with_session(base_url: impl Into<String>, session: SessionHandle) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("Agent client initialized: base_url={}", base_url);
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Replace the session identity (new assessment).
    pub fn reset_session(&mut self) {
        self.session.reset();
    }

    /// Start a company-matching stream.
    pub async fn match_company(
        &self,
        company_name: &str,
        country_of_establishment: &str,
    ) -> AgentResult<EventStreamDecoder> {
        let company_name = company_name.trim();
        let country = country_of_establishment.trim();
        if company_name.is_empty() {
            return Err(AgentError::invalid_request("Company name is required"));
        }
        if country.is_empty() {
            return Err(AgentError::invalid_request(
                "Country of establishment is required",
            ));
        }

        let body = CompanyMatcherRequest {
            company_name,
            country_of_establishment: country,
            session_id: self.session.id(),
        };
        self.open_stream("/agents/company_matcher/stream", &body)
            .await
    }

    /// Start a company-research stream.
    pub async fn research_company(
        &self,
        company_name: &str,
        top_domain: Option<&str>,
        summary_long: Option<&str>,
    ) -> AgentResult<EventStreamDecoder> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(AgentError::invalid_request("Company name is required"));
        }

        let body = CompanyResearcherRequest {
            company_name,
            top_domain: top_domain.map(str::trim).filter(|s| !s.is_empty()),
            summary_long: summary_long.map(str::trim).filter(|s| !s.is_empty()),
            session_id: self.session.id(),
        };
        self.open_stream("/agents/company_researcher/stream", &body)
            .await
    }

    /// Start a classification stream over the reviewed company profile.
    pub async fn categorize_service(
        &self,
        company_profile: &serde_json::Value,
        top_domain: Option<&str>,
        summary_long: Option<&str>,
    ) -> AgentResult<EventStreamDecoder> {
        let body = ServiceCategorizerRequest {
            company_profile,
            top_domain: top_domain.map(str::trim).filter(|s| !s.is_empty()),
            summary_long: summary_long.map(str::trim).filter(|s| !s.is_empty()),
            session_id: self.session.id(),
        };
        self.open_stream("/agents/service_categorizer/stream", &body)
            .await
    }

    /// Start a chat turn with the main agent, carrying the latest context
    /// snapshot.
    pub async fn chat(
        &self,
        message: &str,
        frontend_context: Option<&str>,
        context_mode: Option<ContextMode>,
    ) -> AgentResult<EventStreamDecoder> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AgentError::invalid_request("Message is required"));
        }

        let body = MainAgentRequest {
            message,
            frontend_context,
            context_mode,
            session_id: self.session.id(),
        };
        self.open_stream("/agents/main_agent/stream", &body).await
    }

    /// POST the body and wrap the validated response in a decoder. A non-2xx
    /// status fails here, before any events are yielded.
    async fn open_stream<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> AgentResult<EventStreamDecoder> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Agent stream POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(AgentError::network)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!("Agent API error: HTTP {} from {} — {}", status, url, body_text);
            return Err(AgentError::RequestFailed {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Ok(EventStreamDecoder::from_response(response))
    }
}
