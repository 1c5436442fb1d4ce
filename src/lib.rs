//! DSA Copilot
//!
//! Client core for a guided Digital Services Act compliance assessment.
//! Everything the backend streams — company matching, deep research,
//! classification, chat — arrives as `"data: " + JSON` frames; this crate
//! decodes them, drives the assessment state machine, gates the per-section
//! findings review, and keeps the assistant chat supplied with a snapshot of
//! what the user currently sees.
//!
//! Layering:
//!
//! - `dsa-copilot-core` — wire event types, domain models, core errors
//! - `dsa-copilot-agents` — streaming HTTP client and frame decoder
//! - this crate — assessment engines on top of both:
//!   - `services::workflow` - phase state machine and canonical state
//!   - `services::sources` / `services::research_phase` - research progress
//!   - `services::review` - per-section findings review
//!   - `services::snapshot` - chat context capture and rendering
//!   - `services::chat` - context-aware assistant chat

pub mod models;
pub mod services;

// ── Re-exports ──────────────────────────────────────────────────────────────

pub use dsa_copilot_agents::{
    AgentClient, AgentError, AgentResult, CancelToken, ContextMode, EventStreamDecoder,
    FrameBuffer, SessionHandle,
};
pub use dsa_copilot_core::{
    CompanyMatch, CompanyMatchResult, CompanyResearchResult, ComplianceReport, Confidence,
    CoreError, CoreResult, Finding, SearchSource, Section, StreamEvent,
};
pub use models::{ChatMessage, ChatRole, CompanyIdentity, ManualSectionDraft, ReportViewState};
pub use services::{
    AssessmentPhase, ChatContext, ChatSession, PhaseView, ResearchPhase, ReviewSession,
    SourceAggregator, WorkflowController, WorkflowEvent,
};
