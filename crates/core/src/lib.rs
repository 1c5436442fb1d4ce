//! DSA Copilot Core
//!
//! Foundational types for the DSA Copilot workspace: the agent stream event
//! vocabulary, the domain models carried by terminal `result` payloads, and
//! the core error type. This crate has zero dependencies on transport or
//! application-level code (HTTP client, workflow engine, chat).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `streaming` - Typed agent stream events (`StreamEvent`, `SearchSource`)
//! - `models` - Domain payloads (match results, findings, compliance report)
//!
//! ## Design Principles
//!
//! 1. **Minimal dependencies** - serde/serde_json/thiserror/chrono only
//! 2. **Lenient decoding** - unknown event tags and extra fields are ignored,
//!    never fatal (the wire format is owned by the backend and may grow)
//! 3. **Unidirectional dependency** - this crate depends on nothing else in
//!    the workspace

pub mod error;
pub mod models;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{is_search_tool, SearchSource, StreamEvent};

// ── Domain Models ──────────────────────────────────────────────────────
pub use models::{
    Classification, CompanyMatch, CompanyMatchResult, CompanyResearchResult, ComplianceReport,
    Confidence, Finding, MatchConfidence, ObligationAnalysis, Section, NOT_PUBLIC_SENTINEL,
};
