//! Domain Models
//!
//! Typed payloads carried by terminal `result` events, mirroring the backend
//! agents' output schemas: company matching, per-question research findings,
//! and the DSA classification report. The backend tolerates extra fields, so
//! every struct here deserializes leniently and serializes without nulls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel answer the researcher emits when a question could not be answered
/// from public sources. A finding carrying it must be completed by the user
/// before the section can advance.
pub const NOT_PUBLIC_SENTINEL: &str = "Information not publicly available";

// ============================================================================
// Company matching
// ============================================================================

/// Match confidence reported by the company matcher.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    Exact,
    High,
    Medium,
    Low,
}

/// A single company match candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyMatch {
    pub name: String,
    /// Top domain only (e.g. "acme.de", no scheme/path)
    pub top_domain: String,
    pub confidence: MatchConfidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_short: Option<String>,
    #[serde(default)]
    pub summary_long: String,
}

/// Final output from the company matcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyMatchResult {
    pub input_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<CompanyMatch>,
    #[serde(default)]
    pub suggestions: Vec<CompanyMatch>,
}

impl CompanyMatchResult {
    /// The match that confirms without a user pick: an exact match with exact
    /// confidence. Anything weaker goes through suggestion selection.
    pub fn auto_confirmable(&self) -> Option<&CompanyMatch> {
        self.exact_match
            .as_ref()
            .filter(|m| m.confidence == MatchConfidence::Exact)
    }
}

// ============================================================================
// Research findings
// ============================================================================

/// Confidence attached to a research finding. The backend emits capitalized
/// words ("High"), and user-edited findings are always forced to High.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

/// One question/answer pair produced by automated research or manual entry,
/// subject to user review before it feeds classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Free-text section name from the backend's question catalog
    pub section: String,
    pub question: String,
    pub answer: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub confidence: Confidence,
    /// Explicit "nothing found" flag; older backend versions omit it and
    /// signal via the sentinel answer instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_found: Option<bool>,
}

fn default_source() -> String {
    "Unknown".to_string()
}

impl Finding {
    /// Whether research came up empty for this question, either by explicit
    /// flag or by the sentinel answer text.
    pub fn information_missing(&self) -> bool {
        if self.information_found == Some(false) {
            return true;
        }
        self.answer.trim().eq_ignore_ascii_case(NOT_PUBLIC_SENTINEL)
    }
}

/// Aggregated research output: one finding per catalog question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyResearchResult {
    pub company_name: String,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
    pub answers: Vec<Finding>,
}

// ============================================================================
// Review sections
// ============================================================================

/// The three fixed topical groupings of findings. Review happens one section
/// at a time, in this order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    TerritorialScope,
    CompanySize,
    ServiceType,
}

impl Section {
    /// Review order. `ALL[i + 1]` is the section after `ALL[i]`.
    pub const ALL: [Section; 3] = [
        Section::TerritorialScope,
        Section::CompanySize,
        Section::ServiceType,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::TerritorialScope => "Territorial Scope",
            Section::CompanySize => "Company Size",
            Section::ServiceType => "Service Type",
        }
    }

    /// Position in the review order (0-based).
    pub fn index(&self) -> usize {
        match self {
            Section::TerritorialScope => 0,
            Section::CompanySize => 1,
            Section::ServiceType => 2,
        }
    }

    /// Section after this one, if any.
    pub fn next(&self) -> Option<Section> {
        Section::ALL.get(self.index() + 1).copied()
    }

    /// Section before this one, if any.
    pub fn prev(&self) -> Option<Section> {
        self.index().checked_sub(1).map(|i| Section::ALL[i])
    }

    /// Map a backend free-text section name onto one of the three review
    /// sections. The question catalog is a CSV maintained by hand, so this
    /// matches keywords rather than exact strings. Unmatched names fold into
    /// the last section so no finding is dropped.
    pub fn classify(raw: &str) -> Section {
        let lower = raw.to_lowercase();
        if lower.contains("territorial") || lower.contains("scope") || lower.contains("geograph") {
            Section::TerritorialScope
        } else if lower.contains("size") {
            Section::CompanySize
        } else {
            Section::ServiceType
        }
    }
}

// ============================================================================
// Classification / compliance report
// ============================================================================

/// DSA classification result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub is_in_scope: bool,
    /// "Mere Conduit", "Caching", "Hosting", "Not Applicable"
    pub service_category: String,
    pub is_online_platform: bool,
    pub is_marketplace: bool,
    pub is_search_engine: bool,
    pub is_vlop_vlose: bool,
    pub reasoning: String,
}

/// Analysis of one DSA obligation for a specific company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObligationAnalysis {
    pub article: String,
    pub title: String,
    pub applies: bool,
    pub implications: String,
    #[serde(default)]
    pub action_items: Vec<String>,
}

/// Final compliance assessment report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub company_name: String,
    pub classification: Classification,
    #[serde(default)]
    pub obligation_analyses: Vec<ObligationAnalysis>,
    #[serde(default)]
    pub summary: String,
}
