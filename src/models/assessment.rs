//! Assessment State Models
//!
//! Local state types for a running assessment that never cross the wire as-is:
//! the user's company input, manual-entry drafts for the opt-out path, and the
//! report view state mirrored into the chat context.

use serde::{Deserialize, Serialize};

use dsa_copilot_core::{Confidence, CoreError, CoreResult, Finding, Section};

/// The company as entered by the user, enriched once a match is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyIdentity {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_long: Option<String>,
}

impl CompanyIdentity {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            top_domain: None,
            summary_long: None,
        }
    }
}

/// One question the user fills in by hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualField {
    pub question: String,
    pub value: String,
}

/// Questions for one section when the user skips automated research. Field
/// order is fixed; the section is complete when every field has text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualSectionDraft {
    section: Section,
    fields: Vec<ManualField>,
}

impl ManualSectionDraft {
    pub fn new(section: Section, questions: &[&str]) -> Self {
        Self {
            section,
            fields: questions
                .iter()
                .map(|q| ManualField {
                    question: (*q).to_string(),
                    value: String::new(),
                })
                .collect(),
        }
    }

    /// Draft seeded with the built-in question catalog for a section.
    pub fn for_section(section: Section) -> Self {
        Self::new(section, default_questions(section))
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn fields(&self) -> &[ManualField] {
        &self.fields
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> CoreResult<()> {
        let field = self
            .fields
            .get_mut(index)
            .ok_or_else(|| CoreError::validation(format!("No field at index {index}")))?;
        field.value = value.into();
        Ok(())
    }

    /// All fields filled with non-blank text.
    pub fn is_complete(&self) -> bool {
        !self.fields.is_empty() && self.fields.iter().all(|f| !f.value.trim().is_empty())
    }

    /// Convert the draft into findings equivalent to a reviewed section.
    /// User-entered answers carry full confidence.
    pub fn to_findings(&self) -> Vec<Finding> {
        self.fields
            .iter()
            .map(|f| Finding {
                section: self.section.label().to_string(),
                question: f.question.clone(),
                answer: f.value.trim().to_string(),
                source: "User provided".to_string(),
                confidence: Confidence::High,
                information_found: Some(true),
            })
            .collect()
    }
}

/// Built-in question catalog for manual entry, one list per section.
pub fn default_questions(section: Section) -> &'static [&'static str] {
    match section {
        Section::TerritorialScope => &[
            "In which EU member states is the service offered or accessible?",
            "Where is the company established or legally represented in the EU?",
            "Does the service target EU users (language, currency, marketing)?",
        ],
        Section::CompanySize => &[
            "How many employees does the company have?",
            "What is the company's annual turnover?",
            "How many average monthly active users does the service have in the EU?",
        ],
        Section::ServiceType => &[
            "What type of digital service does the company provide?",
            "Does the service store or transmit content provided by its users?",
            "Does the service disseminate user content to the public?",
            "Does the service allow consumers to conclude distance contracts with traders?",
        ],
    }
}

/// Report tab the user is looking at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportTab {
    #[default]
    Classification,
    Obligations,
    Summary,
}

impl ReportTab {
    pub fn label(&self) -> &'static str {
        match self {
            ReportTab::Classification => "Classification",
            ReportTab::Obligations => "Obligations",
            ReportTab::Summary => "Summary",
        }
    }
}

/// Filter over the obligations list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObligationFilter {
    #[default]
    All,
    Applicable,
    NotApplicable,
}

impl ObligationFilter {
    pub fn label(&self) -> &'static str {
        match self {
            ObligationFilter::All => "All",
            ObligationFilter::Applicable => "Applicable",
            ObligationFilter::NotApplicable => "Not applicable",
        }
    }
}

/// What the report view currently shows. Only this, never the full report,
/// goes into the chat context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReportViewState {
    pub active_tab: ReportTab,
    pub active_filter: ObligationFilter,
    /// Article id of the single expanded obligation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_article: Option<String>,
}
