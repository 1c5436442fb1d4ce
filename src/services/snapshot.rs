//! Context Snapshot Builder
//!
//! Renders what the user currently sees into a compact text block that rides
//! along with every chat message, so the assistant can answer questions about
//! the screen. One `PhaseView` variant per phase keeps the snapshot
//! structurally scoped: it is impossible to leak another phase's data because
//! the other phases' state is not even representable here.
//!
//! `render` is pure and cheap, safe to call on every state change.

use dsa_copilot_agents::ContextMode;
use dsa_copilot_core::{
    CompanyMatchResult, Confidence, ObligationAnalysis, SearchSource, Section,
};

use crate::models::{CompanyIdentity, ObligationFilter, ReportTab};
use crate::services::research_phase::ResearchPhase;
use crate::services::workflow::{AssessmentPhase, WorkflowController};

/// One finding as shown in the review list.
#[derive(Debug, Clone, PartialEq)]
pub struct FindingView {
    pub question: String,
    pub answer: String,
    pub source: String,
    pub confidence: Confidence,
    pub accepted: bool,
    pub edited: bool,
    pub needs_input: bool,
}

/// The edit currently open, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct EditView {
    pub question: String,
    pub buffer: String,
}

/// One manual-entry field as shown on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualFieldView {
    pub question: String,
    pub value: String,
}

/// What the visible phase shows. Exactly one variant per phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseView {
    CompanyMatch {
        input: Option<CompanyIdentity>,
        result: Option<CompanyMatchResult>,
    },
    Research {
        research_phase: ResearchPhase,
        recent_sources: Vec<SearchSource>,
        total_sources: usize,
        capped: bool,
    },
    Review {
        section: Section,
        findings: Vec<FindingView>,
        editing: Option<EditView>,
    },
    ManualEntry {
        section: Section,
        fields: Vec<ManualFieldView>,
    },
    Classify,
    Report {
        active_tab: ReportTab,
        active_filter: ObligationFilter,
        expanded: Option<ObligationAnalysis>,
    },
    Error {
        failed_phase: String,
        message: String,
    },
}

/// Snapshot of the assessment as context for a chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub phase_label: String,
    pub company_name: Option<String>,
    pub view: PhaseView,
}

/// Context mode matching the visible phase: findings questions while
/// reviewing, obligation questions on the report, general otherwise.
pub fn context_mode_for(view: &PhaseView) -> ContextMode {
    match view {
        PhaseView::Review { .. } => ContextMode::ReviewFindings,
        PhaseView::Report { .. } => ContextMode::Obligations,
        _ => ContextMode::General,
    }
}

impl ChatContext {
    /// Capture the controller's current phase into a snapshot.
    pub fn capture(workflow: &WorkflowController) -> Self {
        let view = match workflow.phase() {
            AssessmentPhase::CompanyMatch => PhaseView::CompanyMatch {
                input: workflow.identity().cloned(),
                result: workflow.match_result().cloned(),
            },
            AssessmentPhase::DeepResearch => PhaseView::Research {
                research_phase: workflow.tracker().phase(),
                recent_sources: workflow.sources().visible().iter().cloned().collect(),
                total_sources: workflow.sources().total(),
                capped: workflow.sources().is_capped(),
            },
            AssessmentPhase::Review { section } => {
                let session = workflow.review(*section);
                let findings = session
                    .map(|s| {
                        s.findings()
                            .iter()
                            .zip(s.statuses())
                            .map(|(f, st)| FindingView {
                                question: f.question.clone(),
                                answer: f.answer.clone(),
                                source: f.source.clone(),
                                confidence: f.confidence,
                                accepted: st.accepted,
                                edited: st.edited,
                                needs_input: f.information_missing(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let editing = session.and_then(|s| {
                    s.edit().map(|e| EditView {
                        question: s.findings()[e.index].question.clone(),
                        buffer: e.buffer.clone(),
                    })
                });
                PhaseView::Review {
                    section: *section,
                    findings,
                    editing,
                }
            }
            AssessmentPhase::ManualEntry { section } => PhaseView::ManualEntry {
                section: *section,
                fields: workflow
                    .draft(*section)
                    .map(|d| {
                        d.fields()
                            .iter()
                            .map(|f| ManualFieldView {
                                question: f.question.clone(),
                                value: f.value.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            AssessmentPhase::Classify => PhaseView::Classify,
            AssessmentPhase::Report => {
                let view_state = workflow.report_view();
                let expanded = view_state.expanded_article.as_ref().and_then(|article| {
                    workflow.report().and_then(|r| {
                        r.obligation_analyses
                            .iter()
                            .find(|o| &o.article == article)
                            .cloned()
                    })
                });
                PhaseView::Report {
                    active_tab: view_state.active_tab,
                    active_filter: view_state.active_filter,
                    expanded,
                }
            }
            AssessmentPhase::PhaseError { phase, message } => PhaseView::Error {
                failed_phase: phase.label().to_string(),
                message: message.clone(),
            },
        };
        Self {
            phase_label: workflow.phase().label().to_string(),
            company_name: workflow.company_name().map(str::to_string),
            view,
        }
    }

    pub fn context_mode(&self) -> ContextMode {
        context_mode_for(&self.view)
    }

    /// Render the snapshot as the text block sent with each chat message.
    /// Field order is stable so the assistant sees a consistent layout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Current phase: {}\n", self.phase_label));
        if let Some(name) = &self.company_name {
            out.push_str(&format!("Company: {name}\n"));
        }
        out.push('\n');

        match &self.view {
            PhaseView::CompanyMatch { input, result } => {
                out.push_str("[Company Identification]\n");
                if let Some(input) = input {
                    out.push_str(&format!("Input name: {}\n", input.name));
                    out.push_str(&format!("Country of establishment: {}\n", input.country));
                }
                if let Some(result) = result {
                    if let Some(exact) = &result.exact_match {
                        out.push_str(&format!(
                            "Exact match: {} ({})\n",
                            exact.name, exact.top_domain
                        ));
                    }
                    if !result.suggestions.is_empty() {
                        out.push_str("Suggestions:\n");
                        for s in &result.suggestions {
                            out.push_str(&format!("- {} ({})\n", s.name, s.top_domain));
                        }
                    }
                }
            }
            PhaseView::Research {
                research_phase,
                recent_sources,
                total_sources,
                capped,
            } => {
                out.push_str("[Research Progress]\n");
                out.push_str(&format!("Status: {}\n", research_phase.label()));
                out.push_str(&format!("Sources consulted: {total_sources}"));
                if *capped {
                    out.push_str(" (cap reached)");
                }
                out.push('\n');
                if !recent_sources.is_empty() {
                    out.push_str("Recent sources:\n");
                    for s in recent_sources {
                        match &s.title {
                            Some(title) => out.push_str(&format!("- {} ({})\n", title, s.url)),
                            None => out.push_str(&format!("- {}\n", s.url)),
                        }
                    }
                }
            }
            PhaseView::Review {
                section,
                findings,
                editing,
            } => {
                out.push_str(&format!("[Findings Under Review — {}]\n", section.label()));
                for (i, f) in findings.iter().enumerate() {
                    let status = if f.edited {
                        "edited"
                    } else if f.accepted {
                        "accepted"
                    } else if f.needs_input {
                        "needs input"
                    } else {
                        "pending"
                    };
                    out.push_str(&format!("{}. {} [{}]\n", i + 1, f.question, status));
                    out.push_str(&format!("   Answer: {}\n", f.answer));
                    out.push_str(&format!("   Source: {}\n", f.source));
                }
                if let Some(edit) = editing {
                    out.push_str(&format!("Currently editing: {}\n", edit.question));
                }
            }
            PhaseView::ManualEntry { section, fields } => {
                out.push_str(&format!("[Manual Entry — {}]\n", section.label()));
                for f in fields {
                    let value = if f.value.trim().is_empty() {
                        "(blank)"
                    } else {
                        f.value.as_str()
                    };
                    out.push_str(&format!("- {}: {}\n", f.question, value));
                }
            }
            PhaseView::Classify => {
                out.push_str("[Classification]\n");
                out.push_str("Status: classification in progress\n");
            }
            PhaseView::Report {
                active_tab,
                active_filter,
                expanded,
            } => {
                out.push_str("[Compliance Report]\n");
                out.push_str(&format!("Active tab: {}\n", active_tab.label()));
                out.push_str(&format!("Obligation filter: {}\n", active_filter.label()));
                if let Some(o) = expanded {
                    out.push_str(&format!("Expanded obligation: {} — {}\n", o.article, o.title));
                    out.push_str(&format!(
                        "Applies: {}\n",
                        if o.applies { "yes" } else { "no" }
                    ));
                    out.push_str(&format!("Implications: {}\n", o.implications));
                }
            }
            PhaseView::Error {
                failed_phase,
                message,
            } => {
                out.push_str("[Error]\n");
                out.push_str(&format!("Failed phase: {failed_phase}\n"));
                out.push_str(&format!("Message: {message}\n"));
            }
        }
        out
    }
}
