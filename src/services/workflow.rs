//! Workflow Controller
//!
//! The assessment pipeline as an explicit state machine:
//!
//! company_match → deep_research → review (×3 sections) → classify → report
//!
//! with a manual-entry branch replacing research+review when the user opts
//! out of automated matching, and a phase-scoped error state any streaming
//! phase can fall into. All canonical assessment state lives here; views and
//! the chat context are derived from it.
//!
//! State changes go through [`WorkflowController::apply`] with a
//! [`WorkflowEvent`]; events that make no sense in the current phase are
//! rejected with `CoreError::Validation` and change nothing.

use dsa_copilot_core::{
    CompanyMatch, CompanyMatchResult, CompanyResearchResult, ComplianceReport, CoreError,
    CoreResult, Finding, Section, StreamEvent,
};

use crate::models::{CompanyIdentity, ManualSectionDraft, ReportViewState};
use crate::services::research_phase::ResearchPhaseTracker;
use crate::services::review::ReviewSession;
use crate::services::sources::SourceAggregator;

/// Where the assessment currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentPhase {
    CompanyMatch,
    DeepResearch,
    ManualEntry { section: Section },
    Review { section: Section },
    Classify,
    Report,
    /// A streaming phase failed. Retry re-enters the wrapped phase.
    PhaseError {
        phase: Box<AssessmentPhase>,
        message: String,
    },
}

impl AssessmentPhase {
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentPhase::CompanyMatch => "Company Identification",
            AssessmentPhase::DeepResearch => "Deep Research",
            AssessmentPhase::ManualEntry { .. } => "Manual Entry",
            AssessmentPhase::Review { .. } => "Findings Review",
            AssessmentPhase::Classify => "Classification",
            AssessmentPhase::Report => "Compliance Report",
            AssessmentPhase::PhaseError { .. } => "Error",
        }
    }

    /// Phases driven by a backend stream, and therefore able to fail into
    /// `PhaseError`.
    fn is_streaming(&self) -> bool {
        matches!(
            self,
            AssessmentPhase::CompanyMatch
                | AssessmentPhase::DeepResearch
                | AssessmentPhase::Classify
        )
    }
}

/// Everything that can move the workflow forward (or back).
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// The company matcher finished. Auto-confirms on an exact match.
    MatchCompleted(CompanyMatchResult),
    /// The user picked a match (or confirmed a non-exact one).
    CompanyConfirmed(CompanyMatch),
    /// The user opted out of matching and will enter data by hand.
    ManualEntryRequested,
    /// The researcher finished; findings go into section review.
    ResearchCompleted(CompanyResearchResult),
    /// The current review section was approved (all findings accepted).
    SectionApproved,
    /// The current manual section is complete.
    ManualSectionCompleted,
    /// The classifier finished.
    ClassificationCompleted(ComplianceReport),
    /// The stream backing the current phase failed.
    StreamFailed { message: String },
    /// Go back one review/manual step.
    Back,
    /// Re-enter the failed phase after a `StreamFailed`.
    Retry,
}

pub struct WorkflowController {
    phase: AssessmentPhase,
    identity: Option<CompanyIdentity>,
    match_result: Option<CompanyMatchResult>,
    confirmed: Option<CompanyMatch>,
    research: Option<CompanyResearchResult>,
    reviews: [Option<ReviewSession>; 3],
    drafts: [Option<ManualSectionDraft>; 3],
    completed: [bool; 3],
    manual_mode: bool,
    sources: SourceAggregator,
    tracker: ResearchPhaseTracker,
    report: Option<ComplianceReport>,
    report_view: ReportViewState,
}

impl WorkflowController {
    pub fn new() -> Self {
        Self {
            phase: AssessmentPhase::CompanyMatch,
            identity: None,
            match_result: None,
            confirmed: None,
            research: None,
            reviews: [None, None, None],
            drafts: [None, None, None],
            completed: [false; 3],
            manual_mode: false,
            sources: SourceAggregator::new(),
            tracker: ResearchPhaseTracker::new(),
            report: None,
            report_view: ReportViewState::default(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn phase(&self) -> &AssessmentPhase {
        &self.phase
    }

    pub fn identity(&self) -> Option<&CompanyIdentity> {
        self.identity.as_ref()
    }

    pub fn match_result(&self) -> Option<&CompanyMatchResult> {
        self.match_result.as_ref()
    }

    pub fn confirmed_company(&self) -> Option<&CompanyMatch> {
        self.confirmed.as_ref()
    }

    /// Best known company name: confirmed match, else the user's input.
    pub fn company_name(&self) -> Option<&str> {
        self.confirmed
            .as_ref()
            .map(|c| c.name.as_str())
            .or_else(|| self.identity.as_ref().map(|i| i.name.as_str()))
    }

    pub fn sources(&self) -> &SourceAggregator {
        &self.sources
    }

    pub fn tracker(&self) -> &ResearchPhaseTracker {
        &self.tracker
    }

    pub fn report(&self) -> Option<&ComplianceReport> {
        self.report.as_ref()
    }

    pub fn report_view(&self) -> &ReportViewState {
        &self.report_view
    }

    pub fn report_view_mut(&mut self) -> &mut ReportViewState {
        &mut self.report_view
    }

    pub fn review(&self, section: Section) -> Option<&ReviewSession> {
        self.reviews[section.index()].as_ref()
    }

    /// Review session for the section currently on screen, if reviewing.
    pub fn current_review(&self) -> Option<&ReviewSession> {
        match self.phase {
            AssessmentPhase::Review { section } => self.review(section),
            _ => None,
        }
    }

    pub fn current_review_mut(&mut self) -> Option<&mut ReviewSession> {
        match self.phase {
            AssessmentPhase::Review { section } => self.reviews[section.index()].as_mut(),
            _ => None,
        }
    }

    pub fn draft(&self, section: Section) -> Option<&ManualSectionDraft> {
        self.drafts[section.index()].as_ref()
    }

    pub fn current_draft(&self) -> Option<&ManualSectionDraft> {
        match self.phase {
            AssessmentPhase::ManualEntry { section } => self.draft(section),
            _ => None,
        }
    }

    pub fn current_draft_mut(&mut self) -> Option<&mut ManualSectionDraft> {
        match self.phase {
            AssessmentPhase::ManualEntry { section } => self.drafts[section.index()].as_mut(),
            _ => None,
        }
    }

    /// Record the user's company input before starting the matcher.
    pub fn set_identity(&mut self, identity: CompanyIdentity) {
        self.identity = Some(identity);
    }

    // ── Event reducer ───────────────────────────────────────────────────────

    pub fn apply(&mut self, event: WorkflowEvent) -> CoreResult<()> {
        match event {
            WorkflowEvent::MatchCompleted(result) => self.on_match_completed(result),
            WorkflowEvent::CompanyConfirmed(company) => self.on_company_confirmed(company),
            WorkflowEvent::ManualEntryRequested => self.on_manual_entry_requested(),
            WorkflowEvent::ResearchCompleted(result) => self.on_research_completed(result),
            WorkflowEvent::SectionApproved => self.on_section_approved(),
            WorkflowEvent::ManualSectionCompleted => self.on_manual_section_completed(),
            WorkflowEvent::ClassificationCompleted(report) => self.on_classified(report),
            WorkflowEvent::StreamFailed { message } => self.on_stream_failed(message),
            WorkflowEvent::Back => self.on_back(),
            WorkflowEvent::Retry => self.on_retry(),
        }
    }

    fn on_match_completed(&mut self, result: CompanyMatchResult) -> CoreResult<()> {
        self.expect_phase(&AssessmentPhase::CompanyMatch)?;
        if let Some(exact) = result.auto_confirmable().cloned() {
            tracing::info!("Exact match '{}' auto-confirmed", exact.name);
            self.match_result = Some(result);
            return self.confirm(exact);
        }
        tracing::info!(
            "Match result needs user confirmation ({} suggestions)",
            result.suggestions.len()
        );
        self.match_result = Some(result);
        Ok(())
    }

    fn on_company_confirmed(&mut self, company: CompanyMatch) -> CoreResult<()> {
        self.expect_phase(&AssessmentPhase::CompanyMatch)?;
        self.confirm(company)
    }

    fn confirm(&mut self, company: CompanyMatch) -> CoreResult<()> {
        if let Some(identity) = &mut self.identity {
            identity.top_domain = Some(company.top_domain.clone());
            if !company.summary_long.is_empty() {
                identity.summary_long = Some(company.summary_long.clone());
            }
        }
        tracing::info!("Company confirmed: {} — starting deep research", company.name);
        self.confirmed = Some(company);
        // The user may have visited manual entry and backed out; a confirmed
        // match means the assessment goes through research and review.
        self.manual_mode = false;
        self.reset_streaming_state();
        self.phase = AssessmentPhase::DeepResearch;
        Ok(())
    }

    fn on_manual_entry_requested(&mut self) -> CoreResult<()> {
        self.expect_phase(&AssessmentPhase::CompanyMatch)?;
        if self.identity.is_none() {
            return Err(CoreError::validation(
                "Enter a company name before switching to manual entry",
            ));
        }
        self.manual_mode = true;
        for section in Section::ALL {
            let slot = &mut self.drafts[section.index()];
            if slot.is_none() {
                *slot = Some(ManualSectionDraft::for_section(section));
            }
        }
        tracing::info!("Manual entry requested, skipping automated research");
        self.phase = AssessmentPhase::ManualEntry {
            section: Section::TerritorialScope,
        };
        Ok(())
    }

    fn on_research_completed(&mut self, result: CompanyResearchResult) -> CoreResult<()> {
        self.expect_phase(&AssessmentPhase::DeepResearch)?;
        let mut by_section: [Vec<Finding>; 3] = [vec![], vec![], vec![]];
        for finding in &result.answers {
            by_section[Section::classify(&finding.section).index()].push(finding.clone());
        }
        for section in Section::ALL {
            let findings = std::mem::take(&mut by_section[section.index()]);
            self.reviews[section.index()] = Some(ReviewSession::new(section, findings));
        }
        self.completed = [false; 3];
        tracing::info!(
            "Research complete: {} findings across {} sections",
            result.answers.len(),
            Section::ALL.len()
        );
        self.research = Some(result);
        self.phase = AssessmentPhase::Review {
            section: Section::TerritorialScope,
        };
        Ok(())
    }

    fn on_section_approved(&mut self) -> CoreResult<()> {
        let section = match self.phase {
            AssessmentPhase::Review { section } => section,
            _ => return Err(self.unexpected("SectionApproved")),
        };
        let session = self.reviews[section.index()]
            .as_ref()
            .ok_or_else(|| CoreError::internal("Review session missing for current section"))?;
        if !session.all_accepted() {
            return Err(CoreError::validation(
                "All findings must be accepted before approving the section",
            ));
        }
        self.completed[section.index()] = true;
        match section.next() {
            Some(next) => {
                // Moving forward into a section the user already approved
                // once: start it pre-accepted again.
                if self.completed[next.index()] {
                    if let Some(s) = self.reviews[next.index()].as_mut() {
                        s.prefill_accepted();
                    }
                }
                self.phase = AssessmentPhase::Review { section: next };
            }
            None => {
                tracing::info!("All sections approved — ready to classify");
                self.phase = AssessmentPhase::Classify;
            }
        }
        Ok(())
    }

    fn on_manual_section_completed(&mut self) -> CoreResult<()> {
        let section = match self.phase {
            AssessmentPhase::ManualEntry { section } => section,
            _ => return Err(self.unexpected("ManualSectionCompleted")),
        };
        let draft = self.drafts[section.index()]
            .as_ref()
            .ok_or_else(|| CoreError::internal("Draft missing for current section"))?;
        if !draft.is_complete() {
            return Err(CoreError::validation(
                "All fields must be filled before completing the section",
            ));
        }
        self.completed[section.index()] = true;
        match section.next() {
            Some(next) => {
                self.phase = AssessmentPhase::ManualEntry { section: next };
            }
            None => {
                tracing::info!("Manual entry complete — ready to classify");
                self.phase = AssessmentPhase::Classify;
            }
        }
        Ok(())
    }

    fn on_classified(&mut self, report: ComplianceReport) -> CoreResult<()> {
        self.expect_phase(&AssessmentPhase::Classify)?;
        tracing::info!(
            "Classification complete: in_scope={}, {} obligations",
            report.classification.is_in_scope,
            report.obligation_analyses.len()
        );
        self.report = Some(report);
        self.report_view = ReportViewState::default();
        self.phase = AssessmentPhase::Report;
        Ok(())
    }

    fn on_stream_failed(&mut self, message: String) -> CoreResult<()> {
        if !self.phase.is_streaming() {
            return Err(self.unexpected("StreamFailed"));
        }
        tracing::warn!("Stream failed during {}: {}", self.phase.label(), message);
        self.phase = AssessmentPhase::PhaseError {
            phase: Box::new(self.phase.clone()),
            message,
        };
        Ok(())
    }

    fn on_back(&mut self) -> CoreResult<()> {
        match self.phase {
            AssessmentPhase::Review { section } => match section.prev() {
                Some(prev) => {
                    // The previous section was approved to get here; it
                    // re-opens with everything pre-accepted but editable.
                    if let Some(s) = self.reviews[prev.index()].as_mut() {
                        s.prefill_accepted();
                    }
                    self.phase = AssessmentPhase::Review { section: prev };
                    Ok(())
                }
                None => Err(CoreError::validation("Already at the first section")),
            },
            AssessmentPhase::ManualEntry { section } => match section.prev() {
                Some(prev) => {
                    self.phase = AssessmentPhase::ManualEntry { section: prev };
                    Ok(())
                }
                None => {
                    // Leaving manual entry altogether; drafts are kept.
                    self.phase = AssessmentPhase::CompanyMatch;
                    Ok(())
                }
            },
            _ => Err(self.unexpected("Back")),
        }
    }

    fn on_retry(&mut self) -> CoreResult<()> {
        let failed = match &self.phase {
            AssessmentPhase::PhaseError { phase, .. } => (**phase).clone(),
            _ => return Err(self.unexpected("Retry")),
        };
        tracing::info!("Retrying {} after failure", failed.label());
        self.reset_streaming_state();
        self.phase = failed;
        Ok(())
    }

    /// Fresh aggregator and phase tracker for a (re)started stream.
    pub fn reset_streaming_state(&mut self) {
        self.sources.reset();
        self.tracker.reset();
    }

    // ── Stream event plumbing ───────────────────────────────────────────────

    /// Route one company-matcher stream event.
    pub fn handle_match_event(&mut self, event: &StreamEvent) -> CoreResult<()> {
        match event {
            StreamEvent::Result { data } => {
                let result: CompanyMatchResult = serde_json::from_value(data.clone())?;
                self.apply(WorkflowEvent::MatchCompleted(result))
            }
            StreamEvent::Error { message } => self.apply(WorkflowEvent::StreamFailed {
                message: message.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Route one researcher stream event: feeds the source aggregator and
    /// phase tracker, and finishes the phase on the terminal result.
    pub fn handle_research_event(&mut self, event: &StreamEvent) -> CoreResult<()> {
        self.tracker.observe(event);
        match event {
            StreamEvent::ToolEnd { sources, .. } if !sources.is_empty() => {
                self.sources.ingest(sources);
                Ok(())
            }
            StreamEvent::Result { data } => {
                let result: CompanyResearchResult = serde_json::from_value(data.clone())?;
                self.apply(WorkflowEvent::ResearchCompleted(result))
            }
            StreamEvent::Error { message } => self.apply(WorkflowEvent::StreamFailed {
                message: message.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Route one classifier stream event.
    pub fn handle_classify_event(&mut self, event: &StreamEvent) -> CoreResult<()> {
        match event {
            StreamEvent::Result { data } => {
                let report: ComplianceReport = serde_json::from_value(data.clone())?;
                self.apply(WorkflowEvent::ClassificationCompleted(report))
            }
            StreamEvent::Error { message } => self.apply(WorkflowEvent::StreamFailed {
                message: message.clone(),
            }),
            _ => Ok(()),
        }
    }

    // ── Classification input ────────────────────────────────────────────────

    /// The reviewed (or manually entered) company profile, in the shape the
    /// service categorizer expects.
    pub fn company_profile(&self) -> CoreResult<serde_json::Value> {
        let name = self
            .company_name()
            .ok_or_else(|| CoreError::validation("No company set"))?;
        // Reviewed findings win over drafts: drafts may linger from a manual
        // entry the user abandoned before confirming a match.
        let use_reviews = self.reviews.iter().all(|r| r.is_some());
        let mut answers: Vec<Finding> = Vec::new();
        for section in Section::ALL {
            if use_reviews {
                let session = self.reviews[section.index()]
                    .as_ref()
                    .ok_or_else(|| CoreError::validation("Sections have not been reviewed"))?;
                answers.extend(session.findings().iter().cloned());
            } else if self.manual_mode {
                let draft = self.drafts[section.index()]
                    .as_ref()
                    .ok_or_else(|| CoreError::validation("Manual entry is incomplete"))?;
                answers.extend(draft.to_findings());
            } else {
                return Err(CoreError::validation("Sections have not been reviewed"));
            }
        }
        Ok(serde_json::json!({
            "company_name": name,
            "country": self.identity.as_ref().map(|i| i.country.as_str()),
            "answers": answers,
        }))
    }

    fn expect_phase(&self, expected: &AssessmentPhase) -> CoreResult<()> {
        if &self.phase == expected {
            Ok(())
        } else {
            Err(CoreError::validation(format!(
                "Operation not valid during {}",
                self.phase.label()
            )))
        }
    }

    fn unexpected(&self, event: &str) -> CoreError {
        CoreError::validation(format!(
            "{event} not valid during {}",
            self.phase.label()
        ))
    }
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new()
    }
}
