//! Review Session
//!
//! Per-section review of research findings. Every finding must be explicitly
//! accepted (or edited, which implies acceptance) before the section can be
//! approved. Findings where research came up empty cannot be accepted as-is:
//! the user has to supply an answer through the edit path.
//!
//! The engine enforces the rules itself rather than trusting the caller to
//! disable the right buttons; invalid operations come back as
//! `CoreError::Validation`.

use dsa_copilot_core::{Confidence, CoreError, CoreResult, Finding, Section};

/// Review status of one finding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindingStatus {
    pub accepted: bool,
    pub edited: bool,
}

/// The one edit that may be open at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub index: usize,
    pub buffer: String,
}

#[derive(Debug)]
pub struct ReviewSession {
    section: Section,
    findings: Vec<Finding>,
    statuses: Vec<FindingStatus>,
    edit: Option<EditState>,
}

impl ReviewSession {
    pub fn new(section: Section, findings: Vec<Finding>) -> Self {
        let statuses = vec![FindingStatus::default(); findings.len()];
        Self {
            section,
            findings,
            statuses,
            edit: None,
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn statuses(&self) -> &[FindingStatus] {
        &self.statuses
    }

    pub fn edit(&self) -> Option<&EditState> {
        self.edit.as_ref()
    }

    /// Mark every finding accepted, as when re-entering a section that was
    /// already approved. Findings stay editable.
    pub fn prefill_accepted(&mut self) {
        for status in &mut self.statuses {
            status.accepted = true;
        }
        self.edit = None;
    }

    /// Accept a finding as-is.
    pub fn accept(&mut self, index: usize) -> CoreResult<()> {
        let finding = self.finding_at(index)?;
        if finding.information_missing() {
            return Err(CoreError::validation(
                "This finding has no researched answer; edit it to provide one",
            ));
        }
        if self.edit.as_ref().is_some_and(|e| e.index == index) {
            return Err(CoreError::validation(
                "Finding is being edited; save or cancel the edit first",
            ));
        }
        self.statuses[index].accepted = true;
        Ok(())
    }

    /// Open an edit on a finding, seeding the buffer with the current answer.
    /// A finding with no researched answer seeds an empty buffer instead of
    /// the sentinel text. Replaces any edit already open.
    pub fn begin_edit(&mut self, index: usize) -> CoreResult<()> {
        let finding = self.finding_at(index)?;
        let buffer = if finding.information_missing() {
            String::new()
        } else {
            finding.answer.clone()
        };
        self.edit = Some(EditState { index, buffer });
        Ok(())
    }

    /// Replace the open edit's buffer (the user typing).
    pub fn set_edit_buffer(&mut self, text: impl Into<String>) -> CoreResult<()> {
        match &mut self.edit {
            Some(edit) => {
                edit.buffer = text.into();
                Ok(())
            }
            None => Err(CoreError::validation("No edit in progress")),
        }
    }

    /// Commit the open edit. Requires non-blank text; the edited finding is
    /// treated as user-verified: confidence High, information present, and
    /// both accepted and edited.
    pub fn save_edit(&mut self) -> CoreResult<()> {
        let edit = self
            .edit
            .as_ref()
            .ok_or_else(|| CoreError::validation("No edit in progress"))?;
        let text = edit.buffer.trim();
        if text.is_empty() {
            // Edit stays open so the user can keep typing
            return Err(CoreError::validation("Answer cannot be empty"));
        }
        let index = edit.index;
        let answer = text.to_string();
        let finding = &mut self.findings[index];
        finding.answer = answer;
        finding.confidence = Confidence::High;
        finding.information_found = Some(true);
        self.statuses[index] = FindingStatus {
            accepted: true,
            edited: true,
        };
        self.edit = None;
        Ok(())
    }

    /// Discard the open edit, if any. The finding keeps its previous answer
    /// and status.
    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Whether the section can be approved: every finding accepted and no
    /// edit open.
    pub fn all_accepted(&self) -> bool {
        self.edit.is_none() && self.statuses.iter().all(|s| s.accepted)
    }

    fn finding_at(&self, index: usize) -> CoreResult<&Finding> {
        self.findings
            .get(index)
            .ok_or_else(|| CoreError::validation(format!("No finding at index {index}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsa_copilot_core::NOT_PUBLIC_SENTINEL;

    fn finding(question: &str, answer: &str) -> Finding {
        Finding {
            section: "Company Size".to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            source: "example.com".to_string(),
            confidence: Confidence::Medium,
            information_found: None,
        }
    }

    fn session() -> ReviewSession {
        ReviewSession::new(
            Section::CompanySize,
            vec![
                finding("Employees?", "Around 250"),
                finding("Turnover?", "EUR 40M"),
                finding("Monthly active users?", NOT_PUBLIC_SENTINEL),
            ],
        )
    }

    #[test]
    fn test_fresh_session_nothing_accepted() {
        let s = session();
        assert!(!s.all_accepted());
        assert!(s.statuses().iter().all(|st| !st.accepted && !st.edited));
    }

    #[test]
    fn test_accept_marks_finding() {
        let mut s = session();
        s.accept(0).unwrap();
        assert!(s.statuses()[0].accepted);
        assert!(!s.statuses()[0].edited);
    }

    #[test]
    fn test_accept_out_of_bounds() {
        let mut s = session();
        assert!(matches!(s.accept(9), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_accept_rejected_for_missing_information() {
        let mut s = session();
        assert!(matches!(s.accept(2), Err(CoreError::Validation(_))));
        assert!(!s.statuses()[2].accepted);
    }

    #[test]
    fn test_accept_rejected_while_editing_same_finding() {
        let mut s = session();
        s.begin_edit(0).unwrap();
        assert!(s.accept(0).is_err());
        // A different finding can still be accepted
        s.accept(1).unwrap();
    }

    #[test]
    fn test_begin_edit_seeds_current_answer() {
        let mut s = session();
        s.begin_edit(0).unwrap();
        assert_eq!(s.edit().unwrap().buffer, "Around 250");
    }

    #[test]
    fn test_begin_edit_seeds_empty_for_missing_information() {
        let mut s = session();
        s.begin_edit(2).unwrap();
        assert_eq!(s.edit().unwrap().buffer, "");
    }

    #[test]
    fn test_save_edit_upgrades_finding() {
        let mut s = session();
        s.begin_edit(2).unwrap();
        s.set_edit_buffer("  12 million MAU  ").unwrap();
        s.save_edit().unwrap();
        let f = &s.findings()[2];
        assert_eq!(f.answer, "12 million MAU");
        assert_eq!(f.confidence, Confidence::High);
        assert_eq!(f.information_found, Some(true));
        assert!(s.statuses()[2].accepted);
        assert!(s.statuses()[2].edited);
        assert!(s.edit().is_none());
    }

    #[test]
    fn test_save_edit_rejects_blank_text() {
        let mut s = session();
        s.begin_edit(2).unwrap();
        s.set_edit_buffer("   ").unwrap();
        assert!(s.save_edit().is_err());
        // The edit stays open
        assert!(s.edit().is_some());
    }

    #[test]
    fn test_cancel_edit_keeps_previous_answer() {
        let mut s = session();
        s.begin_edit(0).unwrap();
        s.set_edit_buffer("garbage").unwrap();
        s.cancel_edit();
        assert_eq!(s.findings()[0].answer, "Around 250");
        assert!(s.edit().is_none());
    }

    #[test]
    fn test_all_accepted_gates_on_every_finding() {
        let mut s = session();
        s.accept(0).unwrap();
        s.accept(1).unwrap();
        assert!(!s.all_accepted());
        s.begin_edit(2).unwrap();
        s.set_edit_buffer("5M MAU").unwrap();
        assert!(!s.all_accepted());
        s.save_edit().unwrap();
        assert!(s.all_accepted());
    }

    #[test]
    fn test_open_edit_blocks_approval() {
        let mut s = ReviewSession::new(Section::CompanySize, vec![finding("Q", "A")]);
        s.accept(0).unwrap();
        assert!(s.all_accepted());
        s.begin_edit(0).unwrap();
        assert!(!s.all_accepted());
        s.cancel_edit();
        assert!(s.all_accepted());
    }

    #[test]
    fn test_prefill_accepted() {
        let mut s = session();
        s.prefill_accepted();
        assert!(s.all_accepted());
        // Still editable afterwards
        s.begin_edit(0).unwrap();
        assert!(s.edit().is_some());
    }
}
