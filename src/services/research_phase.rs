//! Research Phase Tracker
//!
//! Derives a coarse progress phase for the deep-research run from the event
//! stream. The backend does not emit an explicit phase signal, so this is a
//! best-effort heuristic over node names and event counts, isolated behind
//! one type so a real signal can replace it later.

use dsa_copilot_core::{is_search_tool, StreamEvent};

/// Node-name fragment that marks the report-assembly stage. Matches
/// "finalize_profile", "finalization" and similar.
pub const FINALIZING_NODE_HINT: &str = "finaliz";

/// Searches that must have completed before the run can be considered to be
/// summarizing. Sized to the backend's question catalog.
pub const SUMMARIZATION_MIN_SEARCHES: usize = 30;

/// Coarse progress phase of a deep-research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchPhase {
    Research,
    Summarization,
    Finalizing,
}

impl ResearchPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ResearchPhase::Research => "Researching sources",
            ResearchPhase::Summarization => "Summarizing findings",
            ResearchPhase::Finalizing => "Finalizing profile",
        }
    }
}

/// Heuristic phase tracker. Phases only move forward; both Summarization and
/// Finalizing latch once entered.
#[derive(Debug)]
pub struct ResearchPhaseTracker {
    phase: ResearchPhase,
    search_count: usize,
    llm_count: usize,
}

impl ResearchPhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: ResearchPhase::Research,
            search_count: 0,
            llm_count: 0,
        }
    }

    pub fn phase(&self) -> ResearchPhase {
        self.phase
    }

    pub fn search_count(&self) -> usize {
        self.search_count
    }

    /// Feed one stream event through the heuristic.
    pub fn observe(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::NodeStart { node, .. } => {
                if node.to_lowercase().contains(FINALIZING_NODE_HINT)
                    && self.phase != ResearchPhase::Finalizing
                {
                    tracing::debug!("Research phase -> Finalizing (node '{node}')");
                    self.phase = ResearchPhase::Finalizing;
                }
            }
            StreamEvent::ToolEnd { name, .. } if is_search_tool(name) => {
                self.search_count += 1;
            }
            StreamEvent::LlmStart { .. } => {
                self.llm_count += 1;
                if self.phase == ResearchPhase::Research
                    && self.search_count >= SUMMARIZATION_MIN_SEARCHES
                    && self.llm_count > self.search_count
                {
                    tracing::debug!(
                        "Research phase -> Summarization (searches={}, llm_calls={})",
                        self.search_count,
                        self.llm_count
                    );
                    self.phase = ResearchPhase::Summarization;
                }
            }
            _ => {}
        }
    }

    /// Back to the initial state for a fresh run.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ResearchPhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
