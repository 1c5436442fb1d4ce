//! Assessment engines: streaming aggregation, review, workflow, context
//! snapshots, and chat.

pub mod chat;
pub mod research_phase;
pub mod review;
pub mod snapshot;
pub mod sources;
pub mod workflow;

pub use chat::{ChatSession, FALLBACK_CONNECTION, FALLBACK_EMPTY};
pub use research_phase::{ResearchPhase, ResearchPhaseTracker};
pub use review::{EditState, FindingStatus, ReviewSession};
pub use snapshot::{context_mode_for, ChatContext, PhaseView};
pub use sources::{SourceAggregator, MAX_TOTAL_SOURCES};
pub use workflow::{AssessmentPhase, WorkflowController, WorkflowEvent};
