//! Assessment and chat state models.

pub mod assessment;
pub mod chat;

pub use assessment::{
    default_questions, CompanyIdentity, ManualField, ManualSectionDraft, ObligationFilter,
    ReportTab, ReportViewState,
};
pub use chat::{ChatMessage, ChatRole};
