//! DSA Copilot Agents
//!
//! Streaming HTTP client for the DSA Copilot backend agents. The backend
//! exposes one streaming POST endpoint per agent (company matcher, company
//! researcher, service categorizer, main agent), all speaking the same
//! `"data: " + JSON` frame protocol; this crate owns the transport side:
//!
//! - `decoder` - chunk reassembly and lazy event decoding
//!   (`FrameBuffer`, `EventStreamDecoder`, `CancelToken`)
//! - `client` - typed per-endpoint request builders (`AgentClient`),
//!   session identity (`SessionHandle`), chat context modes
//! - `error` - transport error taxonomy (`AgentError`)
//!
//! What deliberately does NOT live here: retry/backoff, reconnect/replay,
//! and timeouts. A failed stream is reported once; the workflow layer owns
//! recovery.

pub mod client;
pub mod decoder;
pub mod error;

// Re-export main types
pub use client::{AgentClient, ContextMode, SessionHandle};
pub use decoder::{CancelToken, EventStreamDecoder, FrameBuffer};
pub use error::{AgentError, AgentResult};
