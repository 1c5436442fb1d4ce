//! Event Stream Decoder
//!
//! Turns the chunked text body of an agent streaming endpoint into a lazy,
//! single-pass sequence of [`StreamEvent`]s.
//!
//! Two layers:
//! - [`FrameBuffer`] is a pure, synchronous line reassembler: it buffers
//!   arbitrary chunk boundaries, recognizes `"data: "` frames, and silently
//!   skips anything that does not parse. It is directly testable without a
//!   transport.
//! - [`EventStreamDecoder`] drives a byte stream (normally a reqwest response
//!   body) through a `FrameBuffer`, latches on the first terminal event, and
//!   honors cooperative cancellation between events.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use dsa_copilot_core::StreamEvent;

use crate::error::{AgentError, AgentResult};

/// The only line prefix that carries an event. Everything else (keep-alives,
/// comments, blank separator lines) is ignored.
const DATA_PREFIX: &str = "data: ";

/// Cooperative cancellation flag for one stream.
///
/// Cancellation is checked between yielded events, not a hard abort of the
/// transport: in-flight network cost may still complete, but its results are
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Reassembles `"data: " + JSON + "\n"` frames from arbitrary byte chunks.
///
/// A line may arrive split across any number of chunks; only complete lines
/// are parsed and the trailing partial line is retained across pushes. The
/// buffer holds raw bytes: a chunk boundary may fall inside a multi-byte
/// UTF-8 character, so decoding happens per complete line, never per chunk.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = Self::parse_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flush at end-of-stream: the transport may close without a final
    /// newline, so a complete `data: ` frame left in the buffer still counts.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = String::from_utf8_lossy(&rest);
        Self::parse_line(rest.trim_end_matches('\r'))
    }

    fn parse_line(line: &str) -> Option<StreamEvent> {
        let payload = line.strip_prefix(DATA_PREFIX)?;
        match serde_json::from_str::<StreamEvent>(payload) {
            // Unknown tags are dropped here so consumers never see them.
            Ok(StreamEvent::Unknown) => {
                tracing::debug!("Skipping unknown stream event: {}", payload);
                None
            }
            Ok(event) => Some(event),
            Err(e) => {
                // Malformed frames are tolerated, not fatal; the stream
                // continues with the next line.
                tracing::debug!("Skipping malformed stream frame: {}", e);
                None
            }
        }
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = AgentResult<Bytes>> + Send>>;

/// Lazy, forward-only decoder over one agent stream.
///
/// Yields events in exactly the order the backend emitted them, stops at
/// transport end-of-stream whether or not a terminal event was seen, and
/// yields nothing after the first terminal event.
pub struct EventStreamDecoder {
    stream: ByteStream,
    frames: FrameBuffer,
    pending: VecDeque<StreamEvent>,
    terminated: bool,
    exhausted: bool,
    cancel: CancelToken,
}

// The boxed stream is opaque, so show the decoder's own state only.
impl std::fmt::Debug for EventStreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamDecoder")
            .field("pending", &self.pending.len())
            .field("terminated", &self.terminated)
            .field("exhausted", &self.exhausted)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl EventStreamDecoder {
    pub(crate) fn new(stream: ByteStream) -> Self {
        Self {
            stream,
            frames: FrameBuffer::new(),
            pending: VecDeque::new(),
            terminated: false,
            exhausted: false,
            cancel: CancelToken::new(),
        }
    }

    /// Wrap an already-validated (2xx) response body.
    pub fn from_response(response: reqwest::Response) -> Self {
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AgentError::network));
        Self::new(Box::pin(stream))
    }

    /// Build a decoder over in-memory chunks. Used by tests and by any caller
    /// that already holds the body.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
        I::IntoIter: Send + 'static,
    {
        let stream = futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|c| -> AgentResult<Bytes> { Ok(Bytes::from(c)) }),
        );
        Self::new(Box::pin(stream))
    }

    /// Handle for cancelling this stream from elsewhere. Cloneable.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next event, or `Ok(None)` when the stream is over (terminal event
    /// seen, transport closed, or cancelled). Transport failures mid-stream
    /// surface as `Err`.
    pub async fn next_event(&mut self) -> AgentResult<Option<StreamEvent>> {
        loop {
            if self.terminated {
                return Ok(None);
            }
            if self.cancel.is_cancelled() {
                // Discard anything still buffered; an abandoned attempt must
                // not leak events into a retry.
                self.pending.clear();
                self.terminated = true;
                return Ok(None);
            }

            if let Some(event) = self.pending.pop_front() {
                if event.is_terminal() {
                    self.terminated = true;
                }
                return Ok(Some(event));
            }

            if self.exhausted {
                return Ok(None);
            }

            match self.stream.next().await {
                Some(Ok(chunk)) => {
                    self.pending.extend(self.frames.push(&chunk));
                }
                Some(Err(e)) => {
                    self.terminated = true;
                    return Err(e);
                }
                None => {
                    self.exhausted = true;
                    if let Some(event) = self.frames.finish() {
                        self.pending.push_back(event);
                    }
                }
            }
        }
    }

    /// Drain the stream into side effects: calls `on_event` for every event
    /// until the stream ends. Convenience used by callers that do not need
    /// per-event control flow.
    pub async fn for_each_event<F>(&mut self, mut on_event: F) -> AgentResult<()>
    where
        F: FnMut(StreamEvent),
    {
        while let Some(event) = self.next_event().await? {
            on_event(event);
        }
        Ok(())
    }
}
