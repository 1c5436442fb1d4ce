//! Source Aggregator
//!
//! Collects the web sources surfaced by search tool results during deep
//! research: dedups by URL across the whole session, keeps a running total
//! capped at a fixed maximum, and maintains a small sliding window of the
//! most recent sources for display and context snapshots.

use std::collections::{HashSet, VecDeque};

use dsa_copilot_core::SearchSource;

/// Hard cap on counted sources per research run.
pub const MAX_TOTAL_SOURCES: usize = 25;

/// Default size of the recent-sources window.
pub const DEFAULT_VISIBLE_WINDOW: usize = 4;

const MIN_VISIBLE_WINDOW: usize = 3;
const MAX_VISIBLE_WINDOW: usize = 6;

#[derive(Debug, Default)]
pub struct SourceAggregator {
    seen: HashSet<String>,
    visible: VecDeque<SearchSource>,
    total: usize,
    capped: bool,
    window: usize,
}

impl SourceAggregator {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_VISIBLE_WINDOW)
    }

    /// Aggregator with a custom window size, clamped to a sane range.
    pub fn with_window(window: usize) -> Self {
        Self {
            seen: HashSet::new(),
            visible: VecDeque::new(),
            total: 0,
            capped: false,
            window: window.clamp(MIN_VISIBLE_WINDOW, MAX_VISIBLE_WINDOW),
        }
    }

    /// Admit a batch of sources. Duplicates (by URL) and blank URLs are
    /// dropped; once the cap is hit, everything new is dropped and the capped
    /// flag stays set. Returns how many sources were admitted.
    pub fn ingest(&mut self, sources: &[SearchSource]) -> usize {
        let mut admitted = 0;
        for source in sources {
            let url = source.url.trim();
            if url.is_empty() || self.seen.contains(url) {
                continue;
            }
            if self.total >= MAX_TOTAL_SOURCES {
                if !self.capped {
                    tracing::warn!("Source cap reached ({MAX_TOTAL_SOURCES}), dropping new sources");
                    self.capped = true;
                }
                continue;
            }
            self.seen.insert(url.to_string());
            self.total += 1;
            self.visible.push_back(source.clone());
            if self.visible.len() > self.window {
                self.visible.pop_front();
            }
            admitted += 1;
        }
        admitted
    }

    /// Count of distinct sources admitted so far. Never exceeds
    /// [`MAX_TOTAL_SOURCES`].
    pub fn total(&self) -> usize {
        self.total
    }

    /// Most recent sources, oldest first.
    pub fn visible(&self) -> &VecDeque<SearchSource> {
        &self.visible
    }

    pub fn is_capped(&self) -> bool {
        self.capped
    }

    /// Clear everything for a fresh research run.
    pub fn reset(&mut self) {
        self.seen.clear();
        self.visible.clear();
        self.total = 0;
        self.capped = false;
    }
}
