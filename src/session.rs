//! Per-user session context.
//!
//! A [`Session`] owns everything one user accumulates between requests: the
//! bounded prompt history and the last generated batch (kept for previews
//! and the zip download). Handlers receive it explicitly; there is no
//! process-global state.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;

/// Number of prompts remembered per session.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// A remembered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

/// Recency list of prompts, oldest evicted first.
#[derive(Debug, Clone)]
pub struct PromptHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for PromptHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl PromptHistory {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, prompt: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            prompt: prompt.into(),
            created_at: Utc::now(),
        });
    }

    /// Newest first.
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// State carried across one user's requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub history: PromptHistory,
    /// Last successful batch, labelled, in display order.
    pub batch: Vec<(String, DynamicImage)>,
    pub last_accessed: Instant,
}

impl Session {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: PromptHistory::with_capacity(history_capacity),
            batch: Vec::new(),
            last_accessed: Instant::now(),
        }
    }

    /// Mark the session as used to keep it alive.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}
