//! Debounced saving of stroke snapshots.
//!
//! Every change re-arms a short deadline; the snapshot is only written once
//! the document has been quiet for the whole debounce interval.

use crate::stroke::SavedStroke;
use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default quiet period before a save, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Auto-save settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    pub debounce_ms: u64,
    /// Save a pending snapshot to its own document before switching away.
    /// When off, the snapshot is dropped once the next document has loaded.
    pub flush_on_switch: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            flush_on_switch: true,
        }
    }
}

/// A snapshot waiting for its deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    /// Document the snapshot belongs to, captured when it was scheduled.
    pub document_id: String,
    pub strokes: Vec<SavedStroke>,
    pub due: Instant,
}

/// Holds at most one pending save.
#[derive(Debug, Clone)]
pub struct AutoSave {
    config: AutoSaveConfig,
    pending: Option<PendingSave>,
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(AutoSaveConfig::default())
    }
}

impl AutoSave {
    pub fn new(config: AutoSaveConfig) -> Self {
        Self { config, pending: None }
    }

    pub fn config(&self) -> &AutoSaveConfig {
        &self.config
    }

    /// Get the debounce interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.config.debounce_ms)
    }

    /// Replace any pending snapshot and restart the deadline from `now`.
    pub fn schedule(&mut self, document_id: &str, strokes: Vec<SavedStroke>, now: Instant) {
        if let Some(previous) = &self.pending {
            if previous.document_id != document_id {
                log::warn!(
                    "Dropping pending save of {} in favour of {}",
                    previous.document_id,
                    document_id
                );
            }
        }
        self.pending = Some(PendingSave {
            document_id: document_id.to_string(),
            strokes,
            due: now + self.interval(),
        });
    }

    /// Take the pending snapshot if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingSave> {
        match &self.pending {
            Some(pending) if now >= pending.due => self.pending.take(),
            _ => None,
        }
    }

    /// Take the pending snapshot regardless of its deadline.
    pub fn cancel(&mut self) -> Option<PendingSave> {
        self.pending.take()
    }

    /// Put back a snapshot that could not be written, keeping its deadline.
    ///
    /// A snapshot scheduled in the meantime is newer and wins.
    pub fn rearm(&mut self, pending: PendingSave) {
        if self.pending.is_none() {
            self.pending = Some(pending);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Deadline of the pending save, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }
}
