//! Edit-button presses that arrive while a row is animating.
//!
//! Such a press is not executed right away. It is queued with the row
//! position and the time of the first queued press. When the row's
//! transition finishes, the press is replayed only if it was queued less
//! than half the animation duration before completion; older presses are
//! dropped. Later presses on the same row do not move the anchor.

use crate::config::AnimationConfig;
use pantry_lists::ItemId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A press waiting for an animation to finish
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedPress {
    /// Row the press targets
    pub item: ItemId,
    /// Backing-list position when pressed
    pub position: usize,
    /// When the first press was queued
    pub queued_at: Instant,
}

/// What to do with a press right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Press {
    /// Row is idle: toggle it
    Execute,
    /// Row is animating: wait for completion
    Queued,
}

/// Debounces edit-button presses per row
#[derive(Debug)]
pub struct EditButtonGate {
    window: Duration,
    queued: HashMap<ItemId, QueuedPress>,
}

impl EditButtonGate {
    /// Gate with a staleness window of half the animation duration
    #[must_use]
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            window: config.replay_window(),
            queued: HashMap::new(),
        }
    }

    /// Staleness window
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Register a press on `item`
    pub fn press(&mut self, item: ItemId, position: usize, now: Instant, animating: bool) -> Press {
        if !animating {
            return Press::Execute;
        }
        self.queued.entry(item).or_insert_with(|| {
            tracing::debug!(%item, position, "Edit press queued behind running animation");
            QueuedPress {
                item,
                position,
                queued_at: now,
            }
        });
        Press::Queued
    }

    /// The transition of `item` finished at `now`
    ///
    /// Returns the press to replay, if one is queued and still fresh.
    pub fn complete(&mut self, item: ItemId, now: Instant) -> Option<QueuedPress> {
        let press = self.queued.remove(&item)?;
        let waited = now.saturating_duration_since(press.queued_at);
        if waited < self.window {
            tracing::debug!(%item, ?waited, "Replaying queued edit press");
            metrics::counter!("motion.replay.executed").increment(1);
            Some(press)
        } else {
            tracing::debug!(%item, ?waited, window = ?self.window, "Dropping stale edit press");
            metrics::counter!("motion.replay.dropped").increment(1);
            None
        }
    }

    /// The transition of `item` was abandoned; forget its press
    pub fn abandon(&mut self, item: ItemId) {
        if self.queued.remove(&item).is_some() {
            metrics::counter!("motion.replay.dropped").increment(1);
        }
    }

    /// Whether a press is waiting on `item`
    #[must_use]
    pub fn is_queued(&self, item: ItemId) -> bool {
        self.queued.contains_key(&item)
    }
}
