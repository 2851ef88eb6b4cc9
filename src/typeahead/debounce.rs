//! Debounce gate for text changes
//!
//! Rapid keystrokes are coalesced into a single scheduled change. Transitions
//! to or from empty text are never delayed, so the first character and
//! clearing the input react immediately.

use std::time::Duration;

use tokio::time::Instant;

/// A text change as seen by the query scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub new: String,
    pub old: String,
}

impl TextChange {
    pub fn new(new: impl Into<String>, old: impl Into<String>) -> Self {
        Self {
            new: new.into(),
            old: old.into(),
        }
    }
}

/// Outcome of offering a change to the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Process the change now
    Fire(TextChange),
    /// The change is pending until the deadline
    Deferred(Instant),
}

/// Holds at most one pending text change
#[derive(Debug)]
pub struct DebounceGate {
    delay: Duration,
    pending: Option<(TextChange, Instant)>,
}

impl DebounceGate {
    /// Create a gate
    ///
    /// # Arguments
    /// * `delay` - How long a non-empty to non-empty change is held back
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Offer a keystroke's change
    ///
    /// Any pending change is cancelled and merged: the merged change keeps the
    /// pending change's `old` text, which is the last text actually processed.
    ///
    /// # Arguments
    /// * `change` - The keystroke's new and previous text
    /// * `now` - Current time
    ///
    /// # Returns
    /// * `Gate` - Fire immediately or wait until the returned deadline
    pub fn offer(&mut self, change: TextChange, now: Instant) -> Gate {
        let immediate = change.new.is_empty() || change.old.is_empty() || self.delay.is_zero();

        let merged = match self.pending.take() {
            Some((pending, _)) => TextChange {
                new: change.new,
                old: pending.old,
            },
            None => change,
        };

        if immediate {
            return Gate::Fire(merged);
        }

        let deadline = now + self.delay;
        self.pending = Some((merged, deadline));
        Gate::Deferred(deadline)
    }

    /// Deadline of the pending change, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Take the pending change if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<TextChange> {
        if self.deadline().is_some_and(|deadline| deadline <= now) {
            self.pending.take().map(|(change, _)| change)
        } else {
            None
        }
    }

    /// Drop the pending change. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
