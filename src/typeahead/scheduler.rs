//! Query scheduling: local filtering versus remote lookups
//!
//! The scheduler decides, for each effective text change, whether the
//! displayed candidates can simply be narrowed locally or whether the
//! candidate source must be asked again. It also owns the request
//! generation counter: only the most recently dispatched lookup is current,
//! and a result is applied only while its generation is still current.

use std::fmt;

use tracing::debug;

/// Token identifying one dispatched lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// What the displayed list currently derives from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Current {
    /// Nothing requested yet, or explicitly cleared by selecting nothing
    Idle,
    /// A lookup with this generation, pending or applied
    Remote(Generation),
    /// A synchronous local filter of the displayed candidates
    Filtered,
}

/// A lookup the host must run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub generation: Generation,
    /// Raw, un-normalized text to look up
    pub prefix: String,
}

/// Routing decision for one text change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Nothing to do
    Unchanged,
    /// Narrow the displayed candidates locally
    Filter,
    /// Ask the candidate source
    Dispatch(LookupTicket),
}

/// Inputs to a routing decision that live outside the scheduler
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    /// Text projection of the committed candidate, if any
    pub committed_text: Option<&'a str>,
    /// Number of candidates currently displayed
    pub displayed: usize,
    /// Configured `item_max`
    pub item_max: usize,
}

/// Tracks the current request generation
#[derive(Debug)]
pub struct QueryScheduler {
    next: u64,
    current: Current,
    stale_discards: u64,
}

impl Default for QueryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryScheduler {
    /// Create a scheduler with nothing current
    pub fn new() -> Self {
        Self {
            next: 1,
            current: Current::Idle,
            stale_discards: 0,
        }
    }

    /// What the displayed list currently derives from
    pub fn current(&self) -> Current {
        self.current
    }

    /// Number of results discarded because a newer request superseded them
    pub fn stale_discards(&self) -> u64 {
        self.stale_discards
    }

    /// Decide how to serve a text change
    ///
    /// # Arguments
    /// * `new` - Text after the change
    /// * `old` - Text before the change
    /// * `ctx` - Selection and display state the decision depends on
    ///
    /// # Returns
    /// * `Route` - The decision; `Filter` and `Dispatch` also update the
    ///   current generation
    pub fn route(&mut self, new: &str, old: &str, ctx: RouteContext<'_>) -> Route {
        if new == old {
            return Route::Unchanged;
        }
        // The user has not diverged from the committed selection. An emptied
        // input with nothing committed still goes out; the answer clears the list.
        if ctx.committed_text == Some(new) {
            return Route::Unchanged;
        }

        // Eligibility uses the raw strings even when matching is
        // case-insensitive: "An" -> "an" is not treated as narrowing.
        let narrowing = !new.is_empty() && !old.is_empty() && new.starts_with(old);
        if self.current != Current::Idle && ctx.displayed < ctx.item_max && narrowing {
            debug!(new, old, displayed = ctx.displayed, "filtering locally");
            self.current = Current::Filtered;
            return Route::Filter;
        }

        let generation = Generation(self.next);
        self.next = self.next.wrapping_add(1);
        self.current = Current::Remote(generation);
        debug!(%generation, prefix = new, "dispatching lookup");

        Route::Dispatch(LookupTicket {
            generation,
            prefix: new.to_string(),
        })
    }

    /// Whether a result for `generation` may be applied.
    ///
    /// Counts a stale discard when it may not.
    pub fn accept(&mut self, generation: Generation) -> bool {
        if self.is_current(generation) {
            return true;
        }
        self.stale_discards += 1;
        debug!(%generation, current = ?self.current, "discarding stale lookup result");
        false
    }

    /// Whether `generation` is the current lookup, without side effects
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current == Current::Remote(generation)
    }

    /// Forget the current request; any outstanding result becomes stale
    pub fn clear(&mut self) {
        self.current = Current::Idle;
    }
}
