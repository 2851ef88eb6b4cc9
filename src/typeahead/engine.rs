//! Typeahead engine - one widget's state machine
//!
//! [`Typeahead`] ties the scheduler, the reconciler and the selection state
//! together. It performs no I/O and owns no timers: every entry point is a
//! synchronous state transition, and its side effects are
//!
//! - a returned [`Decision`] telling the host whether to run a lookup, and
//! - queued [`ViewEvent`]s, collected with [`Typeahead::take_events`].
//!
//! [`Session`](super::Session) drives an engine with real timers and an async
//! candidate source.

use tracing::{debug, warn};

use super::candidate::CandidateOps;
use super::keys::{Key, KeyOutcome};
use super::reconcile::{CandidateNode, NodeId, Reconciler};
use super::scheduler::{Current, Generation, LookupTicket, QueryScheduler, Route, RouteContext};
use super::selection::{self, Direction, Phase, Selection};
use super::text::{self, Normalizer};
use super::view::ViewEvent;
use crate::config::{Config, ConfigOverrides};
use crate::error::Result;

/// What a text change requires from the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing changed
    Unchanged,
    /// The displayed candidates were narrowed locally
    Filtered,
    /// Run this lookup and hand the result to [`Typeahead::apply_lookup`]
    Dispatched(LookupTicket),
}

/// What happened to a lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The result was displayed
    Applied,
    /// A newer request superseded it; it was dropped silently
    Stale,
}

/// Suggestion engine for one text input
#[derive(Debug)]
pub struct Typeahead<T> {
    config: Config,
    normalizer: Normalizer,
    ops: CandidateOps<T>,
    scheduler: QueryScheduler,
    reconciler: Reconciler,
    nodes: Vec<CandidateNode<T>>,
    selection: Selection<T>,
    events: Vec<ViewEvent<T>>,
}

impl<T: Clone> Typeahead<T> {
    /// Create an engine
    ///
    /// # Arguments
    /// * `config` - Resolved configuration, owned by this instance
    /// * `ops` - Projection and equality for candidates
    pub fn new(config: Config, ops: CandidateOps<T>) -> Self {
        Self {
            normalizer: Normalizer::new(config.case_sensitive),
            config,
            ops,
            scheduler: QueryScheduler::new(),
            reconciler: Reconciler::new(),
            nodes: Vec::new(),
            selection: Selection::default(),
            events: Vec::new(),
        }
    }

    /// Create an engine from overrides on top of the process-wide defaults
    ///
    /// # Returns
    /// * `Result<Self>` - The engine, or the configuration error
    pub fn from_overrides(overrides: &ConfigOverrides, ops: CandidateOps<T>) -> Result<Self> {
        Ok(Self::new(overrides.resolve()?, ops))
    }

    /* ------------------------------ accessors ------------------------------ */

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current input text
    pub fn text(&self) -> &str {
        &self.selection.text
    }

    /// Displayed nodes in order
    pub fn nodes(&self) -> &[CandidateNode<T>] {
        &self.nodes
    }

    /// Displayed candidates in order
    pub fn candidates(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().map(|n| &n.candidate)
    }

    /// The highlighted node
    pub fn active(&self) -> Option<&CandidateNode<T>> {
        let index = self.selection.active_index(&self.nodes)?;
        Some(&self.nodes[index])
    }

    pub fn is_visible(&self) -> bool {
        self.selection.visible
    }

    pub fn is_focused(&self) -> bool {
        self.selection.focused
    }

    /// Last committed value
    pub fn committed(&self) -> Option<&T> {
        self.selection.committed.as_ref()
    }

    /// Text projection of a candidate
    pub fn project(&self, candidate: &T) -> String {
        self.ops.project(candidate)
    }

    /// What the displayed list currently derives from
    pub fn current_request(&self) -> Current {
        self.scheduler.current()
    }

    /// Number of lookup results dropped as stale
    pub fn stale_discards(&self) -> u64 {
        self.scheduler.stale_discards()
    }

    pub fn phase(&self) -> Phase {
        let s = &self.selection;
        if s.text.is_empty() && s.active.is_none() && !s.visible {
            return Phase::Empty;
        }
        let committed_text = s.committed.as_ref().map(|c| self.ops.project(c));
        if !s.visible && committed_text.as_deref() == Some(s.text.as_str()) {
            Phase::Committed
        } else {
            Phase::Typing
        }
    }

    /// Drain the queued view events
    pub fn take_events(&mut self) -> Vec<ViewEvent<T>> {
        std::mem::take(&mut self.events)
    }

    /// Verify the selection invariants
    ///
    /// # Returns
    /// * `Result<(), String>` - A description of the first violation
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if let Some(id) = self.selection.active {
            if !self.nodes.iter().any(|n| n.id == id) {
                return Err(format!("active node {id} is not displayed"));
            }
        }
        if self.selection.visible && self.nodes.is_empty() {
            return Err("dropdown visible without candidates".to_string());
        }
        Ok(())
    }

    /* ------------------------------ text & lookups ------------------------------ */

    /// Handle an effective text change
    ///
    /// # Arguments
    /// * `new` - Input text after the change
    /// * `old` - Input text before the change
    ///
    /// # Returns
    /// * `Decision` - Whether the host must dispatch a lookup
    pub fn on_text_changed(&mut self, new: &str, old: &str) -> Decision {
        if new == old {
            return Decision::Unchanged;
        }

        self.transition(|this| {
            this.selection.text = new.to_string();

            let committed_text = this.selection.committed.as_ref().map(|c| this.ops.project(c));
            let ctx = RouteContext {
                committed_text: committed_text.as_deref(),
                displayed: this.nodes.len(),
                item_max: this.config.item_max,
            };

            match this.scheduler.route(new, old, ctx) {
                Route::Unchanged => Decision::Unchanged,
                Route::Filter => {
                    let narrowed = this.filter_displayed(new);
                    this.show(narrowed);
                    this.select_from_current_text();
                    Decision::Filtered
                }
                Route::Dispatch(ticket) => Decision::Dispatched(ticket),
            }
        })
    }

    /// Record the text the input shows while its change is still debounced.
    ///
    /// Nothing is routed here; the change arrives later through
    /// [`Typeahead::on_text_changed`]. A lookup landing in between matches its
    /// candidates against this text.
    pub fn set_input_text(&mut self, text: &str) {
        self.selection.text = text.to_string();
    }

    /// Apply the outcome of a dispatched lookup
    ///
    /// Results of superseded generations are dropped whatever they contain.
    /// A failure of the current lookup leaves everything displayed as is.
    ///
    /// # Arguments
    /// * `generation` - Generation from the lookup's ticket
    /// * `result` - Candidates, or the source's error
    ///
    /// # Returns
    /// * `Result<LookupOutcome>` - `Err` carries a current lookup's failure,
    ///   to be surfaced to the host once
    pub fn apply_lookup(
        &mut self,
        generation: Generation,
        result: Result<Vec<T>>,
    ) -> Result<LookupOutcome> {
        if !self.scheduler.accept(generation) {
            return Ok(LookupOutcome::Stale);
        }

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                warn!(%generation, error = %e, "lookup failed");
                return Err(e);
            }
        };

        debug!(%generation, count = items.len(), "applying lookup result");
        self.transition(|this| {
            this.show(items);
            this.select_from_current_text();
        });
        Ok(LookupOutcome::Applied)
    }

    /* ------------------------------ selection ------------------------------ */

    /// Select a candidate, or clear the widget with `None`
    ///
    /// # Arguments
    /// * `candidate` - Value to commit
    /// * `keep_open` - Keep the dropdown open for further browsing
    pub fn select(&mut self, candidate: Option<T>, keep_open: bool) {
        self.transition(|this| match candidate {
            Some(c) => {
                let node = this.position_of(&c).map(|i| this.nodes[i].id);
                this.commit(c, node, keep_open);
            }
            None => this.clear(),
        });
    }

    /// Pointer selection of a displayed node
    ///
    /// # Returns
    /// * `bool` - False if no such node is displayed
    pub fn select_node(&mut self, id: NodeId) -> bool {
        let Some(candidate) = self
            .nodes
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.candidate.clone())
        else {
            return false;
        };
        self.transition(|this| this.commit(candidate, Some(id), false));
        true
    }

    /// Value pushed in by the host (form reset, initial value)
    pub fn set_value(&mut self, value: Option<T>) {
        self.select(value, false);
    }

    /// Auto-commit on a unique prefix match of `text`; clear on empty text
    pub fn select_from_text(&mut self, text: &str) {
        let text = text.to_string();
        self.transition(|this| this.select_from_text_inner(&text));
    }

    /// Move the highlight; returns false on an empty list
    pub fn cycle(&mut self, direction: Direction) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        self.transition(|this| {
            this.selection.active = selection::cycle(&this.nodes, this.selection.active, direction);
        });
        true
    }

    /// Commit the highlighted candidate unless it is already committed
    ///
    /// # Returns
    /// * `bool` - True if something was committed
    pub fn commit_active(&mut self) -> bool {
        let Some(node) = self.active() else {
            return false;
        };
        if let Some(committed) = &self.selection.committed {
            if self.ops.same(&node.candidate, committed) {
                return false;
            }
        }
        let (candidate, id) = (node.candidate.clone(), node.id);
        self.transition(|this| this.commit(candidate, Some(id), false));
        true
    }

    /// Hide the dropdown, keeping text and highlight
    pub fn hide(&mut self) {
        self.transition(|this| this.selection.visible = false);
    }

    /// Keyboard entry point
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        let handled = match key {
            Key::Down => self.cycle(Direction::Next),
            Key::Up => self.cycle(Direction::Previous),
            Key::Enter => self.commit_active(),
            Key::Escape => {
                self.hide();
                true
            }
            Key::Other => false,
        };
        if handled {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }

    /// The input gained focus: show the dropdown if there is anything in it
    pub fn focus_gained(&mut self) {
        self.transition(|this| {
            this.selection.focused = true;
            this.selection.visible = !this.nodes.is_empty();
        });
    }

    /// The input lost focus. Hiding waits for [`Typeahead::blur_grace_elapsed`]
    /// so a pointer selection still lands.
    pub fn focus_lost(&mut self) {
        self.selection.focused = false;
    }

    /// The focus-loss grace delay elapsed: hide unless focus came back
    pub fn blur_grace_elapsed(&mut self) {
        if self.selection.focused {
            return;
        }
        self.hide();
    }

    /* ------------------------------ internals ------------------------------ */

    /// Run a transition and queue highlight/visibility events for its net effect
    fn transition<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let active_before = self.selection.active;
        let visible_before = self.selection.visible;

        let out = f(self);

        if self.selection.active != active_before {
            let candidate = self.active().map(|n| n.candidate.clone());
            self.events.push(ViewEvent::ActiveChanged {
                previous: active_before,
                current: self.selection.active,
                candidate,
            });
        }
        if self.selection.visible != visible_before {
            self.events
                .push(ViewEvent::VisibilityChanged(self.selection.visible));
        }
        debug_assert!(
            self.check_invariants().is_ok(),
            "selection invariant violated: {:?}",
            self.check_invariants()
        );
        out
    }

    fn position_of(&self, candidate: &T) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| self.ops.same(candidate, &n.candidate))
    }

    fn filter_displayed(&self, text: &str) -> Vec<T> {
        let needle = self.normalizer.normalize(text);
        self.nodes
            .iter()
            .filter(|n| {
                let projected = self.ops.project(&n.candidate);
                text::matches(&needle, &self.normalizer.normalize(&projected))
            })
            .map(|n| n.candidate.clone())
            .collect()
    }

    /// Reconcile the displayed list to `items`
    fn show(&mut self, items: Vec<T>) {
        let previous = std::mem::take(&mut self.nodes);
        let ops = &self.ops;
        let reconciled = self
            .reconciler
            .reconcile(previous, items, |a, b| ops.same(a, b));

        self.nodes = reconciled.nodes;
        if !reconciled.ops.is_empty() {
            self.events.push(ViewEvent::CandidatesChanged(reconciled.ops));
        }
        self.selection.reset_to_first(&self.nodes);
    }

    fn select_from_current_text(&mut self) {
        let text = self.selection.text.clone();
        self.select_from_text_inner(&text);
    }

    fn select_from_text_inner(&mut self, text: &str) {
        if text.is_empty() {
            self.clear();
            return;
        }

        let needle = self.normalizer.normalize(text).into_owned();
        let unique = {
            let mut matching = self.nodes.iter().filter(|n| {
                let projected = self.ops.project(&n.candidate);
                text::matches(&needle, &self.normalizer.normalize(&projected))
            });
            match (matching.next(), matching.next()) {
                (Some(node), None) => Some((node.candidate.clone(), node.id)),
                _ => None,
            }
        };

        if let Some((candidate, id)) = unique {
            self.commit(candidate, Some(id), true);
        }
    }

    fn commit(&mut self, candidate: T, node: Option<NodeId>, keep_open: bool) {
        let text = self.ops.project(&candidate);
        let unchanged = self.selection.text == text
            && self
                .selection
                .committed
                .as_ref()
                .is_some_and(|c| self.ops.same(c, &candidate));

        self.selection.active = node;
        self.selection.visible = keep_open && !self.nodes.is_empty();
        if unchanged {
            return;
        }

        debug!(text = %text, keep_open, "committing selection");
        self.selection.text = text.clone();
        self.selection.committed = Some(candidate.clone());
        self.events.push(ViewEvent::SelectionCommitted {
            value: Some(candidate),
            text,
        });
    }

    fn clear(&mut self) {
        debug!("clearing selection");
        self.selection.text.clear();
        self.selection.committed = None;
        self.scheduler.clear();
        self.show(Vec::new());
        self.events.push(ViewEvent::SelectionCommitted {
            value: None,
            text: String::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(case_sensitive: bool) -> Typeahead<String> {
        let config = Config {
            case_sensitive,
            ..Config::default()
        };
        Typeahead::new(config, CandidateOps::strings())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ticket(decision: Decision) -> LookupTicket {
        match decision {
            Decision::Dispatched(ticket) => ticket,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn test_new_engine_is_empty() {
        let e = engine(true);
        assert_eq!(e.phase(), Phase::Empty);
        assert!(e.check_invariants().is_ok());
        assert_eq!(e.current_request(), Current::Idle);
    }

    #[test]
    fn test_dispatch_carries_raw_text() {
        let mut e = engine(false);
        let t = ticket(e.on_text_changed("AnN", ""));
        assert_eq!(t.prefix, "AnN");
        assert_eq!(e.text(), "AnN");
    }

    #[test]
    fn test_apply_populates_and_highlights_first() {
        let mut e = engine(false);
        let t = ticket(e.on_text_changed("a", ""));
        let outcome = e
            .apply_lookup(t.generation, Ok(strings(&["Anna Adams", "Anna Lee", "Bob Smith"])))
            .unwrap();
        assert_eq!(outcome, LookupOutcome::Applied);
        assert_eq!(e.nodes().len(), 3);
        assert_eq!(e.active().map(|n| n.candidate.as_str()), Some("Anna Adams"));
        assert!(e.is_visible());
        assert_eq!(e.committed(), None);
        assert_eq!(e.phase(), Phase::Typing);

        let events = e.take_events();
        assert!(matches!(events[0], ViewEvent::CandidatesChanged(ref ops) if ops.len() == 3));
        assert!(events.iter().any(|ev| matches!(ev, ViewEvent::ActiveChanged { .. })));
        assert!(events.contains(&ViewEvent::VisibilityChanged(true)));
    }

    #[test]
    fn test_select_none_clears_everything() {
        let mut e = engine(true);
        let t = ticket(e.on_text_changed("A", ""));
        e.apply_lookup(t.generation, Ok(strings(&["Anna", "Alan"]))).unwrap();
        e.take_events();

        e.select(None, false);

        assert_eq!(e.text(), "");
        assert!(e.nodes().is_empty());
        assert_eq!(e.phase(), Phase::Empty);
        assert_eq!(e.current_request(), Current::Idle);
        let events = e.take_events();
        assert!(events.contains(&ViewEvent::SelectionCommitted {
            value: None,
            text: String::new()
        }));
        assert!(events.contains(&ViewEvent::VisibilityChanged(false)));
    }

    #[test]
    fn test_select_candidate_commits_text() {
        let mut e = engine(true);
        let t = ticket(e.on_text_changed("A", ""));
        e.apply_lookup(t.generation, Ok(strings(&["Anna", "Alan"]))).unwrap();

        e.select(Some("Alan".to_string()), false);

        assert_eq!(e.text(), "Alan");
        assert_eq!(e.committed().map(String::as_str), Some("Alan"));
        assert_eq!(e.active().map(|n| n.candidate.as_str()), Some("Alan"));
        assert!(!e.is_visible());
        assert_eq!(e.phase(), Phase::Committed);
    }

    #[test]
    fn test_select_keep_open_stays_typing() {
        let mut e = engine(true);
        let t = ticket(e.on_text_changed("A", ""));
        e.apply_lookup(t.generation, Ok(strings(&["Anna", "Alan"]))).unwrap();

        e.select(Some("Anna".to_string()), true);
        assert!(e.is_visible());
        assert_eq!(e.phase(), Phase::Typing);
    }

    #[test]
    fn test_select_value_not_displayed_has_no_active() {
        let mut e = engine(true);
        e.set_value(Some("Zed".to_string()));
        assert_eq!(e.text(), "Zed");
        assert!(e.active().is_none());
        assert!(e.check_invariants().is_ok());
    }

    #[test]
    fn test_select_node_by_pointer() {
        let mut e = engine(true);
        let t = ticket(e.on_text_changed("A", ""));
        e.apply_lookup(t.generation, Ok(strings(&["Anna", "Alan"]))).unwrap();
        let alan = e.nodes()[1].id;

        assert!(e.select_node(alan));
        assert_eq!(e.text(), "Alan");
        assert_eq!(e.committed().map(String::as_str), Some("Alan"));
        assert!(!e.is_visible());

        e.select(None, false);
        assert!(!e.select_node(alan), "node is no longer displayed");
        assert_eq!(e.text(), "");
    }

    #[test]
    fn test_escape_hides_without_touching_selection() {
        let mut e = engine(true);
        let t = ticket(e.on_text_changed("A", ""));
        e.apply_lookup(t.generation, Ok(strings(&["Anna", "Alan"]))).unwrap();
        let active = e.active().map(|n| n.id);

        assert_eq!(e.handle_key(Key::Escape), KeyOutcome::Handled);
        assert!(!e.is_visible());
        assert_eq!(e.active().map(|n| n.id), active);
        assert_eq!(e.text(), "A");
    }

    #[test]
    fn test_other_keys_pass_through() {
        let mut e = engine(true);
        assert_eq!(e.handle_key(Key::Other), KeyOutcome::Ignored);
        assert_eq!(e.handle_key(Key::Enter), KeyOutcome::Ignored);
    }

    #[test]
    fn test_focus_shows_only_non_empty_list() {
        let mut e = engine(true);
        e.focus_gained();
        assert!(!e.is_visible());

        let t = ticket(e.on_text_changed("A", ""));
        e.apply_lookup(t.generation, Ok(strings(&["Anna", "Alan"]))).unwrap();
        e.hide();
        e.focus_gained();
        assert!(e.is_visible());
    }

    #[test]
    fn test_blur_grace_rechecks_focus() {
        let mut e = engine(true);
        let t = ticket(e.on_text_changed("A", ""));
        e.apply_lookup(t.generation, Ok(strings(&["Anna", "Alan"]))).unwrap();
        e.focus_gained();

        e.focus_lost();
        assert!(e.is_visible(), "hiding waits for the grace delay");
        e.focus_gained();
        e.blur_grace_elapsed();
        assert!(e.is_visible(), "focus came back before the delay elapsed");

        e.focus_lost();
        e.blur_grace_elapsed();
        assert!(!e.is_visible());
    }
}
