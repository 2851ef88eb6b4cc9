//! Selection state of one widget
//!
//! Holds the input text, the highlighted candidate, dropdown visibility, the
//! committed value and the focus flag. Transitions that touch other
//! components (clearing the request, reconciling) live on
//! [`Typeahead`](super::Typeahead); this module keeps the parts that only
//! depend on the displayed list.

use super::reconcile::{CandidateNode, NodeId};

/// Coarse state of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No text, nothing highlighted, dropdown hidden
    Empty,
    /// Text diverges from any committed value, or the list is kept open
    Typing,
    /// Text equals the committed value and the dropdown is hidden
    Committed,
}

/// Direction of keyboard cycling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone)]
pub struct Selection<T> {
    pub text: String,
    pub active: Option<NodeId>,
    pub visible: bool,
    pub committed: Option<T>,
    pub focused: bool,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            text: String::new(),
            active: None,
            visible: false,
            committed: None,
            focused: false,
        }
    }
}

impl<T> Selection<T> {
    /// Position of the active node in `nodes`
    pub fn active_index(&self, nodes: &[CandidateNode<T>]) -> Option<usize> {
        let id = self.active?;
        nodes.iter().position(|n| n.id == id)
    }

    /// Reset after reconciliation: highlight the first node and show the
    /// dropdown iff something is displayed
    pub fn reset_to_first(&mut self, nodes: &[CandidateNode<T>]) {
        self.active = nodes.first().map(|n| n.id);
        self.visible = !nodes.is_empty();
    }
}

/// Node reached by cycling from `active`, wrapping around.
///
/// Without an active node, `Next` lands on the first node and `Previous` on
/// the last. Returns `None` only for an empty list.
pub fn cycle<T>(
    nodes: &[CandidateNode<T>],
    active: Option<NodeId>,
    direction: Direction,
) -> Option<NodeId> {
    if nodes.is_empty() {
        return None;
    }
    let len = nodes.len();
    let position = active.and_then(|id| nodes.iter().position(|n| n.id == id));
    let index = match (direction, position) {
        (Direction::Next, Some(i)) => (i + 1) % len,
        (Direction::Next, None) => 0,
        (Direction::Previous, Some(0)) | (Direction::Previous, None) => len - 1,
        (Direction::Previous, Some(i)) => i - 1,
    };
    Some(nodes[index].id)
}
