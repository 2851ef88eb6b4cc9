//! View collaborator interface
//!
//! The engine never touches UI nodes. It emits [`ViewEvent`]s which a view
//! layer executes; [`ListView`] is an in-memory view used by the demo binary
//! and by tests.

use tracing::warn;

use super::reconcile::{CandidateNode, ListOp, NodeId};
use crate::error::TypeaheadError;

/// Instruction for the view layer
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent<T> {
    /// Ordered insert/remove operations for the dropdown
    CandidatesChanged(Vec<ListOp<T>>),
    /// The highlighted candidate moved. Only the two named nodes need to
    /// re-render their highlight.
    ActiveChanged {
        previous: Option<NodeId>,
        current: Option<NodeId>,
        candidate: Option<T>,
    },
    /// A value was committed (or cleared); `text` is what the input now shows
    SelectionCommitted { value: Option<T>, text: String },
    /// The dropdown was shown or hidden
    VisibilityChanged(bool),
}

/// Receives engine output. Every method has a no-op default.
pub trait ViewBinding<T>: Send {
    fn candidates_changed(&mut self, _ops: Vec<ListOp<T>>) {}

    fn active_changed(
        &mut self,
        _previous: Option<NodeId>,
        _current: Option<NodeId>,
        _candidate: Option<T>,
    ) {
    }

    fn selection_committed(&mut self, _value: Option<T>, _text: String) {}

    fn visibility_changed(&mut self, _visible: bool) {}

    /// Error channel: a current lookup failed. Called once per failure.
    fn lookup_failed(&mut self, _error: &TypeaheadError) {}
}

impl<T> ViewEvent<T> {
    /// Deliver this event to a view
    pub fn dispatch<V: ViewBinding<T> + ?Sized>(self, view: &mut V) {
        match self {
            ViewEvent::CandidatesChanged(ops) => view.candidates_changed(ops),
            ViewEvent::ActiveChanged {
                previous,
                current,
                candidate,
            } => view.active_changed(previous, current, candidate),
            ViewEvent::SelectionCommitted { value, text } => view.selection_committed(value, text),
            ViewEvent::VisibilityChanged(visible) => view.visibility_changed(visible),
        }
    }
}

/// In-memory view executing engine instructions
#[derive(Debug, Clone)]
pub struct ListView<T> {
    nodes: Vec<CandidateNode<T>>,
    active: Option<NodeId>,
    visible: bool,
    text: String,
    commits: Vec<Option<T>>,
    errors: Vec<String>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            active: None,
            visible: false,
            text: String::new(),
            commits: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> ListView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayed nodes in order
    pub fn nodes(&self) -> &[CandidateNode<T>] {
        &self.nodes
    }

    /// Displayed candidates in order
    pub fn candidates(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().map(|n| &n.candidate)
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    /// The highlighted candidate, if any
    pub fn active_candidate(&self) -> Option<&T> {
        let id = self.active?;
        self.nodes.iter().find(|n| n.id == id).map(|n| &n.candidate)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Text last written into the input by a commit
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Every committed value, oldest first
    pub fn commits(&self) -> &[Option<T>] {
        &self.commits
    }

    /// Every surfaced lookup failure, oldest first
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl<T: Send> ViewBinding<T> for ListView<T> {
    fn candidates_changed(&mut self, ops: Vec<ListOp<T>>) {
        for op in ops {
            match op {
                ListOp::Insert {
                    index,
                    node,
                    candidate,
                    ..
                } => {
                    if index > self.nodes.len() {
                        warn!(index, %node, "insert past the end of the list");
                        self.nodes.push(CandidateNode { id: node, candidate });
                    } else {
                        self.nodes.insert(index, CandidateNode { id: node, candidate });
                    }
                }
                ListOp::Remove { index, node } => match self.nodes.get(index) {
                    Some(existing) if existing.id == node => {
                        self.nodes.remove(index);
                    }
                    _ => {
                        warn!(index, %node, "remove does not match the displayed node");
                        self.nodes.retain(|n| n.id != node);
                    }
                },
            }
        }
    }

    fn active_changed(
        &mut self,
        _previous: Option<NodeId>,
        current: Option<NodeId>,
        _candidate: Option<T>,
    ) {
        self.active = current;
    }

    fn selection_committed(&mut self, value: Option<T>, text: String) {
        self.text = text;
        self.commits.push(value);
    }

    fn visibility_changed(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn lookup_failed(&mut self, error: &TypeaheadError) {
        self.errors.push(error.to_string());
    }
}
