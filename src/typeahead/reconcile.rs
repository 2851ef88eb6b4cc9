//! Incremental reconciliation of the displayed candidate list
//!
//! The reconciler turns the currently displayed nodes and a freshly computed
//! candidate list into the new node list plus the insert/remove operations a
//! view must execute to get there. It assumes both lists share an order and
//! that changes are mostly appends or replacements at the tail, which is what
//! successive narrowing queries produce.
//!
//! The diff walks both lists with two cursors. A node whose candidate equals
//! the next incoming candidate is kept; otherwise a new node is inserted in
//! front of it and the old node is compared again against the following
//! candidate. Whatever old nodes remain after the incoming list is exhausted
//! are removed. This is not a longest-common-subsequence diff: a reordered
//! list produces more inserts than strictly necessary.

use std::fmt;

use tracing::trace;

/// Identifier of a displayed node.
///
/// Allocated when a candidate first appears; the view maps it to its own UI
/// node and keeps that node until a matching remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A displayed candidate together with its node identity
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateNode<T> {
    pub id: NodeId,
    pub candidate: T,
}

/// One instruction for the view.
///
/// Operations are ordered; each `index` refers to the list as it stands after
/// every earlier operation has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp<T> {
    /// Create a node for `candidate` at `index`, placed right after `after`
    /// (or at the head of the list when `None`)
    Insert {
        index: usize,
        after: Option<NodeId>,
        node: NodeId,
        candidate: T,
    },
    /// Destroy the node at `index`
    Remove { index: usize, node: NodeId },
}

/// Result of one reconciliation pass
#[derive(Debug, Clone)]
pub struct Reconciled<T> {
    pub nodes: Vec<CandidateNode<T>>,
    pub ops: Vec<ListOp<T>>,
}

/// Allocates node identities and diffs candidate lists
#[derive(Debug, Default)]
pub struct Reconciler {
    next_id: u64,
}

impl Reconciler {
    /// Create a reconciler whose first node gets id 0
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Reconcile `previous` into a list displaying `next`
    ///
    /// # Arguments
    /// * `previous` - Currently displayed nodes, in display order
    /// * `next` - Candidates to display, in display order
    /// * `same` - Structural equality between candidates
    ///
    /// # Returns
    /// * `Reconciled<T>` - The new node list and the operations producing it
    pub fn reconcile<T, F>(
        &mut self,
        previous: Vec<CandidateNode<T>>,
        next: Vec<T>,
        same: F,
    ) -> Reconciled<T>
    where
        T: Clone,
        F: Fn(&T, &T) -> bool,
    {
        let mut nodes = previous;
        let mut ops = Vec::new();
        let mut j = 0usize;

        for candidate in next {
            let keep = nodes
                .get(j)
                .is_some_and(|node| same(&candidate, &node.candidate));

            if keep {
                trace!(index = j, node = %nodes[j].id, "keeping node");
            } else {
                let id = self.allocate();
                let after = j.checked_sub(1).map(|k| nodes[k].id);
                trace!(index = j, node = %id, "inserting node");
                ops.push(ListOp::Insert {
                    index: j,
                    after,
                    node: id,
                    candidate: candidate.clone(),
                });
                nodes.insert(j, CandidateNode { id, candidate });
            }
            j += 1;
        }

        for node in nodes.split_off(j) {
            trace!(index = j, node = %node.id, "removing node");
            ops.push(ListOp::Remove {
                index: j,
                node: node.id,
            });
        }

        Reconciled { nodes, ops }
    }
}
