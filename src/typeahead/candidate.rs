//! Caller-supplied views onto opaque candidate values
//!
//! The engine never looks inside a candidate. It only asks for its text
//! (for matching and for filling the input on commit) and whether two
//! candidates are the same (for reconciliation and commit checks).

use std::fmt;
use std::sync::Arc;

type ProjectFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
type SameFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Text projection and structural equality for candidates of type `T`
pub struct CandidateOps<T> {
    project: ProjectFn<T>,
    same: SameFn<T>,
}

impl<T> Clone for CandidateOps<T> {
    fn clone(&self) -> Self {
        Self {
            project: Arc::clone(&self.project),
            same: Arc::clone(&self.same),
        }
    }
}

impl<T> fmt::Debug for CandidateOps<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateOps").finish_non_exhaustive()
    }
}

impl<T: PartialEq> CandidateOps<T> {
    /// Create candidate ops from a projection, comparing candidates with `==`
    ///
    /// # Arguments
    /// * `project` - Text representation of a candidate
    pub fn new(project: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        Self {
            project: Arc::new(project),
            same: Arc::new(|a: &T, b: &T| a == b),
        }
    }
}

impl<T> CandidateOps<T> {
    /// Create candidate ops with an explicit equality predicate
    pub fn with_equality(
        project: impl Fn(&T) -> String + Send + Sync + 'static,
        same: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            project: Arc::new(project),
            same: Arc::new(same),
        }
    }

    /// Text representation of a candidate
    pub fn project(&self, candidate: &T) -> String {
        (self.project)(candidate)
    }

    /// Whether two candidates are structurally equal
    pub fn same(&self, a: &T, b: &T) -> bool {
        (self.same)(a, b)
    }
}

impl CandidateOps<String> {
    /// Candidate ops for plain string candidates
    pub fn strings() -> Self {
        Self::new(|s: &String| s.clone())
    }
}
