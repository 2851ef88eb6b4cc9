//! Incremental suggestion engine for a text input
//!
//! This module provides:
//! - Text normalization and prefix matching ([`text`])
//! - Query scheduling: local filter versus remote lookup, with stale result
//!   suppression through request generations ([`scheduler`])
//! - Incremental reconciliation of the displayed list ([`reconcile`])
//! - Selection state: highlight, keyboard cycling, single-match auto-commit
//!   ([`selection`], [`engine`])
//! - Debouncing of keystrokes ([`debounce`])
//! - A tokio driver binding an engine to a source and a view ([`session`])
//!
//! The engine itself is synchronous and free of I/O. It is fed text changes,
//! keys, focus changes and lookup results, and answers with [`ViewEvent`]s.
//!
//! # Example
//!
//! ```rust
//! use typeahead::config::Config;
//! use typeahead::typeahead::{CandidateOps, Decision, Typeahead};
//!
//! let mut engine = Typeahead::new(Config::default(), CandidateOps::strings());
//! let Decision::Dispatched(ticket) = engine.on_text_changed("Bo", "") else {
//!     panic!("first keystroke goes to the source");
//! };
//! engine
//!     .apply_lookup(ticket.generation, Ok(vec!["Bob Smith".to_string()]))
//!     .unwrap();
//!
//! // A single match is committed while the list stays open.
//! assert_eq!(engine.text(), "Bob Smith");
//! assert!(engine.is_visible());
//! ```

pub mod candidate;
pub mod debounce;
pub mod engine;
pub mod keys;
pub mod reconcile;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod source;
pub mod text;
pub mod view;

pub use candidate::CandidateOps;
pub use debounce::{DebounceGate, Gate, TextChange};
pub use engine::{Decision, LookupOutcome, Typeahead};
pub use keys::{Key, KeyOutcome};
pub use reconcile::{CandidateNode, ListOp, NodeId, Reconciled, Reconciler};
pub use scheduler::{Current, Generation, LookupTicket, QueryScheduler, Route};
pub use selection::{Direction, Phase};
pub use session::{BLUR_GRACE, Input, Session};
pub use source::{CandidateSource, FnSource, StaticSource};
pub use text::Normalizer;
pub use view::{ListView, ViewBinding, ViewEvent};
