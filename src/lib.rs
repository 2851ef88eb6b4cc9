//! Typeahead Library
//!
//! An incremental suggestion engine for text inputs. As the user types, it
//! decides whether to narrow the already displayed candidates locally or to
//! ask the candidate source again, discards answers to superseded lookups,
//! reconciles the displayed list with minimal churn and keeps a keyboard
//! navigable highlight.
//!
//! # Modules
//!
//! - `config`: Resolved configuration, process-wide defaults, settings file
//! - `error`: Error types and handling
//! - `render`: Terminal rendering of a dropdown
//! - `typeahead`: The engine, its components and the tokio session driver
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use typeahead::{CandidateOps, Config, ListView, Session, StaticSource, Typeahead};
//!
//! #[tokio::main]
//! async fn main() {
//!     let names = vec!["Anna Adams".to_string(), "Bob Smith".to_string()];
//!     let source = StaticSource::new(names, CandidateOps::strings());
//!     let engine = Typeahead::new(Config::default(), CandidateOps::strings());
//!     let mut session = Session::new(engine, Arc::new(source), ListView::<String>::new());
//!
//!     session.input("Bo");
//!     session.settle().await;
//!     assert_eq!(session.view().text(), "Bob Smith");
//! }
//! ```

pub mod config;
pub mod error;
pub mod render;
pub mod typeahead;

// Re-export commonly used types
pub use config::{Config, ConfigOverrides};
pub use error::{Result, TypeaheadError};
pub use typeahead::{
    CandidateOps, CandidateSource, Key, ListView, Session, StaticSource, Typeahead, ViewBinding,
    ViewEvent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
