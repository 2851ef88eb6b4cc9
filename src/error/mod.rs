//! Error handling module for the typeahead engine.
//!
//! This module provides:
//! - A single crate-wide error type, [`TypeaheadError`]
//! - Specific error kinds for candidate lookups and configuration
//! - The crate-wide [`Result`] alias
//!
//! Stale lookup results are not errors: they are reported as
//! [`LookupOutcome::Stale`](crate::typeahead::LookupOutcome::Stale) and never
//! reach the host.
//!
//! # Example
//!
//! ```rust
//! use typeahead::error::{ConfigError, Result, TypeaheadError};
//!
//! fn check_item_max(value: i64) -> Result<usize> {
//!     if value <= 0 {
//!         return Err(ConfigError::invalid("item_max", value, "must be greater than zero").into());
//!     }
//!     Ok(value as usize)
//! }
//!
//! assert!(matches!(check_item_max(0), Err(TypeaheadError::Config(_))));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, LookupError, Result, TypeaheadError};
