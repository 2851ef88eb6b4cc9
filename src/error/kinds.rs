use std::{fmt, io};

/// Crate-wide `Result` type using [`TypeaheadError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, TypeaheadError>;

/// Top-level error type for typeahead operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum TypeaheadError {
    /// Candidate lookup errors.
    Lookup(LookupError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors raised by a candidate source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The source answered with a failure.
    Failed(String),

    /// The source could not be reached.
    Unavailable(String),

    /// The source did not answer in time.
    Timeout,
}

/// Configuration-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Build an [`ConfigError::InvalidValue`] for a rejected field.
    pub fn invalid(field: &str, value: impl fmt::Display, reason: &str) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for TypeaheadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeaheadError::Lookup(e) => write!(f, "Lookup error: {e}"),
            TypeaheadError::Config(e) => write!(f, "Configuration error: {e}"),
            TypeaheadError::Io(e) => write!(f, "I/O error: {e}"),
            TypeaheadError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Failed(msg) => write!(f, "Lookup failed: {msg}"),
            LookupError::Unavailable(msg) => write!(f, "Candidate source unavailable: {msg}"),
            LookupError::Timeout => write!(f, "Lookup timed out"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(f, "Invalid value '{value}' for field '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for TypeaheadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TypeaheadError::Lookup(e) => Some(e),
            TypeaheadError::Config(e) => Some(e),
            TypeaheadError::Io(e) => Some(e),
            TypeaheadError::Generic(_) => None,
        }
    }
}
impl std::error::Error for LookupError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to TypeaheadError ========================= */

impl From<io::Error> for TypeaheadError {
    fn from(err: io::Error) -> Self {
        TypeaheadError::Io(err)
    }
}

impl From<LookupError> for TypeaheadError {
    fn from(err: LookupError) -> Self {
        TypeaheadError::Lookup(err)
    }
}

impl From<ConfigError> for TypeaheadError {
    fn from(err: ConfigError) -> Self {
        TypeaheadError::Config(err)
    }
}

impl From<toml::de::Error> for TypeaheadError {
    fn from(err: toml::de::Error) -> Self {
        TypeaheadError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for TypeaheadError {
    fn from(err: toml::ser::Error) -> Self {
        TypeaheadError::Generic(format!("Failed to serialize configuration: {err}"))
    }
}

impl From<serde_json::Error> for TypeaheadError {
    fn from(err: serde_json::Error) -> Self {
        TypeaheadError::Generic(format!("Invalid candidate data: {err}"))
    }
}
