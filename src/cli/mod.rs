//! Command-line interface for the typeahead demo
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Settings loading and installation of the process-wide defaults
//! - Loading the candidate list
//! - Parsing the scripted typing session

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

use typeahead::config::{self, Config, ConfigOverrides, LogLevel, Settings};
use typeahead::error::{ConfigError, Result, TypeaheadError};
use typeahead::typeahead::{CandidateOps, Key};

/// Candidates used when no candidate file is given
const SAMPLE_CANDIDATES: &[&str] = &[
    "Anna Adams",
    "Anna Lee",
    "Andrew Brown",
    "Bob Smith",
    "Bobby Tables",
    "Carla Diaz",
    "Carl Jensen",
];

/// Typeahead demo - replays a typing session against a candidate list
#[derive(Parser, Debug)]
#[command(
    name = "typeahead",
    version,
    about = "Replay a typing session through the typeahead engine",
    long_about = "Replays a scripted typing session through the typeahead engine and prints
the dropdown after every step.

Steps are plain text (typed one keystroke per character) or one of
<down> <up> <enter> <esc> <bs> <focus> <blur> <clear> <click:N>."
)]
pub struct CliArgs {
    /// Script steps
    #[arg(value_name = "STEP")]
    pub steps: Vec<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Candidate file: a JSON array of strings or objects, or one candidate per line
    #[arg(long, value_name = "FILE")]
    pub candidates: Option<PathBuf>,

    /// Field holding the text of object candidates
    #[arg(long, value_name = "FIELD", default_value = "name")]
    pub text_field: String,

    /// Match candidates case-insensitively
    #[arg(long)]
    pub case_insensitive: bool,

    /// Maximum number of displayed candidates that still allows local filtering
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub item_max: Option<i64>,

    /// Debounce delay for keystrokes, in milliseconds
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub debounce_ms: Option<i64>,

    /// Simulated lookup latency, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub latency_ms: u64,

    /// Give up on a lookup after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub lookup_timeout_ms: Option<u64>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for the demo
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Show configuration
    Config {
        /// Show the effective defaults as TOML
        #[arg(long)]
        show: bool,
    },
}

/// One step of a scripted session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Type these characters, one keystroke each
    Type(String),
    Key(Key),
    /// Delete the last character
    Backspace,
    Focus,
    Blur,
    /// Empty the input in one keystroke
    Clear,
    /// Click the n-th displayed candidate, counting from 1
    Click(usize),
}

impl Step {
    /// Parse a script step
    ///
    /// # Arguments
    /// * `raw` - Step as given on the command line
    ///
    /// # Returns
    /// * `Result<Step>` - Parsed step or error for an unknown `<...>` step
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(name) = raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) else {
            return Ok(Step::Type(raw.to_string()));
        };

        let step = match name.to_lowercase().as_str() {
            "down" => Step::Key(Key::Down),
            "up" => Step::Key(Key::Up),
            "enter" => Step::Key(Key::Enter),
            "esc" | "escape" => Step::Key(Key::Escape),
            "bs" | "backspace" => Step::Backspace,
            "focus" => Step::Focus,
            "blur" => Step::Blur,
            "clear" => Step::Clear,
            other => match other.strip_prefix("click:").map(str::parse::<usize>) {
                Some(Ok(n)) if n > 0 => Step::Click(n),
                _ => {
                    return Err(TypeaheadError::Generic(format!("Unknown script step '{raw}'")));
                }
            },
        };
        Ok(step)
    }
}

/// Text of a candidate: strings as is, objects by `field`
///
/// # Arguments
/// * `value` - Candidate
/// * `field` - Field of object candidates holding the text
pub fn project_value(value: &Value, field: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Parse a candidate list
///
/// A JSON array is taken element by element; anything else is read as one
/// candidate per non-blank line.
pub fn parse_candidates(text: &str) -> Result<Vec<Value>> {
    if text.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(text)?;
        return Ok(values);
    }
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Value::String(line.to_string()))
        .collect())
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded settings file
    settings: Settings,

    /// Resolved configuration for the demo widget
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// Loads the settings file, installs its `[defaults]` as the process-wide
    /// defaults and resolves the command-line overrides on top.
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        Self::from_args(args)
    }

    fn from_args(args: CliArgs) -> Result<Self> {
        let settings = Settings::load_from_file(args.config_file.as_deref())?;
        settings.install_defaults()?;
        let config = Self::overrides(&args).resolve()?;

        Ok(Self {
            args,
            settings,
            config,
        })
    }

    /// Instance overrides given on the command line
    fn overrides(args: &CliArgs) -> ConfigOverrides {
        ConfigOverrides {
            case_sensitive: args.case_insensitive.then_some(false),
            item_max: args.item_max,
            debounce_ms: args.debounce_ms,
            ..ConfigOverrides::default()
        }
    }

    /// Get the resolved configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Log level from the flags, falling back to the settings file
    pub fn log_level(&self) -> tracing::Level {
        if self.args.very_verbose {
            LogLevel::Trace.to_tracing_level()
        } else if self.args.verbose {
            LogLevel::Debug.to_tracing_level()
        } else {
            self.settings.logging.level.to_tracing_level()
        }
    }

    /// Whether log lines carry timestamps
    pub fn log_timestamps(&self) -> bool {
        self.settings.logging.timestamps
    }

    /// Parsed script steps
    pub fn steps(&self) -> Result<Vec<Step>> {
        self.args.steps.iter().map(|s| Step::parse(s)).collect()
    }

    /// Candidate projection for the configured text field
    pub fn candidate_ops(&self) -> CandidateOps<Value> {
        let field = self.args.text_field.clone();
        CandidateOps::new(move |value: &Value| project_value(value, &field))
    }

    /// Load the candidate list, or the built-in sample
    pub fn load_candidates(&self) -> Result<Vec<Value>> {
        match &self.args.candidates {
            Some(path) => Self::read_candidates(path),
            None => Ok(SAMPLE_CANDIDATES
                .iter()
                .map(|s| Value::String(s.to_string()))
                .collect()),
        }
    }

    fn read_candidates(path: &Path) -> Result<Vec<Value>> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let text = std::fs::read_to_string(path)?;
        parse_candidates(&text)
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if subcommand was handled, false to continue
    pub fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Version) => {
                println!("typeahead version {}", env!("CARGO_PKG_VERSION"));
                println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
                Ok(true)
            }
            Some(Commands::Config { show }) => {
                if *show {
                    self.show_config()?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Show the effective process-wide defaults
    fn show_config(&self) -> Result<()> {
        let path = self
            .args
            .config_file
            .clone()
            .unwrap_or_else(Settings::default_path);
        println!("# Configuration file: {}", path.display());
        println!("{}", toml::to_string_pretty(&config::defaults())?);
        Ok(())
    }
}
