//! Typeahead demo
//!
//! Replays a scripted typing session through the typeahead engine and prints
//! the dropdown after every step.
//!
//! # Usage
//!
//! ```bash
//! # Type "an", move down, commit
//! typeahead --case-insensitive an '<down>' '<enter>'
//!
//! # Candidates from a file, with a slow source
//! typeahead --candidates people.json --text-field name --latency-ms 300 Bo
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use typeahead::error::Result;
use typeahead::render::DropdownRenderer;
use typeahead::typeahead::{CandidateOps, ListView, Session, StaticSource, Typeahead};

mod cli;

use cli::{CliInterface, Step};

type DemoSession = Session<Value, ListView<Value>>;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load settings
/// 2. Initialize logging
/// 3. Handle subcommands or replay the script
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand()? {
        return Ok(());
    }

    replay(&cli).await
}

/// Replay every script step, printing the dropdown after each one
async fn replay(cli: &CliInterface) -> Result<()> {
    let steps = cli.steps()?;
    let config = cli.config().clone();
    let ops = cli.candidate_ops();

    let source = StaticSource::new(cli.load_candidates()?, ops.clone())
        .case_sensitive(config.case_sensitive)
        .with_limit(config.item_max)
        .with_latency(Duration::from_millis(cli.args().latency_ms));
    debug!(candidates = source.len(), "candidate source ready");

    let engine = Typeahead::new(config.clone(), ops.clone());
    let mut session = Session::new(engine, Arc::new(source), ListView::new());
    if let Some(ms) = cli.args().lookup_timeout_ms {
        session = session.with_lookup_timeout(Duration::from_millis(ms));
    }
    let renderer = DropdownRenderer::new(!cli.args().no_color);

    session.focus();
    print_state(&renderer, &session, &ops, "<start>", &config);

    for (raw, step) in cli.args().steps.iter().zip(&steps) {
        apply_step(&mut session, step);

        tokio::select! {
            _ = session.settle() => {}
            _ = tokio::signal::ctrl_c() => {
                session.shutdown();
                println!("Interrupted");
                return Ok(());
            }
        }

        print_state(&renderer, &session, &ops, raw, &config);
    }

    session.shutdown();
    Ok(())
}

/// Feed one step into the session
fn apply_step(session: &mut DemoSession, step: &Step) {
    match step {
        Step::Type(chars) => {
            let mut text = session.shown_text().to_string();
            for c in chars.chars() {
                text.push(c);
                session.input(text.clone());
            }
        }
        Step::Key(key) => {
            let outcome = session.key(*key);
            debug!(?key, ?outcome, "key replayed");
        }
        Step::Backspace => {
            let mut text = session.shown_text().to_string();
            text.pop();
            session.input(text);
        }
        Step::Focus => session.focus(),
        Step::Blur => session.blur(),
        Step::Clear => session.input(""),
        Step::Click(n) => {
            let node = session.view().nodes().get(n - 1).map(|node| node.id);
            match node {
                Some(id) => {
                    session.click(id);
                }
                None => warn!(position = n, "no displayed candidate to click"),
            }
        }
    }
}

fn print_state(
    renderer: &DropdownRenderer,
    session: &DemoSession,
    ops: &CandidateOps<Value>,
    label: &str,
    config: &typeahead::Config,
) {
    println!("$ {label}");
    println!(
        "{}",
        renderer.render(session.view(), session.shown_text(), |v| ops.project(v), config)
    );
    println!();
}

/// Initialize logging system based on verbosity level
///
/// `RUST_LOG` takes precedence over the flags and the settings file.
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(cli.log_level()).into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.log_timestamps() {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
