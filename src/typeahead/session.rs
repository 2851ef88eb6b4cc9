//! Session - drives one engine with real timers and lookups
//!
//! A [`Session`] owns a [`Typeahead`] engine, its candidate source and its
//! view. Everything runs on the task that owns the session: in-flight
//! lookups are polled through a `FuturesUnordered`, and the debounce and
//! focus-loss deadlines are plain `sleep_until`s raced against them, so the
//! engine is never shared and needs no locking.
//!
//! Two ways to drive a session:
//!
//! - call the input methods ([`Session::input`], [`Session::key`], ...) and
//!   then [`Session::tick`] / [`Session::settle`] to let time and lookups
//!   progress, or
//! - hand it a channel of [`Input`]s with [`Session::run`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::debounce::{DebounceGate, Gate, TextChange};
use super::engine::{Decision, Typeahead};
use super::keys::{Key, KeyOutcome};
use super::reconcile::NodeId;
use super::scheduler::{Generation, LookupTicket};
use super::source::CandidateSource;
use super::view::{ViewBinding, ViewEvent};
use crate::error::{LookupError, Result};

/// How long the dropdown survives focus loss, so a pointer selection still lands
pub const BLUR_GRACE: Duration = Duration::from_millis(50);

/// Host event for a running session
#[derive(Debug, Clone, PartialEq)]
pub enum Input<T> {
    /// The input now shows this text
    Text(String),
    Key(Key),
    Focus,
    Blur,
    /// Pointer selection of a displayed node
    Click(NodeId),
    /// Value pushed in by the host
    SetValue(Option<T>),
}

type PendingLookup<T> = BoxFuture<'static, (Generation, Result<Vec<T>>)>;

/// One widget instance bound to a source and a view
pub struct Session<T, V> {
    engine: Typeahead<T>,
    source: Arc<dyn CandidateSource<T>>,
    view: V,
    gate: DebounceGate,
    /// Text currently shown by the input
    shown: String,
    blur_deadline: Option<Instant>,
    lookup_timeout: Option<Duration>,
    in_flight: FuturesUnordered<PendingLookup<T>>,
}

impl<T, V> Session<T, V>
where
    T: Clone + Send + 'static,
    V: ViewBinding<T>,
{
    /// Create a session
    ///
    /// # Arguments
    /// * `engine` - Engine with its resolved configuration
    /// * `source` - Where lookups go
    /// * `view` - Receives every engine instruction
    pub fn new(engine: Typeahead<T>, source: Arc<dyn CandidateSource<T>>, view: V) -> Self {
        let gate = DebounceGate::new(engine.config().debounce());
        Self {
            shown: engine.text().to_string(),
            engine,
            source,
            view,
            gate,
            blur_deadline: None,
            lookup_timeout: None,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Fail lookups that take longer than `limit` with [`LookupError::Timeout`]
    pub fn with_lookup_timeout(mut self, limit: Duration) -> Self {
        self.lookup_timeout = Some(limit);
        self
    }

    pub fn engine(&self) -> &Typeahead<T> {
        &self.engine
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Text the input currently shows
    pub fn shown_text(&self) -> &str {
        &self.shown
    }

    /// Number of lookups still running
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// No pending deadline and no lookup running
    pub fn is_idle(&self) -> bool {
        !self.gate.is_pending() && self.blur_deadline.is_none() && self.in_flight.is_empty()
    }

    /* ------------------------------ host events ------------------------------ */

    /// Keystroke: the input now shows `text`
    pub fn input(&mut self, text: impl Into<String>) {
        let text = text.into();
        let old = std::mem::replace(&mut self.shown, text.clone());
        self.engine.set_input_text(&text);
        match self.gate.offer(TextChange::new(text, old), Instant::now()) {
            Gate::Fire(change) => self.process(change),
            Gate::Deferred(deadline) => debug!(?deadline, "text change deferred"),
        }
    }

    pub fn key(&mut self, key: Key) -> KeyOutcome {
        let outcome = self.engine.handle_key(key);
        self.flush();
        outcome
    }

    pub fn focus(&mut self) {
        self.engine.focus_gained();
        self.flush();
    }

    /// Focus lost: the dropdown hides once [`BLUR_GRACE`] elapses without focus
    pub fn blur(&mut self) {
        self.engine.focus_lost();
        self.blur_deadline = Some(Instant::now() + BLUR_GRACE);
    }

    /// Pointer selection; false if the node is not displayed
    pub fn click(&mut self, node: NodeId) -> bool {
        let selected = self.engine.select_node(node);
        self.flush();
        selected
    }

    pub fn set_value(&mut self, value: Option<T>) {
        self.engine.set_value(value);
        self.flush();
    }

    /// Apply one host event
    pub fn apply(&mut self, input: Input<T>) {
        match input {
            Input::Text(text) => self.input(text),
            Input::Key(key) => {
                self.key(key);
            }
            Input::Focus => self.focus(),
            Input::Blur => self.blur(),
            Input::Click(node) => {
                self.click(node);
            }
            Input::SetValue(value) => self.set_value(value),
        }
    }

    /* ------------------------------ time & lookups ------------------------------ */

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.gate.deadline(), self.blur_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Wait for the next lookup completion or deadline and handle it
    ///
    /// # Returns
    /// * `bool` - False if there was nothing to wait for
    pub async fn tick(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        let deadline = self.next_deadline();
        tokio::select! {
            Some((generation, result)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                self.complete(generation, result);
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                self.fire_due(Instant::now());
            }
        }
        true
    }

    /// Tick until nothing is pending
    pub async fn settle(&mut self) {
        while self.tick().await {}
    }

    /// Process events from `inputs` until the channel closes or `cancel` fires
    ///
    /// # Returns
    /// * `V` - The view, after the session has shut down
    pub async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<Input<T>>,
        cancel: CancellationToken,
    ) -> V {
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("session cancelled");
                    break;
                }
                input = inputs.recv() => match input {
                    Some(input) => self.apply(input),
                    None => break,
                },
                Some((generation, result)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(generation, result);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire_due(Instant::now());
                }
            }
        }
        self.shutdown();
        self.view
    }

    /// Release every timer and drop every in-flight lookup
    pub fn shutdown(&mut self) {
        let dropped = self.in_flight.len();
        self.gate.cancel();
        self.blur_deadline = None;
        self.in_flight = FuturesUnordered::new();
        info!(dropped_lookups = dropped, "session shut down");
    }

    /* ------------------------------ internals ------------------------------ */

    fn fire_due(&mut self, now: Instant) {
        if let Some(change) = self.gate.poll(now) {
            self.process(change);
        }
        if self.blur_deadline.is_some_and(|deadline| deadline <= now) {
            self.blur_deadline = None;
            self.engine.blur_grace_elapsed();
            self.flush();
        }
    }

    fn process(&mut self, change: TextChange) {
        if let Decision::Dispatched(ticket) = self.engine.on_text_changed(&change.new, &change.old) {
            self.dispatch(ticket);
        }
        self.flush();
    }

    fn dispatch(&mut self, ticket: LookupTicket) {
        let LookupTicket { generation, prefix } = ticket;
        let source = Arc::clone(&self.source);
        let limit = self.lookup_timeout;
        self.in_flight.push(
            async move {
                let lookup = source.lookup(&prefix);
                let result = match limit {
                    Some(limit) => tokio::time::timeout(limit, lookup)
                        .await
                        .unwrap_or_else(|_| Err(LookupError::Timeout.into())),
                    None => lookup.await,
                };
                (generation, result)
            }
            .boxed(),
        );
    }

    fn complete(&mut self, generation: Generation, result: Result<Vec<T>>) {
        if let Err(e) = self.engine.apply_lookup(generation, result) {
            self.view.lookup_failed(&e);
        }
        self.flush();
    }

    /// Forward engine events to the view. A commit rewrites the input, which
    /// supersedes any keystroke still waiting in the debounce gate.
    fn flush(&mut self) {
        let mut committed = false;
        for event in self.engine.take_events() {
            committed |= matches!(event, ViewEvent::SelectionCommitted { .. });
            event.dispatch(&mut self.view);
        }
        if committed {
            if self.gate.cancel() {
                debug!("commit superseded a pending text change");
            }
            self.shown = self.engine.text().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::Config;
    use crate::error::LookupError;
    use crate::typeahead::candidate::CandidateOps;
    use crate::typeahead::source::{FnSource, StaticSource};
    use crate::typeahead::view::ListView;

    /// Answers each prefix after its own latency and records every call
    struct ScriptedSource {
        answers: HashMap<&'static str, (u64, Vec<&'static str>)>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedSource {
        fn new(answers: &[(&'static str, u64, &[&'static str])]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(prefix, delay, items)| (*prefix, (*delay, items.to_vec())))
                    .collect(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl CandidateSource<String> for ScriptedSource {
        async fn lookup(&self, prefix: &str) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push(prefix.to_string());
            let (delay, items) = self.answers.get(prefix).cloned().unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(items.into_iter().map(String::from).collect())
        }
    }

    fn session(
        config: Config,
        source: impl CandidateSource<String> + 'static,
    ) -> Session<String, ListView<String>> {
        let engine = Typeahead::new(config, CandidateOps::strings());
        Session::new(engine, Arc::new(source), ListView::new())
    }

    fn displayed(session: &Session<String, ListView<String>>) -> Vec<String> {
        session.view().candidates().cloned().collect()
    }

    fn people() -> Vec<String> {
        ["Anna Adams", "Anna Lee", "Bob Smith"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_of_superseded_lookup_is_never_shown() {
        let config = Config {
            item_max: 2,
            ..Config::default()
        };
        let mut s = session(
            config,
            ScriptedSource::new(&[
                ("z", 0, &["z1", "z2"]),
                ("x", 300, &["x1", "x2"]),
                ("xy", 10, &["xy1", "xy2"]),
            ]),
        );

        s.input("z");
        s.settle().await;
        assert_eq!(displayed(&s), vec!["z1", "z2"]);

        // "x" does not extend "z": remote, slow.
        s.input("x");
        assert!(s.tick().await, "debounce deadline fires");
        assert_eq!(s.in_flight(), 1);

        // The list is full, so "xy" goes remote too, and answers first.
        s.input("xy");
        s.settle().await;

        assert_eq!(displayed(&s), vec!["xy1", "xy2"]);
        assert_eq!(s.engine().stale_discards(), 1);
        assert!(s.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_keeps_list_and_reports_once() {
        let source = FnSource::new(|prefix: &str| -> Result<Vec<String>> {
            if prefix.starts_with('b') {
                Err(LookupError::Failed("index offline".into()).into())
            } else {
                Ok(people())
            }
        });
        let mut s = session(Config::default(), source);

        s.input("A");
        s.settle().await;
        assert_eq!(displayed(&s).len(), 3);

        s.input("b");
        s.settle().await;

        assert_eq!(displayed(&s).len(), 3);
        assert!(s.view().is_visible());
        assert_eq!(s.view().errors().len(), 1);
        assert!(s.view().errors()[0].contains("index offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_times_out_and_keeps_list() {
        let config = Config {
            item_max: 2,
            ..Config::default()
        };
        let mut s = session(
            config,
            ScriptedSource::new(&[("A", 0, &["Anna Adams", "Anna Lee"]), ("B", 500, &["Bob Smith"])]),
        )
        .with_lookup_timeout(Duration::from_millis(100));

        s.input("A");
        s.settle().await;
        assert_eq!(displayed(&s), vec!["Anna Adams", "Anna Lee"]);

        s.input("B");
        s.settle().await;

        assert_eq!(displayed(&s), vec!["Anna Adams", "Anna Lee"]);
        assert_eq!(s.view().errors().len(), 1);
        assert!(s.view().errors()[0].contains("timed out"));
        assert!(s.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_keystrokes_coalesce_into_one_lookup() {
        let source = ScriptedSource::new(&[
            ("a", 0, &["ab1", "ab2", "abc1"]),
            ("abc", 0, &["abc1", "abc2"]),
        ]);
        let calls = Arc::clone(&source.calls);
        let config = Config {
            item_max: 3,
            ..Config::default()
        };
        let mut s = session(config, source);

        s.input("a");
        s.settle().await;

        s.input("ab");
        tokio::time::advance(Duration::from_millis(60)).await;
        s.input("abc");
        assert_eq!(s.in_flight(), 0, "nothing dispatched before the deadline");
        s.settle().await;

        assert_eq!(*calls.lock().unwrap(), vec!["a", "abc"]);
        assert_eq!(displayed(&s), vec!["abc1", "abc2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_keystroke_is_not_debounced() {
        let source = ScriptedSource::new(&[("a", 0, &["a1"])]);
        let calls = Arc::clone(&source.calls);
        let mut s = session(Config::default(), source);

        s.input("a");
        assert_eq!(s.in_flight(), 1);
        assert_eq!(*calls.lock().unwrap(), Vec::<String>::new(), "lookup runs when polled");
        s.settle().await;
        assert_eq!(*calls.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_hides_after_grace_delay() {
        let mut s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings()),
        );
        s.focus();
        s.input("A");
        s.settle().await;
        assert!(s.view().is_visible());

        s.blur();
        assert!(s.view().is_visible());
        s.settle().await;
        assert!(!s.view().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_selection_during_grace_delay_lands() {
        let mut s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings()),
        );
        s.focus();
        s.input("A");
        s.settle().await;
        let lee = s.view().nodes()[1].id;

        s.blur();
        tokio::time::advance(Duration::from_millis(20)).await;
        assert!(s.click(lee));
        s.settle().await;

        assert_eq!(s.view().text(), "Anna Lee");
        assert_eq!(s.shown_text(), "Anna Lee");
        assert!(!s.view().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refocus_within_grace_delay_keeps_list() {
        let mut s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings()),
        );
        s.focus();
        s.input("A");
        s.settle().await;

        s.blur();
        s.focus();
        s.settle().await;
        assert!(s.view().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_cancels_pending_keystroke() {
        let mut s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings()),
        );
        s.input("A");
        s.settle().await;

        s.input("Ax");
        assert!(!s.is_idle());
        s.set_value(Some("Bob Smith".to_string()));

        assert!(s.is_idle());
        assert_eq!(s.shown_text(), "Bob Smith");
        assert_eq!(s.engine().text(), "Bob Smith");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_landing_during_debounce_matches_shown_text() {
        let mut s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings())
                .with_latency(Duration::from_millis(50)),
        );

        s.input("B");
        tokio::time::advance(Duration::from_millis(20)).await;
        s.input("Bx");
        s.settle().await;

        // "Bob Smith" was the only answer for "B", but the input shows "Bx".
        assert_eq!(s.shown_text(), "Bx");
        assert_eq!(s.engine().text(), "Bx");
        assert_eq!(s.engine().committed(), None);
        assert!(s.view().commits().is_empty());
        assert!(displayed(&s).is_empty(), "narrowed locally to nothing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_landing_during_debounce_commits_on_shown_text() {
        let mut s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings())
                .with_latency(Duration::from_millis(50)),
        );

        s.input("B");
        tokio::time::advance(Duration::from_millis(20)).await;
        s.input("Bo");
        s.settle().await;

        assert_eq!(s.shown_text(), "Bob Smith");
        assert_eq!(s.view().commits(), &[Some("Bob Smith".to_string())]);
        assert!(s.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_processes_inputs_until_channel_closes() {
        let s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings())
                .with_latency(Duration::from_millis(30)),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(s.run(rx, cancel.clone()));

        tx.send(Input::Focus).unwrap();
        tx.send(Input::Text("B".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(Input::Key(Key::Down)).unwrap();
        drop(tx);

        let view = handle.await.unwrap();
        assert_eq!(view.text(), "Bob Smith");
        assert_eq!(view.commits(), &[Some("Bob Smith".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_in_flight_lookups() {
        let s = session(
            Config::default(),
            StaticSource::new(people(), CandidateOps::strings())
                .with_latency(Duration::from_secs(5)),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(s.run(rx, cancel.clone()));

        tx.send(Input::Text("A".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let view = handle.await.unwrap();
        assert!(view.nodes().is_empty());
    }
}
