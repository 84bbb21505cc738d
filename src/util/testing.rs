use std::collections::VecDeque;
use std::env;
use std::sync::{Mutex, Once};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::ConflictResolution;
use crate::infrastructure::traits::Prompter;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "trace");
    }

    // Create a filter for noisy modules
    let noisy_modules = [""];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| !name.is_empty() && metadata.target().starts_with(name))
    });

    // Set up the subscriber with environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // Build and set the subscriber
    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Prompter answering from queues filled by the test.
///
/// An exhausted queue answers like a user hitting end of input: no
/// confirmation, an unrecognized conflict answer and no line.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirms: Mutex<VecDeque<bool>>,
    conflicts: Mutex<VecDeque<Option<ConflictResolution>>>,
    lines: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(self, answer: bool) -> Self {
        push(&self.confirms, answer);
        self
    }

    pub fn resolve_with(self, answer: Option<ConflictResolution>) -> Self {
        push(&self.conflicts, answer);
        self
    }

    pub fn answer_line(self, line: &str) -> Self {
        push(&self.lines, line.to_string());
        self
    }

    /// Every prompt or conflicting name seen so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn record(&self, prompt: &str) {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(prompt.to_string());
        }
    }
}

fn push<T>(queue: &Mutex<VecDeque<T>>, value: T) {
    if let Ok(mut q) = queue.lock() {
        q.push_back(value);
    }
}

fn pop<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue.lock().ok().and_then(|mut q| q.pop_front())
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str) -> bool {
        self.record(prompt);
        pop(&self.confirms).unwrap_or(false)
    }

    fn resolve_conflict(&self, name: &str) -> Option<ConflictResolution> {
        self.record(name);
        pop(&self.conflicts).flatten()
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        self.record(prompt);
        pop(&self.lines)
    }
}

// test
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_scripted_answers_when_asked_then_replays_in_order_and_defaults_after() {
        let prompter = ScriptedPrompter::new()
            .confirm_with(true)
            .resolve_with(Some(ConflictResolution::Skip));

        assert!(prompter.confirm("remove?"));
        assert!(!prompter.confirm("remove again?"));
        assert_eq!(
            prompter.resolve_conflict("a.txt"),
            Some(ConflictResolution::Skip)
        );
        assert_eq!(prompter.resolve_conflict("b.txt"), None);
        assert_eq!(prompter.read_line("content:"), None);
        assert_eq!(prompter.asked().len(), 5);
    }
}
