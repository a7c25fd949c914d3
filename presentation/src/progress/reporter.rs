//! Progress reporting for chat turns
//!
//! [`TurnReporter`] shows an indicatif spinner while the reply is THINKING
//! and prints the display text as it grows once it is STREAMING.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tutor_application::TurnProgress;
use tutor_domain::{ResponseState, ValidatedActions};

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Tracks how much of the display text is already on screen.
///
/// Display text grows append-only in the common case. When it is rewritten
/// in place (a token that was shown turns out to be a command), the printer
/// stops and leaves the rest to [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct StreamingPrinter {
    printed: String,
    diverged: bool,
}

impl StreamingPrinter {
    /// New text to print for `display`, if any.
    pub fn advance(&mut self, display: &str) -> Option<String> {
        if self.diverged {
            return None;
        }
        match display.strip_prefix(self.printed.as_str()) {
            Some("") => None,
            Some(suffix) => {
                let suffix = suffix.to_string();
                self.printed.push_str(&suffix);
                Some(suffix)
            }
            None => {
                self.diverged = true;
                None
            }
        }
    }

    /// Text still missing for `final_display`. After a divergence the whole
    /// text is reprinted on a fresh line.
    pub fn finish(&mut self, final_display: &str) -> String {
        let rest = if self.diverged {
            format!("\n{}", final_display)
        } else {
            self.advance(final_display).unwrap_or_default()
        };
        self.printed.clear();
        self.diverged = false;
        rest
    }

    pub fn has_printed(&self) -> bool {
        !self.printed.is_empty() || self.diverged
    }
}

/// Reports progress of one chat turn on the terminal
pub struct TurnReporter {
    spinner: Mutex<Option<ProgressBar>>,
    printer: Mutex<StreamingPrinter>,
    streaming: Mutex<bool>,
}

impl TurnReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            printer: Mutex::new(StreamingPrinter::default()),
            streaming: Mutex::new(false),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self) {
        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if spinner.is_none() {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.set_message("Thinking...");
            pb.enable_steady_tick(SPINNER_TICK);
            *spinner = Some(pb);
        }
    }

    fn stop_spinner(&self) {
        if let Some(pb) = self.spinner.lock().unwrap_or_else(|e| e.into_inner()).take() {
            pb.finish_and_clear();
        }
    }

    fn set_spinner_message(&self, message: String) {
        if let Some(pb) = self.spinner.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            pb.set_message(message);
        }
    }

    /// Print whatever of `final_display` is not on screen yet. Returns
    /// `false` if nothing was streamed, so the caller prints the reply.
    pub fn finish(&self, final_display: &str) -> bool {
        self.stop_spinner();
        *self.streaming.lock().unwrap_or_else(|e| e.into_inner()) = false;
        let mut printer = self.printer.lock().unwrap_or_else(|e| e.into_inner());
        if !printer.has_printed() {
            return false;
        }
        let rest = printer.finish(final_display);
        print!("{}", rest);
        println!();
        true
    }
}

impl Default for TurnReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnProgress for TurnReporter {
    fn on_state_change(&self, state: ResponseState) {
        match state {
            ResponseState::Thinking => self.start_spinner(),
            ResponseState::Streaming => {
                self.stop_spinner();
                *self.streaming.lock().unwrap_or_else(|e| e.into_inner()) = true;
            }
            ResponseState::Completed | ResponseState::Idle => self.stop_spinner(),
        }
    }

    fn on_display_update(&self, display: &str, _actions: &ValidatedActions) {
        if !*self.streaming.lock().unwrap_or_else(|e| e.into_inner()) {
            return;
        }
        let mut printer = self.printer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(text) = printer.advance(display) {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
    }

    fn on_attempt(&self, attempt: u32, credential_index: usize) {
        if attempt > 1 {
            self.set_spinner_message(format!(
                "Thinking... {}",
                format!("(retry {} with key #{})", attempt - 1, credential_index).dimmed()
            ));
        }
    }

    fn on_backoff(&self, wait: Duration) {
        self.set_spinner_message(format!(
            "Waiting for an available key {}",
            format!("({} ms)", wait.as_millis()).dimmed()
        ));
    }
}
