//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::progress::reporter::TurnReporter;
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tutor_application::{ChatSession, NoTurnProgress, TurnOutcome};

const HISTORY_CAPACITY: usize = 500;

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    /// `/context` alone shows the current page.
    Context(Option<String>),
    Actions,
    State,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`. Returns `None` for ordinary input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        Some(match name {
            "help" | "h" | "?" => Self::Help,
            "context" | "ctx" => Self::Context(arg.map(str::to_string)),
            "actions" => Self::Actions,
            "state" => Self::State,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        })
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    session: ChatSession,
    show_progress: bool,
    verbose: bool,
    history_file: Option<PathBuf>,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            show_progress: true,
            verbose: false,
            history_file: dirs_history_path(),
        }
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Show withheld actions after each reply
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_file = path;
        }
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut line_editor = Reedline::create();
        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(e) => warn!("Could not open REPL history {}: {}", path.display(), e),
            }
        }

        self.print_welcome();

        loop {
            let prompt = DefaultPrompt::new(
                DefaultPromptSegment::Basic(format!("{} ", self.session.context_id())),
                DefaultPromptSegment::Empty,
            );

            match line_editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(line) {
                        if self.handle_command(command) {
                            break;
                        }
                        continue;
                    }

                    self.process_question(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        self.session.cancel();
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            Study Tutor - Chat Mode          │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "Page: {}   Catalog: {} routes, {} topics",
            self.session.context_id(),
            self.session.catalog().route_count(),
            self.session.catalog().topic_count()
        );
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?       - Show this help");
        println!("  /context [PATH]     - Show or change the current page");
        println!("  /actions            - Show the latest suggested actions");
        println!("  /state              - Show response state and API key health");
        println!("  /quit, /exit, /q    - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => {
                println!();
                Self::print_help();
            }
            ReplCommand::Context(None) => {
                println!("Current page: {}", self.session.context_id());
            }
            ReplCommand::Context(Some(path)) => {
                if self.session.switch_context(path.as_str()) {
                    println!("{} {}", "Now on".green(), path.bold());
                    if !self.session.catalog().is_valid_route(&path) {
                        println!("{}", "(this page is not in the catalog)".dimmed());
                    }
                } else {
                    println!("Already on {}", path);
                }
            }
            ReplCommand::Actions => {
                let text = ConsoleFormatter::format_actions(self.session.last_actions());
                if text.is_empty() {
                    println!("No suggested actions yet.");
                } else {
                    print!("{}", text);
                }
            }
            ReplCommand::State => {
                print!(
                    "{}",
                    ConsoleFormatter::format_state(self.session.state_machine())
                );
                print!(
                    "{}",
                    ConsoleFormatter::format_pool(&self.session.pool_snapshot(), Instant::now())
                );
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn process_question(&mut self, question: &str) {
        println!();

        let turn = self.session.shutdown_token().child_token();
        let watcher = spawn_interrupt_watcher(turn.clone());

        let outcome = if self.show_progress {
            let reporter = TurnReporter::new();
            let outcome = self
                .session
                .send_with_cancel(question, &reporter, turn.clone())
                .await;
            let streamed = reporter.finish(&outcome.display_text);
            self.session.settle(&reporter).await;
            self.render(&outcome, streamed);
            outcome
        } else {
            let outcome = self
                .session
                .send_with_cancel(question, &NoTurnProgress, turn.clone())
                .await;
            self.session.settle(&NoTurnProgress).await;
            self.render(&outcome, false);
            outcome
        };

        watcher.abort();
        debug!("Turn finished: {:?}", outcome.kind);
        println!();
    }

    fn render(&self, outcome: &TurnOutcome, streamed: bool) {
        if streamed {
            print!("{}", ConsoleFormatter::format_actions(&outcome.actions));
        } else {
            print!("{}", ConsoleFormatter::format_turn(outcome));
        }
        if self.verbose {
            print!("{}", ConsoleFormatter::format_rejections(&outcome.rejections));
        }
    }
}

/// Cancel `turn` on Ctrl-C. Abort the returned handle once the turn ends.
pub fn spawn_interrupt_watcher(turn: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = turn.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    turn.cancel();
                }
            }
        }
    })
}

fn dirs_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("study-tutor").join("history.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("/help"), Some(ReplCommand::Help));
        assert_eq!(ReplCommand::parse(" /q "), Some(ReplCommand::Quit));
        assert_eq!(
            ReplCommand::parse("/context /biology/cells"),
            Some(ReplCommand::Context(Some("/biology/cells".to_string())))
        );
        assert_eq!(
            ReplCommand::parse("/context   "),
            Some(ReplCommand::Context(None))
        );
        assert_eq!(ReplCommand::parse("/actions"), Some(ReplCommand::Actions));
        assert_eq!(ReplCommand::parse("/state"), Some(ReplCommand::State));
        assert_eq!(
            ReplCommand::parse("/models"),
            Some(ReplCommand::Unknown("/models".to_string()))
        );
    }

    #[test]
    fn test_plain_input_is_not_a_command() {
        assert_eq!(ReplCommand::parse("What is /biology about?"), None);
        assert_eq!(ReplCommand::parse("hello"), None);
    }

    #[tokio::test]
    async fn test_interrupt_watcher_ends_with_turn() {
        let turn = CancellationToken::new();
        let watcher = spawn_interrupt_watcher(turn.clone());
        turn.cancel();
        watcher.await.unwrap();
    }
}
