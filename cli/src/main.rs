//! CLI entrypoint for study-tutor
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tutor_application::{
    ChatSession, ConversationLogger, NoConversationLogger, NoTurnProgress, StreamDispatcher,
    TurnKind, TurnOutcome,
};
use tutor_domain::CredentialPool;
use tutor_infrastructure::{
    CatalogLoader, ConfigLoader, FileConfig, HttpChatTransport, JsonlConversationLogger,
};
use tutor_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormat, TurnReporter, spawn_interrupt_watcher,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(ExitCode::SUCCESS);
    }

    info!("Starting study-tutor");

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };
    apply_cli_overrides(&mut config, &cli);

    if !config.output.color {
        colored::control::set_override(false);
    }

    let issues = config.validate();
    for issue in &issues {
        eprintln!("{}", ConsoleFormatter::format_issue(issue));
    }
    if FileConfig::has_errors(&issues) {
        bail!("Configuration has errors. Run with --show-config to see the sources used.");
    }

    // === Dependency Injection ===
    let catalog = CatalogLoader::load_or_empty(config.catalog.path.as_deref().map(Path::new))?;
    let transport = HttpChatTransport::new(config.provider.endpoint.trim())
        .context("Failed to build HTTP client")?;
    let logger = transcript_logger(config.logging.transcript.as_deref());

    let keys = config.provider.usable_keys();
    info!(
        "Provider {} with model {} and {} key(s)",
        transport.endpoint(),
        config.provider.model,
        keys.len()
    );

    let dispatcher = Arc::new(
        StreamDispatcher::new(
            Arc::new(transport),
            CredentialPool::new(keys),
            config.to_dispatch_params(),
        )
        .with_conversation_logger(logger.clone()),
    );
    let mut session = ChatSession::new(
        dispatcher,
        Arc::new(catalog),
        config.to_assistant_params(),
        cli.context.as_str(),
    )
    .with_conversation_logger(logger);

    // Chat mode
    if cli.chat {
        let mut repl = ChatRepl::new(session)
            .with_progress(!cli.quiet && config.repl.show_progress)
            .with_verbose(cli.verbose > 0)
            .with_history_file(config.repl.history_file.as_deref().map(PathBuf::from));
        repl.run().await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Single question mode - question is required
    let question = match cli.question.as_deref() {
        Some(q) => q,
        None => bail!("Question is required. Use --chat for interactive mode."),
    };

    let turn = session.shutdown_token().child_token();
    let watcher = spawn_interrupt_watcher(turn.clone());

    let show_progress = !cli.quiet && cli.output == OutputFormat::Text;
    let (outcome, streamed) = if show_progress {
        let reporter = TurnReporter::new();
        let outcome = session.send_with_cancel(question, &reporter, turn).await;
        let streamed = reporter.finish(&outcome.display_text);
        (outcome, streamed)
    } else {
        let outcome = session
            .send_with_cancel(question, &NoTurnProgress, turn)
            .await;
        (outcome, false)
    };
    watcher.abort();

    print_outcome(&outcome, cli.output, streamed, cli.verbose > 0);

    Ok(match outcome.kind {
        TurnKind::Answered | TurnKind::Blocked => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Set up the stderr subscriber, plus a non-blocking file writer when
/// `log_file` is given. The returned guard must live until exit.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = || match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    if let Some(path) = &cli.catalog {
        config.catalog.path = Some(path.display().to_string());
    }
    if let Some(path) = &cli.transcript {
        config.logging.transcript = Some(path.display().to_string());
    }
}

fn transcript_logger(path: Option<&str>) -> Arc<dyn ConversationLogger> {
    let Some(path) = path else {
        return Arc::new(NoConversationLogger);
    };
    match JsonlConversationLogger::new(path) {
        Some(logger) => {
            info!("Writing transcript to {}", logger.path().display());
            Arc::new(logger)
        }
        None => {
            warn!("Transcript disabled");
            Arc::new(NoConversationLogger)
        }
    }
}

fn print_outcome(outcome: &TurnOutcome, format: OutputFormat, streamed: bool, verbose: bool) {
    match format {
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(outcome)),
        OutputFormat::Text => {
            if streamed {
                print!("{}", ConsoleFormatter::format_actions(&outcome.actions));
            } else {
                print!("{}", ConsoleFormatter::format_turn(outcome));
            }
            if verbose {
                print!("{}", ConsoleFormatter::format_rejections(&outcome.rejections));
            }
        }
    }
}
