use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use sync_types::{CheckKind, Verdict};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sync_checker::config::Config;
use sync_checker::sources::{BoardUi, CardSource, GmailClient, MailSource, TrelloClient};
use sync_checker::reconcile::needs_mail;
use sync_checker::{overall_verdict, Reconciler};

#[derive(Parser)]
#[command(name = "sync-checker")]
#[command(about = "Verify that emails were reflected as cards on the task board")]
#[command(
    long_about = "Compares the mailbox with the task board and reports every email that\n\
    the external sync failed to turn into (or merge into) the expected card.\n\n\
    Exit status: 0 passed, 1 violations found, 2 nothing to check, 3 error."
)]
struct Cli {
    /// Path to the TOML configuration file.
    ///
    /// Missing files are fine: defaults plus environment variables
    /// (TRELLO_API_KEY, TRELLO_API_TOKEN, TRELLO_BOARD_ID, GMAIL_TOKEN_FILE) are used.
    #[arg(
        short,
        long,
        default_value = "sync-checker.toml",
        env = "SYNC_CHECKER_CONFIG"
    )]
    config: PathBuf,

    /// Where card state is read from.
    #[arg(short, long, value_enum, default_value_t = BoardSource::Api)]
    source: BoardSource,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BoardSource {
    /// Board REST API
    Api,
    /// Board web UI through a WebDriver server
    Ui,
}

#[derive(Subcommand)]
enum Commands {
    /// Emails whose body mentions "urgent" must have a card with the Urgent label
    Urgent,
    /// Emails sharing a subject must be merged into one card holding every body
    Merge,
    /// Cards listed under [[checks.expected_cards]] must exist as configured
    Card,
    /// At least one card must carry an urgent label
    Labelled,
    /// Run every check
    All,
    /// Print an example configuration file
    Init,
}

impl Commands {
    fn kinds(&self) -> Vec<CheckKind> {
        match self {
            Commands::Urgent => vec![CheckKind::UrgentMapping],
            Commands::Merge => vec![CheckKind::MergedDescriptions],
            Commands::Card => vec![CheckKind::ExpectedCard],
            Commands::Labelled => vec![CheckKind::LabelledCards],
            Commands::All => vec![
                CheckKind::UrgentMapping,
                CheckKind::MergedDescriptions,
                CheckKind::ExpectedCard,
                CheckKind::LabelledCards,
            ],
            Commands::Init => vec![],
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sync_checker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:?}", e);
            ExitCode::from(3)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Init = cli.command {
        let example =
            toml::to_string_pretty(&Config::example()).context("Failed to render example config")?;
        println!("{}", example);
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let kinds = cli.command.kinds();
    let mail = if kinds.iter().any(|k| needs_mail(*k)) {
        Some(
            GmailClient::from_config(&config.gmail)
                .await
                .context("Failed to create Gmail client")?,
        )
    } else {
        None
    };

    let board: Box<dyn CardSource> = match cli.source {
        BoardSource::Api => {
            config.require_trello()?;
            Box::new(TrelloClient::new(&config.trello))
        }
        BoardSource::Ui => {
            config.require_ui()?;
            Box::new(BoardUi::new(config.ui.clone()))
        }
    };

    let reconciler = Reconciler::new(&config.checks);
    let reports = reconciler
        .run(
            &kinds,
            mail.as_ref().map(|m| m as &dyn MailSource),
            board.as_ref(),
        )
        .await
        .context("Reconciliation failed")?;

    for report in &reports {
        println!("{}: {}", report.kind.as_str(), report.verdict().as_str());
        for violation in &report.violations {
            println!("  - {}", violation);
        }
    }

    let code = match overall_verdict(&reports) {
        Verdict::Passed => ExitCode::SUCCESS,
        Verdict::Failed => ExitCode::from(1),
        Verdict::Skipped => ExitCode::from(2),
    };
    Ok(code)
}
