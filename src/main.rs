use std::process::ExitCode;

use clap::Parser;
use secov_admin::{
    AppState,
    cli::{self, Cli},
    config::Config,
    error::AppError,
    notify::{Inbox, Level},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            for line in cli::failure_lines(&failure.error, failure.notified) {
                eprintln!("{line}");
            }
            ExitCode::FAILURE
        }
    }
}

struct Failure {
    error: AppError,
    /// Whether the command already raised this error as a notification.
    notified: bool,
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Self {
            error,
            notified: false,
        }
    }
}

async fn run(cli: Cli) -> Result<(), Failure> {
    let mut config = Config::from_env()?;
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    let state = AppState::from_config(config)?;

    let inbox = Inbox::new();
    let outcome = cli::execute(&state, cli.command, &inbox).await;
    let notes = inbox.drain();
    for n in &notes {
        match n.level {
            Level::Success => println!("✓ {}", n.message),
            Level::Info => println!("· {}", n.message),
            Level::Error => eprintln!("! {}", n.message),
        }
    }

    match outcome {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(error) => Err(Failure {
            notified: notes.iter().any(|n| n.level == Level::Error),
            error,
        }),
    }
}
