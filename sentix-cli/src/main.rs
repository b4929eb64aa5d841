#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentix_common::Config;
use sentix_engine::{
    extract_keywords, AnalysisError, AnalysisHistory, AnalysisOrchestrator, GeminiBackend,
    GenerativeBackend, QuotaState, SentimentLabel, UnavailableBackend,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// `Sentix` - sentiment analysis with graceful offline degradation.
#[derive(Parser, Debug)]
#[command(name = "sentix")]
#[command(version = "0.1.0")]
#[command(about = "Analyze the sentiment of short texts.", long_about = None)]
struct Cli {
    /// Never call the remote backend; use the local classifier
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a single text
    Analyze {
        text: String,

        /// Also suggest a quote and playlist for the mood
        #[arg(long)]
        mood: bool,
    },

    /// Analyze several texts at once (reads stdin lines when none are given)
    Batch { texts: Vec<String> },

    /// Compare the sentiment of two texts
    Compare { a: String, b: String },

    /// Emotions, tones and named entities of a text
    Deeper { text: String },

    /// Suggest a quote and playlist for a sentiment
    Mood {
        /// Sentiment label (positive, negative, neutral)
        #[arg(long)]
        label: SentimentLabel,

        text: String,
    },

    /// Extract keywords locally
    Keywords { text: String },

    /// Analyze stdin lines one by one and summarize the session
    Session,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionReport {
    analyzed: usize,
    rejected: usize,
    distribution: BTreeMap<SentimentLabel, usize>,
    fallback_share: f64,
    quota: QuotaState,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<sentix_common::Error>() {
        return e.exit_code();
    }
    match err.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::Validation(_)) => 65,
        Some(AnalysisError::QuotaExceeded { .. }) => 75,
        Some(AnalysisError::UnsupportedOperation { .. }) => 69,
        None => 1,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_and_validate()?;

    sentix_common::logging::init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    if let Commands::Keywords { text } = &cli.command {
        return print_json(&extract_keywords(text));
    }

    let backend: Arc<dyn GenerativeBackend> = if cli.offline {
        info!("Offline mode, backend disabled");
        Arc::new(UnavailableBackend)
    } else {
        let gemini = GeminiBackend::from_config(&config)?;
        info!(model = gemini.model(), "Using Gemini backend");
        Arc::new(gemini)
    };
    let orchestrator = AnalysisOrchestrator::from_config(&config, backend);

    match cli.command {
        Commands::Analyze { text, mood } => {
            if mood {
                print_json(&orchestrator.analyze_with_mood(&text).await?)
            } else {
                print_json(&orchestrator.analyze(&text).await?)
            }
        }
        Commands::Batch { texts } => {
            let texts = if texts.is_empty() { read_stdin_lines().await? } else { texts };
            if texts.is_empty() {
                return Err(sentix_common::Error::InvalidInput(
                    "no texts given on the command line or stdin".into(),
                )
                .into());
            }
            print_json(&orchestrator.analyze_batch(&texts).await?)
        }
        Commands::Compare { a, b } => print_json(&orchestrator.compare(&a, &b).await?),
        Commands::Deeper { text } => print_json(&orchestrator.deeper_analysis(&text).await?),
        Commands::Mood { label, text } => {
            print_json(&orchestrator.mood_enhancement(label, &text).await)
        }
        Commands::Session => run_session(&orchestrator).await,
        Commands::Keywords { .. } => Ok(()),
    }
}

async fn run_session(orchestrator: &AnalysisOrchestrator) -> Result<()> {
    let mut history = AnalysisHistory::new();
    let mut rejected = 0;

    for line in read_stdin_lines().await? {
        match orchestrator.analyze(&line).await {
            Ok(result) => history.record(result),
            Err(e) if e.is_quota_exceeded() => {
                warn!(error = %e, "Quota exhausted, ending session");
                eprintln!("{e}");
                break;
            }
            Err(e) => {
                rejected += 1;
                eprintln!("Skipped: {e}");
            }
        }
    }

    print_json(&SessionReport {
        analyzed: history.len(),
        rejected,
        distribution: history.distribution(),
        fallback_share: history.fallback_share(),
        quota: orchestrator.quota_state(),
    })
}

async fn read_stdin_lines() -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = Vec::new();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }
    Ok(out)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mood_label() {
        let cli = Cli::try_parse_from(["sentix", "mood", "--label", "negative", "rainy day"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Mood { label: SentimentLabel::Negative, .. }
        ));
    }

    #[test]
    fn offline_flag_is_global() {
        let cli = Cli::try_parse_from(["sentix", "analyze", "hello", "--offline", "--mood"]).unwrap();
        assert!(cli.offline);
        assert!(matches!(cli.command, Commands::Analyze { mood: true, .. }));
    }

    #[test]
    fn batch_accepts_no_args() {
        let cli = Cli::try_parse_from(["sentix", "batch"]).unwrap();
        assert!(matches!(cli.command, Commands::Batch { texts } if texts.is_empty()));
    }

    #[test]
    fn exit_codes_by_error() {
        let config_err = anyhow::Error::new(sentix_common::Error::Config("no key".into()));
        assert_eq!(exit_code(&config_err), 78);

        let wrapped = sentix_common::Error::Config("bad limit".into()).with_context("Invalid configuration");
        assert_eq!(exit_code(&anyhow::Error::new(wrapped)), 78);

        let no_input = anyhow::Error::new(sentix_common::Error::InvalidInput("empty".into()));
        assert_eq!(exit_code(&no_input), 65);

        let quota = anyhow::Error::new(AnalysisError::QuotaExceeded {
            requested: 1,
            remaining: 0,
        });
        assert_eq!(exit_code(&quota), 75);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
