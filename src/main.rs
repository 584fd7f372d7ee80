use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use betting_analyzer::api::ResultsFeedClient;
use betting_analyzer::archive::{OutcomeSource, SimulatedOutcomes};
use betting_analyzer::config::Config;
use betting_analyzer::db::SessionStore;
use betting_analyzer::matching::MatchFilter;
use betting_analyzer::models::{ArchiveStatus, Prediction};
use betting_analyzer::workers::AnalysisRunner;
use betting_analyzer::AnalyzerService;

#[derive(Parser)]
#[command(
    name = "betting-analyzer",
    about = "Match ingestion, outcome prediction and archive verification"
)]
struct Cli {
    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest match sheets (.xlsx, .xls or .csv)
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List ingested matches
    Matches {
        #[arg(long)]
        league: Option<String>,

        #[arg(long)]
        date: Option<NaiveDate>,

        /// Text searched in team and league names
        #[arg(long)]
        search: Option<String>,
    },

    /// Analyze every match on a date and archive confident predictions
    Analyze {
        /// Match date (YYYY-MM-DD)
        date: NaiveDate,

        /// Minimum confidence (overrides MIN_CONFIDENCE)
        #[arg(short, long)]
        min_confidence: Option<u32>,

        /// Skip the pause between matches
        #[arg(long)]
        no_delay: bool,
    },

    /// List archived predictions, newest first
    Archive {
        /// pending, verified, correct or incorrect
        #[arg(long)]
        status: Option<ArchiveStatus>,
    },

    /// Settle pending predictions and update the learning model
    Verify {
        /// Use simulated outcomes even when a results feed is configured
        #[arg(long)]
        simulate: bool,

        /// Seed for reproducible simulated outcomes
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the archive, learning model and statistics to a JSON file
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge an exported archive file
    Import { file: PathBuf },

    /// Show the learning model
    Learning,

    /// Show session statistics
    Stats,

    /// Delete all matches, predictions and learning progress
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "betting_analyzer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let store = SessionStore::new(&config.database_url).await?;
    let mut service = store.load().await?;

    let modified = match cli.command {
        Command::Ingest { files } => cmd_ingest(&mut service, &files),
        Command::Matches {
            league,
            date,
            search,
        } => cmd_matches(&service, MatchFilter { league, date, search }),
        Command::Analyze {
            date,
            min_confidence,
            no_delay,
        } => {
            let min_confidence = min_confidence.unwrap_or(config.min_confidence);
            let (updated, modified) =
                cmd_analyze(service, &config, date, min_confidence, no_delay).await?;
            service = updated;
            modified
        }
        Command::Archive { status } => cmd_archive(&service, status),
        Command::Verify { simulate, seed } => cmd_verify(&mut service, &config, simulate, seed).await,
        Command::Export { output } => cmd_export(&service, output)?,
        Command::Import { file } => cmd_import(&mut service, &file)?,
        Command::Learning => cmd_learning(&service),
        Command::Stats => cmd_stats(&service),
        Command::Reset => {
            service.clear();
            store.clear().await?;
            println!("All data cleared");
            false
        }
    };

    if modified {
        store.save(&service).await?;
    }

    Ok(())
}

fn cmd_ingest(service: &mut AnalyzerService, files: &[PathBuf]) -> bool {
    let processed = service.ingest_paths(files);

    for file in &processed {
        println!(
            "{}: {} matches, {} new, {} duplicates",
            file.name, file.total_matches, file.new_matches, file.duplicates
        );
    }
    println!("{} matches in corpus", service.repository().len());

    !processed.is_empty()
}

fn cmd_matches(service: &AnalyzerService, filter: MatchFilter) -> bool {
    let matches = service.repository().filter(&filter);
    if matches.is_empty() {
        println!("No matches. Ingest a sheet first: betting-analyzer ingest <file.xlsx>");
        return false;
    }

    for m in &matches {
        let date = m
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "no date".to_string());
        let odds = match m.full_odds() {
            Some([home, draw, away]) => format!("{:.2} / {:.2} / {:.2}", home, draw, away),
            None => "-".to_string(),
        };
        println!("{}  {:<40} {:<24} {}", date, m.label(), m.league, odds);
    }
    println!("{} of {} matches", matches.len(), service.repository().len());

    false
}

async fn cmd_analyze(
    service: AnalyzerService,
    config: &Config,
    date: NaiveDate,
    min_confidence: u32,
    no_delay: bool,
) -> Result<(AnalyzerService, bool)> {
    let (min_delay, max_delay) = if no_delay {
        (0, 0)
    } else {
        (config.analysis_delay_min_ms, config.analysis_delay_max_ms)
    };

    let shared = Arc::new(RwLock::new(service));
    let runner = AnalysisRunner::new(Arc::clone(&shared), min_delay, max_delay);
    let predictions = runner.run(date, min_confidence).await?;
    drop(runner);

    let service = Arc::try_unwrap(shared)
        .map_err(|_| anyhow::anyhow!("Analysis state is still shared"))?
        .into_inner();

    if predictions.is_empty() {
        println!("No predictions at or above {}% on {}", min_confidence, date);
        return Ok((service, false));
    }

    for prediction in &predictions {
        print_prediction(prediction);
    }
    println!(
        "{} predictions archived (min. {}%)",
        predictions.len(),
        min_confidence
    );

    Ok((service, true))
}

fn print_prediction(prediction: &Prediction) {
    let odds = prediction
        .odds
        .map(|o| format!(" @ {:.2}", o))
        .unwrap_or_default();
    println!(
        "{:>3}%  {} [{}]  {} ({}){}",
        prediction.confidence,
        prediction.match_label,
        prediction.league,
        prediction.bet_type,
        prediction.bet_type.label(),
        odds
    );
    for reason in &prediction.reasoning {
        println!("       - {}", reason);
    }
}

fn cmd_archive(service: &AnalyzerService, status: Option<ArchiveStatus>) -> bool {
    let entries = service.archive().by_status(status);
    if entries.is_empty() {
        println!("Archive is empty");
        return false;
    }

    for entry in entries {
        let actual = entry
            .actual_result
            .map(|r| format!(" (actual {})", r))
            .unwrap_or_default();
        println!(
            "{}  {:<10} {:>3}%  {} -> {}{}",
            entry.added_at.format("%Y-%m-%d %H:%M"),
            entry.status.as_str(),
            entry.prediction.confidence,
            entry.prediction.match_label,
            entry.prediction.bet_type,
            actual
        );
    }

    false
}

async fn cmd_verify(
    service: &mut AnalyzerService,
    config: &Config,
    simulate: bool,
    seed: Option<u64>,
) -> bool {
    if service.archive().pending_count() == 0 {
        println!("No pending predictions");
        return false;
    }

    let mut source: Box<dyn OutcomeSource> = match (&config.results_feed_url, simulate) {
        (Some(url), false) => {
            info!("Settling against results feed {}", url);
            let client = ResultsFeedClient::new(url);
            Box::new(client.fetch_settlements(service.archive().entries()).await)
        }
        _ => {
            let rate = config.simulated_success_rate;
            Box::new(match seed {
                Some(seed) => SimulatedOutcomes::seeded(seed, rate),
                None => SimulatedOutcomes::new(rate),
            })
        }
    };

    let summary = service.verify_pending(source.as_mut());
    println!(
        "Verified {}: {} correct, {} incorrect ({:.1}%), {} still pending",
        summary.processed,
        summary.correct,
        summary.incorrect,
        summary.accuracy(),
        summary.unsettled
    );

    summary.processed > 0
}

fn cmd_export(service: &AnalyzerService, output: Option<PathBuf>) -> Result<bool> {
    if service.archive().is_empty() {
        warn!("Nothing to export");
        println!("Archive is empty, nothing to export");
        return Ok(false);
    }

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "betting_archive_{}.json",
            Utc::now().format("%Y-%m-%d")
        ))
    });

    let json = service.export().to_json()?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "Exported {} predictions to {}",
        service.archive().len(),
        path.display()
    );
    Ok(false)
}

fn cmd_import(service: &mut AnalyzerService, file: &Path) -> Result<bool> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let (added, total) = service
        .import_json(&payload)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!("Imported {} new predictions out of {}", added, total);
    Ok(true)
}

fn cmd_learning(service: &AnalyzerService) -> bool {
    let model = service.learning();

    println!("Weights:");
    for (name, weight) in model.weights.entries() {
        println!("  {:<14} {:.1}%", name, weight * 100.0);
    }
    println!(
        "Verified: {} ({} correct, {:.1}%)",
        model.total_predictions,
        model.correct_predictions,
        model.accuracy()
    );
    println!("Learning progress: {:.0}%", model.learning_progress);
    println!(
        "Patterns: {} success, {} failure",
        model.success_patterns.len(),
        model.failure_patterns.len()
    );
    if let Some(last) = model.accuracy_history.last() {
        println!(
            "Last batch: {:.1}% after {} predictions ({})",
            last.accuracy,
            last.total_predictions,
            last.timestamp.format("%Y-%m-%d %H:%M")
        );
    }

    false
}

fn cmd_stats(service: &AnalyzerService) -> bool {
    let stats = service.statistics();

    println!("Matches:     {}", stats.total_matches);
    println!("Files:       {}", service.processed_files().len());
    println!("Leagues:     {}", service.repository().leagues().len());
    println!("Archived:    {}", stats.total_predictions);
    println!("Pending:     {}", service.archive().pending_count());
    println!("Verified:    {}", stats.verified_predictions);
    println!("Correct:     {}", stats.correct_predictions);
    println!("Accuracy:    {:.1}%", stats.accuracy);
    println!("Learning:    {:.0}%", stats.learning_progress);

    false
}
