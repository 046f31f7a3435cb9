use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use cybershield::classifier::heuristic::HeuristicClassifier;
use cybershield::config::{Config, StorageKind};
use cybershield::models::{Feedback, LanguageHint, Sensitivity};
use cybershield::output::{csv, terminal};
use cybershield::session::{Session, SessionError, EXAMPLE_TEXTS};
use cybershield::stats::{compute_stats, ResultFilter};
use cybershield::store::backend::{MemoryStorage, StorageBackend};
use cybershield::store::ResultStore;

/// CyberShield: multilingual cyberbullying detection.
///
/// Flags toxic Tamil, Hindi, English and mixed-script text, keeps a local
/// history of results and reports aggregate statistics.
#[derive(Parser)]
#[command(name = "cybershield", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the result store and default settings
    Init,

    /// Analyze a piece of text
    Analyze {
        /// The text to analyze
        text: String,

        /// Language hint: auto, tamil, hindi or english
        #[arg(long, default_value = "auto")]
        lang: String,
    },

    /// Analyze every non-empty line of a file
    Batch {
        /// File with one text per line
        file: PathBuf,

        /// Language hint applied to every line
        #[arg(long, default_value = "auto")]
        lang: String,
    },

    /// List example texts to try
    Examples,

    /// Show stored detection results, most recent first
    History {
        /// all, toxic or clean
        #[arg(long, default_value = "all")]
        filter: ResultFilter,

        /// Maximum rows to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Show aggregate statistics over the stored history
    Stats,

    /// Mark a stored result as correct or incorrect
    Feedback {
        /// Result ID (see `cybershield history`)
        id: String,

        /// correct or incorrect
        verdict: Feedback,
    },

    /// Export stored results to CSV
    Export {
        /// all, toxic or clean
        #[arg(long, default_value = "all")]
        filter: ResultFilter,

        /// Output path (default: cybershield-<filter>-<date>.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show or change settings
    Settings {
        /// low, medium or high
        #[arg(long)]
        sensitivity: Option<Sensitivity>,

        /// Accept reviewer feedback (true/false)
        #[arg(long)]
        feedback: Option<bool>,

        /// Store analysis results automatically (true/false)
        #[arg(long)]
        autosave: Option<bool>,
    },

    /// Delete all stored results and reset settings
    Clear {
        /// Confirm the irreversible reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cybershield=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing CyberShield store...");
            let store = open_store(&config)?;
            println!("Store initialized ({}).", describe_storage(&config));
            println!("Results on record: {}", store.len());
            println!("\nNext step: cargo run -- analyze \"some text\"");
        }

        Commands::Analyze { text, lang } => {
            let hint = LanguageHint::parse_lenient(&lang);
            let session = build_session(&config)?;

            println!("Analyzing...");
            match session.submit(&text, hint).await {
                Ok(result) => terminal::display_result(&result),
                Err(e @ (SessionError::EmptyText | SessionError::TooLong { .. })) => {
                    println!("{} {e}", "Cannot analyze:".yellow());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Batch { file, lang } => {
            let hint = LanguageHint::parse_lenient(&lang);
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let lines: Vec<&str> = content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();

            if lines.is_empty() {
                println!("No text found in {}.", file.display());
                return Ok(());
            }

            let session = build_session(&config)?;
            println!("Analyzing {} texts...", lines.len());

            let pb = ProgressBar::new(lines.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar().template("  Analyzing [{bar:30}] {pos}/{len} ({eta})")?,
            );

            let mut results = Vec::with_capacity(lines.len());
            let mut skipped = 0;
            for line in lines {
                match session.submit(line, hint).await {
                    Ok(result) => results.push(result),
                    Err(e @ SessionError::TooLong { .. }) => {
                        warn!(error = %e, "Skipping line");
                        skipped += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
                pb.inc(1);
            }
            pb.finish_and_clear();

            for result in &results {
                terminal::display_result_line(result);
            }
            let toxic = results.iter().filter(|r| r.is_toxic).count();
            println!("\n{}", "Batch complete.".bold());
            println!("  Analyzed: {}", results.len());
            println!("  Toxic:    {toxic}");
            if skipped > 0 {
                println!("  Skipped:  {skipped} (over {} characters)", config.max_text_chars);
            }
        }

        Commands::Examples => {
            println!("Try these examples:");
            for example in EXAMPLE_TEXTS {
                println!("  cybershield analyze \"{example}\"");
            }
        }

        Commands::History { filter, limit } => {
            let store = open_store(&config)?;
            let results = filter.apply(store.history());
            terminal::display_history(&results, filter, limit);
        }

        Commands::Stats => {
            let store = open_store(&config)?;
            let stats = compute_stats(store.history());
            terminal::display_stats(&stats);
        }

        Commands::Feedback { id, verdict } => {
            let mut store = open_store(&config)?;
            if store.record_feedback(&id, verdict)? {
                println!("Thank you for your feedback! Marked {id} as {}.", verdict.as_str());
            } else {
                println!("Feedback not recorded (unknown result ID or feedback disabled).");
            }
        }

        Commands::Export { filter, output } => {
            let store = open_store(&config)?;
            let results = filter.apply(store.history());
            let path = output.unwrap_or_else(|| {
                PathBuf::from(csv::default_export_filename(
                    filter,
                    chrono::Utc::now().date_naive(),
                ))
            });
            let rows = csv::write_csv(&path, &results)?;
            println!("Exported {rows} results to {}", path.display());
        }

        Commands::Settings {
            sensitivity,
            feedback,
            autosave,
        } => {
            let store = open_store(&config)?;
            let mut settings = store.settings()?;
            let changed = sensitivity.is_some() || feedback.is_some() || autosave.is_some();

            if let Some(sensitivity) = sensitivity {
                settings.sensitivity = sensitivity;
            }
            if let Some(feedback) = feedback {
                settings.enable_feedback = feedback;
            }
            if let Some(autosave) = autosave {
                settings.auto_save = autosave;
            }
            if changed {
                store.update_settings(&settings)?;
            }
            terminal::display_settings(&settings);
        }

        Commands::Clear { yes } => {
            if !yes {
                println!(
                    "This deletes every stored result and resets settings. Re-run with {} to confirm.",
                    "--yes".bold()
                );
                return Ok(());
            }
            let mut store = open_store(&config)?;
            let removed = store.len();
            store.clear()?;
            println!("Cleared {removed} results. Settings reset to defaults.");
        }
    }

    Ok(())
}

/// Select the storage backend based on configuration.
///
/// When the configured backend can't be opened, falls back to in-memory
/// storage so analysis still works for this run.
fn open_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    match config.storage {
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageKind::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                return match cybershield::store::sqlite::SqliteStorage::open(&config.db_path) {
                    Ok(storage) => Ok(Arc::new(storage)),
                    Err(e) => {
                        warn!(error = %e, "SQLite storage unavailable, results will not persist");
                        Ok(Arc::new(MemoryStorage::new()))
                    }
                };
            }
            #[cfg(not(feature = "sqlite"))]
            anyhow::bail!(
                "CYBERSHIELD_STORAGE is sqlite but the 'sqlite' feature is not compiled in.\n\
                 Rebuild with default features or set CYBERSHIELD_STORAGE=memory."
            );
        }
    }
}

/// Open the result store, degrading to an empty in-memory store on failure.
fn open_store(config: &Config) -> Result<ResultStore> {
    let backend = open_backend(config)?;
    match ResultStore::open(backend, config.max_history) {
        Ok(store) => Ok(store),
        Err(e) => {
            warn!(error = %e, "Failed to load stored results, starting empty");
            Ok(ResultStore::open(
                Arc::new(MemoryStorage::new()),
                config.max_history,
            )?)
        }
    }
}

/// Wire the classifier and store into an analysis session.
fn build_session(config: &Config) -> Result<Session> {
    let classifier = HeuristicClassifier::new()?.with_processing_delay(config.processing_delay());
    let store = open_store(config)?;
    let (min_latency, max_latency) = config.network_latency();
    Ok(Session::new(Box::new(classifier), store)
        .with_network_latency(min_latency, max_latency)
        .with_max_text_chars(config.max_text_chars))
}

fn describe_storage(config: &Config) -> String {
    match config.storage {
        StorageKind::Sqlite => format!("SQLite at {}", config.db_path),
        StorageKind::Memory => "in-memory, not persisted".to_string(),
    }
}
