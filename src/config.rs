use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::classifier::heuristic::DEFAULT_PROCESSING_DELAY;
use crate::session::{DEFAULT_MAX_TEXT_CHARS, DEFAULT_NETWORK_LATENCY};

/// Which storage backend holds the history and settings.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageKind {
    /// SQLite file at `db_path` (default)
    Sqlite,
    /// In-process map: nothing survives the process
    Memory,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub storage: StorageKind,
    /// Cap on stored results; `None` keeps everything.
    pub max_history: Option<usize>,
    /// When false, both the processing delay and network latency are zero.
    pub simulate_latency: bool,
    /// Caller-side limit on submitted text length, in characters.
    pub max_text_chars: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a default; only malformed values are errors.
    pub fn load() -> Result<Self> {
        let storage = match env::var("CYBERSHIELD_STORAGE") {
            Ok(raw) if !raw.trim().is_empty() => parse_storage(&raw)?,
            _ => StorageKind::Sqlite,
        };

        let max_history = match env::var("CYBERSHIELD_MAX_HISTORY") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_positive("CYBERSHIELD_MAX_HISTORY", &raw)?),
            _ => None,
        };

        let max_text_chars = match env::var("CYBERSHIELD_MAX_TEXT_CHARS") {
            Ok(raw) if !raw.trim().is_empty() => parse_positive("CYBERSHIELD_MAX_TEXT_CHARS", &raw)?,
            _ => DEFAULT_MAX_TEXT_CHARS,
        };

        let simulate_latency = match env::var("CYBERSHIELD_SIMULATE_LATENCY") {
            Ok(raw) => parse_bool("CYBERSHIELD_SIMULATE_LATENCY", &raw)?,
            Err(_) => true,
        };

        Ok(Self {
            db_path: env::var("CYBERSHIELD_DB_PATH")
                .unwrap_or_else(|_| "./cybershield.db".to_string()),
            storage,
            max_history,
            simulate_latency,
            max_text_chars,
        })
    }

    /// Internal classifier delay.
    pub fn processing_delay(&self) -> Duration {
        if self.simulate_latency {
            DEFAULT_PROCESSING_DELAY
        } else {
            Duration::ZERO
        }
    }

    /// Caller-side simulated network latency range.
    pub fn network_latency(&self) -> (Duration, Duration) {
        if self.simulate_latency {
            DEFAULT_NETWORK_LATENCY
        } else {
            (Duration::ZERO, Duration::ZERO)
        }
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<usize> {
    let value: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a positive integer, got '{raw}'"))?;
    if value == 0 {
        anyhow::bail!("{name} must be a positive integer, got 0");
    }
    Ok(value)
}

fn parse_storage(raw: &str) -> Result<StorageKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sqlite" => Ok(StorageKind::Sqlite),
        "memory" => Ok(StorageKind::Memory),
        _ => anyhow::bail!("CYBERSHIELD_STORAGE must be sqlite or memory, got '{raw}'"),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{name} must be true or false, got '{raw}'"),
    }
}
