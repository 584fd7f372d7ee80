use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path
    pub database_url: String,

    /// Default confidence threshold for archiving predictions
    pub min_confidence: u32,

    /// Lower bound of the pause between analyzed matches, in milliseconds
    pub analysis_delay_min_ms: u64,

    /// Upper bound of the pause between analyzed matches, in milliseconds
    pub analysis_delay_max_ms: u64,

    /// Share of simulated verifications that come back correct
    pub simulated_success_rate: f64,

    /// Results feed used to settle predictions; simulation when unset
    pub results_feed_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/analyzer.db".to_string()),

            min_confidence: env::var("MIN_CONFIDENCE")
                .unwrap_or_else(|_| "70".to_string())
                .parse()
                .context("MIN_CONFIDENCE must be a valid number")?,

            analysis_delay_min_ms: env::var("ANALYSIS_DELAY_MIN_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("ANALYSIS_DELAY_MIN_MS must be a valid number")?,

            analysis_delay_max_ms: env::var("ANALYSIS_DELAY_MAX_MS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("ANALYSIS_DELAY_MAX_MS must be a valid number")?,

            simulated_success_rate: env::var("SIMULATED_SUCCESS_RATE")
                .unwrap_or_else(|_| "0.6".to_string())
                .parse()
                .context("SIMULATED_SUCCESS_RATE must be a valid number")?,

            results_feed_url: env::var("RESULTS_FEED_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        };

        if !(0.0..=1.0).contains(&config.simulated_success_rate) {
            anyhow::bail!("SIMULATED_SUCCESS_RATE must be between 0 and 1");
        }

        Ok(config)
    }
}
