use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::archive::SettledResults;
use crate::models::{ArchiveEntry, BetType};

/// Client for a match results feed used to settle archived predictions
pub struct ResultsFeedClient {
    client: Client,
    base_url: String,
}

/// Result record returned by the feed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    /// e.g. "finished", "scheduled", "postponed"
    pub status: String,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
}

impl FeedResult {
    /// 1X2 outcome, once the match is finished and the score is known
    pub fn outcome(&self) -> Option<BetType> {
        let finished = matches!(
            self.status.trim().to_lowercase().as_str(),
            "finished" | "ft" | "full_time"
        );
        if !finished {
            return None;
        }

        Some(BetType::from_score(self.home_goals?, self.away_goals?))
    }
}

impl ResultsFeedClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn result_url(&self, entry: &ArchiveEntry) -> String {
        let prediction = &entry.prediction;
        let date = prediction
            .date
            .map(|d| d.to_string())
            .unwrap_or_default();

        format!(
            "{}/results?home={}&away={}&date={}",
            self.base_url,
            urlencoding::encode(&prediction.home),
            urlencoding::encode(&prediction.away),
            urlencoding::encode(&date)
        )
    }

    /// Fetch the result of one match; `None` when the feed has no record
    pub async fn fetch_result(&self, entry: &ArchiveEntry) -> Result<Option<FeedResult>> {
        let url = self.result_url(entry);
        debug!("Fetching result: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch match result")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Results feed error: {} - {}", status, text);
        }

        let result: FeedResult = response
            .json()
            .await
            .context("Failed to parse match result")?;

        Ok(Some(result))
    }

    /// Look up every pending entry; failed lookups are logged and left unsettled
    pub async fn fetch_settlements(&self, entries: &[ArchiveEntry]) -> SettledResults {
        let mut settled = SettledResults::new();

        for entry in entries.iter().filter(|e| e.is_pending()) {
            match self.fetch_result(entry).await {
                Ok(Some(result)) => {
                    if let Some(outcome) = result.outcome() {
                        settled.insert(&entry.id, outcome);
                    }
                }
                Ok(None) => debug!("No result for {}", entry.prediction.match_label),
                Err(e) => warn!(
                    "Result lookup failed for {}: {:#}",
                    entry.prediction.match_label, e
                ),
            }
        }

        info!("Results feed settled {} pending predictions", settled.len());
        settled
    }
}
