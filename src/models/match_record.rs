use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::BetType;

/// A fixture ingested from an uploaded sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Source-scoped identifier (`<file>_<data row>`)
    pub id: String,

    /// Kick-off date, if the sheet carried a parseable one
    pub date: Option<NaiveDate>,

    /// Home team name (trimmed, inner whitespace collapsed)
    pub home: String,

    /// Away team name (trimmed, inner whitespace collapsed)
    pub away: String,

    /// League or competition name
    pub league: String,

    /// Decimal odds for a home win
    pub odds1: Option<f64>,

    /// Decimal odds for a draw
    pub odds_x: Option<f64>,

    /// Decimal odds for an away win
    pub odds2: Option<f64>,

    /// Name of the file the match came from
    pub file_name: String,

    /// 1-based sheet row (the header is row 1)
    pub row_index: usize,
}

impl Match {
    /// Display label, e.g. "Arsenal vs Chelsea"
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home, self.away)
    }

    /// All three odds, only when every one of them is present
    pub fn full_odds(&self) -> Option<[f64; 3]> {
        match (self.odds1, self.odds_x, self.odds2) {
            (Some(home), Some(draw), Some(away)) => Some([home, draw, away]),
            _ => None,
        }
    }

    /// Odds for a bet type, only when the full 1X2 triple is known
    pub fn odds_for(&self, bet_type: BetType) -> Option<f64> {
        let [home, draw, away] = self.full_odds()?;
        Some(match bet_type {
            BetType::Home => home,
            BetType::Draw => draw,
            BetType::Away => away,
        })
    }
}

/// Ingestion record for one uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub name: String,

    /// File size in bytes
    pub size: u64,

    /// Matches extracted from the file
    pub total_matches: usize,

    /// Matches accepted into the corpus
    pub new_matches: usize,

    /// Matches rejected as already known
    pub duplicates: usize,

    pub processed_at: DateTime<Utc>,
}
