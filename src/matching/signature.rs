use chrono::NaiveDate;

use crate::models::Match;

const NO_DATE: &str = "nodate";

/// Lowercase a team name and keep only ASCII letters and digits
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Dedup key for a fixture: `home_vs_away_date`
pub fn signature(home: &str, away: &str, date: Option<NaiveDate>) -> String {
    let date = date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NO_DATE.to_string());

    format!("{}_vs_{}_{}", normalize_name(home), normalize_name(away), date)
}

/// Signature of an ingested match
pub fn match_signature(m: &Match) -> String {
    signature(&m.home, &m.away, m.date)
}
