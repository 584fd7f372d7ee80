use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 1X2 market outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BetType {
    /// Home win
    #[serde(rename = "1")]
    Home,
    /// Draw
    #[serde(rename = "X")]
    Draw,
    /// Away win
    #[serde(rename = "2")]
    Away,
}

impl BetType {
    pub const ALL: [BetType; 3] = [BetType::Home, BetType::Draw, BetType::Away];

    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Home => "1",
            BetType::Draw => "X",
            BetType::Away => "2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BetType::Home => "Home win",
            BetType::Draw => "Draw",
            BetType::Away => "Away win",
        }
    }

    /// Outcome implied by a final score
    pub fn from_score(home_goals: u32, away_goals: u32) -> Self {
        if home_goals > away_goals {
            BetType::Home
        } else if home_goals < away_goals {
            BetType::Away
        } else {
            BetType::Draw
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(BetType::Home),
            "X" | "x" => Ok(BetType::Draw),
            "2" => Ok(BetType::Away),
            other => Err(format!("unknown bet type '{}'", other)),
        }
    }
}

/// Head-to-head lean derived from the two team hashes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeadToHead {
    StrongHome,
    HomeSlight,
    Balanced,
    AwaySlight,
    StrongAway,
}

impl HeadToHead {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadToHead::StrongHome => "strong_home",
            HeadToHead::HomeSlight => "home_slight",
            HeadToHead::Balanced => "balanced",
            HeadToHead::AwaySlight => "away_slight",
            HeadToHead::StrongAway => "strong_away",
        }
    }
}

/// Bookmaker margin classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OddsRecommendation {
    /// Implied probability < 1.04
    ExcellentValue,
    /// Implied probability < 1.06
    GoodValue,
    Normal,
    /// Implied probability > 1.12
    PoorValue,
}

impl OddsRecommendation {
    pub fn from_implied_probability(implied: f64) -> Self {
        if implied < 1.04 {
            OddsRecommendation::ExcellentValue
        } else if implied < 1.06 {
            OddsRecommendation::GoodValue
        } else if implied > 1.12 {
            OddsRecommendation::PoorValue
        } else {
            OddsRecommendation::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsAnalysis {
    /// True only when all three odds were available
    pub has_value: bool,

    pub recommendation: OddsRecommendation,

    /// Bookmaker margin in percent, rounded to 2 decimals (negative for sub-1 books).
    /// Older archives carry it as a decimal string such as "-8.68".
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub margin: f64,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("invalid margin {}", value)))
}

impl Default for OddsAnalysis {
    fn default() -> Self {
        Self {
            has_value: false,
            recommendation: OddsRecommendation::Normal,
            margin: 0.0,
        }
    }
}

/// Contextual tag raising or lowering a side's motivation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MotivationTag {
    TopLeague,
    Derby,
    CupMatch,
}

/// Inputs to the confidence formula for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factors {
    /// Home team form, 1-10
    pub home_form: f64,

    /// Away team form, 1-10
    pub away_form: f64,

    pub form_difference: f64,

    pub head_to_head: HeadToHead,

    /// Home advantage multiplier for the league
    pub home_advantage: f64,

    pub odds_analysis: OddsAnalysis,

    pub motivation: Vec<MotivationTag>,

    pub league_importance: f64,

    /// Best similarity against stored success patterns, 0-1
    pub pattern_match: f64,
}

impl Factors {
    pub fn has_motivation(&self, tag: MotivationTag) -> bool {
        self.motivation.contains(&tag)
    }
}

/// A synthesized outcome prediction for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub match_id: String,

    /// "Home vs Away"
    #[serde(rename = "match")]
    pub match_label: String,

    pub home: String,

    pub away: String,

    pub league: String,

    pub date: Option<NaiveDate>,

    pub file_name: String,

    pub bet_type: BetType,

    /// Clamped to 50-95
    pub confidence: u32,

    /// Value bonus in percent
    pub value: f64,

    /// One entry per triggered rule, in evaluation order
    pub reasoning: Vec<String>,

    /// Odds for the chosen bet type
    pub odds: Option<f64>,

    pub factors: Factors,

    pub analyzed_at: DateTime<Utc>,
}

/// Sort predictions for display, most confident first
pub fn sort_by_confidence(predictions: &mut [Prediction]) {
    predictions.sort_by(|a, b| b.confidence.cmp(&a.confidence));
}
