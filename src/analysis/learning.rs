use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{BetType, Factors};

/// Accuracy history keeps this many most recent points
pub const ACCURACY_HISTORY_LIMIT: usize = 50;

/// Weight adjustment runs once more failures than this are stored
const FAILURES_BEFORE_ADJUSTMENT: usize = 5;

/// Failure patterns inspected per adjustment
const RECENT_FAILURE_WINDOW: usize = 10;

/// Relative weight of each factor; always normalized to sum to 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorWeights {
    pub team_form: f64,
    pub head_to_head: f64,
    pub home_advantage: f64,
    pub motivation: f64,
    pub value_odds: f64,
    pub injuries: f64,
    pub weather: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            team_form: 0.25,
            head_to_head: 0.20,
            home_advantage: 0.15,
            motivation: 0.15,
            value_odds: 0.10,
            injuries: 0.10,
            weather: 0.05,
        }
    }
}

impl FactorWeights {
    /// Named weights in display order
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("teamForm", self.team_form),
            ("headToHead", self.head_to_head),
            ("homeAdvantage", self.home_advantage),
            ("motivation", self.motivation),
            ("valueOdds", self.value_odds),
            ("injuries", self.injuries),
            ("weather", self.weather),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }

    /// Scale every weight so the total is 1
    pub fn normalize(&mut self) {
        let total = self.sum();
        if total <= 0.0 || !total.is_finite() {
            return;
        }

        for weight in [
            &mut self.team_form,
            &mut self.head_to_head,
            &mut self.home_advantage,
            &mut self.motivation,
            &mut self.value_odds,
            &mut self.injuries,
            &mut self.weather,
        ] {
            *weight /= total;
        }
    }
}

/// A verified correct prediction, used for similarity scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessPattern {
    #[serde(rename = "match")]
    pub match_label: String,
    pub bet_type: BetType,
    pub confidence: u32,
    pub factors: Factors,
    pub league: String,
    pub home: String,
    /// Odds of the predicted bet type at analysis time
    pub odds1: Option<f64>,
    pub verified_at: DateTime<Utc>,
}

/// A verified incorrect prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailurePattern {
    #[serde(rename = "match")]
    pub match_label: String,
    pub bet_type: BetType,
    pub actual_result: BetType,
    pub confidence: u32,
    pub factors: Factors,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyPoint {
    pub timestamp: DateTime<Utc>,
    /// Cumulative accuracy in percent
    pub accuracy: f64,
    pub total_predictions: u64,
}

/// Adaptive state fed back into prediction synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningModel {
    pub weights: FactorWeights,
    pub success_patterns: Vec<SuccessPattern>,
    pub failure_patterns: Vec<FailurePattern>,
    pub accuracy_history: Vec<AccuracyPoint>,
    pub total_predictions: u64,
    pub correct_predictions: u64,
    /// One point per verified prediction, capped at 100
    pub learning_progress: f64,
}

impl Default for LearningModel {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            success_patterns: Vec::new(),
            failure_patterns: Vec::new(),
            accuracy_history: Vec::new(),
            total_predictions: 0,
            correct_predictions: 0,
            learning_progress: 0.0,
        }
    }
}

impl LearningModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore default weights and forget all history
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_success(&mut self, pattern: SuccessPattern) {
        self.success_patterns.push(pattern);
    }

    pub fn record_failure(&mut self, pattern: FailurePattern) {
        self.failure_patterns.push(pattern);
    }

    /// Cumulative accuracy in percent
    pub fn accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            return 0.0;
        }
        self.correct_predictions as f64 / self.total_predictions as f64 * 100.0
    }

    /// Fold a finished verification batch into the counters, weights and history
    pub fn apply_verification_batch(&mut self, batch_size: usize, correct_count: usize) {
        if batch_size == 0 {
            return;
        }

        self.total_predictions += batch_size as u64;
        self.correct_predictions += correct_count as u64;
        self.refresh_progress();

        if self.failure_patterns.len() > FAILURES_BEFORE_ADJUSTMENT {
            self.adjust_weights();
        }

        self.accuracy_history.push(AccuracyPoint {
            timestamp: Utc::now(),
            accuracy: self.accuracy(),
            total_predictions: self.total_predictions,
        });
        self.trim_history();

        info!(
            "Learning model updated: {}/{} correct ({:.1}%), progress {:.0}%",
            self.correct_predictions,
            self.total_predictions,
            self.accuracy(),
            self.learning_progress
        );
    }

    /// Shift weight away from form and home advantage toward head-to-head and odds value
    fn adjust_weights(&mut self) -> bool {
        let start = self
            .failure_patterns
            .len()
            .saturating_sub(RECENT_FAILURE_WINDOW);
        let recent_failures = &self.failure_patterns[start..];

        if recent_failures.len() < FAILURES_BEFORE_ADJUSTMENT {
            return false;
        }

        self.weights.team_form *= 0.95;
        self.weights.home_advantage *= 0.98;
        self.weights.head_to_head *= 1.02;
        self.weights.value_odds *= 1.03;
        self.weights.normalize();

        debug!("Adjusted model weights: {:?}", self.weights);
        true
    }

    /// Additively merge patterns, history and counters; weights are kept
    pub fn merge_from(&mut self, other: LearningModel) {
        self.success_patterns.extend(other.success_patterns);
        self.failure_patterns.extend(other.failure_patterns);
        self.accuracy_history.extend(other.accuracy_history);
        self.trim_history();

        self.total_predictions += other.total_predictions;
        self.correct_predictions += other.correct_predictions;
        self.refresh_progress();
    }

    fn refresh_progress(&mut self) {
        self.learning_progress = (self.total_predictions as f64).min(100.0);
    }

    fn trim_history(&mut self) {
        if self.accuracy_history.len() > ACCURACY_HISTORY_LIMIT {
            let excess = self.accuracy_history.len() - ACCURACY_HISTORY_LIMIT;
            self.accuracy_history.drain(..excess);
        }
    }
}
