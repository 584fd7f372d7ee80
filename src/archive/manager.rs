use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::outcome::OutcomeSource;
use crate::analysis::{FailurePattern, LearningModel, SuccessPattern};
use crate::error::{AnalyzerError, Result};
use crate::models::{ArchiveEntry, ArchiveStatus, BetType, Prediction};

/// Owns archived predictions and their pending → correct/incorrect lifecycle
#[derive(Debug, Default)]
pub struct ArchiveManager {
    entries: Vec<ArchiveEntry>,
    ids: HashSet<String>,
}

/// Outcome of one verification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerificationSummary {
    /// Entries moved out of pending
    pub processed: usize,
    pub correct: usize,
    pub incorrect: usize,
    /// Pending entries the outcome source could not settle yet
    pub unsettled: usize,
}

impl VerificationSummary {
    /// Batch accuracy in percent
    pub fn accuracy(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.correct as f64 / self.processed as f64 * 100.0
    }
}

/// Archive-wide counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveStats {
    pub total_archived: usize,
    pub total_verified: usize,
    pub total_correct: usize,
    /// Correct over verified in percent, one decimal
    pub overall_accuracy: f64,
}

impl ArchiveManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore an archive; duplicate ids are an invariant violation
    pub fn from_entries(entries: Vec<ArchiveEntry>) -> Result<Self> {
        let mut manager = Self::new();
        for entry in entries {
            manager.insert(entry)?;
        }
        Ok(manager)
    }

    fn insert(&mut self, entry: ArchiveEntry) -> Result<()> {
        if !self.ids.insert(entry.id.clone()) {
            return Err(AnalyzerError::Invariant(format!(
                "duplicate archive entry id {}",
                entry.id
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Archive predictions as pending entries
    pub fn add_predictions(&mut self, predictions: &[Prediction]) -> Result<usize> {
        let added_at = Utc::now();

        for prediction in predictions {
            self.insert(ArchiveEntry {
                id: Uuid::new_v4().to_string(),
                prediction: prediction.clone(),
                added_at,
                status: ArchiveStatus::Pending,
                verified: false,
                actual_result: None,
            })?;
        }

        info!("Archived {} predictions", predictions.len());
        Ok(predictions.len())
    }

    /// Settle every pending entry the source can resolve and feed the learning model
    pub fn verify_pending(
        &mut self,
        source: &mut dyn OutcomeSource,
        model: &mut LearningModel,
    ) -> VerificationSummary {
        let mut summary = VerificationSummary::default();

        for entry in self.entries.iter_mut().filter(|e| e.is_pending()) {
            let Some(actual) = source.determine_outcome(entry) else {
                debug!("No result yet for {}", entry.prediction.match_label);
                summary.unsettled += 1;
                continue;
            };

            if settle(entry, actual, model) {
                summary.correct += 1;
            } else {
                summary.incorrect += 1;
            }
            summary.processed += 1;
        }

        if summary.processed == 0 {
            if summary.unsettled > 0 {
                warn!("{} pending predictions could not be settled", summary.unsettled);
            }
            return summary;
        }

        model.apply_verification_batch(summary.processed, summary.correct);

        info!(
            "Verification complete: {}/{} correct ({:.1}%), {} still pending",
            summary.correct,
            summary.processed,
            summary.accuracy(),
            summary.unsettled
        );

        summary
    }

    /// Append imported entries whose ids are unknown; returns how many were added.
    /// A batch repeating an id is rejected before anything is appended.
    pub fn merge(&mut self, entries: Vec<ArchiveEntry>) -> Result<usize> {
        let mut incoming = HashSet::with_capacity(entries.len());
        if let Some(repeated) = entries.iter().find(|e| !incoming.insert(e.id.as_str())) {
            return Err(AnalyzerError::Invariant(format!(
                "duplicate archive entry id {} in import",
                repeated.id
            )));
        }

        let mut added = 0;
        for entry in entries {
            if self.ids.contains(&entry.id) {
                continue;
            }
            self.ids.insert(entry.id.clone());
            self.entries.push(entry);
            added += 1;
        }
        Ok(added)
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pending()).count()
    }

    /// Entries with the given status, newest first
    pub fn by_status(&self, status: Option<ArchiveStatus>) -> Vec<&ArchiveEntry> {
        let mut selected: Vec<&ArchiveEntry> = self
            .entries
            .iter()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .collect();
        selected.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        selected
    }

    pub fn stats(&self) -> ArchiveStats {
        let total_verified = self.entries.iter().filter(|e| e.verified).count();
        let total_correct = self
            .entries
            .iter()
            .filter(|e| e.status == ArchiveStatus::Correct)
            .count();

        let overall_accuracy = if total_verified > 0 {
            (total_correct as f64 / total_verified as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        ArchiveStats {
            total_archived: self.entries.len(),
            total_verified,
            total_correct,
            overall_accuracy,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.ids.clear();
    }
}

/// Move a pending entry to its terminal state; true when the prediction was right
fn settle(entry: &mut ArchiveEntry, actual: BetType, model: &mut LearningModel) -> bool {
    let prediction = &entry.prediction;
    let verified_at = Utc::now();
    let correct = actual == prediction.bet_type;

    if correct {
        model.record_success(SuccessPattern {
            match_label: prediction.match_label.clone(),
            bet_type: prediction.bet_type,
            confidence: prediction.confidence,
            factors: prediction.factors.clone(),
            league: prediction.league.clone(),
            home: prediction.home.clone(),
            odds1: prediction.odds,
            verified_at,
        });
    } else {
        model.record_failure(FailurePattern {
            match_label: prediction.match_label.clone(),
            bet_type: prediction.bet_type,
            actual_result: actual,
            confidence: prediction.confidence,
            factors: prediction.factors.clone(),
            verified_at,
        });
    }

    debug!(
        "Verified {}: {}",
        prediction.match_label,
        if correct { "correct" } else { "incorrect" }
    );

    entry.status = if correct {
        ArchiveStatus::Correct
    } else {
        ArchiveStatus::Incorrect
    };
    entry.verified = true;
    entry.actual_result = Some(actual);

    correct
}
