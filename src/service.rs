use std::path::Path;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::analysis::{analyze_match, AnalysisCache, LearningModel};
use crate::archive::exchange::EXPORT_VERSION;
use crate::archive::{
    parse_import, ArchiveExport, ArchiveManager, ExportMetadata, OutcomeSource, Statistics,
    VerificationSummary,
};
use crate::error::{AnalyzerError, Result};
use crate::ingest::{extract_matches, read_sheet, Sheet};
use crate::matching::{match_signature, MatchRepository};
use crate::models::{sort_by_confidence, ArchiveEntry, Match, Prediction, ProcessedFile};

/// One analyzer session: corpus, cache, learning model and archive
#[derive(Debug, Default)]
pub struct AnalyzerService {
    repository: MatchRepository,
    cache: AnalysisCache,
    learning: LearningModel,
    archive: ArchiveManager,
    processed_files: Vec<ProcessedFile>,
    /// Predictions of the last analysis run that produced any
    predictions: Vec<Prediction>,
    analysis_in_progress: bool,
}

impl AnalyzerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from persisted state; the cache starts empty
    pub fn from_parts(
        matches: Vec<Match>,
        processed_files: Vec<ProcessedFile>,
        predictions: Vec<Prediction>,
        archive: Vec<ArchiveEntry>,
        learning: LearningModel,
    ) -> Result<Self> {
        Ok(Self {
            repository: MatchRepository::from_matches(matches),
            cache: AnalysisCache::new(),
            learning,
            archive: ArchiveManager::from_entries(archive)?,
            processed_files,
            predictions,
            analysis_in_progress: false,
        })
    }

    /// Extract and deduplicate the matches of one sheet
    pub fn ingest_sheet(&mut self, sheet: &Sheet) -> Result<ProcessedFile> {
        let extraction = extract_matches(&sheet.name, &sheet.rows)?;
        let total_matches = extraction.matches.len();
        let counts = self.repository.ingest(extraction.matches);

        let record = ProcessedFile {
            name: sheet.name.clone(),
            size: sheet.size,
            total_matches,
            new_matches: counts.accepted,
            duplicates: counts.duplicates,
            processed_at: Utc::now(),
        };

        info!(
            "Processed {}: {} matches, {} new, {} duplicates",
            record.name, record.total_matches, record.new_matches, record.duplicates
        );

        self.processed_files.push(record.clone());
        Ok(record)
    }

    /// Ingest every readable file; failing files are skipped with a warning
    pub fn ingest_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<ProcessedFile> {
        let mut processed = Vec::new();

        for path in paths {
            let path = path.as_ref();
            match read_sheet(path).and_then(|sheet| self.ingest_sheet(&sheet)) {
                Ok(record) => processed.push(record),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        processed
    }

    /// Claim the analysis slot; a second claim is rejected, never queued
    pub fn try_begin_analysis(&mut self) -> Result<()> {
        if self.analysis_in_progress {
            return Err(AnalyzerError::AnalysisInProgress);
        }
        self.analysis_in_progress = true;
        Ok(())
    }

    pub fn finish_analysis(&mut self) {
        self.analysis_in_progress = false;
    }

    pub fn is_analysis_in_progress(&self) -> bool {
        self.analysis_in_progress
    }

    /// Matches an analysis for `date` would cover
    pub fn matches_for(&self, date: NaiveDate) -> Vec<Match> {
        self.repository
            .matches_on(date)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Prediction for one match, served from the cache when its signature is known
    pub fn analyze_match(&mut self, m: &Match) -> Prediction {
        let signature = match_signature(m);
        let learning = &self.learning;
        let (prediction, hit) = self
            .cache
            .get_or_compute(&signature, || analyze_match(m, learning));

        if hit {
            debug!("Cache hit: {}", prediction.match_label);
        } else {
            debug!(
                "New analysis: {} - {}%",
                prediction.match_label, prediction.confidence
            );
        }

        prediction
    }

    /// Archive predictions that cleared the threshold and keep them for display
    pub fn complete_analysis(&mut self, mut selected: Vec<Prediction>) -> Result<Vec<Prediction>> {
        if selected.is_empty() {
            return Ok(selected);
        }

        self.archive.add_predictions(&selected)?;
        sort_by_confidence(&mut selected);
        self.predictions = selected.clone();
        Ok(selected)
    }

    /// Analyze every match on `date` without staging delays
    pub fn start_analysis(
        &mut self,
        date: NaiveDate,
        min_confidence: u32,
    ) -> Result<Vec<Prediction>> {
        self.try_begin_analysis()?;

        let result = self.run_analysis(date, min_confidence);
        self.finish_analysis();
        result
    }

    fn run_analysis(&mut self, date: NaiveDate, min_confidence: u32) -> Result<Vec<Prediction>> {
        let candidates = self.matches_for(date);
        if candidates.is_empty() {
            warn!("No matches on {}", date);
            return Ok(Vec::new());
        }

        info!("Analyzing {} matches on {}", candidates.len(), date);

        let selected: Vec<Prediction> = candidates
            .iter()
            .map(|m| self.analyze_match(m))
            .filter(|p| p.confidence >= min_confidence)
            .collect();

        info!(
            "Analysis finished: {} of {} predictions at or above {}%",
            selected.len(),
            candidates.len(),
            min_confidence
        );

        self.complete_analysis(selected)
    }

    /// Settle pending archive entries and update the learning model
    pub fn verify_pending(&mut self, source: &mut dyn OutcomeSource) -> VerificationSummary {
        if self.archive.pending_count() == 0 {
            info!("No pending predictions to verify");
            return VerificationSummary::default();
        }
        self.archive.verify_pending(source, &mut self.learning)
    }

    pub fn statistics(&self) -> Statistics {
        let stats = self.archive.stats();
        Statistics {
            total_matches: self.repository.len(),
            total_predictions: stats.total_archived,
            verified_predictions: stats.total_verified,
            correct_predictions: stats.total_correct,
            accuracy: stats.overall_accuracy,
            learning_progress: self.learning.learning_progress,
        }
    }

    pub fn export(&self) -> ArchiveExport {
        let statistics = self.statistics();
        ArchiveExport {
            metadata: ExportMetadata {
                exported_at: Utc::now(),
                version: EXPORT_VERSION.to_string(),
                total_predictions: self.archive.len(),
                accuracy: statistics.accuracy,
            },
            archive: self.archive.entries().to_vec(),
            learning_model: self.learning.clone(),
            processed_files: self.processed_files.clone(),
            statistics,
        }
    }

    /// Merge an exported archive; nothing changes unless the whole payload is valid.
    /// Returns (entries added, entries in the payload).
    pub fn import_json(&mut self, payload: &str) -> Result<(usize, usize)> {
        let import = parse_import(payload)?;
        let total = import.archive.len();

        let added = self.archive.merge(import.archive)?;
        if let Some(model) = import.learning_model {
            self.learning.merge_from(model);
        }

        info!("Imported {} new predictions out of {}", added, total);
        Ok((added, total))
    }

    /// Drop every match, prediction and archive entry and reset the learning model
    pub fn clear(&mut self) {
        self.repository.clear();
        self.cache.clear();
        self.learning.reset();
        self.archive.clear();
        self.processed_files.clear();
        self.predictions.clear();
        info!("Session cleared");
    }

    pub fn repository(&self) -> &MatchRepository {
        &self.repository
    }

    pub fn learning(&self) -> &LearningModel {
        &self.learning
    }

    pub fn archive(&self) -> &ArchiveManager {
        &self.archive
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn processed_files(&self) -> &[ProcessedFile] {
        &self.processed_files
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }
}
