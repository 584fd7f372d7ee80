use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Match, Prediction};
use crate::service::AnalyzerService;

/// Runs an analysis over shared session state, pausing between matches
pub struct AnalysisRunner {
    service: Arc<RwLock<AnalyzerService>>,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl AnalysisRunner {
    pub fn new(service: Arc<RwLock<AnalyzerService>>, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            service,
            min_delay_ms,
            max_delay_ms: max_delay_ms.max(min_delay_ms),
        }
    }

    /// Analyze every match on `date`; fails fast if another run holds the slot
    pub async fn run(&self, date: NaiveDate, min_confidence: u32) -> Result<Vec<Prediction>> {
        let candidates = {
            let mut service = self.service.write().await;
            service.try_begin_analysis()?;
            service.matches_for(date)
        };

        let result = self.analyze(date, candidates, min_confidence).await;
        self.service.write().await.finish_analysis();
        result
    }

    async fn analyze(
        &self,
        date: NaiveDate,
        candidates: Vec<Match>,
        min_confidence: u32,
    ) -> Result<Vec<Prediction>> {
        if candidates.is_empty() {
            warn!("No matches on {}", date);
            return Ok(Vec::new());
        }

        let total = candidates.len();
        info!("Starting analysis of {} matches on {}", total, date);

        let mut selected = Vec::new();
        for (i, m) in candidates.iter().enumerate() {
            info!(
                "Progress: {:.1}% - analyzing {}/{}: {}",
                i as f64 / total as f64 * 100.0,
                i + 1,
                total,
                m.label()
            );

            let prediction = self.service.write().await.analyze_match(m);
            if prediction.confidence >= min_confidence {
                selected.push(prediction);
            }

            tokio::time::sleep(self.next_delay()).await;
        }

        info!(
            "Progress: 100.0% - analysis finished, {} predictions at or above {}%",
            selected.len(),
            min_confidence
        );

        self.service.write().await.complete_analysis(selected)
    }

    fn next_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.min_delay_ms..=self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use crate::ingest::{Cell, Sheet};

    fn shared() -> Arc<RwLock<AnalyzerService>> {
        let rows = [
            ["Data", "Gospodarze", "Goście", "Liga", "Kurs1", "KursX", "Kurs2"],
            ["2024-03-10", "Arsenal", "Chelsea", "Premier League", "2,5", "3,8", "4,0"],
            ["2024-03-10", "Ajax", "PSV", "Eredivisie", "2.1", "3.4", "3.3"],
        ];
        let sheet = Sheet {
            name: "polish.csv".to_string(),
            size: 64,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| Cell::from(*c)).collect())
                .collect(),
        };

        let mut service = AnalyzerService::new();
        service.ingest_sheet(&sheet).unwrap();
        Arc::new(RwLock::new(service))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn test_run_archives_and_releases_slot() {
        let service = shared();
        let runner = AnalysisRunner::new(Arc::clone(&service), 0, 1);

        let predictions = runner.run(date(), 70).await.unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].confidence, 83);

        let service = service.read().await;
        assert_eq!(service.archive().len(), 1);
        assert!(!service.is_analysis_in_progress());
    }

    #[tokio::test]
    async fn test_run_rejected_while_busy() {
        let service = shared();
        service.write().await.try_begin_analysis().unwrap();

        let runner = AnalysisRunner::new(Arc::clone(&service), 0, 0);
        assert!(matches!(
            runner.run(date(), 50).await,
            Err(AnalyzerError::AnalysisInProgress)
        ));
        assert!(service.read().await.is_analysis_in_progress());
    }

    #[tokio::test]
    async fn test_empty_date_releases_slot() {
        let service = shared();
        let runner = AnalysisRunner::new(Arc::clone(&service), 0, 0);

        let none = runner
            .run(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), 50)
            .await
            .unwrap();
        assert!(none.is_empty());
        assert!(!service.read().await.is_analysis_in_progress());
    }
}
