use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::signature::match_signature;
use crate::models::Match;

/// Deduplicated match corpus indexed by signature
#[derive(Debug, Default)]
pub struct MatchRepository {
    matches: Vec<Match>,
    signatures: HashSet<String>,
}

/// Result of one ingestion batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounts {
    pub accepted: usize,
    pub duplicates: usize,
}

/// Listing filter for the corpus
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub league: Option<String>,
    pub date: Option<NaiveDate>,
    /// Case-insensitive text searched in team and league names
    pub search: Option<String>,
}

impl MatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a repository from persisted matches
    pub fn from_matches(matches: Vec<Match>) -> Self {
        let mut repo = Self::new();
        let counts = repo.ingest(matches);

        if counts.duplicates > 0 {
            warn!(
                "Dropped {} duplicate matches while restoring corpus",
                counts.duplicates
            );
        }

        repo
    }

    /// Add candidates whose signature is not yet known
    pub fn ingest<I>(&mut self, candidates: I) -> IngestCounts
    where
        I: IntoIterator<Item = Match>,
    {
        let mut counts = IngestCounts::default();

        for candidate in candidates {
            let signature = match_signature(&candidate);

            if self.signatures.contains(&signature) {
                debug!(
                    "Duplicate: {} ({})",
                    candidate.label(),
                    candidate
                        .date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "no date".to_string())
                );
                counts.duplicates += 1;
                continue;
            }

            self.signatures.insert(signature);
            self.matches.push(candidate);
            counts.accepted += 1;
        }

        info!(
            "Ingested {} matches ({} duplicates, {} in corpus)",
            counts.accepted,
            counts.duplicates,
            self.matches.len()
        );

        counts
    }

    pub fn contains_signature(&self, signature: &str) -> bool {
        self.signatures.contains(signature)
    }

    /// Matches scheduled exactly on `date`
    pub fn matches_on(&self, date: NaiveDate) -> Vec<&Match> {
        self.matches
            .iter()
            .filter(|m| m.date == Some(date))
            .collect()
    }

    pub fn all(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Distinct league names, sorted
    pub fn leagues(&self) -> Vec<&str> {
        self.matches
            .iter()
            .map(|m| m.league.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct known dates, sorted
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.matches
            .iter()
            .filter_map(|m| m.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn filter(&self, filter: &MatchFilter) -> Vec<&Match> {
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        self.matches
            .iter()
            .filter(|m| filter.league.as_ref().map_or(true, |l| &m.league == l))
            .filter(|m| filter.date.map_or(true, |d| m.date == Some(d)))
            .filter(|m| {
                search.as_ref().map_or(true, |s| {
                    m.home.to_lowercase().contains(s)
                        || m.away.to_lowercase().contains(s)
                        || m.league.to_lowercase().contains(s)
                })
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.matches.clear();
        self.signatures.clear();
    }
}
