use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{ArchiveEntry, BetType};

/// Share of simulated verifications that come back correct
pub const DEFAULT_SUCCESS_RATE: f64 = 0.6;

/// Decides the actual result of an archived prediction
pub trait OutcomeSource {
    /// Actual result, or `None` while the match is not settled
    fn determine_outcome(&mut self, entry: &ArchiveEntry) -> Option<BetType>;
}

impl<F> OutcomeSource for F
where
    F: FnMut(&ArchiveEntry) -> Option<BetType>,
{
    fn determine_outcome(&mut self, entry: &ArchiveEntry) -> Option<BetType> {
        self(entry)
    }
}

/// Coin-flip settlement: correct with `success_rate`, otherwise a random other outcome
pub struct SimulatedOutcomes {
    rng: StdRng,
    success_rate: f64,
}

impl SimulatedOutcomes {
    pub fn new(success_rate: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            success_rate,
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64, success_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            success_rate,
        }
    }
}

impl Default for SimulatedOutcomes {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_RATE)
    }
}

impl OutcomeSource for SimulatedOutcomes {
    fn determine_outcome(&mut self, entry: &ArchiveEntry) -> Option<BetType> {
        let predicted = entry.prediction.bet_type;

        if self.rng.gen::<f64>() < self.success_rate {
            return Some(predicted);
        }

        let alternatives: Vec<BetType> = BetType::ALL
            .into_iter()
            .filter(|b| *b != predicted)
            .collect();
        alternatives.choose(&mut self.rng).copied()
    }
}

/// Results fetched ahead of time, keyed by archive entry id
#[derive(Debug, Clone, Default)]
pub struct SettledResults {
    results: HashMap<String, BetType>,
}

impl SettledResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry_id: &str, result: BetType) {
        self.results.insert(entry_id.to_string(), result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl OutcomeSource for SettledResults {
    fn determine_outcome(&mut self, entry: &ArchiveEntry) -> Option<BetType> {
        self.results.get(&entry.id).copied()
    }
}
