pub mod exchange;
pub mod manager;
pub mod outcome;

pub use exchange::{parse_import, ArchiveExport, ArchiveImport, ExportMetadata, Statistics};
pub use manager::{ArchiveManager, ArchiveStats, VerificationSummary};
pub use outcome::{OutcomeSource, SettledResults, SimulatedOutcomes};
