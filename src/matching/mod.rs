pub mod repository;
pub mod signature;

pub use repository::{IngestCounts, MatchFilter, MatchRepository};
pub use signature::{match_signature, signature};
