pub mod archive;
pub mod match_record;
pub mod prediction;

pub use archive::{ArchiveEntry, ArchiveStatus};
pub use match_record::{Match, ProcessedFile};
pub use prediction::{
    sort_by_confidence, BetType, Factors, HeadToHead, MotivationTag, OddsAnalysis,
    OddsRecommendation, Prediction,
};
