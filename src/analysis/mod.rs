pub mod cache;
pub mod factors;
pub mod hashing;
pub mod learning;
pub mod synthesizer;

pub use cache::AnalysisCache;
pub use factors::compute_factors;
pub use learning::{
    AccuracyPoint, FactorWeights, FailurePattern, LearningModel, SuccessPattern,
};
pub use synthesizer::{analyze_match, synthesize};
