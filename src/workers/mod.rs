pub mod analysis_runner;

pub use analysis_runner::AnalysisRunner;
