use thiserror::Error;

/// Errors raised by the analyzer core
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Input file could not be read or lacks required columns
    #[error("Ingestion error in {file}: {reason}")]
    Ingestion { file: String, reason: String },

    /// A date or odds cell could not be parsed
    #[error("Cannot parse {field} from '{value}'")]
    FieldParse { field: &'static str, value: String },

    /// Row is missing data the match model requires
    #[error("Row {row} rejected: {reason}")]
    Validation { row: usize, reason: String },

    /// Import payload is not an archive export
    #[error("Archive format error: {0}")]
    ArchiveFormat(String),

    /// An analysis run is already active
    #[error("Analysis already in progress")]
    AnalysisInProgress,

    /// Internal consistency was broken
    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
