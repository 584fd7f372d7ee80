use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::LearningModel;
use crate::error::{AnalyzerError, Result};
use crate::models::{ArchiveEntry, ProcessedFile};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub version: String,
    /// Archived entries in the export
    pub total_predictions: usize,
    /// Overall archive accuracy in percent
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_matches: usize,
    pub total_predictions: usize,
    pub verified_predictions: usize,
    pub correct_predictions: usize,
    pub accuracy: f64,
    pub learning_progress: f64,
}

/// Exchanged archive file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveExport {
    pub metadata: ExportMetadata,
    pub archive: Vec<ArchiveEntry>,
    pub learning_model: LearningModel,
    pub processed_files: Vec<ProcessedFile>,
    pub statistics: Statistics,
}

impl ArchiveExport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The parts of an export that an import merges
#[derive(Debug, Clone)]
pub struct ArchiveImport {
    pub archive: Vec<ArchiveEntry>,
    pub learning_model: Option<LearningModel>,
}

/// Validate an import payload completely before anything is merged
pub fn parse_import(payload: &str) -> Result<ArchiveImport> {
    let mut value: Value = serde_json::from_str(payload)?;

    let archive = match value.get_mut("archive").map(Value::take) {
        Some(archive @ Value::Array(_)) => archive,
        _ => {
            return Err(AnalyzerError::ArchiveFormat(
                "payload has no archive list".to_string(),
            ))
        }
    };

    let archive: Vec<ArchiveEntry> = serde_json::from_value(archive)
        .map_err(|e| AnalyzerError::ArchiveFormat(format!("invalid archive entry: {}", e)))?;

    let learning_model = match value.get_mut("learningModel").map(Value::take) {
        None | Some(Value::Null) => None,
        Some(model) => Some(serde_json::from_value(model).map_err(|e| {
            AnalyzerError::ArchiveFormat(format!("invalid learning model: {}", e))
        })?),
    };

    Ok(ArchiveImport {
        archive,
        learning_model,
    })
}
