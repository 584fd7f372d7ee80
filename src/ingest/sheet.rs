use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{AnalyzerError, Result};

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Empty text, zero and NaN count as no value
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(n) => *n == 0.0 || n.is_nan(),
            Cell::Text(s) => s.is_empty(),
        }
    }

    /// Cell rendered as text; whole numbers print without a fraction
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Workbook values; dates stay spreadsheet serials
impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Float(n) => Cell::Number(*n),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

pub type Row = Vec<Cell>;

/// A loaded sheet: first row is the header
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    /// Source size in bytes
    pub size: u64,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetFormat {
    Csv,
    Workbook,
}

fn sheet_format(path: &Path) -> Option<SheetFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(SheetFormat::Csv),
        "xlsx" | "xls" => Some(SheetFormat::Workbook),
        _ => None,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read a match sheet, choosing the reader from the file extension
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    match sheet_format(path) {
        Some(SheetFormat::Csv) => read_csv(path),
        Some(SheetFormat::Workbook) => read_workbook(path),
        None => Err(AnalyzerError::Ingestion {
            file: display_name(path),
            reason: "unsupported file type (expected .xlsx, .xls or .csv)".to_string(),
        }),
    }
}

/// Read the first worksheet of an .xlsx or .xls workbook
pub fn read_workbook(path: &Path) -> Result<Sheet> {
    let name = display_name(path);
    let failed = |reason: String| AnalyzerError::Ingestion {
        file: name.clone(),
        reason,
    };

    if sheet_format(path) != Some(SheetFormat::Workbook) {
        return Err(failed("unsupported file type (expected .xlsx or .xls)".to_string()));
    }

    let size = std::fs::metadata(path)
        .map_err(|e| failed(e.to_string()))?
        .len();

    let mut workbook = open_workbook_auto(path).map_err(|e| failed(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| failed("workbook has no sheets".to_string()))?
        .map_err(|e| failed(e.to_string()))?;

    let rows: Vec<Row> = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    debug!("Read {} rows from {}", rows.len(), name);

    Ok(Sheet { name, size, rows })
}

/// Read a CSV file; every non-empty cell is kept as text
pub fn read_csv(path: &Path) -> Result<Sheet> {
    let name = display_name(path);

    if sheet_format(path) != Some(SheetFormat::Csv) {
        return Err(AnalyzerError::Ingestion {
            file: name,
            reason: "unsupported file type (expected .csv)".to_string(),
        });
    }

    let mut content = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut content))
        .map_err(|e| AnalyzerError::Ingestion {
            file: name.clone(),
            reason: e.to_string(),
        })?;

    let rows = parse_csv(&name, &content)?;
    debug!("Read {} rows from {}", rows.len(), name);

    Ok(Sheet {
        name,
        size: content.len() as u64,
        rows,
    })
}

/// Parse CSV bytes into rows of cells
pub fn parse_csv(name: &str, content: &[u8]) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| AnalyzerError::Ingestion {
            file: name.to_string(),
            reason: e.to_string(),
        })?;

        rows.push(record.iter().map(Cell::from).collect());
    }

    Ok(rows)
}
