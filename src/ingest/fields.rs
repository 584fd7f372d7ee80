use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::sheet::Cell;
use crate::error::{AnalyzerError, Result};

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01
const SPREADSHEET_UNIX_OFFSET_DAYS: f64 = 25569.0;
const SECONDS_PER_DAY: f64 = 86400.0;

// Slash and dash dates are read day first (European sheets); 03/04/2024 is 3 April
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Trimmed team name with runs of whitespace collapsed
pub fn clean_team_name(cell: &Cell) -> Option<String> {
    if cell.is_blank() {
        return None;
    }

    let cleaned = cell.to_text().split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

pub fn clean_string(cell: &Cell) -> Option<String> {
    if cell.is_blank() {
        return None;
    }

    let cleaned = cell.to_text().trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Parse a date cell: numbers are spreadsheet serials, text is ISO or day-first
pub fn parse_date(cell: &Cell) -> Result<Option<NaiveDate>> {
    match cell {
        _ if cell.is_blank() => Ok(None),
        Cell::Number(serial) => {
            let seconds = ((serial - SPREADSHEET_UNIX_OFFSET_DAYS) * SECONDS_PER_DAY).floor();
            if !seconds.is_finite() {
                return Err(field_error("date", cell));
            }

            DateTime::from_timestamp(seconds as i64, 0)
                .map(|dt| Some(dt.date_naive()))
                .ok_or_else(|| field_error("date", cell))
        }
        Cell::Text(text) => parse_date_text(text.trim())
            .map(Some)
            .ok_or_else(|| field_error("date", cell)),
        Cell::Empty => Ok(None),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc().date());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse decimal odds; accepts a comma separator and trailing junk, must be positive
pub fn parse_odds(cell: &Cell) -> Result<Option<f64>> {
    if cell.is_blank() {
        return Ok(None);
    }

    let value = match cell {
        Cell::Number(n) => Some(*n),
        _ => leading_number(&cell.to_text().replacen(',', ".", 1)),
    };

    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
        _ => Err(field_error("odds", cell)),
    }
}

/// Longest numeric prefix of `text`, after leading whitespace
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }

    if !has_digits {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

fn field_error(field: &'static str, cell: &Cell) -> AnalyzerError {
    AnalyzerError::FieldParse {
        field,
        value: cell.to_text(),
    }
}
