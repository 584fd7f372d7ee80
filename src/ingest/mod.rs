pub mod columns;
pub mod fields;
pub mod sheet;

use tracing::{debug, info};

use crate::error::{AnalyzerError, Result};
use crate::models::Match;

pub use columns::ColumnMap;
pub use sheet::{read_csv, read_sheet, read_workbook, Cell, Row, Sheet};

const UNKNOWN_LEAGUE: &str = "Unknown League";

/// Matches pulled out of one sheet
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub matches: Vec<Match>,
    /// Rows dropped for missing team names
    pub dropped_rows: usize,
}

/// Turn sheet rows into matches; bad fields become absent, rows without teams are dropped
pub fn extract_matches(file_name: &str, rows: &[Row]) -> Result<Extraction> {
    let mut extraction = Extraction::default();

    if rows.len() < 2 {
        return Ok(extraction);
    }

    let headers = columns::normalize_headers(&rows[0]);
    debug!("Headers in {}: {:?}", file_name, headers);

    let columns = ColumnMap::resolve(file_name, &headers)?;
    debug!("Column mapping for {}: {:?}", file_name, columns);

    for (index, row) in rows[1..].iter().enumerate() {
        if row.is_empty() {
            continue;
        }

        match extract_row(file_name, index, row, &columns) {
            Ok(m) => extraction.matches.push(m),
            Err(e) => {
                debug!("{}: {}", file_name, e);
                extraction.dropped_rows += 1;
            }
        }
    }

    info!(
        "Extracted {} matches from {} ({} rows dropped)",
        extraction.matches.len(),
        file_name,
        extraction.dropped_rows
    );

    Ok(extraction)
}

fn extract_row(file_name: &str, index: usize, row: &Row, columns: &ColumnMap) -> Result<Match> {
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or(&Cell::Empty);
    let row_number = index + 2;

    let home = fields::clean_team_name(cell(Some(columns.home)));
    let away = fields::clean_team_name(cell(Some(columns.away)));

    let (home, away) = match (home, away) {
        (Some(home), Some(away)) => (home, away),
        _ => {
            return Err(AnalyzerError::Validation {
                row: row_number,
                reason: "missing home or away team".to_string(),
            })
        }
    };

    Ok(Match {
        id: format!("{}_{}", file_name, index + 1),
        date: optional_field(fields::parse_date(cell(columns.date)), row_number),
        home,
        away,
        league: fields::clean_string(cell(columns.league))
            .unwrap_or_else(|| UNKNOWN_LEAGUE.to_string()),
        odds1: optional_field(fields::parse_odds(cell(columns.odds1)), row_number),
        odds_x: optional_field(fields::parse_odds(cell(columns.odds_x)), row_number),
        odds2: optional_field(fields::parse_odds(cell(columns.odds2)), row_number),
        file_name: file_name.to_string(),
        row_index: row_number,
    })
}

fn optional_field<T>(parsed: Result<Option<T>>, row_number: usize) -> Option<T> {
    parsed.unwrap_or_else(|e| {
        debug!("Row {}: {}", row_number, e);
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    #[test]
    fn test_extract_matches() {
        let rows = vec![
            row(&["Date", "Home", "Away", "League", "1", "X", "2"]),
            row(&["2024-03-10", "Real  Madrid", "Barcelona", "La Liga", "1,8", "3.5", "4.2"]),
            row(&["garbage", "Ajax", "PSV", "", "n/a", "3.4", "3.3"]),
            row(&["2024-03-10", "", "Chelsea", "Premier League", "2", "3", "4"]),
            vec![],
            row(&["2024-03-11", "Lech Poznan", "Legia Warszawa"]),
        ];

        let extraction = extract_matches("week.csv", &rows).unwrap();
        assert_eq!(extraction.matches.len(), 3);
        assert_eq!(extraction.dropped_rows, 1);

        let first = &extraction.matches[0];
        assert_eq!(first.id, "week.csv_1");
        assert_eq!(first.home, "Real Madrid");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(first.full_odds(), Some([1.8, 3.5, 4.2]));
        assert_eq!(first.row_index, 2);

        let second = &extraction.matches[1];
        assert_eq!(second.date, None);
        assert_eq!(second.league, "Unknown League");
        assert_eq!(second.odds1, None);
        assert_eq!(second.odds_x, Some(3.4));

        // Short row: missing cells are absent
        let last = &extraction.matches[2];
        assert_eq!(last.id, "week.csv_5");
        assert_eq!(last.row_index, 6);
        assert_eq!(last.odds2, None);
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let rows = vec![row(&["Date", "Home", "Away"])];
        let extraction = extract_matches("empty.csv", &rows).unwrap();
        assert!(extraction.matches.is_empty());
    }

    #[test]
    fn test_missing_columns_is_a_file_error() {
        let rows = vec![row(&["Date", "Teams"]), row(&["2024-03-10", "Ajax - PSV"])];
        assert!(matches!(
            extract_matches("bad.csv", &rows),
            Err(AnalyzerError::Ingestion { .. })
        ));
    }
}
