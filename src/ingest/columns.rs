use super::sheet::Cell;
use crate::error::{AnalyzerError, Result};

pub const DATE_TERMS: &[&str] = &["data", "date", "datum", "day"];
pub const HOME_TERMS: &[&str] = &["home", "gospodarze", "team1", "drużyna1", "home team"];
pub const AWAY_TERMS: &[&str] = &["away", "goście", "goscie", "team2", "drużyna2", "away team"];
pub const LEAGUE_TERMS: &[&str] = &["league", "liga", "competition", "rozgrywki"];
pub const ODDS_HOME_TERMS: &[&str] = &["1", "odds1", "kurs1", "home odds"];
pub const ODDS_DRAW_TERMS: &[&str] = &["x", "oddsx", "kursx", "draw odds"];
pub const ODDS_AWAY_TERMS: &[&str] = &["2", "odds2", "kurs2", "away odds"];

/// Resolved column positions for one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub home: usize,
    pub away: usize,
    pub league: Option<usize>,
    pub odds1: Option<usize>,
    pub odds_x: Option<usize>,
    pub odds2: Option<usize>,
}

/// Normalize header cells for matching
pub fn normalize_headers(header_row: &[Cell]) -> Vec<String> {
    header_row
        .iter()
        .map(|cell| {
            if cell.is_blank() {
                String::new()
            } else {
                cell.to_text().to_lowercase().trim().to_string()
            }
        })
        .collect()
}

/// First header containing a term, trying terms in order
pub fn find_column(headers: &[String], terms: &[&str]) -> Option<usize> {
    terms.iter().find_map(|term| {
        let term = term.to_lowercase();
        headers
            .iter()
            .position(|h| !h.is_empty() && h.contains(&term))
    })
}

impl ColumnMap {
    /// Resolve columns; home and away are required
    pub fn resolve(file: &str, headers: &[String]) -> Result<Self> {
        let home = find_column(headers, HOME_TERMS);
        let away = find_column(headers, AWAY_TERMS);

        let (home, away) = match (home, away) {
            (Some(home), Some(away)) => (home, away),
            _ => {
                return Err(AnalyzerError::Ingestion {
                    file: file.to_string(),
                    reason: format!("no home/away team columns in headers {:?}", headers),
                })
            }
        };

        Ok(Self {
            date: find_column(headers, DATE_TERMS),
            home,
            away,
            league: find_column(headers, LEAGUE_TERMS),
            odds1: find_column(headers, ODDS_HOME_TERMS),
            odds_x: find_column(headers, ODDS_DRAW_TERMS),
            odds2: find_column(headers, ODDS_AWAY_TERMS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        let cells: Vec<Cell> = names.iter().map(|n| Cell::from(*n)).collect();
        normalize_headers(&cells)
    }

    #[test]
    fn test_resolve_english_headers() {
        let h = headers(&["Date", "Home", "Away", "League", "1", "X", "2"]);
        let map = ColumnMap::resolve("f.csv", &h).unwrap();

        assert_eq!(map.date, Some(0));
        assert_eq!(map.home, 1);
        assert_eq!(map.away, 2);
        assert_eq!(map.league, Some(3));
        assert_eq!(map.odds1, Some(4));
        assert_eq!(map.odds_x, Some(5));
        assert_eq!(map.odds2, Some(6));
    }

    #[test]
    fn test_resolve_polish_headers() {
        let h = headers(&[" Data ", "Gospodarze", "Goście", "Rozgrywki", "Kurs1", "KursX", "Kurs2"]);
        let map = ColumnMap::resolve("f.csv", &h).unwrap();

        assert_eq!(map.date, Some(0));
        assert_eq!(map.home, 1);
        assert_eq!(map.away, 2);
        assert_eq!(map.league, Some(3));
        assert_eq!(map.odds1, Some(4));
        assert_eq!(map.odds_x, Some(5));
        assert_eq!(map.odds2, Some(6));
    }

    #[test]
    fn test_first_term_wins_over_later_terms() {
        // "1" is tried before "odds1" and already hits "team1"
        let h = headers(&["team1", "team2", "odds1"]);
        assert_eq!(find_column(&h, ODDS_HOME_TERMS), Some(0));
    }

    #[test]
    fn test_missing_team_columns() {
        let h = headers(&["date", "league"]);
        assert!(matches!(
            ColumnMap::resolve("f.csv", &h),
            Err(AnalyzerError::Ingestion { .. })
        ));
    }
}
