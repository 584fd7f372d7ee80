use super::hashing::{hash_offset, name_hash};
use super::learning::LearningModel;
use crate::models::{
    Factors, HeadToHead, Match, MotivationTag, OddsAnalysis, OddsRecommendation,
};

const BASE_FORM: f64 = 5.0;
const BIG_CLUBS: &[&str] = &["real", "barcelona", "manchester", "bayern", "juventus", "liverpool"];
const STRONG_MARKERS: &[&str] = &["united", "city", "fc"];
const CLUB_MARKERS: &[&str] = &["athletic", "sporting"];
const LONG_NAME: usize = 15;
const SHORT_NAME: usize = 8;

/// Home advantage by league substring, first hit wins
const HOME_ADVANTAGE: &[(&str, f64)] = &[
    ("premier league", 1.3),
    ("laliga", 1.35),
    ("la liga", 1.35),
    ("bundesliga", 1.25),
    ("serie a", 1.32),
    ("ligue 1", 1.28),
    ("champions league", 1.20),
    ("europa league", 1.15),
];
const DEFAULT_HOME_ADVANTAGE: f64 = 1.25;

const LEAGUE_IMPORTANCE: &[(&str, f64)] = &[
    ("premier league", 1.0),
    ("laliga", 1.0),
    ("la liga", 1.0),
    ("bundesliga", 0.95),
    ("serie a", 0.95),
    ("ligue 1", 0.85),
    ("champions league", 1.2),
    ("europa league", 0.9),
];
const DEFAULT_LEAGUE_IMPORTANCE: f64 = 0.7;

const TOP_LEAGUES: &[&str] = &["premier", "laliga", "bundesliga", "serie"];

/// Derive all scoring factors for a match
pub fn compute_factors(m: &Match, model: &LearningModel) -> Factors {
    let home_form = team_form(&m.home);
    let away_form = team_form(&m.away);

    Factors {
        home_form,
        away_form,
        form_difference: home_form - away_form,
        head_to_head: head_to_head(&m.home, &m.away),
        home_advantage: home_advantage(&m.league),
        odds_analysis: odds_value(m),
        motivation: motivation(m),
        league_importance: league_importance(&m.league),
        pattern_match: pattern_match(m, model),
    }
}

/// Name-derived form rating in [1, 10]
pub fn team_form(team: &str) -> f64 {
    let name = team.to_lowercase();
    let mut form = BASE_FORM;

    if contains_any(&name, BIG_CLUBS) {
        form += 2.0;
    }
    if contains_any(&name, STRONG_MARKERS) {
        form += 0.5;
    }
    if contains_any(&name, CLUB_MARKERS) {
        form += 0.3;
    }

    let length = name.encode_utf16().count();
    if length > LONG_NAME {
        form -= 0.5;
    }
    if length < SHORT_NAME {
        form += 0.3;
    }

    form += hash_offset(name_hash(&name));

    form.clamp(1.0, 10.0)
}

pub fn head_to_head(home: &str, away: &str) -> HeadToHead {
    let home_hash = name_hash(&home.to_lowercase()) as f64;
    let away_hash = name_hash(&away.to_lowercase()) as f64;

    // 0/0 is NaN and falls through to balanced
    let ratio = (home_hash - away_hash).abs() / home_hash.max(away_hash);
    let home_leads = home_hash > away_hash;

    if ratio > 0.5 {
        if home_leads {
            HeadToHead::StrongHome
        } else {
            HeadToHead::StrongAway
        }
    } else if ratio > 0.3 {
        if home_leads {
            HeadToHead::HomeSlight
        } else {
            HeadToHead::AwaySlight
        }
    } else {
        HeadToHead::Balanced
    }
}

pub fn home_advantage(league: &str) -> f64 {
    lookup(HOME_ADVANTAGE, league).unwrap_or(DEFAULT_HOME_ADVANTAGE)
}

pub fn league_importance(league: &str) -> f64 {
    lookup(LEAGUE_IMPORTANCE, league).unwrap_or(DEFAULT_LEAGUE_IMPORTANCE)
}

/// Bookmaker margin analysis; only meaningful with all three odds
pub fn odds_value(m: &Match) -> OddsAnalysis {
    let Some(odds) = m.full_odds() else {
        return OddsAnalysis::default();
    };

    let implied: f64 = odds.iter().map(|o| 1.0 / o).sum();
    let margin = round_to_cents((implied - 1.0) * 100.0);

    OddsAnalysis {
        has_value: true,
        recommendation: OddsRecommendation::from_implied_probability(implied),
        margin,
    }
}

/// Two-decimal rounding of the exact binary value, as a fixed-point display
/// would print it. Exact ties round toward the larger cent.
pub fn round_to_cents(value: f64) -> f64 {
    // Only multiples of 1/8 can sit exactly on a half cent
    if (value * 8.0).fract() == 0.0 {
        let scaled = value * 100.0;
        if (scaled - scaled.trunc()).abs() == 0.5 {
            return scaled.ceil() / 100.0;
        }
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}

pub fn motivation(m: &Match) -> Vec<MotivationTag> {
    let mut tags = Vec::new();
    let league = m.league.to_lowercase();

    if contains_any(&league, TOP_LEAGUES) {
        tags.push(MotivationTag::TopLeague);
    }

    let home = m.home.to_lowercase();
    let away = m.away.to_lowercase();
    let away_parts: Vec<&str> = away.split_whitespace().collect();
    if home.split_whitespace().any(|part| away_parts.contains(&part)) {
        tags.push(MotivationTag::Derby);
    }

    if league.contains("final") || league.contains("cup") {
        tags.push(MotivationTag::CupMatch);
    }

    tags
}

/// Best similarity between the match and any stored success pattern
pub fn pattern_match(m: &Match, model: &LearningModel) -> f64 {
    model
        .success_patterns
        .iter()
        .map(|pattern| {
            let mut similarity = 0.0;

            if similar(&pattern.league, &m.league) {
                similarity += 0.4;
            }
            if similar(&pattern.home, &m.home) {
                similarity += 0.3;
            }
            if let (Some(pattern_odds), Some(match_odds)) = (pattern.odds1, m.odds1) {
                if (pattern_odds - match_odds).abs() / pattern_odds < 0.2 {
                    similarity += 0.3;
                }
            }

            similarity
        })
        .fold(0.0, f64::max)
}

/// Case-insensitive containment in either direction
fn similar(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn lookup(table: &[(&str, f64)], league: &str) -> Option<f64> {
    let league = league.to_lowercase();
    table
        .iter()
        .find(|(key, _)| league.contains(key))
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::learning::SuccessPattern;
    use crate::models::BetType;
    use chrono::{NaiveDate, Utc};

    fn fixture(home: &str, away: &str, league: &str, odds: Option<[f64; 3]>) -> Match {
        Match {
            id: "t_1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10),
            home: home.to_string(),
            away: away.to_string(),
            league: league.to_string(),
            odds1: odds.map(|o| o[0]),
            odds_x: odds.map(|o| o[1]),
            odds2: odds.map(|o| o[2]),
            file_name: "t.csv".to_string(),
            row_index: 2,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_team_form() {
        // big club +2.0, short name bonus not applied (11 chars), offset +0.134
        assert!(approx(team_form("Real Madrid"), 7.134));
        assert!(approx(team_form("Barcelona"), 6.838));
        // short name +0.3
        assert!(approx(team_form("PSV"), 4.93));
        // long name -0.5
        assert!(approx(team_form("Legia Warszawa"), 4.852));
        assert_eq!(team_form("Real Madrid"), team_form("REAL MADRID"));
    }

    #[test]
    fn test_team_form_is_clamped() {
        for name in ["Real Manchester City FC United", "x", "Sporting Athletic Bayern FC"] {
            let form = team_form(name);
            assert!((1.0..=10.0).contains(&form));
        }
    }

    #[test]
    fn test_head_to_head() {
        assert_eq!(head_to_head("Real Madrid", "Barcelona"), HeadToHead::StrongAway);
        assert_eq!(head_to_head("Ajax", "PSV"), HeadToHead::StrongHome);
        assert_eq!(head_to_head("Arsenal", "Chelsea"), HeadToHead::Balanced);
        assert_eq!(head_to_head("Arsenal", "arsenal"), HeadToHead::Balanced);
    }

    #[test]
    fn test_league_tables() {
        assert_eq!(home_advantage("English Premier League"), 1.3);
        assert_eq!(home_advantage("LaLiga EA Sports"), 1.35);
        assert_eq!(home_advantage("Ekstraklasa"), 1.25);
        assert_eq!(league_importance("UEFA Champions League"), 1.2);
        assert_eq!(league_importance("Ligue 1"), 0.85);
        assert_eq!(league_importance("Eredivisie"), 0.7);
    }

    #[test]
    fn test_odds_value() {
        let normal = odds_value(&fixture("Real Madrid", "Barcelona", "La Liga", Some([1.8, 3.5, 4.2])));
        assert!(normal.has_value);
        assert_eq!(normal.recommendation, OddsRecommendation::Normal);
        assert_eq!(normal.margin, 7.94);

        // Sub-1 book: negative margin is a valid quote
        let sub_one = odds_value(&fixture("Arsenal", "Chelsea", "Premier League", Some([2.5, 3.8, 4.0])));
        assert_eq!(sub_one.recommendation, OddsRecommendation::ExcellentValue);
        assert_eq!(sub_one.margin, -8.68);

        let poor = odds_value(&fixture("A", "B", "C", Some([1.5, 3.0, 4.0])));
        assert_eq!(poor.recommendation, OddsRecommendation::PoorValue);

        let mut partial = fixture("A", "B", "C", Some([1.5, 3.0, 4.0]));
        partial.odds_x = None;
        assert_eq!(odds_value(&partial), OddsAnalysis::default());
    }

    #[test]
    fn test_round_to_cents() {
        // 0.015 is stored just below the half cent
        assert_eq!(round_to_cents(0.015), 0.01);
        assert_eq!(round_to_cents(-0.045), -0.04);
        assert_eq!(round_to_cents(5.8), 5.8);
        // Exact ties
        assert_eq!(round_to_cents(0.125), 0.13);
        assert_eq!(round_to_cents(-8.625), -8.62);
        assert_eq!(round_to_cents(0.0), 0.0);
    }

    #[test]
    fn test_motivation() {
        let derby = fixture("Manchester United", "Manchester City", "Premier League", None);
        assert_eq!(
            motivation(&derby),
            vec![MotivationTag::TopLeague, MotivationTag::Derby]
        );

        let cup = fixture("Ajax", "PSV", "KNVB Cup Final", None);
        assert_eq!(motivation(&cup), vec![MotivationTag::CupMatch]);
    }

    #[test]
    fn test_pattern_match() {
        let m = fixture("Arsenal", "Chelsea", "Premier League", Some([2.0, 3.4, 3.8]));
        let mut model = LearningModel::new();
        assert_eq!(pattern_match(&m, &model), 0.0);

        let factors = compute_factors(&m, &model);
        let pattern = |league: &str, home: &str, odds1: Option<f64>| SuccessPattern {
            match_label: format!("{} vs X", home),
            bet_type: BetType::Home,
            confidence: 70,
            factors: factors.clone(),
            league: league.to_string(),
            home: home.to_string(),
            odds1,
            verified_at: Utc::now(),
        };

        model.record_success(pattern("premier", "Everton", Some(5.0)));
        assert!(approx(pattern_match(&m, &model), 0.4));

        model.record_success(pattern("Premier League", "Arsenal FC", Some(2.3)));
        assert!(approx(pattern_match(&m, &model), 1.0));

        // Odds exactly 20% apart do not count
        let mut far = LearningModel::new();
        far.record_success(pattern("Serie A", "Inter", Some(2.5)));
        assert_eq!(pattern_match(&m, &far), 0.0);
    }
}
