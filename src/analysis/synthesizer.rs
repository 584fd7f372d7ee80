use chrono::Utc;

use super::factors::compute_factors;
use super::learning::LearningModel;
use crate::models::{
    BetType, Factors, HeadToHead, Match, MotivationTag, OddsRecommendation, Prediction,
};

pub const MIN_CONFIDENCE: f64 = 50.0;
pub const MAX_CONFIDENCE: f64 = 95.0;

/// Derby confidence never exceeds this before the multiplicative steps
const DERBY_CAP: f64 = 75.0;
const PATTERN_MATCH_THRESHOLD: f64 = 0.7;

/// Compute factors and synthesize a prediction for one match
pub fn analyze_match(m: &Match, model: &LearningModel) -> Prediction {
    let factors = compute_factors(m, model);
    synthesize(factors, m, model)
}

/// Combine factors into a bet type, a confidence in [50, 95] and reasoning
pub fn synthesize(factors: Factors, m: &Match, model: &LearningModel) -> Prediction {
    let mut bet_type = BetType::Home;
    let mut value = 0.0;
    let mut reasoning = Vec::new();

    let mut score = 50.0 + factors.form_difference * 8.0;
    score += (factors.home_advantage - 1.0) * 25.0;

    match factors.head_to_head {
        HeadToHead::StrongHome => {
            score += 15.0;
            reasoning.push("Strong home edge in head-to-head".to_string());
        }
        HeadToHead::HomeSlight => {
            score += 8.0;
            reasoning.push("Slight home edge in head-to-head".to_string());
        }
        HeadToHead::StrongAway => {
            score -= 15.0;
            bet_type = BetType::Away;
            reasoning.push("Strong away edge in head-to-head".to_string());
        }
        HeadToHead::AwaySlight => {
            score -= 8.0;
            bet_type = BetType::Away;
            reasoning.push("Slight away edge in head-to-head".to_string());
        }
        HeadToHead::Balanced => {
            reasoning.push("Balanced head-to-head".to_string());
        }
    }

    if factors.has_motivation(MotivationTag::Derby) {
        bet_type = BetType::Draw;
        score = score.min(DERBY_CAP);
        reasoning.push("Derby: elevated draw risk".to_string());
    }

    if factors.has_motivation(MotivationTag::TopLeague) {
        score += 5.0;
        reasoning.push("Top league: high quality of play".to_string());
    }

    let odds = &factors.odds_analysis;
    if odds.has_value {
        match odds.recommendation {
            OddsRecommendation::ExcellentValue => {
                value = 20.0;
                score += 15.0;
                reasoning.push(format!("Excellent value bet (margin: {:.2}%)", odds.margin));
            }
            OddsRecommendation::GoodValue => {
                value = 10.0;
                score += 8.0;
                reasoning.push(format!("Good value bet (margin: {:.2}%)", odds.margin));
            }
            OddsRecommendation::PoorValue => {
                score -= 10.0;
                reasoning.push(format!("High bookmaker margin ({:.2}%)", odds.margin));
            }
            OddsRecommendation::Normal => {}
        }
    }

    if factors.pattern_match > PATTERN_MATCH_THRESHOLD {
        score += 12.0;
        reasoning.push(format!(
            "Close match to past success patterns ({:.0}%)",
            factors.pattern_match * 100.0
        ));
    }

    score *= factors.league_importance;
    score *= model_multiplier(&factors, model);

    reasoning.push(format!(
        "Form: {} ({:.1}) vs {} ({:.1})",
        m.home, factors.home_form, m.away, factors.away_form
    ));

    Prediction {
        match_id: m.id.clone(),
        match_label: m.label(),
        home: m.home.clone(),
        away: m.away.clone(),
        league: m.league.clone(),
        date: m.date,
        file_name: m.file_name.clone(),
        bet_type,
        confidence: final_confidence(score),
        value,
        reasoning,
        odds: m.odds_for(bet_type),
        factors,
        analyzed_at: Utc::now(),
    }
}

/// Learned scaling applied to the raw score
pub fn model_multiplier(factors: &Factors, model: &LearningModel) -> f64 {
    1.0 + (factors.home_form / 10.0) * model.weights.team_form
        + (factors.home_advantage - 1.0) * model.weights.home_advantage
}

/// Round half up, then clamp to the confidence band
fn final_confidence(score: f64) -> u32 {
    if score.is_nan() {
        return MIN_CONFIDENCE as u32;
    }
    (score + 0.5).floor().clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) as u32
}
