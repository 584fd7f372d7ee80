use std::path::PathBuf;

use chrono::NaiveDate;
use serde_json::Value;

use betting_analyzer::archive::{SimulatedOutcomes, VerificationSummary};
use betting_analyzer::models::{ArchiveEntry, ArchiveStatus, BetType};
use betting_analyzer::{AnalyzerError, AnalyzerService};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

/// Session with four archived predictions, the first two settled correct
fn verified_session() -> AnalyzerService {
    let mut service = AnalyzerService::new();
    service.ingest_paths(&[fixture("round_a.csv")]);
    service
        .start_analysis(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), 50)
        .unwrap();

    let mut seen = 0;
    let mut source = |entry: &ArchiveEntry| -> Option<BetType> {
        seen += 1;
        match seen {
            1 | 2 => Some(entry.prediction.bet_type),
            3 => Some(if entry.prediction.bet_type == BetType::Away {
                BetType::Home
            } else {
                BetType::Away
            }),
            _ => None,
        }
    };
    let summary = service.verify_pending(&mut source);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.unsettled, 1);
    service
}

#[test]
fn export_payload_layout() {
    let service = verified_session();
    let json = service.export().to_json().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["metadata"]["version"], "1.0");
    assert_eq!(value["metadata"]["totalPredictions"], 4);
    assert_eq!(value["metadata"]["accuracy"], 66.7);

    let first = &value["archive"][0];
    assert_eq!(first["match"], "Arsenal vs Chelsea");
    assert_eq!(first["betType"], "1");
    assert_eq!(first["status"], "correct");
    assert_eq!(first["verified"], true);
    assert_eq!(first["actualResult"], "1");
    assert_eq!(first["factors"]["headToHead"], "balanced");
    assert_eq!(first["factors"]["oddsAnalysis"]["recommendation"], "excellent_value");

    assert_eq!(value["archive"][3]["status"], "pending");
    assert!(value["archive"][3]["actualResult"].is_null());

    assert_eq!(value["statistics"]["totalMatches"], 5);
    assert_eq!(value["statistics"]["verifiedPredictions"], 3);
    assert_eq!(value["statistics"]["correctPredictions"], 2);
    assert_eq!(value["learningModel"]["totalPredictions"], 3);
    assert_eq!(value["learningModel"]["weights"]["teamForm"], 0.25);
    assert_eq!(value["processedFiles"][0]["name"], "round_a.csv");
}

#[test]
fn export_import_round_trip() {
    let source = verified_session();
    let json = source.export().to_json().unwrap();

    let mut target = AnalyzerService::new();
    assert_eq!(target.import_json(&json).unwrap(), (4, 4));
    assert_eq!(target.archive().entries(), source.archive().entries());
    assert_eq!(target.learning().success_patterns.len(), 2);
    assert_eq!(target.learning().failure_patterns.len(), 1);
    assert_eq!(target.learning().total_predictions, 3);
    assert_eq!(target.learning().learning_progress, 3.0);

    // Entries are deduplicated by id; counters and patterns are additive
    assert_eq!(target.import_json(&json).unwrap(), (0, 4));
    assert_eq!(target.archive().len(), 4);
    assert_eq!(target.learning().total_predictions, 6);
    assert_eq!(target.learning().success_patterns.len(), 4);
}

#[test]
fn import_never_replaces_weights() {
    let source = verified_session();
    let mut export = source.export();
    export.learning_model.weights.team_form = 0.9;
    let json = export.to_json().unwrap();

    let mut target = AnalyzerService::new();
    target.import_json(&json).unwrap();
    assert_eq!(target.learning().weights.team_form, 0.25);
}

#[test]
fn import_accepts_verified_status() {
    let source = verified_session();
    let mut value: Value = serde_json::from_str(&source.export().to_json().unwrap()).unwrap();
    value["archive"][3]["status"] = Value::from("verified");
    value["archive"][3]["verified"] = Value::from(true);

    let mut target = AnalyzerService::new();
    target.import_json(&value.to_string()).unwrap();

    let entry = &target.archive().entries()[3];
    assert_eq!(entry.status, ArchiveStatus::Verified);
    assert_eq!(target.archive().pending_count(), 0);

    let summary = target.verify_pending(&mut SimulatedOutcomes::seeded(1, 0.6));
    assert_eq!(summary, VerificationSummary::default());
}

#[test]
fn malformed_import_changes_nothing() {
    let mut target = verified_session();
    let before = target.archive().entries().to_vec();

    for payload in [
        r#"{"archive": "none"}"#,
        r#"{"metadata": {"version": "1.0"}}"#,
        r#"{"archive": [{"id": "only-an-id"}], "learningModel": {"totalPredictions": 5}}"#,
    ] {
        assert!(matches!(
            target.import_json(payload),
            Err(AnalyzerError::ArchiveFormat(_))
        ));
    }

    assert_eq!(target.archive().entries(), before.as_slice());
    assert_eq!(target.learning().total_predictions, 3);
}

#[test]
fn second_verification_pass_is_a_noop() {
    let mut service = AnalyzerService::new();
    service.ingest_paths(&[fixture("round_a.csv"), fixture("round_b.csv")]);
    service
        .start_analysis(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), 50)
        .unwrap();

    let first = service.verify_pending(&mut SimulatedOutcomes::seeded(99, 0.6));
    assert_eq!(first.processed, 4);
    assert_eq!(first.correct + first.incorrect, 4);

    let entries = service.archive().entries().to_vec();
    let model = service.learning().clone();

    let second = service.verify_pending(&mut SimulatedOutcomes::seeded(7, 0.6));
    assert_eq!(second, VerificationSummary::default());
    assert_eq!(service.archive().entries(), entries.as_slice());
    assert_eq!(service.learning(), &model);
    assert_eq!(service.learning().total_predictions, 4);
}

#[test]
fn import_accepts_margins_written_as_text() {
    let source = verified_session();
    let mut value: Value = serde_json::from_str(&source.export().to_json().unwrap()).unwrap();

    // Older archives carry the margin as fixed-point text, or 0 without odds
    for entry in value["archive"].as_array_mut().unwrap() {
        let analysis = &mut entry["factors"]["oddsAnalysis"];
        if analysis["hasValue"] == true {
            let margin = analysis["margin"].as_f64().unwrap();
            analysis["margin"] = Value::from(format!("{:.2}", margin));
        } else {
            analysis["margin"] = Value::from(0);
        }
    }
    for pattern in value["learningModel"]["successPatterns"].as_array_mut().unwrap() {
        let analysis = &mut pattern["factors"]["oddsAnalysis"];
        let margin = analysis["margin"].as_f64().unwrap();
        analysis["margin"] = Value::from(format!("{:.2}", margin));
    }
    assert_eq!(value["archive"][0]["factors"]["oddsAnalysis"]["margin"], "-8.68");

    let mut target = AnalyzerService::new();
    assert_eq!(target.import_json(&value.to_string()).unwrap(), (4, 4));
    assert_eq!(target.archive().entries(), source.archive().entries());
    assert_eq!(
        target.archive().entries()[0].prediction.factors.odds_analysis.margin,
        -8.68
    );

    // Written back out as numbers
    let exported: Value = serde_json::from_str(&target.export().to_json().unwrap()).unwrap();
    assert_eq!(exported["archive"][0]["factors"]["oddsAnalysis"]["margin"], -8.68);
}

#[test]
fn import_with_a_repeated_id_changes_nothing() {
    let mut target = verified_session();
    let before = target.archive().entries().to_vec();

    let mut value: Value = serde_json::from_str(&verified_session().export().to_json().unwrap()).unwrap();
    let copy = value["archive"][1].clone();
    value["archive"].as_array_mut().unwrap().push(copy);

    assert!(matches!(
        target.import_json(&value.to_string()),
        Err(AnalyzerError::Invariant(_))
    ));
    assert_eq!(target.archive().entries(), before.as_slice());
    assert_eq!(target.learning().total_predictions, 3);
}
