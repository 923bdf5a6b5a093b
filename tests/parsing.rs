use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};
use statimatch::fixtures::{normalize_booking_matches, normalize_fixtures, retain_on_date};
use statimatch::response_parse::{
    ParseError, dedup_sources, extract_json_payload, matches_array, parse_deep_analysis,
    sanitize_text,
};
use statimatch::state::{Confidence, Sport, VisualKind};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn fenced_block_wins_over_surrounding_prose() {
    let raw = read_fixture("basketball_fixtures_reply.txt");
    let root = extract_json_payload(&raw).expect("fixture should parse");
    let matches = matches_array(&root).expect("matches array");
    assert_eq!(matches.len(), 3);
}

#[test]
fn bare_object_in_prose_is_found() {
    let raw = read_fixture("booking_reply.txt");
    let root = extract_json_payload(&raw).expect("fixture should parse");
    assert_eq!(matches_array(&root).expect("matches array").len(), 3);
}

#[test]
fn text_without_json_is_an_error() {
    let err = extract_json_payload("No fixtures scheduled, sorry.").unwrap_err();
    assert!(matches!(err, ParseError::NoJson));
}

#[test]
fn missing_matches_array_is_a_shape_error() {
    let root = json!({ "matches": { "home": "A" } });
    assert!(matches!(
        matches_array(&root),
        Err(ParseError::MissingShape(_))
    ));
}

#[test]
fn sanitizer_resolves_nested_and_numeric_fields() {
    let record = json!({
        "home": { "name": "Arsenal" },
        "away": "Chelsea",
        "league": true,
        "round": 42,
        "date": "2024-10-27",
        "time": "16:30"
    });
    assert_eq!(sanitize_text(record.get("home"), "x"), "Arsenal");
    assert_eq!(sanitize_text(record.get("round"), "x"), "42");
    assert_eq!(sanitize_text(record.get("league"), "Unknown League"), "Unknown League");
    assert_eq!(sanitize_text(None, "00:00"), "00:00");

    let normalized = normalize_fixtures(&[record], Sport::Football, "2024-10-27");
    assert_eq!(normalized[0].home, "Arsenal");
    assert_eq!(normalized[0].away, "Chelsea");
    assert_eq!(normalized[0].league, "Unknown League");
    let kept = retain_on_date(normalized, "2024-10-27");
    assert_eq!(kept.len(), 1);
}

#[test]
fn fixtures_take_sport_from_the_request() {
    let raw = read_fixture("basketball_fixtures_reply.txt");
    let root = extract_json_payload(&raw).expect("fixture should parse");
    let matches = normalize_fixtures(matches_array(&root).unwrap(), Sport::Basketball, "2024-10-27");

    assert!(matches.iter().all(|m| m.sport == Sport::Basketball));
    assert_eq!(matches[1].away, "Lakers");
    assert_eq!(matches[0].home_logo.as_deref(), Some("https://cdn.example.com/bos.png"));
    assert!(matches[0].away_logo.is_none());
    assert!(matches[1].home_logo.is_none());

    let mut ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn adjacent_day_and_undated_fixtures() {
    let raw = read_fixture("football_fixtures_adjacent_day.txt");
    let root = extract_json_payload(&raw).expect("fixture should parse");
    let matches = normalize_fixtures(matches_array(&root).unwrap(), Sport::Football, "2024-10-27");
    assert_eq!(matches[2].date, "2024-10-27");

    let kept = retain_on_date(matches, "2024-10-27");
    let homes: Vec<&str> = kept.iter().map(|m| m.home.as_str()).collect();
    assert_eq!(homes, vec!["Arsenal", "Girona"]);
}

#[test]
fn booking_records_keep_their_own_sport() {
    let raw = read_fixture("booking_reply.txt");
    let root = extract_json_payload(&raw).expect("fixture should parse");
    let matches = normalize_booking_matches(matches_array(&root).unwrap(), "BC8H2", "2024-10-27");

    assert_eq!(matches[0].sport, Sport::Football);
    assert_eq!(matches[1].sport, Sport::Basketball);
    assert_eq!(matches[2].sport, Sport::Football);
    assert_eq!(matches[2].booking_prediction.as_deref(), Some("GG"));
    assert!(matches.iter().all(|m| m.id.starts_with("booking-BC8H2-")));
}

#[test]
fn sources_are_unique_by_uri() {
    let chunks: Vec<Value> =
        serde_json::from_str(&read_fixture("grounding_chunks.json")).expect("valid json");
    let sources = dedup_sources(&chunks);
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].title, "BBC preview");
    assert_eq!(sources[1].uri, "https://clubelo.com/Arsenal");
}

#[test]
fn parses_football_analysis_fixture() {
    let raw = read_fixture("football_analysis_reply.txt");
    let analysis = parse_deep_analysis(&raw, Sport::Football, Vec::new()).expect("should parse");

    assert_eq!(analysis.referee_analysis, "Michael Oliver averages 4.2 cards per game");
    assert_eq!(analysis.tactical_analysis, "2.1");

    let keys: Vec<&str> = analysis.predictions.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["winner", "goals", "cards", "playerStat"]);
    assert_eq!(analysis.predictions[0].detail.confidence, Confidence::High);
    assert_eq!(analysis.predictions[2].detail.confidence, Confidence::Low);
    assert_eq!(analysis.predictions[3].detail.confidence, Confidence::Medium);
    assert_eq!(analysis.predictions[3].detail.reasoning, "No reasoning provided.");
    assert_eq!(analysis.best_bet.selection, "Over 2.5");

    let viz = analysis.visualization.expect("momentum chart");
    assert_eq!(viz.kind, VisualKind::Momentum);
    assert_eq!(viz.labels.len(), 6);
    assert_eq!(viz.home, vec![62.0, 58.0, 55.0, 60.0, 66.0]);
    assert_eq!(viz.away.len(), 6);

    let picks = analysis.predictions.len();
    let analysis = parse_deep_analysis(&raw, Sport::Football, Vec::new()).unwrap();
    assert_eq!(analysis.picks().len(), picks + 1);
    assert!(analysis.picks()[0].best_bet);
}

#[test]
fn analysis_without_best_bet_is_rejected() {
    let text = r#"{"matchOverview": "x", "predictions": {}}"#;
    assert!(matches!(
        parse_deep_analysis(text, Sport::Basketball, Vec::new()),
        Err(ParseError::MissingShape(_))
    ));
}
