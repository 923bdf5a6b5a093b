use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::prompts::prediction_markets;
use crate::state::{
    Confidence, DeepAnalysis, PredictionDetail, PredictionSlot, Source, Sport, VisualKind,
    Visualization,
};

const JSON_FENCE_OPEN: &str = "```json";
const FENCE: &str = "```";
const SECTION_FALLBACK: &str = "Not available.";
const MOMENTUM_LABELS: [&str; 6] = ["0-15", "15-30", "30-45", "45-60", "60-75", "75-90"];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON found in response")]
    NoJson,
    #[error("invalid JSON in response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("response JSON missing {0}")]
    MissingShape(&'static str),
}

/// Pulls the JSON object out of free model text.
///
/// Tried in order: the first fenced block tagged `json`, the span from the first
/// `{` to the last `}`, and finally the whole text when it starts with `{`.
/// Only the first candidate found is parsed; braces inside string values can
/// confuse the span heuristic.
pub fn extract_json_payload(text: &str) -> Result<Value, ParseError> {
    if let Some(inner) = fenced_json_block(text) {
        return Ok(serde_json::from_str(inner)?);
    }
    if let Some(span) = brace_span(text) {
        return Ok(serde_json::from_str(span)?);
    }
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    Err(ParseError::NoJson)
}

fn fenced_json_block(text: &str) -> Option<&str> {
    let start = text.find(JSON_FENCE_OPEN)? + JSON_FENCE_OPEN.len();
    let rest = &text[start..];
    let end = rest.find(FENCE)?;
    let inner = rest[..end].trim();
    (!inner.is_empty()).then_some(inner)
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The `matches` array of a fixture or booking payload.
pub fn matches_array(root: &Value) -> Result<&Vec<Value>, ParseError> {
    root.get("matches")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingShape("matches array"))
}

/// How a loosely-typed upstream field was shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LooseField<'a> {
    Text(&'a str),
    Number(String),
    /// An object standing in for a string, e.g. a whole team or match record.
    Shaped(&'a str),
    Unknown,
}

impl<'a> LooseField<'a> {
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(s)) => LooseField::Text(s),
            Some(Value::Number(n)) => LooseField::Number(n.to_string()),
            Some(Value::Object(obj)) => ["name", "team", "home"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
                .map_or(LooseField::Unknown, LooseField::Shaped),
            _ => LooseField::Unknown,
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            LooseField::Text(s) | LooseField::Shaped(s) => Some(s.to_string()),
            LooseField::Number(n) => Some(n),
            LooseField::Unknown => None,
        }
    }

    pub fn resolve(self, fallback: &str) -> String {
        self.into_option().unwrap_or_else(|| fallback.to_string())
    }
}

pub fn sanitize_text(value: Option<&Value>, fallback: &str) -> String {
    LooseField::classify(value).resolve(fallback)
}

pub fn optional_text(value: Option<&Value>) -> Option<String> {
    LooseField::classify(value).into_option()
}

/// Unknown or non-string confidence labels read as `Medium`.
pub fn confidence_from(value: Option<&Value>) -> Confidence {
    value
        .and_then(Value::as_str)
        .and_then(Confidence::from_label)
        .unwrap_or(Confidence::Medium)
}

/// Unique-by-uri citations from grounding chunks, first title wins.
pub fn dedup_sources(chunks: &[Value]) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for chunk in chunks {
        let Some(web) = chunk.get("web") else {
            continue;
        };
        let uri = web.get("uri").and_then(Value::as_str).and_then(non_empty);
        let title = web.get("title").and_then(Value::as_str).and_then(non_empty);
        let (Some(uri), Some(title)) = (uri, title) else {
            continue;
        };
        if seen.insert(uri.to_string()) {
            sources.push(Source {
                title: title.to_string(),
                uri: uri.to_string(),
            });
        }
    }
    sources
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

pub fn parse_deep_analysis(
    text: &str,
    sport: Sport,
    sources: Vec<Source>,
) -> Result<DeepAnalysis, ParseError> {
    let root = extract_json_payload(text)?;
    let predictions = root
        .get("predictions")
        .and_then(Value::as_object)
        .ok_or(ParseError::MissingShape("predictions object"))?;
    let best_bet = root
        .get("bestBet")
        .filter(|v| v.is_object())
        .ok_or(ParseError::MissingShape("bestBet object"))?;

    let slots = prediction_markets(sport)
        .iter()
        .filter_map(|spec| {
            let raw = predictions.get(spec.key).filter(|v| v.is_object())?;
            Some(PredictionSlot {
                key: spec.key.to_string(),
                title: spec.title.to_string(),
                market_label: spec.market.to_string(),
                detail: parse_prediction(raw, spec.market),
            })
        })
        .collect();

    Ok(DeepAnalysis {
        sport,
        match_overview: sanitize_text(root.get("matchOverview"), SECTION_FALLBACK),
        referee_analysis: sanitize_text(root.get("refereeAnalysis"), SECTION_FALLBACK),
        form_guide: sanitize_text(root.get("formGuide"), SECTION_FALLBACK),
        tactical_analysis: sanitize_text(root.get("tacticalAnalysis"), SECTION_FALLBACK),
        predictions: slots,
        best_bet: parse_prediction(best_bet, "Best Bet"),
        sources,
        visualization: parse_visualization(root.get("visualization"), sport),
    })
}

fn parse_prediction(raw: &Value, default_market: &str) -> PredictionDetail {
    PredictionDetail {
        market: sanitize_text(raw.get("market"), default_market),
        selection: sanitize_text(raw.get("selection"), "No selection"),
        confidence: confidence_from(raw.get("confidence")),
        reasoning: sanitize_text(raw.get("reasoning"), "No reasoning provided."),
    }
}

fn parse_visualization(raw: Option<&Value>, sport: Sport) -> Option<Visualization> {
    let raw = raw.filter(|v| v.is_object())?;
    let home = numbers(raw.get("home"));
    let away = numbers(raw.get("away"));
    if home.is_empty() && away.is_empty() {
        return None;
    }

    let kind = match raw.get("type").and_then(Value::as_str).map(str::to_ascii_lowercase) {
        Some(kind) if kind == "trend" => VisualKind::Trend,
        Some(kind) if kind == "momentum" => VisualKind::Momentum,
        _ => match sport {
            Sport::Football => VisualKind::Momentum,
            Sport::Basketball => VisualKind::Trend,
        },
    };

    let bins = home.len().max(away.len());
    let mut labels: Vec<String> = raw
        .get("labels")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| optional_text(Some(v))).collect())
        .unwrap_or_default();
    if labels.len() != bins {
        labels = match kind {
            VisualKind::Momentum if bins == MOMENTUM_LABELS.len() => {
                MOMENTUM_LABELS.iter().map(|l| l.to_string()).collect()
            }
            _ => (1..=bins).map(|n| format!("G{n}")).collect(),
        };
    }

    Some(Visualization {
        kind,
        labels,
        home,
        away,
    })
}

fn numbers(value: Option<&Value>) -> Vec<f64> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prefers_tagged_fence_over_other_braces() {
        let text = "Here is {not json} and\n```json\n{\"a\": 1}\n```\ntrailing {x}";
        assert_eq!(extract_json_payload(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn falls_back_to_brace_span() {
        let text = "Sure! The data: {\"matches\": []} hope that helps";
        assert_eq!(extract_json_payload(text).unwrap(), json!({"matches": []}));
    }

    #[test]
    fn untagged_fence_uses_brace_span() {
        let text = "```\n{\"a\": 2}\n```";
        assert_eq!(extract_json_payload(text).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn empty_fence_falls_through_to_brace_span() {
        let text = "```json\n```\nThe data: {\"a\": 3}";
        assert_eq!(extract_json_payload(text).unwrap(), json!({"a": 3}));
    }

    #[test]
    fn prose_without_braces_is_an_error() {
        assert!(matches!(
            extract_json_payload("I could not find any fixtures today."),
            Err(ParseError::NoJson)
        ));
    }

    #[test]
    fn unterminated_object_is_invalid_json() {
        assert!(matches!(
            extract_json_payload("  {\"a\": 1"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn two_objects_greedy_span_fails() {
        let text = "{\"a\": 1} and {\"b\": 2}";
        assert!(matches!(
            extract_json_payload(text),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn sanitizer_covers_each_shape() {
        assert_eq!(sanitize_text(Some(&json!("Chelsea")), "x"), "Chelsea");
        assert_eq!(sanitize_text(Some(&json!(42)), "x"), "42");
        assert_eq!(sanitize_text(Some(&json!({"name": "Arsenal"})), "x"), "Arsenal");
        assert_eq!(sanitize_text(Some(&json!({"team": "Lakers"})), "x"), "Lakers");
        assert_eq!(
            sanitize_text(Some(&json!({"home": "Inter", "away": "Milan"})), "x"),
            "Inter"
        );
        assert_eq!(sanitize_text(Some(&json!({"name": 7})), "x"), "x");
        assert_eq!(sanitize_text(Some(&json!(true)), "x"), "x");
        assert_eq!(sanitize_text(Some(&json!(null)), "x"), "x");
        assert_eq!(sanitize_text(None, "x"), "x");
    }

    #[test]
    fn confidence_defaults_to_medium() {
        assert_eq!(confidence_from(Some(&json!("High"))), Confidence::High);
        assert_eq!(confidence_from(Some(&json!(" low "))), Confidence::Low);
        assert_eq!(confidence_from(Some(&json!("Very High"))), Confidence::Medium);
        assert_eq!(confidence_from(Some(&json!(3))), Confidence::Medium);
        assert_eq!(confidence_from(None), Confidence::Medium);
    }

    #[test]
    fn dedups_sources_by_uri() {
        let chunks = vec![
            json!({"web": {"uri": "https://a", "title": "First"}}),
            json!({"web": {"uri": "https://a", "title": "Second"}}),
            json!({"web": {"uri": "https://b"}}),
            json!({"web": {"title": "No uri"}}),
            json!({"retrievedContext": {}}),
            json!({"web": {"uri": "https://c", "title": "C"}}),
        ];
        let sources = dedup_sources(&chunks);
        assert_eq!(
            sources,
            vec![
                Source {
                    title: "First".to_string(),
                    uri: "https://a".to_string()
                },
                Source {
                    title: "C".to_string(),
                    uri: "https://c".to_string()
                },
            ]
        );
    }

    #[test]
    fn source_uris_are_kept_as_sent() {
        let chunks = vec![
            json!({"web": {"uri": " https://a", "title": " Padded "}}),
            json!({"web": {"uri": "https://a", "title": "Plain"}}),
            json!({"web": {"uri": "   ", "title": "Blank"}}),
        ];
        let sources = dedup_sources(&chunks);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].uri, " https://a");
        assert_eq!(sources[0].title, " Padded ");
        assert_eq!(sources[1].uri, "https://a");
    }

    #[test]
    fn missing_matches_array_is_a_shape_error() {
        let root = json!({"matches": {"home": "A"}});
        assert!(matches!(
            matches_array(&root),
            Err(ParseError::MissingShape(_))
        ));
    }

    #[test]
    fn analysis_requires_predictions_and_best_bet() {
        let text = r#"{"matchOverview": "x", "bestBet": {"market": "1X2"}}"#;
        assert!(matches!(
            parse_deep_analysis(text, Sport::Football, Vec::new()),
            Err(ParseError::MissingShape("predictions object"))
        ));
        let text = r#"{"predictions": {}, "bestBet": "Home"}"#;
        assert!(matches!(
            parse_deep_analysis(text, Sport::Football, Vec::new()),
            Err(ParseError::MissingShape("bestBet object"))
        ));
    }

    #[test]
    fn visualization_accepts_numeric_strings() {
        let raw = json!({"type": "trend", "home": [101, "99.5", "n/a"], "away": [88, 95, 102]});
        let vis = parse_visualization(Some(&raw), Sport::Basketball).expect("visualization");
        assert_eq!(vis.kind, VisualKind::Trend);
        assert_eq!(vis.home, vec![101.0, 99.5]);
        assert_eq!(vis.labels, vec!["G1", "G2", "G3"]);
        assert!(parse_visualization(Some(&json!({"home": []})), Sport::Football).is_none());
    }
}
