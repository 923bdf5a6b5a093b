use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

use statimatch::fixtures::{FixtureQuery, FixtureSort, normalize_fixtures, view_fixtures};
use statimatch::response_parse::{dedup_sources, extract_json_payload, parse_deep_analysis};
use statimatch::state::Sport;

fn fixture_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|idx| {
            let away = if idx % 7 == 0 {
                json!({ "team": format!("Away {idx}") })
            } else {
                json!(format!("Away {idx}"))
            };
            json!({
                "home": format!("Home {idx}"),
                "away": away,
                "league": format!("League {}", idx % 9),
                "date": format!("2024-10-{:02}", 20 + idx % 3),
                "time": format!("{:02}:{:02}", 12 + idx % 10, (idx * 15) % 60),
            })
        })
        .collect()
}

fn fenced_reply(records: &[Value]) -> String {
    format!(
        "Here are the fixtures you asked for.\n```json\n{:#}\n```\nEnjoy the games!",
        json!({ "matches": records })
    )
}

const ANALYSIS_REPLY: &str = r#"Analysis below.
```json
{
  "matchOverview": "Arsenal host Chelsea.",
  "refereeAnalysis": {"name": "Michael Oliver"},
  "formGuide": "W-W-D-W-W",
  "tacticalAnalysis": "High press vs low block.",
  "predictions": {
    "winner": {"market": "1X2", "selection": "Arsenal", "confidence": "High", "reasoning": "Elo"},
    "goals": {"market": "Goals", "selection": "Over 2.5", "confidence": "Medium", "reasoning": "Poisson"},
    "cards": {"market": "Cards", "selection": "Over 3.5", "confidence": "Low", "reasoning": "Referee"},
    "corners": {"market": "Corners", "selection": "Over 9.5", "confidence": "Medium", "reasoning": "Wide play"},
    "handicap": {"market": "Handicap", "selection": "Arsenal -0.5", "confidence": "Medium", "reasoning": "xGD"},
    "playerStat": {"market": "Player Props", "selection": "Saka 1+ SoT", "confidence": "High", "reasoning": "Shots/90"}
  },
  "bestBet": {"market": "1X2", "selection": "Arsenal", "confidence": "High", "reasoning": "Models agree"},
  "visualization": {"type": "momentum", "labels": ["0-15","15-30","30-45","45-60","60-75","75-90"], "home": [60,55,50,65,70,62], "away": [40,45,50,35,30,38]}
}
```"#;

fn bench_fixture_reply_parse(c: &mut Criterion) {
    let reply = fenced_reply(&fixture_records(30));
    c.bench_function("fixture_reply_parse", |b| {
        b.iter(|| {
            let root = extract_json_payload(black_box(&reply)).expect("reply should parse");
            let raw = root["matches"].as_array().cloned().unwrap_or_default();
            let matches = normalize_fixtures(&raw, Sport::Football, "2024-10-20");
            black_box(matches);
        })
    });
}

fn bench_analysis_parse(c: &mut Criterion) {
    let chunks: Vec<Value> = (0..40)
        .map(|idx| json!({ "web": { "uri": format!("https://example.com/{}", idx % 25), "title": format!("Source {idx}") } }))
        .collect();
    c.bench_function("analysis_parse", |b| {
        b.iter(|| {
            let sources = dedup_sources(black_box(&chunks));
            let analysis = parse_deep_analysis(black_box(ANALYSIS_REPLY), Sport::Football, sources)
                .expect("analysis should parse");
            black_box(analysis);
        })
    });
}

fn bench_fixture_view(c: &mut Criterion) {
    let matches = normalize_fixtures(&fixture_records(300), Sport::Football, "2024-10-20");
    let by_date = FixtureQuery {
        text: "league 3".to_string(),
        league: None,
        date: None,
        sort: FixtureSort::Date,
    };
    let ranked = FixtureQuery {
        text: String::new(),
        league: Some("League 4".to_string()),
        date: Some("2024-10-21".to_string()),
        sort: FixtureSort::Importance,
    };
    c.bench_function("fixture_view", |b| {
        b.iter(|| {
            black_box(view_fixtures(black_box(&matches), &by_date));
            black_box(view_fixtures(black_box(&matches), &ranked));
        })
    });
}

criterion_group!(
    benches,
    bench_fixture_reply_parse,
    bench_analysis_parse,
    bench_fixture_view
);
criterion_main!(benches);
