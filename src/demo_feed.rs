//! Offline stand-in for the model, used when no API key is configured or
//! `STATIMATCH_DEMO` is set. Replies are shaped like real ones, including the
//! untidy parts: prose around the JSON, object-valued fields, and a fixture
//! on the wrong day.

use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::Rng;
use serde_json::{Value, json};

use crate::gemini::{GenerateRequest, ModelClient, ModelError, ModelResponse, RequestPurpose};
use crate::prompts::prediction_markets;
use crate::state::Sport;

pub struct DemoClient {
    latency: Duration,
}

impl DemoClient {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// No artificial delay.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    fn wait(&self) {
        if self.latency.is_zero() {
            return;
        }
        let jitter = rand::thread_rng().gen_range(0..=self.latency.as_millis() as u64 / 2);
        thread::sleep(self.latency + Duration::from_millis(jitter));
    }
}

impl Default for DemoClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(900))
    }
}

impl ModelClient for DemoClient {
    fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse, ModelError> {
        self.wait();
        let response = match &request.purpose {
            RequestPurpose::Fixtures { sport, date } => ModelResponse {
                text: fenced(&json!({ "matches": seed_fixtures(*sport, date) })),
                grounding_chunks: Vec::new(),
            },
            RequestPurpose::BookingCode { code } => ModelResponse {
                text: format!(
                    "Here are the selections I found for booking code {code}:\n{}\nGood luck!",
                    json!({ "matches": seed_booking(code) })
                ),
                grounding_chunks: Vec::new(),
            },
            RequestPurpose::Analysis { sport, match_query } => ModelResponse {
                text: fenced(&seed_analysis(*sport, match_query)),
                grounding_chunks: seed_grounding(),
            },
        };
        Ok(response)
    }
}

fn fenced(value: &Value) -> String {
    format!("```json\n{value:#}\n```")
}

fn seed_fixtures(sport: Sport, date: &str) -> Vec<Value> {
    let next_day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| (d + ChronoDuration::days(1)).format("%Y-%m-%d").to_string());

    let rows: &[(&str, &str, &str, &str)] = match sport {
        Sport::Football => &[
            ("Real Madrid", "Barcelona", "La Liga", "21:00"),
            ("Arsenal", "Liverpool", "Premier League", "17:30"),
            ("Bayern Munich", "Borussia Dortmund", "Bundesliga", "18:30"),
            ("Inter", "AC Milan", "Serie A", "20:45"),
            ("Paris Saint-Germain", "Marseille", "Ligue 1", "21:00"),
            ("Ajax", "PSV", "Eredivisie", "14:30"),
        ],
        Sport::Basketball => &[
            ("Boston Celtics", "Milwaukee Bucks", "NBA", "19:30"),
            ("Denver Nuggets", "Los Angeles Lakers", "NBA", "22:00"),
            ("Golden State Warriors", "Phoenix Suns", "NBA", "22:30"),
            ("Real Madrid", "Panathinaikos", "EuroLeague", "20:45"),
            ("Fenerbahce", "Olympiacos", "EuroLeague", "19:45"),
        ],
    };

    let mut out: Vec<Value> = rows
        .iter()
        .map(|(home, away, league, time)| {
            json!({ "home": home, "away": away, "league": league, "date": date, "time": time })
        })
        .collect();
    // object-valued team name
    if let Some(second) = out.get_mut(1) {
        second["away"] = json!({ "team": second["away"].clone(), "rank": 2 });
    }
    if let (Some(last), Some(next_day)) = (out.last_mut(), next_day) {
        last["date"] = Value::String(next_day);
    }
    out
}

fn seed_booking(code: &str) -> Vec<Value> {
    let picks = [
        ("Manchester City", "Chelsea", "Premier League", "football", "Home Win"),
        ("Atletico Madrid", "Sevilla", "La Liga", "football", "Under 2.5"),
        ("Napoli", "Juventus", "Serie A", "football", "GG"),
        ("Miami Heat", "New York Knicks", "NBA", "basketball", "Over 214.5"),
        ("Lyon", "Lille", "Ligue 1", "soccer", "Draw"),
    ];
    let take = 4 + code.len() % 2;
    picks
        .iter()
        .take(take)
        .map(|(home, away, league, sport, prediction)| {
            json!({
                "home": home,
                "away": away,
                "league": league,
                "time": "20:00",
                "sport": sport,
                "bookingPrediction": prediction,
            })
        })
        .collect()
}

fn seed_analysis(sport: Sport, match_query: &str) -> Value {
    let mut rng = rand::thread_rng();
    let confidences = ["High", "Medium", "low"];
    let mut predictions = serde_json::Map::new();
    for (idx, spec) in prediction_markets(sport).iter().enumerate() {
        predictions.insert(
            spec.key.to_string(),
            json!({
                "market": spec.market,
                "selection": demo_selection(sport, spec.key),
                "confidence": confidences[idx % confidences.len()],
                "reasoning": format!("{} Demo reasoning for {match_query}.", spec.reasoning_hint),
            }),
        );
    }

    let (kind, labels, home, away): (&str, Vec<String>, Vec<u32>, Vec<u32>) = match sport {
        Sport::Football => (
            "momentum",
            ["0-15", "15-30", "30-45", "45-60", "60-75", "75-90"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            (0..6).map(|_| rng.gen_range(30..80)).collect(),
            (0..6).map(|_| rng.gen_range(20..70)).collect(),
        ),
        Sport::Basketball => (
            "trend",
            (1..=5).map(|g| format!("G{g}")).collect(),
            (0..5).map(|_| rng.gen_range(98..128)).collect(),
            (0..5).map(|_| rng.gen_range(96..124)).collect(),
        ),
    };

    json!({
        "matchOverview": format!("Demo overview for {match_query}. Ratings favour the home side by a narrow margin."),
        "refereeAnalysis": { "name": "Demo Official", "cardsPerGame": 4.1 },
        "formGuide": "Home: W-W-D-W-L. Away: W-L-W-D-W.",
        "tacticalAnalysis": "Home presses high; away looks to transition quickly through the wide areas.",
        "predictions": predictions,
        "bestBet": {
            "market": prediction_markets(sport).first().map_or("Winner", |spec| spec.market),
            "selection": demo_selection(sport, "winner"),
            "confidence": "High",
            "reasoning": "Both models agree and the price still carries value.",
        },
        "visualization": { "type": kind, "labels": labels, "home": home, "away": away },
    })
}

fn demo_selection(sport: Sport, key: &str) -> &'static str {
    match (sport, key) {
        (Sport::Football, "winner") => "Home",
        (Sport::Football, "goals") => "Over 2.5",
        (Sport::Football, "cards") => "Over 3.5",
        (Sport::Football, "corners") => "Over 9.5",
        (Sport::Football, "handicap") => "Home -0.5",
        (Sport::Basketball, "winner") => "Home",
        (Sport::Basketball, "spread") => "Home -4.5",
        (Sport::Basketball, "totalPoints") => "Over 224.5",
        (Sport::Basketball, "halftime") => "Home",
        (Sport::Basketball, "teamPoints") => "Home Over 112.5",
        (_, "playerStat") => "Top scorer 1+ shot on target",
        _ => "No selection",
    }
}

fn seed_grounding() -> Vec<Value> {
    vec![
        json!({ "web": { "uri": "https://www.example.com/preview", "title": "Match preview" } }),
        json!({ "web": { "uri": "https://stats.example.org/ratings", "title": "Team ratings" } }),
        json!({ "web": { "uri": "https://www.example.com/preview", "title": "Preview (duplicate)" } }),
        json!({ "retrievedContext": { "uri": "ignored" } }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::service;

    #[test]
    fn demo_fixtures_exercise_the_normalizer() {
        let client = DemoClient::instant();
        let matches =
            service::fetch_fixtures(&client, &AppConfig::default(), Sport::Football, "2024-10-27")
                .unwrap();
        assert_eq!(matches.len(), 6);
        assert_eq!(matches[1].away, "Liverpool");
        assert_eq!(matches[5].date, "2024-10-28");
        assert!(matches.iter().all(|m| m.sport == Sport::Football));
    }

    #[test]
    fn demo_booking_reply_is_prose_wrapped() {
        let client = DemoClient::instant();
        let matches =
            service::decode_booking_code(&client, &AppConfig::default(), "ABC", "2024-10-27")
                .unwrap();
        assert_eq!(matches.len(), 5);
        assert_eq!(matches[3].sport, Sport::Basketball);
        assert_eq!(matches[4].sport, Sport::Football);
        assert_eq!(matches[0].date, "2024-10-27");
        assert_eq!(matches[0].booking_prediction.as_deref(), Some("Home Win"));
    }

    #[test]
    fn demo_analysis_parses_for_both_sports() {
        let client = DemoClient::instant();
        for sport in [Sport::Football, Sport::Basketball] {
            let analysis =
                service::analyze_match(&client, &AppConfig::default(), "A vs B (Demo)", sport)
                    .unwrap();
            assert_eq!(analysis.predictions.len(), 6);
            assert_eq!(analysis.referee_analysis, "Demo Official");
            assert_eq!(analysis.sources.len(), 2);
            assert!(analysis.visualization.is_some());
        }
    }
}
