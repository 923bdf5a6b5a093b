use std::collections::BTreeMap;

use chrono::Utc;
use rand::Rng;
use serde_json::Value;

use crate::response_parse::{optional_text, sanitize_text};
use crate::state::{Match, Sport};

pub const RANKED_GROUP_LABEL: &str = "Top Ranked";

const UNKNOWN_HOME: &str = "Unknown Home";
const UNKNOWN_AWAY: &str = "Unknown Away";
const UNKNOWN_LEAGUE: &str = "Unknown League";
const DEFAULT_TIME: &str = "00:00";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FixtureSort {
    /// Upstream order, treated as a relevance ranking.
    #[default]
    Importance,
    Date,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureQuery {
    pub text: String,
    pub league: Option<String>,
    pub date: Option<String>,
    pub sort: FixtureSort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureGroup<'a> {
    pub label: String,
    pub matches: Vec<&'a Match>,
}

/// Normalizes a fixture-list payload. The sport always comes from the request.
pub fn normalize_fixtures(raw: &[Value], sport: Sport, date: &str) -> Vec<Match> {
    let stamp = Utc::now().timestamp_millis();
    raw.iter()
        .enumerate()
        .map(|(idx, record)| {
            normalize_record(record, sport, date, format!("match-{idx}-{stamp}-{}", id_suffix()))
        })
        .collect()
}

/// Normalizes a decoded booking code. Each record may name its own sport;
/// anything missing or unrecognized is football.
pub fn normalize_booking_matches(raw: &[Value], code: &str, date: &str) -> Vec<Match> {
    let stamp = Utc::now().timestamp_millis();
    raw.iter()
        .enumerate()
        .map(|(idx, record)| {
            let sport = record
                .get("sport")
                .and_then(Value::as_str)
                .and_then(Sport::from_loose)
                .unwrap_or(Sport::Football);
            let id = format!("booking-{code}-{idx}-{stamp}-{}", id_suffix());
            let mut fixture = normalize_record(record, sport, date, id);
            fixture.booking_prediction = optional_text(record.get("bookingPrediction"));
            fixture
        })
        .collect()
}

fn normalize_record(record: &Value, sport: Sport, date: &str, id: String) -> Match {
    Match {
        id,
        home: sanitize_text(record.get("home"), UNKNOWN_HOME),
        away: sanitize_text(record.get("away"), UNKNOWN_AWAY),
        league: sanitize_text(record.get("league"), UNKNOWN_LEAGUE),
        date: sanitize_text(record.get("date"), date),
        time: Some(sanitize_text(record.get("time"), DEFAULT_TIME)),
        sport,
        home_logo: logo(record.get("homeLogo")),
        away_logo: logo(record.get("awayLogo")),
        booking_prediction: None,
    }
}

fn logo(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn id_suffix() -> String {
    format!("{:08x}", rand::thread_rng().r#gen::<u32>())
}

/// Drops every fixture whose date is not exactly `date`.
pub fn retain_on_date(mut matches: Vec<Match>, date: &str) -> Vec<Match> {
    matches.retain(|m| m.date == date);
    matches
}

pub fn matches_query(m: &Match, query: &FixtureQuery) -> bool {
    if let Some(date) = query.date.as_deref()
        && m.date != date
    {
        return false;
    }
    if let Some(league) = query.league.as_deref()
        && m.league != league
    {
        return false;
    }
    let needle = query.text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    format!("{} {} {}", m.home, m.away, m.league)
        .to_lowercase()
        .contains(&needle)
}

pub fn view_fixtures<'a>(matches: &'a [Match], query: &FixtureQuery) -> Vec<FixtureGroup<'a>> {
    let mut filtered: Vec<&Match> = matches.iter().filter(|m| matches_query(m, query)).collect();
    if filtered.is_empty() {
        return Vec::new();
    }

    match query.sort {
        FixtureSort::Importance => vec![FixtureGroup {
            label: RANKED_GROUP_LABEL.to_string(),
            matches: filtered,
        }],
        FixtureSort::Date => {
            // Zero-padded dates and times sort correctly as text; sort_by is stable.
            filtered.sort_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then_with(|| a.time.as_deref().unwrap_or("").cmp(b.time.as_deref().unwrap_or("")))
            });
            let mut by_date: BTreeMap<&str, Vec<&Match>> = BTreeMap::new();
            for m in filtered {
                by_date.entry(m.date.as_str()).or_default().push(m);
            }
            by_date
                .into_iter()
                .map(|(date, matches)| FixtureGroup {
                    label: date.to_string(),
                    matches,
                })
                .collect()
        }
    }
}

/// Distinct league names in first-seen order.
pub fn league_chips(matches: &[Match]) -> Vec<String> {
    let mut chips: Vec<String> = Vec::new();
    for m in matches {
        if !chips.iter().any(|league| league == &m.league) {
            chips.push(m.league.clone());
        }
    }
    chips
}
