//! One function per user action: build the prompt, call the model, parse.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::fixtures::{normalize_booking_matches, normalize_fixtures};
use crate::gemini::{GenerateRequest, ModelClient, ModelError, RequestPurpose, with_tier_fallback};
use crate::prompts::{analysis_prompt, booking_code_prompt, fixtures_prompt};
use crate::response_parse::{dedup_sources, extract_json_payload, matches_array, parse_deep_analysis};
use crate::state::{DeepAnalysis, Match, Sport};

const EXCERPT_CHARS: usize = 240;

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

pub fn fetch_fixtures(
    client: &dyn ModelClient,
    config: &AppConfig,
    sport: Sport,
    date: &str,
) -> Result<Vec<Match>> {
    let request = GenerateRequest {
        model: config.fixtures_model.clone(),
        prompt: fixtures_prompt(sport, date),
        grounding: true,
        thinking_budget: config.fixtures_thinking_budget,
        purpose: RequestPurpose::Fixtures {
            sport,
            date: date.to_string(),
        },
    };
    let response = client
        .generate(&request)
        .with_context(|| format!("fixture request for {} on {date}", sport.as_str()))?;
    let root = extract_json_payload(&response.text).inspect_err(|err| {
        warn!(%err, sport = sport.as_str(), date, excerpt = %excerpt(&response.text), "unparseable fixture reply");
    })?;
    let raw = matches_array(&root)?;
    let matches = normalize_fixtures(raw, sport, date);
    info!(count = matches.len(), sport = sport.as_str(), date, "fixtures fetched");
    Ok(matches)
}

/// `today` fills in records that come back without a date.
pub fn decode_booking_code(
    client: &dyn ModelClient,
    config: &AppConfig,
    code: &str,
    today: &str,
) -> Result<Vec<Match>> {
    let request = GenerateRequest {
        model: config.booking_model.clone(),
        prompt: booking_code_prompt(code),
        grounding: false,
        thinking_budget: None,
        purpose: RequestPurpose::BookingCode {
            code: code.to_string(),
        },
    };
    let response = client
        .generate(&request)
        .with_context(|| format!("booking code request for {code}"))?;
    let root = extract_json_payload(&response.text).inspect_err(|err| {
        warn!(%err, code, excerpt = %excerpt(&response.text), "unparseable booking reply");
    })?;
    let raw = matches_array(&root)?;
    let matches = normalize_booking_matches(raw, code, today);
    info!(count = matches.len(), code, "booking code decoded");
    Ok(matches)
}

/// Runs on the analysis tier and retries once on the fallback tier when the
/// first is rate limited or unavailable.
pub fn analyze_match(
    client: &dyn ModelClient,
    config: &AppConfig,
    match_query: &str,
    sport: Sport,
) -> Result<DeepAnalysis> {
    let prompt = analysis_prompt(match_query, sport);
    let request_for = |model: &str| GenerateRequest {
        model: model.to_string(),
        prompt: prompt.clone(),
        grounding: true,
        thinking_budget: config.analysis_thinking_budget,
        purpose: RequestPurpose::Analysis {
            sport,
            match_query: match_query.to_string(),
        },
    };
    let primary = request_for(&config.analysis_model);
    let secondary = request_for(&config.analysis_fallback_model);

    let response = with_tier_fallback(
        || client.generate(&primary),
        || client.generate(&secondary),
        ModelError::is_capacity,
    )
    .with_context(|| format!("analysis request for {match_query}"))?;

    let sources = dedup_sources(&response.grounding_chunks);
    let analysis = parse_deep_analysis(&response.text, sport, sources)
        .inspect_err(|err| {
            warn!(%err, match_query, excerpt = %excerpt(&response.text), "unparseable analysis reply");
        })
        .context("analysis reply did not match the expected shape")?;
    info!(
        match_query,
        predictions = analysis.predictions.len(),
        sources = analysis.sources.len(),
        "analysis complete"
    );
    Ok(analysis)
}
