use crate::state::Sport;

/// One sport-specific prediction the analysis prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub market: &'static str,
    pub example_selection: &'static str,
    pub reasoning_hint: &'static str,
}

const FOOTBALL_MARKETS: &[MarketSpec] = &[
    MarketSpec {
        key: "winner",
        title: "Winner",
        market: "1X2",
        example_selection: "Home / Draw / Away",
        reasoning_hint: "Reasoning based on Elo difference...",
    },
    MarketSpec {
        key: "goals",
        title: "Goals",
        market: "Goals",
        example_selection: "Over / Under 2.5",
        reasoning_hint: "Reasoning based on Poisson probabilities...",
    },
    MarketSpec {
        key: "cards",
        title: "Cards",
        market: "Cards",
        example_selection: "Over/Under X.5",
        reasoning_hint: "Based on referee stats...",
    },
    MarketSpec {
        key: "corners",
        title: "Corners",
        market: "Corners",
        example_selection: "Over/Under X.5",
        reasoning_hint: "Based on wide play and corners won/conceded...",
    },
    MarketSpec {
        key: "handicap",
        title: "Handicap",
        market: "Handicap",
        example_selection: "Team +/- X",
        reasoning_hint: "Based on expected goal difference...",
    },
    MarketSpec {
        key: "playerStat",
        title: "Star Player Prop",
        market: "Player Props",
        example_selection: "Player Name & Stat (e.g. Haaland 1+ SoT)",
        reasoning_hint: "Based on recent shots/goals per 90 data.",
    },
];

const BASKETBALL_MARKETS: &[MarketSpec] = &[
    MarketSpec {
        key: "winner",
        title: "Winner",
        market: "Moneyline",
        example_selection: "Home / Away",
        reasoning_hint: "Reasoning based on net rating and Elo difference...",
    },
    MarketSpec {
        key: "spread",
        title: "Spread",
        market: "Spread",
        example_selection: "Team +/- X.5",
        reasoning_hint: "Based on projected margin...",
    },
    MarketSpec {
        key: "totalPoints",
        title: "Total Points",
        market: "Total Points",
        example_selection: "Over / Under X.5",
        reasoning_hint: "Based on pace and offensive/defensive efficiency...",
    },
    MarketSpec {
        key: "halftime",
        title: "Halftime",
        market: "Halftime",
        example_selection: "Home / Away / Over X.5 first half",
        reasoning_hint: "Based on first-half scoring splits...",
    },
    MarketSpec {
        key: "teamPoints",
        title: "Team Points",
        market: "Team Points",
        example_selection: "Team Over/Under X.5",
        reasoning_hint: "Based on team offensive rating vs opponent defense...",
    },
    MarketSpec {
        key: "playerStat",
        title: "Star Player Prop",
        market: "Player Props",
        example_selection: "Player Name & Stat (e.g. Jokic 25+ PTS)",
        reasoning_hint: "Based on usage rate and recent per-game averages.",
    },
];

pub fn prediction_markets(sport: Sport) -> &'static [MarketSpec] {
    match sport {
        Sport::Football => FOOTBALL_MARKETS,
        Sport::Basketball => BASKETBALL_MARKETS,
    }
}

fn league_priorities(sport: Sport) -> &'static str {
    match sport {
        Sport::Football => {
            "1. UEFA Champions League and the Big 5 European leagues (Premier League, La Liga, Bundesliga, Serie A, Ligue 1).\n\
             2. Other UEFA competitions, domestic cups and international fixtures.\n\
             3. Other top-flight leagues (Eredivisie, Primeira Liga, MLS, Saudi Pro League, Brasileirao)."
        }
        Sport::Basketball => {
            "1. NBA.\n\
             2. EuroLeague and EuroCup.\n\
             3. Other top domestic leagues (ACB, NBL, Lega Basket, BSL) and NCAA Division I."
        }
    }
}

pub fn fixtures_prompt(sport: Sport, date: &str) -> String {
    let example = match sport {
        Sport::Football => {
            r#"{ "home": "Arsenal", "away": "Liverpool", "league": "Premier League", "date": "DATE", "time": "16:30", "homeLogo": "https://...", "awayLogo": "https://..." }"#
        }
        Sport::Basketball => {
            r#"{ "home": "Los Angeles Lakers", "away": "Boston Celtics", "league": "NBA", "date": "DATE", "time": "19:30", "homeLogo": "https://...", "awayLogo": "https://..." }"#
        }
    }
    .replace("DATE", date);

    format!(
        r#"Act as a sports scheduler. Search for the most important {sport} matches scheduled on {date}.

STRICT DATE RULE: Only include matches whose kickoff date is exactly {date}. Do NOT include matches from the day before or the day after, even if they are more popular. If there are no matches on {date}, return an empty array.

Order the list by importance, most important first, using these league priorities:
{priorities}
Within a league, prefer matches between top-table teams, derbies, or high-stakes games. Return at most 30 matches.

Return ONLY a JSON object containing an array called "matches".
Each match object must have: "home", "away", "league", "date" (YYYY-MM-DD), "time" (HH:MM, 24h).
Include "homeLogo" and "awayLogo" image URLs only if you find them; otherwise omit them.
Every field must be a plain string.

Example format:
```json
{{
  "matches": [
    {example}
  ]
}}
```"#,
        sport = sport.as_str(),
        priorities = league_priorities(sport),
    )
}

pub fn booking_code_prompt(code: &str) -> String {
    format!(
        r#"The user has provided a betting booking code: "{code}".
Simulate the contents of this booking code by generating a list of 4-6 realistic high-profile football or basketball matches that might be in a popular accumulator bet this week.

Return ONLY a JSON object containing an array called "matches".
Each match object must have: "home", "away", "league", "date", "time", "sport" ("football" or "basketball"), and "bookingPrediction".
"bookingPrediction" should be a market like "Home Win", "Over 2.5", "GG", "Draw", etc.

Example format:
```json
{{
  "matches": [
    {{
      "home": "Team A",
      "away": "Team B",
      "league": "Premier League",
      "date": "2024-10-27",
      "time": "20:00",
      "sport": "football",
      "bookingPrediction": "Home Win"
    }}
  ]
}}
```"#
    )
}

fn research_framework(sport: Sport) -> &'static str {
    match sport {
        Sport::Football => {
            "1. **Elo Rating System**: Search for the current Club Elo ratings for both teams and calculate the win probability delta.\n\
             2. **Poisson Distribution Model**: Estimate Attack/Defense Strength for both teams and use them to estimate expected goals (λ) for Home and Away.\n\
             3. **Player Performance Data**: Identify key players in top form (Shots on Target per game, Pass Completion %, Goals per 90) and find the SINGLE most probable player prop.\n\
             4. **Advanced Metrics**: Search for recent xG, xGA, and possession stats.\n\
             5. **Squad Intel**: Confirm latest injuries and suspensions.\n\
             6. **Tactical & Referee**: Analyze playstyles and referee strictness (cards and penalties per game)."
        }
        Sport::Basketball => {
            "1. **Efficiency Ratings**: Search for current offensive, defensive and net ratings for both teams.\n\
             2. **Pace & Four Factors**: Estimate possessions per game, eFG%, turnover rate, offensive rebounding and free-throw rate, and project the total.\n\
             3. **Injury Impact**: Confirm the latest injury report and estimate the point impact of missing rotation players.\n\
             4. **Schedule Spots**: Back-to-backs, travel and rest days.\n\
             5. **Player Performance Data**: Usage rate and recent per-game averages; find the SINGLE most probable player prop.\n\
             6. **Officiating**: Crew tendencies for fouls and free throws."
        }
    }
}

fn visualization_schema(sport: Sport) -> &'static str {
    match sport {
        Sport::Football => {
            r#""visualization": { "type": "momentum", "labels": ["0-15", "15-30", "30-45", "45-60", "60-75", "75-90"], "home": [six numbers 0-100 of expected attacking pressure], "away": [six numbers 0-100] }"#
        }
        Sport::Basketball => {
            r#""visualization": { "type": "trend", "labels": ["G1", "G2", "G3", "G4", "G5"], "home": [points scored in each of the last 5 games, oldest first], "away": [same for the away team] }"#
        }
    }
}

pub fn analysis_prompt(match_query: &str, sport: Sport) -> String {
    let predictions = prediction_markets(sport)
        .iter()
        .map(|spec| {
            format!(
                r#"    "{key}": {{ "market": "{market}", "selection": "{selection}", "confidence": "High/Medium/Low", "reasoning": "{hint}" }}"#,
                key = spec.key,
                market = spec.market,
                selection = spec.example_selection,
                hint = spec.reasoning_hint,
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    let analyst = match sport {
        Sport::Football => "world-class football analyst",
        Sport::Basketball => "world-class basketball analyst",
    };

    format!(
        r#"Act as a {analyst} and professional sports bettor.
Conduct an EXHAUSTIVE, DEEP-DIVE statistical research analysis for the match: {match_query}.

You MUST use the 'googleSearch' tool to retrieve the absolute latest real-time data.

### REQUIRED RESEARCH PILLARS (Use Statistical Models):
{framework}

### PREDICTION LOGIC:
- **Model Triangulation**: predictions must be supported by at least two of the models above.
- **Value Identification**: Highlight "Value" where models disagree with the market.
- **Accuracy**: Be precise. Every text field must be a plain string.

### OUTPUT FORMAT:
Return strictly a valid JSON object with this structure:
{{
  "matchOverview": "Executive summary including rating comparison and match context.",
  "refereeAnalysis": "Officials and a stat-backed analysis of their strictness.",
  "formGuide": "Recent form (W-D-L / W-L), ratings, and performance trends.",
  "tacticalAnalysis": "Tactical battle analysis with model-derived expected scorelines.",
  "predictions": {{
{predictions}
  }},
  "bestBet": {{ "market": "The single best value market", "selection": "The outcome", "confidence": "High", "reasoning": "Why this is the mathematical best bet." }},
  {visualization}
}}"#,
        framework = research_framework(sport),
        visualization = visualization_schema(sport),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_prompt_pins_the_date() {
        let prompt = fixtures_prompt(Sport::Basketball, "2024-10-27");
        assert!(prompt.contains("basketball matches scheduled on 2024-10-27"));
        assert!(prompt.contains("exactly 2024-10-27"));
        assert!(prompt.contains("NBA"));
        assert!(prompt.contains("```json"));
    }

    #[test]
    fn booking_prompt_quotes_the_code() {
        let prompt = booking_code_prompt("BC8H2");
        assert!(prompt.contains("\"BC8H2\""));
        assert!(prompt.contains("bookingPrediction"));
    }

    #[test]
    fn analysis_prompt_lists_sport_markets() {
        let football = analysis_prompt("Arsenal vs Chelsea (Premier League)", Sport::Football);
        assert!(football.contains("Arsenal vs Chelsea (Premier League)"));
        assert!(football.contains("\"cards\""));
        assert!(football.contains("\"corners\""));
        assert!(!football.contains("\"halftime\""));

        let basketball = analysis_prompt("Lakers vs Celtics", Sport::Basketball);
        assert!(basketball.contains("\"halftime\""));
        assert!(basketball.contains("\"teamPoints\""));
        assert!(!basketball.contains("\"corners\""));
    }
}
