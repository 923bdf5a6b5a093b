use std::collections::VecDeque;

use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::bet_slip::{BetSelection, BetSlip};
use crate::fixtures::{self, FixtureGroup, FixtureQuery, FixtureSort};

pub const MANUAL_MATCH_ID: &str = "manual";
pub const MANUAL_LEAGUE: &str = "Custom";

pub const LOADING_MESSAGES: [&str; 6] = [
    "Searching global sports databases...",
    "Analyzing referee/officiating trends...",
    "Evaluating team form and H2H history...",
    "Simulating match scenarios (Monte Carlo)...",
    "Calculating Efficiency Metrics...",
    "Finalizing market probabilities...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Football,
    Basketball,
}

impl Sport {
    pub fn as_str(self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Basketball => "basketball",
        }
    }

    pub fn from_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "football" | "soccer" => Some(Sport::Football),
            "basketball" => Some(Sport::Basketball),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Sport::Football => Sport::Basketball,
            Sport::Basketball => Sport::Football,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub home: String,
    pub away: String,
    pub league: String,
    pub date: String,
    pub time: Option<String>,
    pub sport: Sport,
    pub home_logo: Option<String>,
    pub away_logo: Option<String>,
    pub booking_prediction: Option<String>,
}

impl Match {
    /// A free-text fixture typed by the user; `home` carries the whole query.
    pub fn manual(query: &str, sport: Sport, date: &str) -> Self {
        Self {
            id: MANUAL_MATCH_ID.to_string(),
            home: query.trim().to_string(),
            away: String::new(),
            league: MANUAL_LEAGUE.to_string(),
            date: date.to_string(),
            time: None,
            sport,
            home_logo: None,
            away_logo: None,
            booking_prediction: None,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.id == MANUAL_MATCH_ID
    }

    pub fn title(&self) -> String {
        if self.is_manual() {
            self.home.clone()
        } else {
            format!("{} vs {}", self.home, self.away)
        }
    }

    pub fn analysis_query(&self) -> String {
        if self.is_manual() {
            self.home.clone()
        } else {
            format!("{} vs {} ({})", self.home, self.away, self.league)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDetail {
    pub market: String,
    pub selection: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSlot {
    pub key: String,
    pub title: String,
    pub market_label: String,
    pub detail: PredictionDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualKind {
    Momentum,
    Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub kind: VisualKind,
    pub labels: Vec<String>,
    pub home: Vec<f64>,
    pub away: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepAnalysis {
    pub sport: Sport,
    pub match_overview: String,
    pub referee_analysis: String,
    pub form_guide: String,
    pub tactical_analysis: String,
    pub predictions: Vec<PredictionSlot>,
    pub best_bet: PredictionDetail,
    pub sources: Vec<Source>,
    pub visualization: Option<Visualization>,
}

/// A pick as shown on the analysis screen: the best bet first, then every
/// sport-specific slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPick<'a> {
    pub title: String,
    pub market: String,
    pub detail: &'a PredictionDetail,
    pub best_bet: bool,
}

impl DeepAnalysis {
    pub fn picks(&self) -> Vec<AnalysisPick<'_>> {
        let mut picks = Vec::with_capacity(self.predictions.len() + 1);
        picks.push(AnalysisPick {
            title: "AI's Highest Probability".to_string(),
            market: self.best_bet.market.clone(),
            detail: &self.best_bet,
            best_bet: true,
        });
        for slot in &self.predictions {
            picks.push(AnalysisPick {
                title: slot.title.clone(),
                market: slot.market_label.clone(),
                detail: &slot.detail,
                best_bet: false,
            });
        }
        picks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Browse,
    Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Explore,
    Booking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    LoadingMatches,
    ProcessingCode,
    Analyzing,
    Complete,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
    ManualQuery,
    BookingCode,
}

/// Latest request generation per action kind. Results tagged with an older
/// generation are dropped by `apply_delta`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestGenerations {
    pub fixtures: u64,
    pub booking: u64,
    pub analysis: u64,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub view_mode: ViewMode,
    pub status: AppStatus,
    pub error: Option<String>,
    pub sport: Sport,
    pub today: NaiveDate,
    pub selected_date: NaiveDate,
    pub fixtures: Vec<Match>,
    pub fixture_filter: String,
    pub league_filter: Option<String>,
    pub sort: FixtureSort,
    pub selected: usize,
    pub booking_code: String,
    pub booking_matches: Vec<Match>,
    pub booking_searched: bool,
    pub booking_selected: usize,
    pub selected_match: Option<Match>,
    pub analysis: Option<DeepAnalysis>,
    pub analysis_selected: usize,
    pub bet_slip: BetSlip,
    pub slip_overlay: bool,
    pub slip_selected: usize,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub loading_message: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub generations: RequestGenerations,
}

#[derive(Debug, Clone)]
pub enum Delta {
    FixturesLoaded {
        generation: u64,
        date: String,
        matches: Vec<Match>,
    },
    FixturesFailed {
        generation: u64,
        sport: Sport,
        error: String,
    },
    BookingDecoded {
        generation: u64,
        matches: Vec<Match>,
    },
    BookingFailed {
        generation: u64,
        error: String,
    },
    AnalysisReady {
        generation: u64,
        analysis: DeepAnalysis,
    },
    AnalysisFailed {
        generation: u64,
        error: String,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchFixtures {
        generation: u64,
        sport: Sport,
        date: String,
    },
    DecodeBookingCode {
        generation: u64,
        code: String,
    },
    Analyze {
        generation: u64,
        query: String,
        sport: Sport,
    },
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl AppState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            screen: Screen::Browse,
            view_mode: ViewMode::Explore,
            status: AppStatus::Idle,
            error: None,
            sport: Sport::Football,
            today,
            selected_date: today,
            fixtures: Vec::new(),
            fixture_filter: String::new(),
            league_filter: None,
            sort: FixtureSort::Importance,
            selected: 0,
            booking_code: String::new(),
            booking_matches: Vec::new(),
            booking_searched: false,
            booking_selected: 0,
            selected_match: None,
            analysis: None,
            analysis_selected: 0,
            bet_slip: BetSlip::default(),
            slip_overlay: false,
            slip_selected: 0,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            loading_message: 0,
            logs: VecDeque::new(),
            help_overlay: false,
            generations: RequestGenerations::default(),
        }
    }

    pub fn selected_date_str(&self) -> String {
        format_date(self.selected_date)
    }

    pub fn fixture_query(&self) -> FixtureQuery {
        FixtureQuery {
            text: self.fixture_filter.clone(),
            league: self.league_filter.clone(),
            date: Some(self.selected_date_str()),
            sort: self.sort,
        }
    }

    pub fn fixture_groups(&self) -> Vec<FixtureGroup<'_>> {
        fixtures::view_fixtures(&self.fixtures, &self.fixture_query())
    }

    /// Fixtures in display order, flattened across groups.
    pub fn visible_fixtures(&self) -> Vec<&Match> {
        self.fixture_groups()
            .into_iter()
            .flat_map(|group| group.matches)
            .collect()
    }

    pub fn selected_fixture(&self) -> Option<&Match> {
        match self.view_mode {
            ViewMode::Explore => self.visible_fixtures().get(self.selected).copied(),
            ViewMode::Booking => self.booking_matches.get(self.booking_selected),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.status,
            AppStatus::LoadingMatches | AppStatus::ProcessingCode | AppStatus::Analyzing
        )
    }

    pub fn begin_fixture_fetch(&mut self) -> ProviderCommand {
        self.generations.fixtures += 1;
        self.status = AppStatus::LoadingMatches;
        self.error = None;
        self.fixtures.clear();
        self.selected = 0;
        self.league_filter = None;
        ProviderCommand::FetchFixtures {
            generation: self.generations.fixtures,
            sport: self.sport,
            date: self.selected_date_str(),
        }
    }

    pub fn toggle_sport(&mut self) -> ProviderCommand {
        self.sport = self.sport.toggle();
        self.push_log(format!("[INFO] Sport: {}", self.sport.as_str()));
        self.begin_fixture_fetch()
    }

    pub fn shift_date(&mut self, days: i64) -> ProviderCommand {
        self.selected_date += ChronoDuration::days(days);
        self.push_log(format!("[INFO] Date: {}", self.selected_date_str()));
        self.begin_fixture_fetch()
    }

    pub fn reset_date(&mut self) -> ProviderCommand {
        self.selected_date = self.today;
        self.push_log(format!("[INFO] Date: {}", self.selected_date_str()));
        self.begin_fixture_fetch()
    }

    pub fn begin_booking_decode(&mut self, code: &str) -> Option<ProviderCommand> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return None;
        }
        self.generations.booking += 1;
        self.status = AppStatus::ProcessingCode;
        self.error = None;
        self.booking_code = code.clone();
        self.booking_searched = false;
        self.booking_matches.clear();
        self.booking_selected = 0;
        Some(ProviderCommand::DecodeBookingCode {
            generation: self.generations.booking,
            code,
        })
    }

    pub fn begin_analysis(&mut self, fixture: Match) -> ProviderCommand {
        self.generations.analysis += 1;
        self.status = AppStatus::Analyzing;
        self.error = None;
        self.analysis = None;
        self.analysis_selected = 0;
        self.loading_message = 0;
        let command = ProviderCommand::Analyze {
            generation: self.generations.analysis,
            query: fixture.analysis_query(),
            sport: fixture.sport,
        };
        self.selected_match = Some(fixture);
        command
    }

    pub fn begin_selected_analysis(&mut self) -> Option<ProviderCommand> {
        let fixture = self.selected_fixture()?.clone();
        Some(self.begin_analysis(fixture))
    }

    pub fn begin_manual_analysis(&mut self, query: &str) -> Option<ProviderCommand> {
        if query.trim().is_empty() {
            return None;
        }
        let manual = Match::manual(query, self.sport, &self.selected_date_str());
        Some(self.begin_analysis(manual))
    }

    pub fn reset_analysis(&mut self) {
        self.screen = Screen::Browse;
        self.selected_match = None;
        self.analysis = None;
        self.analysis_selected = 0;
        self.status = AppStatus::Idle;
    }

    /// Returns to idle only if `pending` is still the outstanding status.
    fn settle(&mut self, pending: AppStatus) {
        if self.status == pending {
            self.status = AppStatus::Idle;
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
        if self.status == AppStatus::Error {
            self.status = AppStatus::Idle;
        }
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Explore => ViewMode::Booking,
            ViewMode::Booking => ViewMode::Explore,
        };
    }

    pub fn toggle_sort(&mut self) {
        self.sort = match self.sort {
            FixtureSort::Importance => FixtureSort::Date,
            FixtureSort::Date => FixtureSort::Importance,
        };
        self.selected = 0;
    }

    /// Cycles None -> each league chip in order -> None.
    pub fn cycle_league_filter(&mut self) {
        let chips = fixtures::league_chips(&self.fixtures);
        self.league_filter = match &self.league_filter {
            None => chips.first().cloned(),
            Some(current) => chips
                .iter()
                .position(|league| league == current)
                .and_then(|pos| chips.get(pos + 1))
                .cloned(),
        };
        self.selected = 0;
    }

    pub fn set_fixture_filter(&mut self, text: &str) {
        self.fixture_filter = text.to_string();
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        let total = self.selection_len();
        let cursor = self.selection_cursor();
        *cursor = if total == 0 { 0 } else { (*cursor + 1) % total };
    }

    pub fn select_prev(&mut self) {
        let total = self.selection_len();
        let cursor = self.selection_cursor();
        *cursor = if total == 0 {
            0
        } else if *cursor == 0 {
            total - 1
        } else {
            *cursor - 1
        };
    }

    fn selection_len(&self) -> usize {
        if self.slip_overlay {
            return self.bet_slip.len();
        }
        match (self.screen, self.view_mode) {
            (Screen::Analysis, _) => self.analysis.as_ref().map_or(0, |a| a.picks().len()),
            (Screen::Browse, ViewMode::Explore) => self.visible_fixtures().len(),
            (Screen::Browse, ViewMode::Booking) => self.booking_matches.len(),
        }
    }

    fn selection_cursor(&mut self) -> &mut usize {
        if self.slip_overlay {
            return &mut self.slip_selected;
        }
        match (self.screen, self.view_mode) {
            (Screen::Analysis, _) => &mut self.analysis_selected,
            (Screen::Browse, ViewMode::Explore) => &mut self.selected,
            (Screen::Browse, ViewMode::Booking) => &mut self.booking_selected,
        }
    }

    pub fn analysis_title(&self) -> Option<String> {
        self.selected_match.as_ref().map(Match::title)
    }

    pub fn is_pick_in_slip(&self, market: &str, selection: &str) -> bool {
        let Some(title) = self.analysis_title() else {
            return false;
        };
        self.bet_slip.contains(&title, market, selection)
    }

    /// Adds or removes the highlighted analysis pick. Returns `Some(true)` when
    /// the pick was added.
    pub fn toggle_selected_pick(&mut self) -> Option<bool> {
        let title = self.analysis_title()?;
        let analysis = self.analysis.as_ref()?;
        let picks = analysis.picks();
        let pick = picks.get(self.analysis_selected)?;
        let selection = BetSelection::new(
            &title,
            &pick.market,
            &pick.detail.selection,
            pick.detail.confidence,
            Some(analysis.sport),
        );
        let label = format!("{}: {}", selection.market, selection.selection);
        let added = self.bet_slip.toggle(selection);
        if added {
            self.push_log(format!("[INFO] Added to slip: {label}"));
        } else {
            self.push_log(format!("[INFO] Removed from slip: {label}"));
        }
        Some(added)
    }

    pub fn remove_selected_slip_entry(&mut self) {
        let Some(id) = self
            .bet_slip
            .selections()
            .get(self.slip_selected)
            .map(|s| s.id.clone())
        else {
            return;
        };
        self.bet_slip.remove(&id);
        if self.slip_selected >= self.bet_slip.len() {
            self.slip_selected = self.bet_slip.len().saturating_sub(1);
        }
    }

    pub fn clear_slip(&mut self) {
        self.bet_slip.clear();
        self.slip_selected = 0;
    }

    pub fn advance_loading_message(&mut self) {
        self.loading_message = (self.loading_message + 1) % LOADING_MESSAGES.len();
    }

    pub fn loading_text(&self) -> Option<String> {
        match self.status {
            AppStatus::LoadingMatches => Some(format!("Fetching top {} fixtures...", self.sport.as_str())),
            AppStatus::ProcessingCode => Some("Deciphering booking code...".to_string()),
            AppStatus::Analyzing => Some(LOADING_MESSAGES[self.loading_message].to_string()),
            _ => None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::FixturesLoaded {
            generation,
            date,
            matches,
        } => {
            if generation != state.generations.fixtures {
                state.push_log("[INFO] Dropped stale fixtures response");
                return;
            }
            let received = matches.len();
            state.fixtures = fixtures::retain_on_date(matches, &date);
            let dropped = received - state.fixtures.len();
            if dropped > 0 {
                state.push_log(format!("[WARN] Dropped {dropped} fixtures not on {date}"));
            }
            state.push_log(format!(
                "[INFO] Loaded {} {} fixtures for {date}",
                state.fixtures.len(),
                state.sport.as_str()
            ));
            state.selected = 0;
            state.settle(AppStatus::LoadingMatches);
        }
        Delta::FixturesFailed {
            generation,
            sport,
            error,
        } => {
            if generation != state.generations.fixtures {
                return;
            }
            state.fixtures.clear();
            state.selected = 0;
            state.settle(AppStatus::LoadingMatches);
            state.error = Some(format!("Failed to load {} matches.", sport.as_str()));
            state.push_log(format!("[WARN] Fixture fetch failed: {error}"));
        }
        Delta::BookingDecoded {
            generation,
            matches,
        } => {
            if generation != state.generations.booking {
                state.push_log("[INFO] Dropped stale booking response");
                return;
            }
            state.push_log(format!(
                "[INFO] Booking code {} decoded into {} matches",
                state.booking_code,
                matches.len()
            ));
            state.booking_matches = matches;
            state.booking_selected = 0;
            state.booking_searched = true;
            state.settle(AppStatus::ProcessingCode);
        }
        Delta::BookingFailed { generation, error } => {
            if generation != state.generations.booking {
                return;
            }
            state.booking_matches.clear();
            state.booking_selected = 0;
            if state.status == AppStatus::ProcessingCode {
                state.status = AppStatus::Error;
            }
            state.error = Some("Failed to process booking code".to_string());
            state.push_log(format!("[WARN] Booking code failed: {error}"));
        }
        Delta::AnalysisReady {
            generation,
            analysis,
        } => {
            if generation != state.generations.analysis || state.selected_match.is_none() {
                state.push_log("[INFO] Dropped stale analysis response");
                return;
            }
            state.push_log(format!(
                "[INFO] Analysis ready ({} sources)",
                analysis.sources.len()
            ));
            state.analysis = Some(analysis);
            state.analysis_selected = 0;
            state.status = AppStatus::Complete;
            state.screen = Screen::Analysis;
        }
        Delta::AnalysisFailed { generation, error } => {
            if generation != state.generations.analysis || state.selected_match.is_none() {
                state.push_log(format!("[INFO] Dropped stale analysis failure: {error}"));
                return;
            }
            state.analysis = None;
            state.status = AppStatus::Error;
            state.error = Some("Analysis failed. Please try again later.".to_string());
            state.push_log(format!("[WARN] Analysis failed: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn manual_match_title_is_the_query() {
        let manual = Match::manual("  Lakers vs Celtics ", Sport::Basketball, "2024-10-27");
        assert!(manual.is_manual());
        assert_eq!(manual.title(), "Lakers vs Celtics");
        assert_eq!(manual.analysis_query(), "Lakers vs Celtics");
        assert_eq!(manual.league, MANUAL_LEAGUE);
    }

    #[test]
    fn shift_date_mints_new_fixture_generation() {
        let mut state = AppState::new(day(2024, 10, 27));
        let first = state.begin_fixture_fetch();
        let second = state.shift_date(1);
        assert_eq!(
            first,
            ProviderCommand::FetchFixtures {
                generation: 1,
                sport: Sport::Football,
                date: "2024-10-27".to_string(),
            }
        );
        assert_eq!(
            second,
            ProviderCommand::FetchFixtures {
                generation: 2,
                sport: Sport::Football,
                date: "2024-10-28".to_string(),
            }
        );
        assert_eq!(state.status, AppStatus::LoadingMatches);
    }

    #[test]
    fn blank_booking_code_is_ignored() {
        let mut state = AppState::new(day(2024, 10, 27));
        assert!(state.begin_booking_decode("   ").is_none());
        assert_eq!(state.generations.booking, 0);
        let cmd = state.begin_booking_decode(" bc8h2 ").expect("command");
        assert_eq!(
            cmd,
            ProviderCommand::DecodeBookingCode {
                generation: 1,
                code: "BC8H2".to_string(),
            }
        );
    }

    #[test]
    fn loading_messages_cycle() {
        let mut state = AppState::new(day(2024, 10, 27));
        state.status = AppStatus::Analyzing;
        for _ in 0..LOADING_MESSAGES.len() {
            state.advance_loading_message();
        }
        assert_eq!(state.loading_text().as_deref(), Some(LOADING_MESSAGES[0]));
        state.advance_loading_message();
        assert_eq!(state.loading_text().as_deref(), Some(LOADING_MESSAGES[1]));
    }

    #[test]
    fn dismiss_error_returns_to_idle() {
        let mut state = AppState::new(day(2024, 10, 27));
        state.status = AppStatus::Error;
        state.error = Some("boom".to_string());
        state.dismiss_error();
        assert_eq!(state.status, AppStatus::Idle);
        assert!(state.error.is_none());
    }
}
