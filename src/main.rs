use std::io;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};
use tracing::{info, warn};

use statimatch::config::{self, AppConfig};
use statimatch::demo_feed::DemoClient;
use statimatch::fixtures::FixtureSort;
use statimatch::gemini::{GeminiClient, ModelClient};
use statimatch::logging;
use statimatch::provider;
use statimatch::slip_export;
use statimatch::state::{
    AppState, AppStatus, Confidence, Delta, InputMode, Match, ProviderCommand, Screen, ViewMode,
    VisualKind, apply_delta,
};

const LOADING_STEP: Duration = Duration::from_millis(2500);

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    last_loading_step: Instant,
    detail_scroll: u16,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(Local::now().date_naive()),
            should_quit: false,
            cmd_tx,
            last_loading_step: Instant::now(),
            detail_scroll: 0,
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Provider unavailable");
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider request failed");
        }
    }

    fn send_opt(&mut self, cmd: Option<ProviderCommand>) {
        if let Some(cmd) = cmd {
            self.last_loading_step = Instant::now();
            self.detail_scroll = 0;
            self.send(cmd);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input_mode != InputMode::Normal {
            self.on_input_key(key);
            return;
        }
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') | KeyCode::Esc => self.state.help_overlay = false,
                _ => {}
            }
            return;
        }
        if self.state.slip_overlay {
            self.on_slip_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('e') => self.state.dismiss_error(),
            KeyCode::Char('p') => {
                self.state.slip_overlay = true;
                self.state.slip_selected = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            _ => match self.state.screen {
                Screen::Browse => self.on_browse_key(key),
                Screen::Analysis => self.on_analysis_key(key),
            },
        }
    }

    fn on_browse_key(&mut self, key: KeyEvent) {
        if self.state.status == AppStatus::Analyzing {
            if key.code == KeyCode::Esc {
                self.state.reset_analysis();
                self.state.push_log("[INFO] Analysis cancelled");
            }
            return;
        }
        match key.code {
            KeyCode::Char('t') => {
                let cmd = self.state.toggle_sport();
                self.send_opt(Some(cmd));
            }
            KeyCode::Char(']') => {
                let cmd = self.state.shift_date(1);
                self.send_opt(Some(cmd));
            }
            KeyCode::Char('[') => {
                let cmd = self.state.shift_date(-1);
                self.send_opt(Some(cmd));
            }
            KeyCode::Char('T') => {
                let cmd = self.state.reset_date();
                self.send_opt(Some(cmd));
            }
            KeyCode::Char('r') => {
                let cmd = self.state.begin_fixture_fetch();
                self.send_opt(Some(cmd));
            }
            KeyCode::Char('o') => self.state.toggle_sort(),
            KeyCode::Char('l') => self.state.cycle_league_filter(),
            KeyCode::Tab => self.state.toggle_view_mode(),
            KeyCode::Char('/') => self.start_input(InputMode::Filter),
            KeyCode::Char('m') => self.start_input(InputMode::ManualQuery),
            KeyCode::Char('c') => self.start_input(InputMode::BookingCode),
            KeyCode::Enter => {
                let cmd = self.state.begin_selected_analysis();
                self.send_opt(cmd);
            }
            _ => {}
        }
    }

    fn on_analysis_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') => {
                self.state.toggle_selected_pick();
            }
            KeyCode::Char('b') | KeyCode::Esc => {
                self.state.reset_analysis();
                self.detail_scroll = 0;
            }
            KeyCode::PageDown => self.detail_scroll = self.detail_scroll.saturating_add(5),
            KeyCode::PageUp => self.detail_scroll = self.detail_scroll.saturating_sub(5),
            _ => {}
        }
    }

    fn on_slip_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('p') | KeyCode::Esc => self.state.slip_overlay = false,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('x') => self.state.remove_selected_slip_entry(),
            KeyCode::Char('X') => {
                self.state.clear_slip();
                self.state.push_log("[INFO] Slip cleared");
            }
            KeyCode::Char('y') => match slip_export::copy_slip(&self.state.bet_slip) {
                Ok(outcome) => {
                    info!(?outcome, "slip exported");
                    self.state
                        .push_log(format!("[INFO] Slip {}", outcome.describe()));
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "slip export failed");
                    self.state.push_log(format!("[WARN] Slip copy failed: {err:#}"));
                }
            },
            _ => {}
        }
    }

    fn start_input(&mut self, mode: InputMode) {
        self.state.input_mode = mode;
        self.state.input_buffer = match mode {
            InputMode::Filter => self.state.fixture_filter.clone(),
            _ => String::new(),
        };
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let mode = self.state.input_mode;
        match key.code {
            KeyCode::Esc => {
                if mode == InputMode::Filter {
                    self.state.set_fixture_filter("");
                }
                self.state.input_mode = InputMode::Normal;
                self.state.input_buffer.clear();
            }
            KeyCode::Enter => {
                let buffer = std::mem::take(&mut self.state.input_buffer);
                self.state.input_mode = InputMode::Normal;
                match mode {
                    InputMode::ManualQuery => {
                        let cmd = self.state.begin_manual_analysis(&buffer);
                        self.send_opt(cmd);
                    }
                    InputMode::BookingCode => {
                        self.state.view_mode = ViewMode::Booking;
                        let cmd = self.state.begin_booking_decode(&buffer);
                        self.send_opt(cmd);
                    }
                    InputMode::Filter | InputMode::Normal => {}
                }
            }
            KeyCode::Backspace => {
                self.state.input_buffer.pop();
                if mode == InputMode::Filter {
                    let text = self.state.input_buffer.clone();
                    self.state.set_fixture_filter(&text);
                }
            }
            KeyCode::Char(c) => {
                let c = if mode == InputMode::BookingCode {
                    c.to_ascii_uppercase()
                } else {
                    c
                };
                self.state.input_buffer.push(c);
                if mode == InputMode::Filter {
                    let text = self.state.input_buffer.clone();
                    self.state.set_fixture_filter(&text);
                }
            }
            _ => {}
        }
    }

    fn on_tick(&mut self) {
        if self.state.status != AppStatus::Analyzing {
            self.last_loading_step = Instant::now();
            return;
        }
        if self.last_loading_step.elapsed() >= LOADING_STEP {
            self.state.advance_loading_message();
            self.last_loading_step = Instant::now();
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    let log_dir = config::log_dir();
    let _log_guard = match logging::init_logging(&log_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("warning: logging disabled: {err}");
            None
        }
    };
    info!(demo = config.demo, model = %config.analysis_model, "starting statimatch");

    let mut startup_notes = Vec::new();
    let client: Arc<dyn ModelClient> = if config.demo {
        startup_notes.push("[INFO] Demo mode: answers are canned, set GEMINI_API_KEY for live data");
        Arc::new(DemoClient::default())
    } else {
        match GeminiClient::new(&config) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "live client unavailable, using demo feed");
                startup_notes.push("[WARN] Live client unavailable, running demo feed");
                Arc::new(DemoClient::default())
            }
        }
    };

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    provider::spawn_provider(client, config, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(Some(cmd_tx));
    for note in startup_notes {
        app.state.push_log(note);
    }
    app.state
        .push_log(format!("[INFO] Logs: {}", log_dir.display()));
    let first = app.state.begin_fixture_fetch();
    app.send(first);

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    info!("statimatch exited");
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let banner_height = if state.error.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if let Some(error) = &state.error {
        let banner = Paragraph::new(format!(" ! {error}  (e to dismiss)"))
            .style(Style::default().fg(Color::White).bg(Color::Red));
        frame.render_widget(banner, chunks[1]);
    }

    match state.screen {
        Screen::Browse => match state.view_mode {
            ViewMode::Explore => render_explore(frame, chunks[2], state),
            ViewMode::Booking => render_booking(frame, chunks[2], state),
        },
        Screen::Analysis => render_analysis(frame, chunks[2], state, app.detail_scroll),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, chunks[4]);

    if let Some(text) = state.loading_text() {
        render_loading_overlay(frame, chunks[2], &text);
    }
    if state.slip_overlay {
        render_slip_overlay(frame, frame.size(), state);
    }
    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let date = if state.selected_date == state.today {
        format!("{} (Today)", state.selected_date_str())
    } else {
        state.selected_date_str()
    };
    let title = match state.screen {
        Screen::Browse => format!(
            "STATIMATCH | {} | {} | {} | Sort: {} | League: {} | Slip: {}",
            state.sport.as_str().to_uppercase(),
            date,
            view_mode_label(state.view_mode),
            sort_label(state.sort),
            state.league_filter.as_deref().unwrap_or("All"),
            state.bet_slip.len()
        ),
        Screen::Analysis => format!(
            "STATIMATCH ANALYSIS | {} | Slip: {}",
            state.analysis_title().unwrap_or_default(),
            state.bet_slip.len()
        ),
    };
    format!("  (o)  {title}\n  /|\\\n  / \\")
}

fn footer_text(state: &AppState) -> String {
    match state.input_mode {
        InputMode::Filter => return format!("Filter: {}_  (Enter keep | Esc clear)", state.input_buffer),
        InputMode::ManualQuery => {
            return format!("Match to analyze: {}_  (Enter analyze | Esc cancel)", state.input_buffer);
        }
        InputMode::BookingCode => {
            return format!("Booking code: {}_  (Enter decode | Esc cancel)", state.input_buffer);
        }
        InputMode::Normal => {}
    }
    if state.slip_overlay {
        return "j/k Move | x Remove | X Clear | y Copy | p/Esc Close".to_string();
    }
    match state.screen {
        Screen::Browse if state.status == AppStatus::Analyzing => {
            "Esc Cancel analysis | q Quit".to_string()
        }
        Screen::Browse => {
            "j/k Move | Enter Analyze | t Sport | [/] Date | T Today | / Filter | l League | o Sort | m Manual | Tab View | c Code | p Slip | ? Help | q Quit".to_string()
        }
        Screen::Analysis => {
            "j/k Move | Space Add/Remove | PgUp/PgDn Scroll | b/Esc Back | p Slip | ? Help | q Quit".to_string()
        }
    }
}

fn render_explore(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let filter = if state.fixture_filter.is_empty() {
        "Filter: -".to_string()
    } else {
        format!("Filter: {}", state.fixture_filter)
    };
    let chips = statimatch::fixtures::league_chips(&state.fixtures);
    let chip_spans = std::iter::once(Span::raw(format!("{filter} | Leagues: ")))
        .chain(chips.iter().map(|league| {
            let active = state.league_filter.as_deref() == Some(league.as_str());
            let style = if active {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::Cyan)
            };
            Span::styled(format!(" {league} "), style)
        }))
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(Line::from(chip_spans)), sections[0]);

    let groups = state.fixture_groups();
    let list_area = sections[1];
    if groups.is_empty() {
        let msg = match state.status {
            AppStatus::LoadingMatches => "Loading fixtures...",
            _ if state.fixtures.is_empty() => {
                "No matches found for this date. Press m to analyze a match by name."
            }
            _ => "No matches for this filter",
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let mut lines = Vec::new();
    let mut selected_line = 0usize;
    let mut idx = 0usize;
    for group in &groups {
        lines.push(Line::styled(
            format!("{} ({})", group.label, group.matches.len()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for m in &group.matches {
            let selected = idx == state.selected;
            if selected {
                selected_line = lines.len();
            }
            lines.push(fixture_line(m, selected, None));
            idx += 1;
        }
    }
    let offset = scroll_offset(selected_line, lines.len(), list_area.height as usize);
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), list_area);
}

fn render_booking(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let code = if state.booking_code.is_empty() {
        "Booking code: - (press c to enter one)".to_string()
    } else {
        format!("Booking code: {}", state.booking_code)
    };
    frame.render_widget(Paragraph::new(code), sections[0]);

    let list_area = sections[1];
    if state.booking_matches.is_empty() {
        let msg = if state.booking_searched {
            "No matches found for this code."
        } else {
            "Enter a booking code to load its selections."
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let lines = state
        .booking_matches
        .iter()
        .enumerate()
        .map(|(idx, m)| fixture_line(m, idx == state.booking_selected, m.booking_prediction.as_deref()))
        .collect::<Vec<_>>();
    let offset = scroll_offset(state.booking_selected, lines.len(), list_area.height as usize);
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), list_area);
}

fn fixture_line<'a>(m: &Match, selected: bool, pick: Option<&str>) -> Line<'a> {
    let base = if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::styled(if selected { "> " } else { "  " }, base),
        Span::styled(format!("{:<6}", m.time.as_deref().unwrap_or("--:--")), base),
        Span::styled(format!("{:<44}", m.title()), base.add_modifier(Modifier::BOLD)),
        Span::styled(format!("{:<22}", m.league), base.fg(Color::Cyan)),
    ];
    if let Some(pick) = pick {
        spans.push(Span::styled(format!("[{pick}] "), base.fg(Color::Yellow)));
        spans.push(Span::styled(m.sport.as_str().to_string(), base.fg(Color::DarkGray)));
    }
    Line::from(spans)
}

fn render_analysis(frame: &mut Frame, area: Rect, state: &AppState, scroll: u16) {
    let Some(analysis) = &state.analysis else {
        let empty = Paragraph::new("No analysis loaded").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(10)])
        .split(columns[1]);

    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();
    for (title, body) in [
        ("Match Overview", &analysis.match_overview),
        ("Form Guide", &analysis.form_guide),
        ("Tactical Analysis", &analysis.tactical_analysis),
        ("Officiating", &analysis.referee_analysis),
    ] {
        lines.push(Line::styled(title, heading));
        lines.push(Line::raw(body.clone()));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled("Sources", heading));
    if analysis.sources.is_empty() {
        lines.push(Line::styled("No sources returned", Style::default().fg(Color::DarkGray)));
    }
    for source in &analysis.sources {
        lines.push(Line::raw(format!("- {} <{}>", source.title, source.uri)));
    }
    let detail = Paragraph::new(lines)
        .block(Block::default().title("Report").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0));
    frame.render_widget(detail, columns[0]);

    render_picks(frame, right[0], state);
    render_visualization(frame, right[1], state);
}

fn render_picks(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(analysis) = &state.analysis else {
        return;
    };
    let mut lines = Vec::new();
    let mut selected_line = 0usize;
    for (idx, pick) in analysis.picks().iter().enumerate() {
        let selected = idx == state.analysis_selected;
        if selected {
            selected_line = lines.len();
        }
        let in_slip = state.is_pick_in_slip(&pick.market, &pick.detail.selection);
        let base = if selected {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let title_style = if pick.best_bet {
            base.fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            base.add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(vec![
            Span::styled(if in_slip { "[x] " } else { "[ ] " }, base.fg(Color::Green)),
            Span::styled(format!("{} ({})", pick.title, pick.market), title_style),
            Span::styled(
                format!(" {}", pick.detail.confidence.as_str()),
                base.fg(confidence_color(pick.detail.confidence)),
            ),
        ]));
        lines.push(Line::styled(format!("    {}", pick.detail.selection), base));
        if selected {
            lines.push(Line::styled(
                format!("    {}", pick.detail.reasoning),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    let inner_height = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset(selected_line, lines.len(), inner_height);
    let picks = Paragraph::new(lines)
        .block(Block::default().title("Predictions").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(picks, area);
}

fn render_visualization(frame: &mut Frame, area: Rect, state: &AppState) {
    let viz = state.analysis.as_ref().and_then(|a| a.visualization.as_ref());
    let Some(viz) = viz else {
        let empty = Paragraph::new("No chart data")
            .block(Block::default().title("Chart").borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };

    let title = match viz.kind {
        VisualKind::Momentum => "Momentum (home green / away red)",
        VisualKind::Trend => "Last games points (home green / away red)",
    };
    let max = viz
        .home
        .iter()
        .chain(viz.away.iter())
        .fold(0.0_f64, |acc, v| acc.max(*v))
        .ceil()
        .max(1.0) as u64;

    let mut chart = BarChart::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .bar_width(2)
        .bar_gap(0)
        .group_gap(2)
        .max(max);
    for (idx, label) in viz.labels.iter().enumerate() {
        let mut bars = Vec::with_capacity(2);
        if let Some(home) = viz.home.get(idx) {
            bars.push(
                Bar::default()
                    .value(home.max(0.0).round() as u64)
                    .text_value(String::new())
                    .style(Style::default().fg(Color::Green)),
            );
        }
        if let Some(away) = viz.away.get(idx) {
            bars.push(
                Bar::default()
                    .value(away.max(0.0).round() as u64)
                    .text_value(String::new())
                    .style(Style::default().fg(Color::Red)),
            );
        }
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(label.clone()))
                .bars(&bars),
        );
    }
    frame.render_widget(chart, area);
}

fn render_loading_overlay(frame: &mut Frame, area: Rect, text: &str) {
    let popup = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup);
    let body = Paragraph::new(format!("\n{text}"))
        .alignment(Alignment::Center)
        .block(Block::default().title("Working").borders(Borders::ALL));
    frame.render_widget(body, popup);
}

fn render_slip_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);
    let title = format!("Bet Slip ({})", state.bet_slip.len());
    if state.bet_slip.is_empty() {
        let empty = Paragraph::new("Your slip is empty. Add picks from an analysis with Space.")
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, popup);
        return;
    }
    let mut lines = Vec::new();
    for (idx, entry) in state.bet_slip.selections().iter().enumerate() {
        let base = if idx == state.slip_selected {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            entry.match_title.clone(),
            base.add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::from(vec![
            Span::styled(format!("  {}: {} ", entry.market, entry.selection), base),
            Span::styled(
                format!("({})", entry.confidence.as_str()),
                base.fg(confidence_color(entry.confidence)),
            ),
        ]));
    }
    let offset = scroll_offset(
        state.slip_selected * 2,
        lines.len(),
        popup.height.saturating_sub(2) as usize,
    );
    let list = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .scroll((offset, 0));
    frame.render_widget(list, popup);
}

/// First line to show so `selected` stays on screen.
fn scroll_offset(selected: usize, total: usize, visible: usize) -> u16 {
    if visible == 0 || total <= visible {
        return 0;
    }
    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    start.min(u16::MAX as usize) as u16
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn confidence_color(confidence: Confidence) -> Color {
    match confidence {
        Confidence::High => Color::Green,
        Confidence::Medium => Color::Yellow,
        Confidence::Low => Color::Red,
    }
}

fn sort_label(sort: FixtureSort) -> &'static str {
    match sort {
        FixtureSort::Importance => "RANKED",
        FixtureSort::Date => "DATE",
    }
}

fn view_mode_label(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Explore => "EXPLORE",
        ViewMode::Booking => "BOOKING",
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "StatiMatch - Help",
        "",
        "Global:",
        "  j/k or ↑/↓   Move",
        "  p            Bet slip",
        "  e            Dismiss error",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Fixtures:",
        "  Enter        Analyze selected match",
        "  t            Football / basketball",
        "  [ / ]        Previous / next day",
        "  T            Back to today",
        "  r            Refresh",
        "  /            Filter by team or league",
        "  l            Cycle league filter",
        "  o            Ranked / by date",
        "  m            Analyze a match by name",
        "  Tab          Explore / booking code view",
        "  c            Enter a booking code",
        "",
        "Analysis:",
        "  Space        Add / remove pick",
        "  PgUp/PgDn    Scroll report",
        "  b / Esc      Back",
        "",
        "Slip:",
        "  x / X        Remove / clear",
        "  y            Copy to clipboard",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
