use std::io;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::aggregate::AggregationService;
use crate::controller::{QueryController, Selection};
use crate::domain::Metric;
use crate::output::format_count;

const WHOLE_COUNTRY: &str = "(whole country)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Countries,
    States,
}

/// Interactive dashboard: country and state selectors on the left, the
/// three counter cards on the right, all driven through `QueryController`.
pub struct Dashboard {
    controller: QueryController,
    countries: Vec<String>,
    focus: Focus,
    country_filter: String,
    state_filter: String,
    country_cursor: usize,
    state_cursor: usize,
}

pub fn run_dashboard(service: AggregationService) -> miette::Result<()> {
    let mut dashboard = Dashboard::new(service);

    let mut stdout = io::stdout();
    enable_raw_mode().into_diagnostic()?;
    stdout.execute(EnterAlternateScreen).into_diagnostic()?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).into_diagnostic()?;
    terminal.clear().into_diagnostic()?;

    let result = dashboard.event_loop(&mut terminal);

    disable_raw_mode().into_diagnostic()?;
    let mut stdout = io::stdout();
    stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
    result
}

impl Dashboard {
    fn new(service: AggregationService) -> Self {
        let countries = service
            .dataset()
            .regions()
            .countries()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            controller: QueryController::new(service),
            countries,
            focus: Focus::Countries,
            country_filter: String::new(),
            state_filter: String::new(),
            country_cursor: 0,
            state_cursor: 0,
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        loop {
            terminal
                .draw(|frame| draw_ui(frame, self))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Returns true when the dashboard should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match key.code {
            KeyCode::Esc => {
                if !self.focused_filter().is_empty() {
                    self.focused_filter_mut().clear();
                    self.clamp_cursors();
                } else if !matches!(self.controller.selection(), Selection::Idle) {
                    self.controller.clear_country();
                    self.focus = Focus::Countries;
                    self.state_filter.clear();
                    self.state_cursor = 0;
                } else {
                    return true;
                }
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Countries if self.controller.country().is_some() => Focus::States,
                    Focus::Countries => Focus::Countries,
                    Focus::States => Focus::Countries,
                };
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Enter => self.apply_selection(),
            KeyCode::Backspace => {
                self.focused_filter_mut().pop();
                self.clamp_cursors();
            }
            KeyCode::Char(ch) => {
                self.focused_filter_mut().push(ch);
                self.clamp_cursors();
            }
            _ => {}
        }
        false
    }

    fn apply_selection(&mut self) {
        match self.focus {
            Focus::Countries => {
                let Some(country) = self.filtered_countries().get(self.country_cursor).cloned()
                else {
                    return;
                };
                self.controller.select_country(&country);
                self.state_filter.clear();
                self.state_cursor = 0;
                if !self.controller.state_options().is_empty() {
                    self.focus = Focus::States;
                }
            }
            Focus::States => {
                let Some(option) = self.filtered_states().get(self.state_cursor).cloned() else {
                    return;
                };
                if option == WHOLE_COUNTRY {
                    self.controller.select_state(None);
                } else {
                    self.controller.select_state(Some(&option));
                }
            }
        }
    }

    fn filtered_countries(&self) -> Vec<String> {
        filter_items(self.countries.iter().map(String::as_str), &self.country_filter)
    }

    /// State options plus the leading whole-country sentinel, matching the
    /// "state is optional" input boundary.
    fn filtered_states(&self) -> Vec<String> {
        let mut items = vec![WHOLE_COUNTRY.to_string()];
        items.extend(filter_items(
            self.controller.state_options().iter().map(String::as_str),
            &self.state_filter,
        ));
        items
    }

    fn move_cursor(&mut self, delta: i64) {
        let len = match self.focus {
            Focus::Countries => self.filtered_countries().len(),
            Focus::States => self.filtered_states().len(),
        };
        let cursor = match self.focus {
            Focus::Countries => &mut self.country_cursor,
            Focus::States => &mut self.state_cursor,
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        let next = (*cursor as i64 + delta).clamp(0, len as i64 - 1);
        *cursor = next as usize;
    }

    fn clamp_cursors(&mut self) {
        let countries = self.filtered_countries().len();
        self.country_cursor = self.country_cursor.min(countries.saturating_sub(1));
        let states = self.filtered_states().len();
        self.state_cursor = self.state_cursor.min(states.saturating_sub(1));
    }

    fn focused_filter(&self) -> &str {
        match self.focus {
            Focus::Countries => &self.country_filter,
            Focus::States => &self.state_filter,
        }
    }

    fn focused_filter_mut(&mut self) -> &mut String {
        match self.focus {
            Focus::Countries => &mut self.country_filter,
            Focus::States => &mut self.state_filter,
        }
    }
}

fn filter_items<'a>(items: impl Iterator<Item = &'a str>, filter: &str) -> Vec<String> {
    let needle = filter.to_lowercase();
    items
        .filter(|item| needle.is_empty() || item.to_lowercase().contains(&needle))
        .map(str::to_string)
        .collect()
}

fn draw_ui(frame: &mut ratatui::Frame, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(2),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(dashboard), chunks[0]);

    let selectors = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    frame.render_widget(draw_country_pane(dashboard, selectors[0].height), selectors[0]);
    frame.render_widget(draw_state_pane(dashboard, selectors[1].height), selectors[1]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(chunks[2]);
    for (idx, metric) in Metric::ALL.into_iter().enumerate() {
        frame.render_widget(draw_counter_card(dashboard, metric), cards[idx]);
    }

    frame.render_widget(draw_footer(dashboard), chunks[3]);
}

fn draw_header(dashboard: &Dashboard) -> Paragraph<'static> {
    let as_of = dashboard
        .controller
        .service()
        .dataset()
        .as_of()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let title = Line::from(vec![
        Span::styled(
            "COVIDVIEW",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("   Data as of {as_of} (Johns Hopkins CSSE)"),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let lead = Line::from(Span::styled(
        "Country & state breakdown of total confirmed cases, recoveries and deaths.",
        Style::default().fg(Color::Gray),
    ));
    Paragraph::new(vec![title, lead])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_country_pane(dashboard: &Dashboard, height: u16) -> Paragraph<'static> {
    let focused = dashboard.focus == Focus::Countries;
    let title = match dashboard.controller.country() {
        Some(country) => format!("Country: {country}"),
        None => "Country".to_string(),
    };
    draw_selector(
        title,
        &dashboard.filtered_countries(),
        dashboard.country_cursor,
        &dashboard.country_filter,
        focused,
        height,
    )
}

fn draw_state_pane(dashboard: &Dashboard, height: u16) -> Paragraph<'static> {
    let focused = dashboard.focus == Focus::States;
    let title = match dashboard.controller.selection() {
        Selection::CountryState(_, state) => format!("State/Province: {state}"),
        _ => "State/Province".to_string(),
    };
    if dashboard.controller.country().is_none() {
        return Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Select a country first",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(pane_block(title, focused));
    }
    draw_selector(
        title,
        &dashboard.filtered_states(),
        dashboard.state_cursor,
        &dashboard.state_filter,
        focused,
        height,
    )
}

fn draw_selector(
    title: String,
    items: &[String],
    cursor: usize,
    filter: &str,
    focused: bool,
    height: u16,
) -> Paragraph<'static> {
    let mut lines = vec![Line::from(vec![
        Span::styled("Filter: ", Style::default().fg(Color::Gray)),
        Span::styled(filter.to_string(), Style::default().fg(Color::White)),
        Span::styled(if focused { "_" } else { "" }, Style::default().fg(Color::Cyan)),
    ])];

    let visible = (height as usize).saturating_sub(3).max(1);
    let start = if cursor >= visible {
        cursor + 1 - visible
    } else {
        0
    };
    for (offset, item) in items.iter().skip(start).take(visible).enumerate() {
        let selected = start + offset == cursor;
        let style = if selected && focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        let prefix = if selected { "> " } else { "  " };
        lines.push(Line::from(Span::styled(format!("{prefix}{item}"), style)));
    }
    if items.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (no matches)",
            Style::default().fg(Color::DarkGray),
        )));
    }

    Paragraph::new(lines).block(pane_block(title, focused))
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

fn draw_counter_card(dashboard: &Dashboard, metric: Metric) -> Paragraph<'static> {
    let (title, color) = match metric {
        Metric::Confirmed => ("Total Confirmed Cases", Color::Cyan),
        Metric::Recovered => ("Total Recovered Cases", Color::Green),
        Metric::Deaths => ("Total Deaths", Color::Red),
    };
    let value = match dashboard.controller.totals() {
        Some(totals) => Span::styled(
            format_count(totals.get(metric)),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("--", Style::default().fg(Color::DarkGray)),
    };
    let lines = vec![
        Line::from(""),
        Line::from(value),
        Line::from(""),
        Line::from(Span::styled(
            region_label(dashboard),
            Style::default().fg(Color::Gray),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, Style::default().fg(color))),
        )
}

fn region_label(dashboard: &Dashboard) -> String {
    let regions = dashboard.controller.service().dataset().regions();
    match dashboard.controller.selection() {
        Selection::Idle => "select a country".to_string(),
        Selection::Country(country) => {
            match regions.info(country, None).and_then(|info| info.population) {
                Some(population) => format!("{country} · pop {}", format_count(population)),
                None => country.clone(),
            }
        }
        Selection::CountryState(country, state) => {
            let info = regions.info(country, Some(state));
            match info.and_then(|info| info.combined_name.clone()) {
                Some(name) => name,
                None => format!("{state}, {country}"),
            }
        }
    }
}

fn draw_footer(dashboard: &Dashboard) -> Paragraph<'static> {
    let hint = match dashboard.controller.selection() {
        Selection::Idle => "Type to filter · Up/Down move · Enter select country · Esc quit",
        _ => "Tab switch pane · Enter apply · Esc clear selection, Esc again quit",
    };
    Paragraph::new(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    )))
    .block(Block::default().borders(Borders::TOP))
}
