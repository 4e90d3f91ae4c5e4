use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

use crate::anim::{AnimTimings, AnimationCoordinator};
use crate::app::App;
use crate::batch::{BatchMessage, BatchOrchestrator, SelectionState, spawn_batch};
use crate::domain::{FetchOutcome, PokemonId, PokemonRecord};
use crate::fetch::{FetchMessage, FetchOrchestrator, FetchPhase, PhaseKind, spawn_fetch};
use crate::pokeapi::CatalogueClient;

const TICK: Duration = Duration::from_millis(30);
const SPINNER: &[char] = &['|', '/', '-', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Home,
    Detail,
    Starters,
    Help,
}

struct DetailScreen<C: CatalogueClient + 'static> {
    client: Arc<C>,
    machine: FetchOrchestrator,
    anim: AnimationCoordinator,
    tx: Sender<FetchMessage>,
    rx: Receiver<FetchMessage>,
}

impl<C: CatalogueClient + 'static> DetailScreen<C> {
    fn new(client: Arc<C>, id: PokemonId, floor: Duration, timings: AnimTimings) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            machine: FetchOrchestrator::new(id, floor),
            anim: AnimationCoordinator::new(timings),
            tx,
            rx,
        }
    }

    fn pump(&mut self, now: Instant) {
        while let Ok(message) = self.rx.try_recv() {
            self.machine.settle(message.generation, message.outcome);
        }
        let from = self.machine.phase().kind();
        if let Some(to) = self.machine.poll(now) {
            self.anim.phase_changed(from, to, now);
        }
    }

    fn request(&mut self, now: Instant) {
        let from = self.machine.phase().kind();
        if self.machine.request_confirmation() {
            self.anim
                .phase_changed(from, PhaseKind::AwaitingConfirmation, now);
        }
    }

    fn confirm(&mut self, now: Instant) {
        if let Some(ticket) = self.machine.confirm(now) {
            self.anim
                .phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, now);
            spawn_fetch(Arc::clone(&self.client), ticket, self.tx.clone());
        }
    }

    fn cancel(&mut self) {
        self.machine.cancel_confirmation();
    }
}

struct StarterScreen {
    batch: BatchOrchestrator,
    selection: SelectionState,
    anim: AnimationCoordinator,
    rx: Receiver<BatchMessage>,
}

impl StarterScreen {
    fn new<C: CatalogueClient + 'static>(
        client: Arc<C>,
        starters: Vec<PokemonId>,
        timings: AnimTimings,
        now: Instant,
    ) -> Self {
        let mut batch = BatchOrchestrator::new(starters);
        let mut anim = AnimationCoordinator::new(timings);
        let (tx, rx) = mpsc::channel();
        anim.phase_changed(PhaseKind::Idle, PhaseKind::InFlight, now);
        if let Some(tickets) = batch.start() {
            spawn_batch(client, tickets, tx);
        }
        Self {
            batch,
            selection: SelectionState::default(),
            anim,
            rx,
        }
    }

    fn pump(&mut self, now: Instant) {
        while let Ok(message) = self.rx.try_recv() {
            let was_ready = self.batch.result().is_some();
            self.batch
                .settle(message.generation, &message.id, message.outcome);
            if !was_ready {
                if let Some(result) = self.batch.result() {
                    self.anim
                        .phase_changed(PhaseKind::InFlight, result.phase_kind(), now);
                }
            }
        }
    }

    fn select_index(&mut self, index: usize) {
        let Some(id) = self.batch.ids().get(index).cloned() else {
            return;
        };
        if let Some(result) = self.batch.result() {
            self.selection.select(result, &id);
        }
    }

    fn select_step(&mut self, forward: bool) {
        let Some(result) = self.batch.result() else {
            return;
        };
        let ids = self.batch.ids();
        let len = ids.len();
        if len == 0 {
            return;
        }
        let anchor = self
            .selection
            .selected_id()
            .and_then(|selected| ids.iter().position(|id| id == selected));
        let mut candidates = Vec::with_capacity(len);
        for offset in 1..=len {
            let index = match (anchor, forward) {
                (Some(at), true) => (at + offset) % len,
                (Some(at), false) => (at + len - offset % len) % len,
                (None, _) => offset - 1,
            };
            candidates.push(index);
        }
        for index in candidates {
            let id = ids[index].clone();
            if matches!(result.get(&id), Some(FetchOutcome::Success(_))) {
                self.selection.select(result, &id);
                return;
            }
        }
    }
}

pub struct Tui<C: CatalogueClient + 'static> {
    app: App<C>,
    view: View,
    detail: Option<DetailScreen<C>>,
    starters: Option<StarterScreen>,
}

impl<C: CatalogueClient + 'static> Tui<C> {
    pub fn new(app: App<C>) -> Self {
        Self {
            app,
            view: View::Home,
            detail: None,
            starters: None,
        }
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        let mut tick = 0usize;
        loop {
            let now = Instant::now();
            if let Some(screen) = self.detail.as_mut() {
                screen.pump(now);
            }
            if let Some(screen) = self.starters.as_mut() {
                screen.pump(now);
            }

            terminal
                .draw(|frame| self.draw(frame, now, tick))
                .into_diagnostic()?;

            if event::poll(TICK).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key, Instant::now()) {
                        return Ok(());
                    }
                }
            }

            tick = tick.wrapping_add(1);
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame, now: Instant, tick: usize) {
        match self.view {
            View::Home => draw_home(frame, self.app.config().default_pokemon.as_str(), tick),
            View::Detail => {
                if let Some(screen) = self.detail.as_ref() {
                    draw_detail(frame, screen, now);
                }
            }
            View::Starters => {
                if let Some(screen) = self.starters.as_ref() {
                    draw_starters(frame, screen, now, tick);
                }
            }
            View::Help => draw_help(frame),
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        match self.view {
            View::Home => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Char('f') => self.open_detail(),
                KeyCode::Char('s') => self.open_starters(),
                KeyCode::Char('h') | KeyCode::Char('?') => self.view = View::Help,
                _ => {}
            },
            View::Detail => {
                let Some(screen) = self.detail.as_mut() else {
                    self.view = View::Home;
                    return false;
                };
                if screen.machine.phase().kind() == PhaseKind::AwaitingConfirmation {
                    match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => screen.confirm(now),
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => screen.cancel(),
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => return true,
                        KeyCode::Char('f') => screen.request(now),
                        KeyCode::Esc => {
                            self.detail = None;
                            self.view = View::Home;
                        }
                        _ => {}
                    }
                }
            }
            View::Starters => {
                let Some(screen) = self.starters.as_mut() else {
                    self.view = View::Home;
                    return false;
                };
                match key.code {
                    KeyCode::Char('q') => return true,
                    KeyCode::Esc => {
                        self.starters = None;
                        self.view = View::Home;
                    }
                    KeyCode::Left => screen.select_step(false),
                    KeyCode::Right => screen.select_step(true),
                    KeyCode::Char(ch) if ch.is_ascii_digit() => {
                        if let Some(index) = ch.to_digit(10).map(|digit| digit as usize) {
                            if index >= 1 {
                                screen.select_index(index - 1);
                            }
                        }
                    }
                    _ => {}
                }
            }
            View::Help => match key.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Char('h') => self.view = View::Home,
                _ => {}
            },
        }
        false
    }

    pub fn open_detail(&mut self) {
        let id = self.app.config().default_pokemon.clone();
        let floor = self.app.config().floor;
        let timings = self.app.config().anim;
        self.detail = Some(DetailScreen::new(
            Arc::clone(self.app.client()),
            id,
            floor,
            timings,
        ));
        self.view = View::Detail;
    }

    pub fn open_starters(&mut self) {
        let starters = self.app.config().starters.clone();
        let timings = self.app.config().anim;
        self.starters = Some(StarterScreen::new(
            Arc::clone(self.app.client()),
            starters,
            timings,
            Instant::now(),
        ));
        self.view = View::Starters;
    }
}

fn draw_home(frame: &mut ratatui::Frame, default_pokemon: &str, tick: usize) {
    let chunks = base_layout(frame.area());
    frame.render_widget(draw_header("HOME", tick), chunks[0]);

    let menu = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("[f] ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("Fetch {default_pokemon}")),
        ]),
        Line::from(vec![
            Span::styled("[s] ", Style::default().fg(Color::Cyan)),
            Span::raw("Starter batch"),
        ]),
        Line::from(vec![
            Span::styled("[h] ", Style::default().fg(Color::Cyan)),
            Span::raw("Help"),
        ]),
        Line::from(vec![
            Span::styled("[q] ", Style::default().fg(Color::Cyan)),
            Span::raw("Quit"),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(menu, chunks[1]);

    draw_footer(frame, chunks[2], "f fetch · s starters · h help · q quit");
}

fn draw_detail<C: CatalogueClient + 'static>(
    frame: &mut ratatui::Frame,
    screen: &DetailScreen<C>,
    now: Instant,
) {
    let chunks = base_layout(frame.area());
    frame.render_widget(draw_header("DETAIL", 0), chunks[0]);

    match screen.machine.phase() {
        FetchPhase::AwaitingConfirmation { prior } => {
            draw_detail_body(frame, chunks[1], screen.machine.id(), prior, &screen.anim, now);
            draw_footer(frame, chunks[2], "y confirm · n cancel");
            draw_confirm_popup(frame, screen.machine.id());
        }
        phase => {
            draw_detail_body(frame, chunks[1], screen.machine.id(), phase, &screen.anim, now);
            let hint = match phase.kind() {
                PhaseKind::InFlight => "esc back · q quit",
                _ => "f fetch · esc back · q quit",
            };
            draw_footer(frame, chunks[2], hint);
        }
    }
}

fn draw_detail_body(
    frame: &mut ratatui::Frame,
    area: Rect,
    id: &PokemonId,
    phase: &FetchPhase,
    anim: &AnimationCoordinator,
    now: Instant,
) {
    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    match phase {
        FetchPhase::Idle => {
            let text = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No data yet.",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(text, body[0]);
            draw_fetch_button(frame, body[1], &button_label(id), anim.button_scale(now));
        }
        FetchPhase::InFlight { .. } => {
            let ratio = anim.progress(now).unwrap_or(0.0);
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2),
                    Constraint::Length(3),
                    Constraint::Min(1),
                ])
                .split(body[0]);
            let label = Paragraph::new(Line::from(Span::styled(
                format!("Fetching {}...", id.as_str()),
                Style::default().fg(Color::Gray),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(label, rows[0]);
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Loading"))
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(ratio);
            frame.render_widget(gauge, centered_rect(rows[1], 40, 3));
        }
        FetchPhase::Succeeded(record) => {
            draw_record_card(frame, body[0], record, anim.reveal(now));
            draw_fetch_button(frame, body[1], "[ Fetch again ]", anim.button_scale(now));
        }
        FetchPhase::Failed(reason) => {
            let text = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Error: {reason}"),
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(
                    "Press f to try again.",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(text, body[0]);
            draw_fetch_button(frame, body[1], &button_label(id), anim.button_scale(now));
        }
        FetchPhase::AwaitingConfirmation { prior } => {
            draw_detail_body(frame, area, id, prior, anim, now);
        }
    }
}

fn draw_record_card(frame: &mut ratatui::Frame, area: Rect, record: &PokemonRecord, reveal: f64) {
    let level = (255.0 * reveal) as u8;
    let faded = Style::default().fg(Color::Rgb(level, level, level));
    let card = Paragraph::new(vec![
        Line::from(Span::styled(
            record.display_name(),
            faded.add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("Weight: {}", record.weight), faded)),
        Line::from(Span::styled(format!("Height: {}", record.height), faded)),
        Line::from(Span::styled(
            format!("Base XP: {}", record.base_experience),
            faded,
        )),
        Line::from(Span::styled(
            format!(
                "Sprite: {}",
                record.sprite.as_deref().unwrap_or("n/a")
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .wrap(Wrap { trim: true });
    frame.render_widget(card, centered_rect(area, 48, 9));
}

fn draw_starters(frame: &mut ratatui::Frame, screen: &StarterScreen, now: Instant, tick: usize) {
    let chunks = base_layout(frame.area());
    frame.render_widget(draw_header("STARTERS", tick), chunks[0]);

    match screen.batch.result() {
        None => {
            let spinner = SPINNER[tick % SPINNER.len()];
            let text = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Loading starters... {spinner}"),
                    Style::default().fg(Color::Gray),
                )),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(text, chunks[1]);
            draw_footer(frame, chunks[2], "esc back · q quit");
        }
        Some(result) => {
            if let Some(message) = result.aggregate_error() {
                let text = Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(message, Style::default().fg(Color::Red))),
                    Line::from(Span::styled(
                        "Press esc to go back.",
                        Style::default().fg(Color::Gray),
                    )),
                ])
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
                frame.render_widget(text, chunks[1]);
                draw_footer(frame, chunks[2], "esc back · q quit");
                return;
            }

            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2),
                    Constraint::Min(6),
                    Constraint::Length(2),
                ])
                .split(chunks[1]);

            let title = Paragraph::new(Line::from(Span::styled(
                "Choose your starter Pokémon",
                Style::default().add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(title, body[0]);

            let entries = result.entries();
            let cards = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![
                    Constraint::Ratio(1, entries.len().max(1) as u32);
                    entries.len().max(1)
                ])
                .split(body[1]);

            let reveal = screen.anim.reveal(now);
            for (index, entry) in entries.iter().enumerate() {
                let selected = screen.selection.is_selected(&entry.id);
                draw_starter_card(frame, cards[index], index, entry.id.as_str(), &entry.outcome, selected, reveal);
            }

            let selected_line = match screen.selection.current(result) {
                Some((_, record)) => Line::from(Span::styled(
                    format!(
                        "You have picked {} as your starter pokemon.",
                        record.display_name()
                    ),
                    Style::default().fg(Color::Yellow),
                )),
                None => Line::from(Span::styled(
                    "Press 1-3 or ←/→ to select a starter.",
                    Style::default().fg(Color::Gray),
                )),
            };
            let summary = Paragraph::new(selected_line).alignment(Alignment::Center);
            frame.render_widget(summary, body[2]);

            draw_footer(frame, chunks[2], "1-3 select · ←/→ move · esc back");
        }
    }
}

fn draw_starter_card(
    frame: &mut ratatui::Frame,
    area: Rect,
    index: usize,
    id: &str,
    outcome: &FetchOutcome,
    selected: bool,
    reveal: f64,
) {
    match outcome {
        FetchOutcome::Success(record) => {
            let border = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let level = (255.0 * reveal) as u8;
            let faded = Style::default().fg(Color::Rgb(level, level, level));
            let card = Paragraph::new(vec![
                Line::from(Span::styled(record.display_name(), faded.add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from(Span::styled(format!("Weight: {}", record.weight), faded)),
                Line::from(Span::styled(format!("Height: {}", record.height), faded)),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(format!("{}", index + 1)),
            );
            frame.render_widget(card, area.inner(ratatui::layout::Margin::new(1, 1)));
        }
        FetchOutcome::Failure(_) => {
            let card = Paragraph::new(vec![
                Line::from(Span::styled(id.to_string(), Style::default().fg(Color::DarkGray))),
                Line::from(""),
                Line::from(Span::styled(
                    "Unavailable",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(format!("{}", index + 1)),
            );
            frame.render_widget(card, area.inner(ratatui::layout::Margin::new(1, 1)));
        }
    }
}

fn draw_help(frame: &mut ratatui::Frame) {
    let block = Block::default().borders(Borders::ALL).title("Help");
    let lines = vec![
        Line::from("f fetch detail   s starter batch   q quit"),
        Line::from("Detail: f opens a confirm prompt, y runs the fetch, n cancels"),
        Line::from("Starters: 1-3 or arrow keys select a loaded starter"),
        Line::from("esc returns to the previous screen"),
    ];
    let view = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(view, frame.area());
}

fn draw_header(label: &str, tick: usize) -> Paragraph<'static> {
    let hb = if tick % 20 < 10 { "*" } else { " " };
    let line = Line::from(vec![
        Span::styled(
            "TERMDEX",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw(format!("   :: {label}   ")),
        Span::styled(hb.to_string(), Style::default().fg(Color::Green)),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_footer(frame: &mut ratatui::Frame, area: Rect, hint: &str) {
    let footer = Paragraph::new(Line::from(Span::styled(
        hint.to_string(),
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

fn draw_fetch_button(frame: &mut ratatui::Frame, area: Rect, label: &str, scale: f64) {
    let base = (label.chars().count() as u16).saturating_add(6);
    let width = ((f64::from(base) * scale).round() as u16).clamp(4, area.width.max(4));
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y,
        width: width.min(area.width),
        height: area.height.min(3),
    };
    let button = Paragraph::new(Line::from(Span::styled(
        label.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(button, rect);
}

fn draw_confirm_popup(frame: &mut ratatui::Frame, id: &PokemonId) {
    let area = centered_rect(frame.area(), 44, 5);
    frame.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Confirm");
    let text = Paragraph::new(vec![
        Line::from(format!("Fetch {}?", id.as_str())),
        Line::from("Press y to confirm, n to cancel."),
    ])
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(text, area);
}

fn button_label(id: &PokemonId) -> String {
    format!("[ Fetch {} ]", id.as_str())
}

fn base_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(2),
        ])
        .split(area)
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
