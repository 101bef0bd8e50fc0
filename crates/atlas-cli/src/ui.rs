use std::collections::HashMap;
use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use ratatui::Terminal;

use atlas_core::actions::{AtlasAction, RuntimeAction, UserAction, QUICK_PROMPTS};
use atlas_core::canvas::CanvasEntry;
use atlas_core::highlight::HighlightColor;
use atlas_core::message::{Directive, Role};
use atlas_core::notes::{place_note, CellRect, NoteGeometry, RepositionScheduler};
use atlas_core::reducer::{reduce, AtlasEffect, DispatchEnvelope};
use atlas_core::registry::ComponentKind;
use atlas_core::signal::{BoardSnapshot, CityReading, QuakeReading, RiskLabel};
use atlas_core::state::{DashState, DashTab, LogLevel, LogSource, UiTheme};
use atlas_core::targets::TargetCategory;

use atlas_feed::chat::{ChatAdapter, ChatEvent};
use atlas_feed::contracts::SignalSnapshot;
use atlas_feed::feed::SignalFeed;

use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

enum UiEvent {
    Snapshot(SignalSnapshot),
    FeedError(String),
    Chat(ChatEvent),
}

pub fn run(
    mut state: DashState,
    feed: Box<dyn SignalFeed>,
    assistant: Arc<dyn ChatAdapter + Sync>,
    refresh: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard; // Restores the terminal on exit or panic

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, &mut state, feed, assistant, refresh).map_err(|e| e.into())
}

fn spawn_feed_worker(mut feed: Box<dyn SignalFeed>, refresh: Duration, tx: mpsc::Sender<UiEvent>) {
    thread::spawn(move || loop {
        let event = match feed.fetch() {
            Ok(snapshot) => UiEvent::Snapshot(snapshot),
            Err(err) => UiEvent::FeedError(err.to_string()),
        };
        if tx.send(event).is_err() {
            return;
        }
        thread::sleep(refresh);
    });
}

/// Map the feed crate's scored snapshot onto the core board model.
fn board_snapshot(snapshot: SignalSnapshot) -> BoardSnapshot {
    BoardSnapshot {
        cities: snapshot
            .cities
            .into_iter()
            .map(|city| CityReading {
                id: city.signal.id,
                name: city.signal.name.into(),
                country: city.signal.country.into(),
                temp_c: city.signal.temp_c,
                wind_kph: city.signal.wind_kph,
                rain_mm: city.signal.rain_mm,
                aqi: city.signal.aqi,
                risk: city.risk,
                risk_label: RiskLabel::for_score(city.risk),
            })
            .collect(),
        quakes: snapshot
            .quakes
            .into_iter()
            .map(|quake| QuakeReading {
                id: quake.id,
                place: quake.place.into(),
                magnitude: quake.magnitude,
                depth_km: quake.depth_km,
                time_ms: quake.time_ms,
            })
            .collect(),
        updated_ms: snapshot.updated_ms,
    }
}

fn to_core_directive(payload: atlas_feed::contracts::DirectivePayload) -> Directive {
    Directive {
        component_name: payload.component_name,
        props: payload.props,
    }
}

fn apply_chat_event(state: &mut DashState, event: ChatEvent) {
    let action = match event {
        ChatEvent::Token(text) => RuntimeAction::AssistantToken(text),
        ChatEvent::Meta(text) => RuntimeAction::AssistantMeta(text),
        ChatEvent::Directive(payload) => {
            RuntimeAction::AssistantDirective(to_core_directive(payload))
        }
        ChatEvent::Done { error } => RuntimeAction::AssistantDone { error },
    };
    reduce(state, AtlasAction::Runtime(action));
}

enum KeyHandlerResult {
    Continue(Vec<AtlasEffect>),
    Exit,
}

fn handle_chat_focus_keys(key: event::KeyEvent, state: &mut DashState) -> KeyHandlerResult {
    let effects = match key.code {
        KeyCode::Esc => reduce(state, AtlasAction::User(UserAction::SetChatFocus(false))),
        KeyCode::Enter => reduce(state, AtlasAction::User(UserAction::ChatSubmit)),
        KeyCode::Backspace => reduce(state, AtlasAction::User(UserAction::ChatBackspace)),
        KeyCode::Up => reduce(state, AtlasAction::User(UserAction::ChatHistoryUp)),
        KeyCode::Down => reduce(state, AtlasAction::User(UserAction::ChatHistoryDown)),
        KeyCode::Char(c) => reduce(state, AtlasAction::User(UserAction::ChatInput(c))),
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_global_keys(key: event::KeyEvent, state: &mut DashState) -> KeyHandlerResult {
    let effects = match key.code {
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        KeyCode::Char('i') => reduce(state, AtlasAction::User(UserAction::SetChatFocus(true))),
        KeyCode::Char('[') => reduce(
            state,
            AtlasAction::User(UserAction::SetTheme(state.theme.prev())),
        ),
        KeyCode::Char(']') => reduce(state, AtlasAction::User(UserAction::CycleTheme)),
        KeyCode::Right | KeyCode::Tab => reduce(state, AtlasAction::User(UserAction::NextTab)),
        KeyCode::Left => reduce(state, AtlasAction::User(UserAction::PrevTab)),
        KeyCode::Char('1') => reduce(
            state,
            AtlasAction::User(UserAction::SelectTab(DashTab::Board)),
        ),
        KeyCode::Char('2') => reduce(
            state,
            AtlasAction::User(UserAction::SelectTab(DashTab::Chat)),
        ),
        KeyCode::Char('3') => reduce(
            state,
            AtlasAction::User(UserAction::SelectTab(DashTab::Logs)),
        ),
        KeyCode::Char('x') => {
            let Some(key) = latest_note_key(state) else {
                return KeyHandlerResult::Continue(Vec::new());
            };
            reduce(state, AtlasAction::User(UserAction::DismissNote(key)))
        }
        KeyCode::F(n) if (1..=QUICK_PROMPTS.len() as u8).contains(&n) => reduce(
            state,
            AtlasAction::User(UserAction::QuickPrompt(usize::from(n) - 1)),
        ),
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_key_event(key: event::KeyEvent, state: &mut DashState) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }
    if state.chat.focus_in_chat {
        handle_chat_focus_keys(key, state)
    } else {
        handle_global_keys(key, state)
    }
}

fn latest_note_key(state: &DashState) -> Option<String> {
    state
        .canvas_entries
        .iter()
        .rev()
        .find(|entry| entry.kind == ComponentKind::StickyNote)
        .map(|entry| entry.key.clone())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut DashState,
    feed: Box<dyn SignalFeed>,
    assistant: Arc<dyn ChatAdapter + Sync>,
    refresh: Duration,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel();
    spawn_feed_worker(feed, refresh, tx.clone());

    let mut notes = RepositionScheduler::default();
    notes.request();
    let mut note_rects: HashMap<String, CellRect> = HashMap::new();

    loop {
        while let Ok(event) = rx.try_recv() {
            match event {
                UiEvent::Snapshot(snapshot) => {
                    reduce(
                        state,
                        AtlasAction::Runtime(RuntimeAction::SetBoardSnapshot(board_snapshot(
                            snapshot,
                        ))),
                    );
                    notes.request();
                }
                UiEvent::FeedError(err) => {
                    reduce(state, AtlasAction::Runtime(RuntimeAction::FeedFailed(err)));
                }
                UiEvent::Chat(chat_event) => apply_chat_event(state, chat_event),
            }
        }

        terminal.draw(|f| ui(f, state, &mut notes, &mut note_rects))?;

        if event::poll(Duration::from_millis(50))? {
            let mut effects = Vec::new();
            match event::read()? {
                Event::Key(key) => match handle_key_event(key, state) {
                    KeyHandlerResult::Continue(e) => effects.extend(e),
                    KeyHandlerResult::Exit => return Ok(()),
                },
                Event::Resize(_, _) => notes.request(),
                _ => {}
            }

            for effect in effects {
                match effect {
                    AtlasEffect::RequestFrame => {}
                    AtlasEffect::SubmitChat { prompt, context } => {
                        reduce(
                            state,
                            AtlasAction::Runtime(RuntimeAction::AppendLog {
                                level: LogLevel::Debug,
                                source: LogSource::Assistant,
                                message: format!("request: {prompt}"),
                            }),
                        );
                        let adapter = Arc::clone(&assistant);
                        let tx_chat = tx.clone();
                        thread::spawn(move || {
                            adapter.stream(&prompt, context.as_deref(), &|event| {
                                let _ = tx_chat.send(UiEvent::Chat(event));
                            });
                        });
                    }
                    AtlasEffect::PublishDispatch(DispatchEnvelope {
                        replace,
                        directives,
                    }) => {
                        reduce(
                            state,
                            AtlasAction::Runtime(RuntimeAction::DispatchComponents {
                                replace,
                                directives,
                            }),
                        );
                        notes.request();
                    }
                    AtlasEffect::CopyToClipboard(text) => {
                        if let Ok(mut clipboard) = arboard::Clipboard::new() {
                            let _ = clipboard.set_text(text);
                        }
                    }
                }
            }
        }
    }
}

fn get_spinner() -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let idx = (now_ms() / 100) as usize % frames.len();
    frames[idx]
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    accent_alt: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    panel_bg: Color,
    selected_bg: Color,
}

fn palette_for(theme: UiTheme) -> UiPalette {
    match theme {
        UiTheme::Classic => UiPalette {
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            panel_bg: Color::Black,
            selected_bg: Color::DarkGray,
        },
        UiTheme::Cyberpunk => UiPalette {
            accent: Color::Magenta,
            accent_alt: Color::Cyan,
            success: Color::LightGreen,
            warning: Color::LightYellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::Magenta,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(58, 0, 58),
        },
        UiTheme::NeonNoir => UiPalette {
            accent: Color::LightBlue,
            accent_alt: Color::LightCyan,
            success: Color::LightGreen,
            warning: Color::Yellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::LightBlue,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(18, 28, 42),
        },
        UiTheme::SolarFlare => UiPalette {
            accent: Color::LightYellow,
            accent_alt: Color::LightRed,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::Yellow,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(42, 28, 0),
        },
        UiTheme::ForestZen => UiPalette {
            accent: Color::LightGreen,
            accent_alt: Color::Green,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::LightGreen,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(8, 32, 10),
        },
    }
}

fn syntect_theme_name(theme: UiTheme) -> &'static str {
    match theme {
        UiTheme::Classic => "base16-ocean.dark",
        UiTheme::Cyberpunk => "base16-eighties.dark",
        UiTheme::NeonNoir => "base16-mocha.dark",
        UiTheme::SolarFlare => "base16-ocean.dark",
        UiTheme::ForestZen => "base16-ocean.dark",
    }
}

fn highlight_color(color: HighlightColor) -> Color {
    match color {
        HighlightColor::Red => Color::Red,
        HighlightColor::Green => Color::Green,
        HighlightColor::Blue => Color::Blue,
        HighlightColor::Yellow => Color::Yellow,
    }
}

fn node_visible(state: &DashState, id: &str) -> bool {
    state.doc.node(id).map(|node| node.visible).unwrap_or(true)
}

fn node_highlight(state: &DashState, id: &str) -> Option<HighlightColor> {
    state.doc.node(id).and_then(|node| node.highlight)
}

fn section_border(state: &DashState, id: &str, palette: UiPalette) -> Style {
    match node_highlight(state, id) {
        Some(color) => Style::default()
            .fg(highlight_color(color))
            .add_modifier(Modifier::BOLD),
        None => Style::default().fg(palette.border),
    }
}

fn risk_style(label: RiskLabel, palette: UiPalette) -> Style {
    match label {
        RiskLabel::Critical => Style::default()
            .fg(palette.danger)
            .add_modifier(Modifier::BOLD),
        RiskLabel::High => Style::default().fg(palette.danger),
        RiskLabel::Moderate => Style::default().fg(palette.warning),
        RiskLabel::Low => Style::default().fg(palette.success),
    }
}

fn ui(
    f: &mut ratatui::Frame,
    state: &DashState,
    notes: &mut RepositionScheduler,
    note_rects: &mut HashMap<String, CellRect>,
) {
    let palette = palette_for(state.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Input
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], state, palette);
    render_tabs(f, chunks[1], state, palette);

    match state.tab {
        DashTab::Board => render_board(f, chunks[2], state, palette, notes, note_rects),
        DashTab::Chat => render_chat(f, chunks[2], state, palette),
        DashTab::Logs => render_logs(f, chunks[2], state, palette),
    }

    render_input(f, chunks[3], state, palette);
    render_footer(f, chunks[4], state, palette);
}

fn render_header(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let thinking = if state.chat.pending {
        format!("{} thinking", get_spinner())
    } else {
        "idle".to_string()
    };
    let text = format!(
        "Atlas | feed:{} | cities:{} | quakes:{} | theme:{} | {}",
        state.feed_status.label(),
        state.board.cities.len(),
        state.board.quakes.len(),
        state.theme.label(),
        thinking
    );
    let header = Paragraph::new(text)
        .style(Style::default().fg(palette.accent))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(section_border(state, "header-main", palette)),
        );
    f.render_widget(header, area);
}

fn render_tabs(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let titles: Vec<Line> = [DashTab::Board, DashTab::Chat, DashTab::Logs]
        .iter()
        .map(|t| Line::from(t.label()))
        .collect();
    let selected = match state.tab {
        DashTab::Board => 0,
        DashTab::Chat => 1,
        DashTab::Logs => 2,
    };
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title("Views"),
        )
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_board(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DashState,
    palette: UiPalette,
    notes: &mut RepositionScheduler,
    note_rects: &mut HashMap<String, CellRect>,
) {
    let has_cards = state.canvas_entries.iter().any(|entry| {
        matches!(
            entry.kind,
            ComponentKind::ExplanationCard | ComponentKind::RunbookCard
        )
    });
    let show_analysis = has_cards && node_visible(state, "analysis-panel");

    let columns = if show_analysis {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(40)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0)])
            .split(area)
    };
    let main_area = columns[0];

    let mut anchors: HashMap<String, Rect> = HashMap::new();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(main_area);
    render_kpi_row(f, rows[0], state, palette, &mut anchors);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);
    render_city_board(f, panels[0], state, palette, &mut anchors);
    render_quake_panel(f, panels[1], state, palette, &mut anchors);

    if show_analysis {
        anchors.insert("analysis-panel".to_string(), columns[1]);
        render_canvas_cards(f, columns[1], state, palette);
    }

    render_notes(f, state, palette, notes, note_rects, &anchors);
}

fn render_kpi_row(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DashState,
    palette: UiPalette,
    anchors: &mut HashMap<String, Rect>,
) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    if node_visible(state, "kpi-top-risk") {
        anchors.insert("kpi-top-risk".to_string(), cells[0]);
        let lines = match state.board.top_risk_city() {
            Some(city) => vec![
                Line::from(city.name.to_string()),
                Line::from(vec![
                    Span::styled(
                        format!("risk {} ", city.risk),
                        risk_style(city.risk_label, palette),
                    ),
                    Span::styled(city.risk_label.label(), risk_style(city.risk_label, palette)),
                ]),
            ],
            None => vec![Line::from("waiting for data")],
        };
        let p = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(section_border(state, "kpi-top-risk", palette))
                .title("Top Risk"),
        );
        f.render_widget(p, cells[0]);
    }

    if node_visible(state, "kpi-quakes") {
        anchors.insert("kpi-quakes".to_string(), cells[1]);
        let p = Paragraph::new(vec![
            Line::from(format!("{} tracked", state.board.quakes.len())),
            Line::from(Span::styled(
                format!("updated {}", atlas_core::state::clock_label(state.board.updated_ms)),
                Style::default().fg(palette.muted),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(section_border(state, "kpi-quakes", palette))
                .title("Quakes"),
        );
        f.render_widget(p, cells[1]);
    }

    if node_visible(state, "kpi-strongest-quake") {
        anchors.insert("kpi-strongest-quake".to_string(), cells[2]);
        let lines = match state.board.strongest_quake() {
            Some(quake) => vec![
                Line::from(format!("M{:.1}", quake.magnitude)),
                Line::from(Span::styled(
                    quake.place.to_string(),
                    Style::default().fg(palette.muted),
                )),
            ],
            None => vec![Line::from("none")],
        };
        let p = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(section_border(state, "kpi-strongest-quake", palette))
                .title("Strongest"),
        );
        f.render_widget(p, cells[2]);
    }
}

fn render_city_board(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DashState,
    palette: UiPalette,
    anchors: &mut HashMap<String, Rect>,
) {
    if !node_visible(state, "city-board") {
        return;
    }
    anchors.insert("city-board".to_string(), area);

    let visible = state.doc.visible_in_category(TargetCategory::City);
    let mut lines = Vec::new();
    let mut row_y = area.y.saturating_add(1);
    for city in &state.board.cities {
        let id = format!("city-{}", city.id);
        if !visible.iter().any(|node| node.id == id) {
            continue;
        }
        if row_y < area.y + area.height.saturating_sub(1) {
            anchors.insert(id.clone(), Rect::new(area.x, row_y, area.width, 1));
        }
        row_y = row_y.saturating_add(1);

        let row_style = match node_highlight(state, &id) {
            Some(color) => Style::default()
                .fg(highlight_color(color))
                .bg(palette.selected_bg)
                .add_modifier(Modifier::BOLD),
            None => Style::default(),
        };
        let aqi = city
            .aqi
            .map(|v| format!("{:>4}", v.round()))
            .unwrap_or_else(|| " n/a".to_string());
        lines.push(Line::from(vec![
            Span::styled(format!("{:<14}", city.name), row_style),
            Span::styled(format!("aqi {aqi}  "), row_style),
            Span::styled(
                format!("risk {:>3} {}", city.risk, city.risk_label.label()),
                risk_style(city.risk_label, palette).patch(row_style),
            ),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "no cities in scope",
            Style::default().fg(palette.muted),
        )));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(section_border(state, "city-board", palette))
            .title("Cities"),
    );
    f.render_widget(p, area);
}

fn render_quake_panel(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DashState,
    palette: UiPalette,
    anchors: &mut HashMap<String, Rect>,
) {
    if !node_visible(state, "quake-panel") {
        return;
    }
    anchors.insert("quake-panel".to_string(), area);

    let visible = state.doc.visible_in_category(TargetCategory::Quake);
    let mut lines = Vec::new();
    for quake in &state.board.quakes {
        let id = format!("quake-{}", quake.id);
        if !visible.iter().any(|node| node.id == id) {
            continue;
        }
        let style = match node_highlight(state, &id) {
            Some(color) => Style::default()
                .fg(highlight_color(color))
                .add_modifier(Modifier::BOLD),
            None => Style::default(),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("M{:<4.1} ", quake.magnitude), style),
            Span::styled(quake.place.to_string(), style),
            Span::styled(
                format!("  {:.0} km", quake.depth_km),
                Style::default().fg(palette.muted),
            ),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "no quakes in scope",
            Style::default().fg(palette.muted),
        )));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(section_border(state, "quake-panel", palette))
            .title("Quakes"),
    );
    f.render_widget(p, area);
}

fn render_canvas_cards(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let mut lines = Vec::new();
    for entry in &state.canvas_entries {
        match entry.kind {
            ComponentKind::ExplanationCard => {
                push_card_title(&mut lines, entry, "title", "Explanation", palette);
                if let Some(summary) = entry.directive.prop_str("summary") {
                    for raw in summary.lines() {
                        lines.push(Line::from(format!("  {raw}")));
                    }
                }
                if let Some(bullets) = entry.directive.prop_str("bullets") {
                    for bullet in bullets.lines().filter(|l| !l.trim().is_empty()) {
                        lines.push(Line::from(format!("  • {}", bullet.trim())));
                    }
                }
                lines.push(Line::from(""));
            }
            ComponentKind::RunbookCard => {
                push_card_title(&mut lines, entry, "title", "Runbook", palette);
                let severity = entry.directive.prop_str("severity").unwrap_or("P3");
                let objective = entry.directive.prop_str("objective").unwrap_or("");
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  [{severity}] "),
                        Style::default().fg(palette.warning),
                    ),
                    Span::raw(objective.to_string()),
                ]));
                if let Some(steps) = entry
                    .directive
                    .props
                    .get("steps")
                    .and_then(serde_json::Value::as_array)
                {
                    for step in steps {
                        let label = step.get("step").and_then(serde_json::Value::as_str);
                        let status = step
                            .get("status")
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or("todo");
                        let (symbol, color) = match status {
                            "done" => ("●", palette.success),
                            "in_progress" => ("➤", palette.warning),
                            _ => ("○", palette.muted),
                        };
                        if let Some(label) = label {
                            lines.push(Line::from(vec![
                                Span::styled(format!("  {symbol} "), Style::default().fg(color)),
                                Span::raw(label.to_string()),
                            ]));
                        }
                    }
                }
                lines.push(Line::from(""));
            }
            // Side effects and notes render elsewhere.
            _ => {}
        }
    }

    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(section_border(state, "analysis-panel", palette))
                .title("Analysis"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn push_card_title(
    lines: &mut Vec<Line<'static>>,
    entry: &CanvasEntry,
    key: &str,
    fallback: &str,
    palette: UiPalette,
) {
    let title = entry
        .directive
        .prop_str(key)
        .unwrap_or(fallback)
        .to_string();
    lines.push(Line::from(Span::styled(
        title,
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    )));
}

fn render_notes(
    f: &mut ratatui::Frame,
    state: &DashState,
    palette: UiPalette,
    notes: &mut RepositionScheduler,
    note_rects: &mut HashMap<String, CellRect>,
    anchors: &HashMap<String, Rect>,
) {
    let screen = f.area();
    let screen_cell = CellRect::new(screen.x, screen.y, screen.width, screen.height);
    let recompute = notes.take();

    for entry in &state.canvas_entries {
        if entry.kind != ComponentKind::StickyNote {
            continue;
        }
        let rect = if recompute || !note_rects.contains_key(&entry.key) {
            let anchor = entry
                .directive
                .prop_str("targetId")
                .and_then(|token| state.doc.resolve_id(token))
                .and_then(|id| anchors.get(&id))
                .or_else(|| anchors.get("city-board"))
                .copied()
                .unwrap_or(screen);
            let geometry = NoteGeometry::from_directive(&entry.directive);
            let anchor_cell = CellRect::new(anchor.x, anchor.y, anchor.width, anchor.height);
            match place_note(geometry, anchor_cell, screen_cell) {
                Some(rect) => {
                    note_rects.insert(entry.key.clone(), rect);
                    rect
                }
                None => continue,
            }
        } else {
            note_rects[&entry.key]
        };

        let area = Rect::new(rect.x, rect.y, rect.width, rect.height);
        let text = entry.directive.prop_str("text").unwrap_or("");
        f.render_widget(Clear, area);
        let p = Paragraph::new(text.to_string())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Note (x dismiss)")
                    .style(Style::default().bg(palette.panel_bg))
                    .border_style(Style::default().fg(palette.warning)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(p, area);
    }

    note_rects.retain(|key, _| {
        state
            .canvas_entries
            .iter()
            .any(|entry| entry.kind == ComponentKind::StickyNote && entry.key == *key)
    });
}

fn render_chat(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let mut lines: Vec<Line> = Vec::new();
    for message in &state.normalized {
        let text = message.text();
        match message.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "[You]",
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                )));
                for raw in text.lines() {
                    lines.push(Line::from(format!("  {raw}")));
                }
            }
            Role::Assistant => {
                if text.is_empty() {
                    if let Some(directive) = &message.directive {
                        lines.push(Line::from(Span::styled(
                            format!("  [directive] {}", directive.component_name),
                            Style::default().fg(palette.muted),
                        )));
                        continue;
                    }
                }
                lines.push(Line::from(Span::styled(
                    "[Assistant]",
                    Style::default()
                        .fg(palette.success)
                        .add_modifier(Modifier::BOLD),
                )));
                push_assistant_text(&mut lines, &text, state.theme, palette);
            }
        }
        lines.push(Line::from(""));
    }

    if state.chat.pending && !state.chat.live_preview.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("[Assistant {}]", get_spinner()),
            Style::default()
                .fg(palette.accent_alt)
                .add_modifier(Modifier::BOLD),
        )));
        push_assistant_text(&mut lines, &state.chat.live_preview, state.theme, palette);
        lines.push(Line::from(""));
    }

    if let Some(err) = &state.chat.submit_error {
        lines.push(Line::from(Span::styled(
            format!("! {err}"),
            Style::default().fg(palette.danger),
        )));
    }

    let height = area.height.saturating_sub(2);
    let scroll = (lines.len() as u16).saturating_sub(height);
    let title = if state.chat.pending {
        format!("Chat | {} streaming", get_spinner())
    } else {
        format!("Chat ({} messages)", state.normalized.len())
    };
    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(title),
        )
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0));
    f.render_widget(p, area);
}

/// Assistant text with fenced code blocks run through syntect.
fn push_assistant_text(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    theme: UiTheme,
    palette: UiPalette,
) {
    let ps = get_syntax_set();
    let ts = get_theme_set();
    let syn_theme = &ts.themes[syntect_theme_name(theme)];

    let mut in_code = false;
    let mut highlighter: Option<HighlightLines> = None;
    for raw in text.lines() {
        let trimmed = raw.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            if in_code {
                in_code = false;
                highlighter = None;
            } else {
                in_code = true;
                let syntax = ps
                    .find_syntax_by_token(rest.trim())
                    .unwrap_or_else(|| ps.find_syntax_plain_text());
                highlighter = Some(HighlightLines::new(syntax, syn_theme));
            }
            lines.push(Line::from(Span::styled(
                format!("  {trimmed}"),
                Style::default().fg(palette.muted),
            )));
            continue;
        }

        if in_code {
            let mut spans = vec![Span::raw("  ")];
            if let Some(h) = highlighter.as_mut() {
                let ranges = h.highlight_line(raw, ps).unwrap_or_default();
                for (style, chunk) in ranges {
                    let fg = Color::Rgb(
                        style.foreground.r,
                        style.foreground.g,
                        style.foreground.b,
                    );
                    spans.push(Span::styled(chunk.to_string(), Style::default().fg(fg)));
                }
            } else {
                spans.push(Span::raw(raw.to_string()));
            }
            lines.push(Line::from(spans));
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            lines.push(Line::from(format!("  • {item}")));
        } else {
            lines.push(Line::from(format!("  {raw}")));
        }
    }
}

fn render_logs(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| {
            let style = match entry.level {
                LogLevel::Error => Style::default().fg(palette.danger),
                LogLevel::Warn => Style::default().fg(palette.warning),
                LogLevel::Debug => Style::default().fg(palette.muted),
                LogLevel::Info => Style::default(),
            };
            Line::from(Span::styled(
                format!(
                    "{} {:>5} [{}][{}] {}",
                    entry.timestamp_label(),
                    entry.seq,
                    entry.level.label(),
                    entry.source.label(),
                    entry.message
                ),
                style,
            ))
        })
        .collect();

    let height = area.height.saturating_sub(2);
    let scroll = (lines.len() as u16).saturating_sub(height);
    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(format!("Logs ({})", state.logs.len())),
        )
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0));
    f.render_widget(p, area);
}

fn render_input(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let title = if state.chat.pending {
        format!("Ask Atlas {} (streaming...)", get_spinner())
    } else {
        "Ask Atlas (i to focus, Esc to leave, Enter to send)".to_string()
    };
    let border = if state.chat.focus_in_chat {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.border)
    };
    let text = if state.chat.input.is_empty() {
        if !state.chat.focus_in_chat {
            Span::styled(
                "Press 'i' to ask about the board...",
                Style::default().fg(palette.muted),
            )
        } else if (now_ms() / 500) % 2 == 0 {
            Span::styled("▌", Style::default().fg(palette.accent))
        } else {
            Span::raw("")
        }
    } else if state.chat.focus_in_chat && (now_ms() / 500) % 2 == 0 {
        Span::raw(format!("{}▌", state.chat.input))
    } else {
        Span::raw(state.chat.input.clone())
    };
    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border),
    );
    f.render_widget(input, area);
}

fn render_footer(f: &mut ratatui::Frame, area: Rect, state: &DashState, palette: UiPalette) {
    let text = if state.chat.focus_in_chat {
        "In chat: /help /status /clear /theme /copylast /focus | Esc leaves input".to_string()
    } else {
        let prompts: Vec<String> = QUICK_PROMPTS
            .iter()
            .enumerate()
            .map(|(i, item)| format!("F{} {}", i + 1, item.label))
            .collect();
        format!(
            "{} | i chat | 1-3 tabs | [ ] theme | x dismiss note | q quit",
            prompts.join(" | ")
        )
    };
    let footer = Paragraph::new(text)
        .style(Style::default().fg(palette.muted))
        .alignment(Alignment::Left);
    f.render_widget(footer, area);
}
