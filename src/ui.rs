use crate::app::{AppState, Intent};
use crate::config::Config;
use crate::player::{PlaybackEngine, PlaybackState};
use crate::station;
use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame, Terminal,
};
use reqwest::Client;
use std::io::stdout;
use std::time::Duration;

enum Action {
    Quit,
    Dispatch(Intent),
}

pub async fn run_ui<E: PlaybackEngine>(
    client: Client,
    config: &Config,
    mut app: AppState<E>,
) -> Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = drive(&mut terminal, &client, config, &mut app).await;

    app.player.release();

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

async fn drive<B: Backend, E: PlaybackEngine>(
    terminal: &mut Terminal<B>,
    client: &Client,
    config: &Config,
    app: &mut AppState<E>,
) -> Result<()> {
    // The fetch holds up the first real frame.
    terminal.draw(|f| render(f, app))?;
    let fetched = station::fetch_stations(client, &config.stations_url()).await;
    app.load(fetched);

    loop {
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                match map_key(app.search_open, key) {
                    Some(Action::Quit) => break,
                    Some(Action::Dispatch(intent)) => app.handle(intent),
                    None => {}
                }
            }
        }
    }
    Ok(())
}

fn map_key(searching: bool, key: KeyEvent) -> Option<Action> {
    let intent = match key.code {
        KeyCode::Up => Intent::CursorUp,
        KeyCode::Down => Intent::CursorDown,
        KeyCode::Left | KeyCode::BackTab => Intent::PreviousGroup,
        KeyCode::Right | KeyCode::Tab => Intent::NextGroup,
        KeyCode::Enter => Intent::PlayCursor,
        KeyCode::Esc if searching => Intent::ToggleSearch,
        KeyCode::Backspace if searching => Intent::QueryPop,
        KeyCode::Char(c) if searching => Intent::QueryPush(c),
        KeyCode::Char('q') | KeyCode::Esc => return Some(Action::Quit),
        KeyCode::Char('/') => Intent::ToggleSearch,
        KeyCode::Char(' ') => Intent::TogglePause,
        KeyCode::Char('n') => Intent::Next,
        KeyCode::Char('p') => Intent::Previous,
        KeyCode::Char('+') | KeyCode::Char('=') => Intent::VolumeUp,
        KeyCode::Char('-') => Intent::VolumeDown,
        KeyCode::Char('m') => Intent::Mute,
        _ => return None,
    };
    Some(Action::Dispatch(intent))
}

pub fn render<E: PlaybackEngine>(f: &mut Frame, app: &AppState<E>) {
    let size = f.size();

    if app.loading {
        render_loading(f, size);
        return;
    }

    let mut constraints = vec![
        Constraint::Length(if app.search_open { 7 } else { 4 }),
        Constraint::Length(3),
        Constraint::Min(3),
    ];
    if app.show_transport() {
        constraints.push(Constraint::Length(6));
    }
    if app.status.is_some() {
        constraints.push(Constraint::Length(1));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(size);

    render_header(f, chunks[0], app);
    render_tabs(f, chunks[1], app);
    render_grid(f, chunks[2], app);

    let mut next = 3;
    if app.show_transport() {
        render_transport(f, chunks[next], app);
        next += 1;
    }
    if let Some(msg) = &app.status {
        let line = Paragraph::new(Span::styled(
            format!(" ✗ {}", msg),
            Style::default().fg(Color::Red),
        ));
        f.render_widget(line, chunks[next]);
    }
}

fn render_loading(f: &mut Frame, area: Rect) {
    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let text = Paragraph::new(Span::styled(
        "Loading Stations...",
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(text, middle[1]);
}

fn render_header<E: PlaybackEngine>(f: &mut Frame, area: Rect, app: &AppState<E>) {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            "📻 Indian Radio",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   {} stations", app.catalog.len()),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        ),
    ])];
    lines.push(keys_legend());

    if app.search_open {
        lines.push(Line::from(""));
        let query = if app.query.is_empty() {
            Span::styled("Search stations...", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(app.query.as_str(), Style::default().fg(Color::White))
        };
        lines.push(Line::from(vec![
            Span::styled("🔍 ", Style::default().fg(Color::Magenta)),
            query,
            Span::styled("▏", Style::default().fg(Color::Magenta)),
        ]));
    }

    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    f.render_widget(header, area);
}

fn render_tabs<E: PlaybackEngine>(f: &mut Frame, area: Rect, app: &AppState<E>) {
    let titles: Vec<Line> = app.catalog.group_names().map(Line::from).collect();
    let mut tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(" ◀ categories ▶ ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        );
    if let Some(pos) = app.catalog.position(app.selected_group()) {
        tabs = tabs.select(pos);
    }
    f.render_widget(tabs, area);
}

fn render_grid<E: PlaybackEngine>(f: &mut Frame, area: Rect, app: &AppState<E>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {} ", app.selected_group()))
        .border_style(Style::default().fg(Color::Cyan));

    let rows = app.rows();
    if rows.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "♫ No stations found",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Try adjusting your search",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = rows
        .iter()
        .map(|(_, s)| {
            let playing = app.is_playing_station(s);
            let marker = if playing { "▶ " } else { "♪ " };
            let name_style = if playing {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Magenta)),
                Span::styled(s.name.as_str(), name_style),
                Span::styled(
                    format!("  {}", s.tags.as_deref().unwrap_or("")),
                    Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default();
    state.select(Some(app.cursor.min(rows.len() - 1)));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_transport<E: PlaybackEngine>(f: &mut Frame, area: Rect, app: &AppState<E>) {
    let Some((station, group)) = app.player.now_playing() else {
        return;
    };
    let paused = app.player.state() == PlaybackState::Paused;
    let status_icon = if paused { "⏸" } else { "▶" };
    let status_text = if paused { "Paused" } else { "Playing" };
    let volume = app.player.volume();

    let lines = vec![
        Line::from(vec![
            Span::styled(
                station.name.as_str(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", group), Style::default().fg(Color::Gray)),
        ]),
        Line::from(vec![
            Span::styled(
                format!("{} {}", status_icon, status_text),
                if paused {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                },
            ),
            Span::raw("   "),
            Span::styled(volume_bar(volume), Style::default().fg(Color::Magenta)),
        ]),
        Line::from(vec![
            Span::styled("p", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" ⏮  "),
            Span::styled("Space", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" ⏯  "),
            Span::styled("n", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" ⏭  "),
            Span::styled("+/- m", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" volume  "),
            Span::styled("q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" quit"),
        ]),
    ];

    let bar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" ☆ Now Playing ☆ ")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(bar, area);
}

fn keys_legend() -> Line<'static> {
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };
    let quit = Span::styled("q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    Line::from(vec![
        key("←/→"),
        Span::raw(" category  "),
        key("↑/↓"),
        Span::raw(" station  "),
        key("Enter"),
        Span::raw(" play  "),
        key("/"),
        Span::raw(" search  "),
        quit,
        Span::raw(" quit"),
    ])
}

fn volume_bar(volume: f32) -> String {
    let percent = (volume * 100.0).round() as usize;
    let width = 20;
    let filled = (percent * width / 100).min(width);

    let mut bar = String::from("│");
    for i in 0..width {
        bar.push(match i {
            _ if i >= filled => '·',
            _ if volume == 0.0 => '✗',
            _ if i < width * 60 / 100 => '▓',
            _ if i < width * 80 / 100 => '▒',
            _ => '░',
        });
    }
    bar.push('│');

    let icon = match percent {
        0 => "🔇",
        1..=29 => "🔈",
        30..=69 => "🔉",
        _ => "🔊",
    };
    format!("{} {} {}%", bar, icon, percent)
}
