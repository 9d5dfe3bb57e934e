mod export;
mod help;
mod state;

use crate::cli::{self, Cli};
use crate::model::{ConfigKind, ControllerEvent, MonitorConfig, UiCommand};
use crate::orchestrator;
use crate::remote::RemoteJobClient;
use crate::sync::ControlView;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use export::{copy_to_clipboard, display_path};
use help::draw_help;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{PromptAction, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, cfg: MonitorConfig) -> Result<()> {
    let client = RemoteJobClient::new(&cfg)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    for cmd in cli::initial_commands(&args) {
        let _ = cmd_tx.send(cmd);
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let feedback_ttl = cfg.feedback_ttl;
    let ui_handle = std::thread::spawn(move || run_threaded(feedback_ttl, event_rx, cmd_tx));

    let res = orchestrator::run_controller(cfg, client, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    feedback_ttl: Duration,
    mut event_rx: UnboundedReceiver<ControllerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(feedback_ttl);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        let mut controller_gone = false;
        loop {
            match event_rx.try_recv() {
                Ok(ev) => state.apply_event(ev, Instant::now()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    controller_gone = true;
                    break;
                }
            }
        }
        if controller_gone {
            break Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            state.feedback.expire(Instant::now());
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if state.prompt.is_some() {
                    handle_prompt_key(&mut state, k.code, &cmd_tx);
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('s')) => {
                        if state.view.start_enabled {
                            state.view = ControlView::transitional("STARTING...", true);
                            let _ = cmd_tx.send(UiCommand::Start);
                        }
                    }
                    (_, KeyCode::Char('x')) => {
                        if state.view.stop_enabled {
                            state.view = ControlView::transitional("STOPPING...", false);
                            let _ = cmd_tx.send(UiCommand::Stop);
                        }
                    }
                    (_, KeyCode::Char('r')) => {
                        let _ = cmd_tx.send(UiCommand::Refresh);
                    }
                    (_, KeyCode::Char('1')) => state.toggle_panel(ConfigKind::Sites),
                    (_, KeyCode::Char('2')) => state.toggle_panel(ConfigKind::Terms),
                    (_, KeyCode::Char('i')) => {
                        state.open_prompt(ConfigKind::Sites, PromptAction::Import)
                    }
                    (_, KeyCode::Char('I')) => {
                        state.open_prompt(ConfigKind::Terms, PromptAction::Import)
                    }
                    (_, KeyCode::Char('a')) => {
                        state.open_prompt(ConfigKind::Sites, PromptAction::Add)
                    }
                    (_, KeyCode::Char('A')) => {
                        state.open_prompt(ConfigKind::Terms, PromptAction::Add)
                    }
                    (_, KeyCode::Char('e')) => {
                        let _ = cmd_tx.send(UiCommand::Export {
                            kind: ConfigKind::Sites,
                        });
                    }
                    (_, KeyCode::Char('E')) => {
                        let _ = cmd_tx.send(UiCommand::Export {
                            kind: ConfigKind::Terms,
                        });
                    }
                    (_, KeyCode::Char('y')) => copy_last_export(&mut state),
                    (_, KeyCode::Tab) => {
                        state.tab = (state.tab + 1) % 2;
                    }
                    (_, KeyCode::Char('?')) => {
                        state.tab = 1;
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_prompt_key(state: &mut UiState, code: KeyCode, cmd_tx: &UnboundedSender<UiCommand>) {
    match code {
        KeyCode::Esc => state.prompt = None,
        KeyCode::Enter => {
            if let Some(cmd) = state.submit_prompt() {
                let _ = cmd_tx.send(cmd);
            }
        }
        KeyCode::Backspace => {
            if let Some(p) = state.prompt.as_mut() {
                p.input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(p) = state.prompt.as_mut() {
                p.input.push(c);
            }
        }
        _ => {}
    }
}

fn copy_last_export(state: &mut UiState) {
    let now = Instant::now();
    match state.last_exported_path.clone() {
        Some(path) => match copy_to_clipboard(&path) {
            Ok(()) => state.feedback.post(
                format!("✓ Copied to clipboard: {}", display_path(&path)),
                true,
                now,
            ),
            Err(e) => state
                .feedback
                .post(format!("Clipboard copy failed: {e:#}"), false, now),
        },
        None => state.feedback.post(
            "No exported file path to copy. Export a list first (e/E)",
            false,
            now,
        ),
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Dashboard"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("crawl-monitor"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => draw_help(chunks[1], f),
    }
}

fn status_color(label: &str) -> Color {
    match label {
        "RUNNING" => Color::Green,
        "STOPPING" | "STOPPING..." | "STARTING..." => Color::Yellow,
        "STOPPED" | "IDLE" => Color::Cyan,
        "ERROR" | "START FAILED" | "STOP FAILED" => Color::Red,
        _ => Color::Gray,
    }
}

fn panel_height(state: &UiState, kind: ConfigKind) -> Constraint {
    // Collapsed panels keep their bordered header row.
    match state.panel(kind).height_target() {
        Some(h) if !state.panel(kind).is_collapsed() => Constraint::Length(h.max(3)),
        _ => Constraint::Length(3),
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut rows = vec![Constraint::Length(5)];
    if state.view.progress_visible {
        rows.push(Constraint::Length(3));
    }
    rows.push(panel_height(state, ConfigKind::Sites));
    rows.push(panel_height(state, ConfigKind::Terms));
    if state.prompt.is_some() {
        rows.push(Constraint::Length(3));
    }
    rows.push(Constraint::Min(0));
    rows.push(Constraint::Length(1));

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(rows)
        .split(area);
    let mut idx = 0;

    draw_status(main[idx], f, state);
    idx += 1;

    if state.view.progress_visible {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(Color::Green))
            .percent(u16::from(state.view.progress_percent))
            .label(state.view.progress_label.clone());
        f.render_widget(gauge, main[idx]);
        idx += 1;
    }

    for (kind, key) in [(ConfigKind::Sites, "1"), (ConfigKind::Terms, "2")] {
        draw_panel(main[idx], f, state, kind, key);
        idx += 1;
    }

    if let Some(prompt) = &state.prompt {
        let p = Paragraph::new(Line::from(vec![
            Span::raw(prompt.input.clone()),
            Span::styled("█", Style::default().fg(Color::Gray)),
        ]))
        .block(Block::default().borders(Borders::ALL).title(prompt.title()));
        f.render_widget(p, main[idx]);
        idx += 1;
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(main[idx]);
    idx += 1;

    let results = Paragraph::new(
        state
            .results
            .clone()
            .unwrap_or_else(|| "No finished crawl yet.".into()),
    )
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Results"));
    f.render_widget(results, bottom[0]);

    // Newest entries at the bottom, trimmed to what fits.
    let visible = usize::from(bottom[1].height.saturating_sub(2));
    let skip = state.activity.len().saturating_sub(visible);
    let log_lines: Vec<Line> = state
        .activity
        .iter()
        .skip(skip)
        .map(|l| Line::from(l.clone()))
        .collect();
    let log = Paragraph::new(log_lines)
        .block(Block::default().borders(Borders::ALL).title("Activity"));
    f.render_widget(log, bottom[1]);

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("s", Style::default().fg(Color::Magenta)),
        Span::raw(" start  "),
        Span::styled("x", Style::default().fg(Color::Magenta)),
        Span::raw(" stop  "),
        Span::styled("r", Style::default().fg(Color::Magenta)),
        Span::raw(" refresh  "),
        Span::styled("i/I", Style::default().fg(Color::Magenta)),
        Span::raw(" import  "),
        Span::styled("a/A", Style::default().fg(Color::Magenta)),
        Span::raw(" add  "),
        Span::styled("e/E", Style::default().fg(Color::Magenta)),
        Span::raw(" export  "),
        Span::styled("?", Style::default().fg(Color::Magenta)),
        Span::raw(" help  "),
        Span::styled("q", Style::default().fg(Color::Magenta)),
        Span::raw(" quit"),
    ]));
    f.render_widget(hint, main[idx]);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let view = &state.view;
    let control = |name: &'static str, enabled: bool| {
        if enabled {
            Span::styled(name, Style::default().fg(Color::White))
        } else {
            Span::styled(
                name,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT),
            )
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled(
                view.label.clone(),
                Style::default()
                    .fg(status_color(&view.label))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Controls: ", Style::default().fg(Color::Gray)),
            control("[s] Start", view.start_enabled),
            Span::raw("  "),
            control("[x] Stop", view.stop_enabled),
        ]),
    ];

    let now = Instant::now();
    if let Some(msg) = state.feedback.current(now) {
        let color = if msg.success { Color::Green } else { Color::Red };
        lines.push(Line::from(Span::styled(
            msg.text.clone(),
            Style::default().fg(color),
        )));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Crawler"));
    f.render_widget(p, area);
}

fn draw_panel(area: Rect, f: &mut ratatui::Frame, state: &UiState, kind: ConfigKind, key: &str) {
    let toggle = state.panel(kind);
    let title = format!("[{key}] {}", toggle.label());
    let block = Block::default().borders(Borders::ALL).title(title);

    if toggle.is_collapsed() {
        let count = match kind {
            ConfigKind::Sites => &state.sites,
            ConfigKind::Terms => &state.terms,
        };
        let summary = match count {
            Some(Ok(lines)) => format!("{} {kind}", lines.len()),
            Some(Err(_)) => format!("{kind} unavailable"),
            None => "Loading...".into(),
        };
        let p = Paragraph::new(Span::styled(summary, Style::default().fg(Color::Gray)))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let lines: Vec<Line> = state
        .panel_lines(kind)
        .into_iter()
        .map(Line::from)
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}
