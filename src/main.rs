use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use fpl_terminal::comparison::ComparisonError;
use fpl_terminal::metrics::COMPARISON_METRICS;
use fpl_terminal::rankings::{self, SortKey};
use fpl_terminal::state::{
    apply_delta, AppState, ComparisonFocus, ProviderCommand, Tab,
};
use fpl_terminal::value_score::ScoredPlayer;
use fpl_terminal::{feed, persist, premium, state};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.access.prompt_active {
            self.on_access_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Tab => self.switch_tab(self.state.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.state.tab.prev()),
            KeyCode::Char('1') => self.switch_tab(Tab::Players),
            KeyCode::Char('2') => self.switch_tab(Tab::TopPicks),
            KeyCode::Char('3') => self.switch_tab(Tab::Performance),
            KeyCode::Char('4') => self.switch_tab(Tab::Comparison),
            KeyCode::Char('5') => self.switch_tab(Tab::SetPieces),
            KeyCode::Char('r') => self.request_refresh(),
            KeyCode::Char('e') => self.request_export(),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            _ => self.on_tab_key(key),
        }
    }

    fn on_tab_key(&mut self, key: KeyEvent) {
        match self.state.tab {
            Tab::Players => match key.code {
                KeyCode::Char('s') => self.state.cycle_sort(),
                KeyCode::Char('p') => self.state.filters.cycle_position(),
                KeyCode::Char('t') => self.state.filters.cycle_team(),
                KeyCode::Char('[') => self.state.filters.adjust_max_price(false),
                KeyCode::Char(']') => self.state.filters.adjust_max_price(true),
                KeyCode::Char('m') => self.state.filters.adjust_min_minutes(true),
                KeyCode::Char('M') => self.state.filters.adjust_min_minutes(false),
                KeyCode::Char('f') => self.state.filters.adjust_min_form(true),
                KeyCode::Char('F') => self.state.filters.adjust_min_form(false),
                KeyCode::Char('v') => self.state.filters.adjust_min_value(true),
                KeyCode::Char('V') => self.state.filters.adjust_min_value(false),
                KeyCode::Char('o') => self.state.filters.adjust_max_selected(false),
                KeyCode::Char('O') => self.state.filters.adjust_max_selected(true),
                KeyCode::Char('c') => self.state.filters.reset(),
                _ => {}
            },
            Tab::Performance => {
                if key.code == KeyCode::Enter {
                    self.request_history();
                }
            }
            Tab::Comparison => match key.code {
                KeyCode::Left | KeyCode::Right => {
                    self.state.compare_focus = match self.state.compare_focus {
                        ComparisonFocus::Players => ComparisonFocus::Metrics,
                        ComparisonFocus::Metrics => ComparisonFocus::Players,
                    };
                }
                KeyCode::Char(' ') | KeyCode::Enter => match self.state.compare_focus {
                    ComparisonFocus::Players => self.state.toggle_compare_player(),
                    ComparisonFocus::Metrics => self.state.toggle_compare_metric(),
                },
                _ => {}
            },
            Tab::TopPicks | Tab::SetPieces => {}
        }
    }

    fn on_access_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.access.prompt_active = false;
                self.state.access.input.clear();
                self.state.tab = Tab::Players;
            }
            KeyCode::Enter => {
                let code = std::mem::take(&mut self.state.access.input);
                if premium::verify_access_code(&code) {
                    self.state.access.unlocked = true;
                    self.state.access.prompt_active = false;
                    self.state.push_log("[INFO] Pro access unlocked");
                } else {
                    self.state.push_log("[WARN] Invalid access code");
                }
            }
            KeyCode::Backspace => {
                self.state.access.input.pop();
            }
            KeyCode::Char(c) => self.state.access.input.push(c),
            _ => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab.is_premium() && !self.state.access.unlocked {
            self.state.access.prompt_active = true;
        }
        self.state.tab = tab;
    }

    fn move_cursor(&mut self, delta: i64) {
        match self.state.tab {
            Tab::Players => {
                let len = self.state.filtered_players().len();
                self.state.selected = step_index(self.state.selected, delta, len);
            }
            Tab::Performance => {
                let len = self.state.scored.len();
                self.state.perf_selected = step_index(self.state.perf_selected, delta, len);
            }
            Tab::Comparison => match self.state.compare_focus {
                ComparisonFocus::Players => {
                    let len = self.state.scored.len();
                    self.state.compare_player_cursor =
                        step_index(self.state.compare_player_cursor, delta, len);
                }
                ComparisonFocus::Metrics => {
                    let len = COMPARISON_METRICS.len();
                    self.state.compare_metric_cursor =
                        step_index(self.state.compare_metric_cursor, delta, len);
                }
            },
            Tab::TopPicks | Tab::SetPieces => {}
        }
    }

    fn request_refresh(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Refresh unavailable");
            return;
        };
        if tx.send(ProviderCommand::RefreshDataset).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.dataset_loading = true;
            self.state.push_log("[INFO] Refresh request sent");
        }
    }

    fn request_history(&mut self) {
        let Some(player) = self.state.selected_performance_player() else {
            self.state.push_log("[INFO] No player selected");
            return;
        };
        let player_id = player.record.id;
        let player_name = player.record.name.clone();
        if self.state.history.contains_key(&player_id)
            || self.state.history_loading.contains(&player_id)
        {
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] History fetch unavailable");
            return;
        };
        if tx
            .send(ProviderCommand::FetchHistory {
                player_id,
                player_name: player_name.clone(),
            })
            .is_err()
        {
            self.state.push_log("[WARN] History request failed");
        } else {
            self.state.history_loading.insert(player_id);
            self.state
                .push_log(format!("[INFO] History requested for {player_name}"));
        }
    }

    fn request_export(&mut self) {
        if self.state.export.running {
            self.state.push_log("[INFO] Export already running");
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Export unavailable");
            return;
        };
        let path = format!(
            "fpl_export_{}.xlsx",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        if tx.send(ProviderCommand::ExportWorkbook { path }).is_err() {
            self.state.push_log("[WARN] Export request failed");
        }
    }
}

fn step_index(current: usize, delta: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as i64 + delta;
    next.clamp(0, len as i64 - 1) as usize
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx));
    if persist::load_into_state(&mut app.state) {
        app.state.push_log("[INFO] Restored cached dataset");
    }
    let res = run_app(&mut terminal, &mut app, rx);

    if let Err(err) = persist::save_from_state(&app.state) {
        app.state.push_log(format!("[WARN] Snapshot save failed: {err:#}"));
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
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
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if app.state.tab.is_premium() && !app.state.access.unlocked {
        render_locked(frame, chunks[1]);
    } else {
        match app.state.tab {
            Tab::Players => render_players(frame, chunks[1], &app.state),
            Tab::TopPicks => render_top_picks(frame, chunks[1], &app.state),
            Tab::Performance => render_performance(frame, chunks[1], &app.state),
            Tab::Comparison => render_comparison(frame, chunks[1], &app.state),
            Tab::SetPieces => render_set_pieces(frame, chunks[1], &app.state),
        }
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.access.prompt_active {
        render_access_prompt(frame, frame.size(), &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let tabs = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let lock = if tab.is_premium() && !state.access.unlocked {
                "*"
            } else {
                ""
            };
            if *tab == state.tab {
                format!("[{} {}{}]", i + 1, tab.label(), lock)
            } else {
                format!(" {} {}{} ", i + 1, tab.label(), lock)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let status = if state.export.running {
        format!(
            " | export {}/{} {}",
            state.export.current, state.export.total, state.export.message
        )
    } else {
        String::new()
    };
    format!(
        "FPL TERMINAL | {}{}\n{}",
        state.data_updated_label(),
        status,
        tabs
    )
}

fn footer_text(state: &AppState) -> String {
    match state.tab {
        Tab::Players => {
            "Tab/1-5 Tabs | j/k Move | s Sort | p Pos | t Team | [/] Price | m/M Min | f/F Form | v/V Value | o/O Own% | c Clear | r Refresh | e Export | ? Help | q Quit"
                .to_string()
        }
        Tab::Performance => {
            "Tab/1-5 Tabs | j/k Move | Enter Fetch history | r Refresh | e Export | ? Help | q Quit".to_string()
        }
        Tab::Comparison => {
            "Tab/1-5 Tabs | ←/→ Pane | j/k Move | Space Toggle | ? Help | q Quit".to_string()
        }
        Tab::TopPicks | Tab::SetPieces => {
            "Tab/1-5 Tabs | r Refresh | e Export | ? Help | q Quit".to_string()
        }
    }
}

fn render_locked(frame: &mut Frame, area: Rect) {
    let text = "Pro feature locked\n\nEnter the access code to unlock Performance,\nComparison and Set Pieces.";
    let locked = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title("Locked").borders(Borders::ALL));
    frame.render_widget(locked, area);
}

// --- Players tab ------------------------------------------------------------

fn render_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(40)])
        .split(area);

    render_filter_sidebar(frame, columns[0], state);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(columns[1]);

    let widths = player_columns();
    render_player_header(frame, sections[0], &widths, state.sort);

    let list_area = sections[1];
    let players = state.filtered_players();
    if players.is_empty() {
        let empty = Paragraph::new("No players match the filters")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, players.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let selected = idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }
        render_player_row(frame, row_area, &widths, &players[idx], row_style);
    }
}

fn player_columns() -> [Constraint; 9] {
    [
        Constraint::Min(18),
        Constraint::Length(14),
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(7),
    ]
}

fn render_player_header(frame: &mut Frame, area: Rect, widths: &[Constraint], sort: SortKey) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "Player", style);
    render_cell_text(frame, cols[1], "Team", style);
    render_cell_text(frame, cols[2], "Pos", style);
    render_cell_text(frame, cols[3], "Price", style);
    render_cell_text(frame, cols[4], "Min", style);
    render_cell_text(frame, cols[5], "Pts", style);
    render_cell_text(frame, cols[6], "Form", style);
    render_cell_text(frame, cols[7], "Sel%", style);
    let score_head = if sort == SortKey::ValueScore {
        "Score*"
    } else {
        "Score"
    };
    render_cell_text(frame, cols[8], score_head, style);
}

fn render_player_row(
    frame: &mut Frame,
    area: Rect,
    widths: &[Constraint],
    player: &ScoredPlayer,
    style: Style,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);

    let record = &player.record;
    let pos = record
        .position
        .map(|p| p.short().to_string())
        .unwrap_or_else(|| "-".to_string());
    render_cell_text(frame, cols[0], &record.name, style);
    render_cell_text(frame, cols[1], &record.team, style);
    render_cell_text(frame, cols[2], &pos, style);
    render_cell_text(frame, cols[3], &format!("{:.1}", record.price), style);
    render_cell_text(frame, cols[4], &record.minutes.to_string(), style);
    render_cell_text(frame, cols[5], &format!("{:.0}", record.total_points()), style);
    render_cell_text(frame, cols[6], &format!("{:.1}", record.form()), style);
    render_cell_text(
        frame,
        cols[7],
        &format!("{:.1}", record.selected_by_percent()),
        style,
    );
    render_cell_text(frame, cols[8], &format!("{:.3}", player.value_score), style);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn render_filter_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let filters = &state.filters;
    let positions = if filters.positions.len() == 4 {
        "All".to_string()
    } else {
        let mut labels: Vec<&str> = filters.positions.iter().map(|p| p.short()).collect();
        labels.sort_unstable();
        labels.join(",")
    };
    let team = filters.team.clone().unwrap_or_else(|| "All".to_string());
    let lines = [
        format!("Sort: {}", state.sort.label()),
        String::new(),
        format!("Position: {positions}"),
        format!("Team: {team}"),
        format!("Max price: {:.1}m", filters.max_price),
        format!("Min minutes: {}", filters.min_minutes),
        format!("Min form: {:.1}", filters.min_form),
        format!("Min value: {:.1}", filters.min_value),
        format!("Max owned: {:.0}%", filters.max_selected),
    ]
    .join("\n");
    let sidebar = Paragraph::new(lines)
        .block(Block::default().title("Filters").borders(Borders::ALL));
    frame.render_widget(sidebar, area);
}

// --- Top Picks tab ----------------------------------------------------------

fn render_top_picks(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let players = state.filtered_players();

    let by_ppm = rankings::top_n(&players, SortKey::PointsPerMillion, rankings::DEFAULT_TOP_N);
    let ppm_lines = ranked_lines(&by_ppm, |p| {
        format!("{:.1}", SortKey::PointsPerMillion.value(p))
    });
    let ppm_panel = Paragraph::new(ppm_lines).block(
        Block::default()
            .title("Top 10 Points per Million")
            .borders(Borders::ALL),
    );
    frame.render_widget(ppm_panel, columns[0]);

    render_top_points_chart(frame, columns[1], &players);

    let differentials = rankings::differential_picks(&players);
    let diff_lines = if differentials.is_empty() {
        "No differentials under 10% ownership".to_string()
    } else {
        ranked_lines(&differentials, |p| {
            format!(
                "{:.1} val {:.1}%",
                p.record.value_season(),
                p.record.selected_by_percent()
            )
        })
    };
    let diff_panel = Paragraph::new(diff_lines).block(
        Block::default()
            .title("Differential Picks (<10% owned)")
            .borders(Borders::ALL),
    );
    frame.render_widget(diff_panel, columns[2]);
}

fn render_top_points_chart(frame: &mut Frame, area: Rect, players: &[ScoredPlayer]) {
    let block = Block::default()
        .title("Top 10 Total Points")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let top = rankings::top_n(players, SortKey::TotalPoints, rankings::DEFAULT_TOP_N);
    if top.is_empty() {
        frame.render_widget(
            Paragraph::new("No players").style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let bars: Vec<Bar> = top
        .iter()
        .map(|p| {
            Bar::default()
                .value(p.record.total_points().max(0.0) as u64)
                .label(truncate(&p.record.name, 10).into())
        })
        .collect();
    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(chart, inner);
}

fn ranked_lines(players: &[ScoredPlayer], value: impl Fn(&ScoredPlayer) -> String) -> String {
    if players.is_empty() {
        return "No players".to_string();
    }
    players
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{:>2}. {:<18} {:<12} {}",
                i + 1,
                p.record.name,
                p.record.team,
                value(p)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Performance tab --------------------------------------------------------

fn render_performance(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(30)])
        .split(area);

    render_player_picker(
        frame,
        columns[0],
        state,
        state.perf_selected,
        "Players (Enter = history)",
    );

    let Some(player) = state.selected_performance_player() else {
        let empty = Paragraph::new("No players loaded")
            .block(Block::default().title("Gameweeks").borders(Borders::ALL));
        frame.render_widget(empty, columns[1]);
        return;
    };

    let block = Block::default()
        .title(format!("Gameweeks: {}", player.record.name))
        .borders(Borders::ALL);
    let inner = block.inner(columns[1]);
    frame.render_widget(block, columns[1]);

    match state.history.get(&player.record.id) {
        Some(entries) if !entries.is_empty() => {
            let sections = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(8), Constraint::Min(1)])
                .split(inner);

            let bars: Vec<Bar> = entries
                .iter()
                .map(|e| {
                    Bar::default()
                        .value(e.total_points.max(0) as u64)
                        .label(format!("{}", e.round).into())
                })
                .collect();
            let chart = BarChart::default()
                .data(BarGroup::default().bars(&bars))
                .bar_width(3)
                .bar_gap(1);
            frame.render_widget(chart, sections[0]);

            let rows = entries
                .iter()
                .rev()
                .take(sections[1].height as usize)
                .map(|e| {
                    format!(
                        "GW{:<3} {:>3} pts  {:>4} min  vs {}",
                        e.round, e.total_points, e.minutes, e.opponent
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            frame.render_widget(Paragraph::new(rows), sections[1]);
        }
        _ => {
            let msg = if state.history_loading.contains(&player.record.id) {
                "Fetching history..."
            } else {
                "Press Enter to fetch gameweek history"
            };
            let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, inner);
        }
    }
}

fn render_player_picker(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    cursor: usize,
    title: &str,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.scored.is_empty() {
        frame.render_widget(Paragraph::new("No players"), inner);
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(cursor, state.scored.len(), visible);
    let lines = (start..end)
        .map(|idx| {
            let p = &state.scored[idx];
            let marker = if idx == cursor { "> " } else { "  " };
            format!("{marker}{} ({})", p.record.name, p.record.team)
        })
        .collect::<Vec<_>>()
        .join("\n");
    frame.render_widget(Paragraph::new(lines), inner);
}

// --- Comparison tab ---------------------------------------------------------

fn render_comparison(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Length(26),
            Constraint::Min(30),
        ])
        .split(area);

    render_compare_players(frame, columns[0], state);
    render_compare_metrics(frame, columns[1], state);
    render_compare_matrix(frame, columns[2], state);
}

fn render_compare_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.compare_focus == ComparisonFocus::Players;
    let title = if focused { "Players *" } else { "Players" };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.scored.is_empty() {
        frame.render_widget(Paragraph::new("No players"), inner);
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(state.compare_player_cursor, state.scored.len(), visible);
    let lines = (start..end)
        .map(|idx| {
            let p = &state.scored[idx];
            let cursor = if focused && idx == state.compare_player_cursor {
                ">"
            } else {
                " "
            };
            let mark = if state.compare_players.contains(&p.record.id) {
                "[x]"
            } else {
                "[ ]"
            };
            format!("{cursor}{mark} {} ({})", p.record.name, p.record.team)
        })
        .collect::<Vec<_>>()
        .join("\n");
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_compare_metrics(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.compare_focus == ComparisonFocus::Metrics;
    let title = if focused { "Metrics *" } else { "Metrics" };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = COMPARISON_METRICS
        .iter()
        .enumerate()
        .map(|(idx, key)| {
            let cursor = if focused && idx == state.compare_metric_cursor {
                ">"
            } else {
                " "
            };
            let mark = if state.compare_metrics.iter().any(|m| m == key) {
                "[x]"
            } else {
                "[ ]"
            };
            format!("{cursor}{mark} {key}")
        })
        .collect::<Vec<_>>()
        .join("\n");
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_compare_matrix(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Normalized (0..1 within selection)")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = match state.comparison() {
        Ok(matrix) => {
            let mut lines = Vec::new();
            let header = matrix
                .metrics
                .iter()
                .map(|m| format!("{:>8}", truncate(m, 8)))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("{:<16} {header}", "Player"));
            for (row_idx, name) in matrix.players.iter().enumerate() {
                let cells = matrix.values[row_idx]
                    .iter()
                    .map(|v| format!("{v:>8.2}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                lines.push(format!("{:<16} {cells}", truncate(name, 16)));
            }
            lines.join("\n")
        }
        Err(ComparisonError::NotEnoughPlayers) => {
            "Select at least 2 players with non-zero stats".to_string()
        }
        Err(ComparisonError::NotEnoughMetrics) => {
            "Select at least 2 metrics with data".to_string()
        }
    };
    frame.render_widget(Paragraph::new(text), inner);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}

// --- Set Pieces tab ---------------------------------------------------------

fn render_set_pieces(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Set-Piece Takers")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let records: Vec<_> = state.scored.iter().map(|p| p.record.clone()).collect();
    let rows = fpl_terminal::set_pieces::set_piece_rows(&records);
    if rows.is_empty() {
        let empty = Paragraph::new("No set-piece data in this dataset")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let mut lines = vec![format!(
        "{:<18} {:<14} {:<4} {:>7} {:>4} {:>4}",
        "Player", "Team", "Pos", "Corners", "FK", "Pen"
    )];
    for row in rows.iter().take(inner.height.saturating_sub(1) as usize) {
        lines.push(format!(
            "{:<18} {:<14} {:<4} {:>7} {:>4} {:>4}",
            truncate(&row.player, 18),
            truncate(&row.team, 14),
            truncate(&row.position, 4),
            order_label(row.corners),
            order_label(row.direct_freekicks),
            order_label(row.penalties),
        ));
    }
    frame.render_widget(Paragraph::new(lines.join("\n")), inner);
}

fn order_label(order: Option<u32>) -> String {
    order.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string())
}

// --- Overlays ---------------------------------------------------------------

fn render_access_prompt(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(50, 24, area);
    frame.render_widget(Clear, popup_area);

    let masked = "*".repeat(state.access.input.chars().count());
    let text = format!(
        "Pro features require an access code.\n\nCode: {masked}_\n\nEnter to submit, Esc to cancel"
    );
    let prompt = Paragraph::new(text)
        .block(Block::default().title("Access Code").borders(Borders::ALL));
    frame.render_widget(prompt, popup_area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FPL Terminal - Help",
        "",
        "Global:",
        "  Tab / 1-5    Switch tab",
        "  j/k or ↑/↓   Move",
        "  r            Refresh dataset",
        "  e            Export workbook",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Players:",
        "  s            Cycle sort key",
        "  p / t        Cycle position / team filter",
        "  [ ] m M f F  Adjust price/minutes/form",
        "  v V o O      Adjust value/ownership",
        "  c            Clear filters",
        "",
        "Performance:",
        "  Enter        Fetch gameweek history",
        "",
        "Comparison:",
        "  ←/→          Switch pane",
        "  Space/Enter  Toggle selection",
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use fpl_terminal::dataset::{AvailabilityStatus, PlayerRecord, Position};

    fn scored(name: &str) -> ScoredPlayer {
        ScoredPlayer {
            record: PlayerRecord {
                id: 1,
                name: name.to_string(),
                team: "Arsenal".to_string(),
                position_raw: "Midfielder".to_string(),
                position: Some(Position::Midfielder),
                price: 8.5,
                minutes: 900,
                status: AvailabilityStatus::Available,
                news: String::new(),
                stats: HashMap::new(),
            },
            value_score: 1.234,
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn player_row_renders_cells_on_centre_line() {
        let backend = TestBackend::new(80, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let widths = player_columns();
        let player = scored("Odegaard");
        terminal
            .draw(|frame| {
                render_player_row(frame, frame.size(), &widths, &player, Style::default());
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Odegaard"));
        assert!(text.contains("Arsenal"));
        assert!(text.contains("1.234"));
    }

    #[test]
    fn player_header_marks_active_sort_column() {
        let backend = TestBackend::new(80, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let widths = player_columns();
        terminal
            .draw(|frame| {
                render_player_header(frame, frame.size(), &widths, SortKey::ValueScore);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Player"));
        assert!(text.contains("Score*"));
    }
}
