use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::msw_board::CellView;
use crate::msw_color::{TermMatch, number_color};
use crate::msw_config::Config;
use crate::msw_game::{Button, Flow, Game, GameState, Geometry, InputEvent};

/// Rows reserved above the board for the timer/status band
pub const HEADER_HEIGHT: u16 = 3;
/// Terminal columns per cell (a padding space plus the glyph)
pub const CELL_WIDTH: u16 = 2;
/// Cells start just inside the board border, under the header band
pub const GEOMETRY: Geometry =
    Geometry::new(1, HEADER_HEIGHT as i32 + 1, CELL_WIDTH as i32, 1, 0);

const MIN_HEADER_WIDTH: u16 = 44;
const KEY_HELP: &str = "N: New  Q: Quit ";

/// Glyph set, Unicode or ASCII fallback
struct Glyphs {
    hidden: &'static str,
    flag: &'static str,
    mine: &'static str,
}

impl Glyphs {
    fn new(ascii: bool) -> Self {
        Glyphs {
            hidden: if ascii { "." } else { "■" },
            flag: if ascii { "F" } else { "⚑" },
            mine: if ascii { "*" } else { "☼" },
        }
    }
}

/// Colors used on the board, adjusted to the terminal's color depth
struct Palette {
    board_bg: Color,
    hidden_fg: Color,
    flag_fg: Color,
    mine_fg: Color,
    exploded_bg: Color,
    cursor_bg: Color,
}

impl Palette {
    fn new() -> Self {
        Palette {
            board_bg: Color::DarkGray.term_match(),
            hidden_fg: Color::Gray.term_match(),
            flag_fg: Color::Red.term_match(),
            mine_fg: Color::Black.term_match(),
            exploded_bg: Color::Red.term_match(),
            cursor_bg: Color::LightBlue.term_match(),
        }
    }
}

/// Puts the terminal back in cooked mode on the main screen when dropped,
/// including on early returns and panics
struct RestoreGuard<W: Write> {
    out: W,
}

impl<W: Write> RestoreGuard<W> {
    fn new(out: W) -> Self {
        RestoreGuard { out }
    }
}

impl<W: Write> Drop for RestoreGuard<W> {
    fn drop(&mut self) {
        // Nothing useful to do with errors here
        let _ = disable_raw_mode();
        let _ = execute!(
            self.out,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        );
    }
}

/// Run the interactive session until the player quits.
/// The terminal is restored even when the loop fails.
pub fn run(game: &mut Game, cfg: &Config) -> Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let _restore = RestoreGuard::new(io::stdout());
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)
        .context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("initializing terminal")?;

    event_loop(&mut terminal, game, cfg)
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, game: &mut Game, cfg: &Config) -> Result<()> {
    let glyphs = Glyphs::new(cfg.ascii_icons);
    let palette = Palette::new();
    let mut cursor = (0i32, 0i32);

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        game.tick();
        terminal.draw(|f| draw(f, game, &glyphs, &palette, cursor))?;

        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            let flow = match event::read()? {
                Event::Key(key) => on_key(key, game, &mut cursor),
                Event::Mouse(me) => on_mouse(me, game, &mut cursor),
                // Resize just needs the next redraw
                _ => Flow::Continue,
            };
            if flow == Flow::Quit {
                info!("player quit");
                return Ok(());
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

/// Move the keyboard cursor, clamped to the board
fn step_cursor(cursor: (i32, i32), dx: i32, dy: i32, dimension: usize) -> (i32, i32) {
    let max = dimension as i32 - 1;
    ((cursor.0 + dx).clamp(0, max), (cursor.1 + dy).clamp(0, max))
}

fn on_key(key: KeyEvent, game: &mut Game, cursor: &mut (i32, i32)) -> Flow {
    if key.kind != KeyEventKind::Press {
        return Flow::Continue;
    }
    let dimension = game.board().dimension();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            return game.handle_event(InputEvent::Closed, &GEOMETRY);
        }
        KeyCode::F(2) | KeyCode::Char('n') => {
            return game.handle_event(InputEvent::NewGame, &GEOMETRY);
        }
        KeyCode::Left | KeyCode::Char('h') => *cursor = step_cursor(*cursor, -1, 0, dimension),
        KeyCode::Right | KeyCode::Char('l') => *cursor = step_cursor(*cursor, 1, 0, dimension),
        KeyCode::Up | KeyCode::Char('k') => *cursor = step_cursor(*cursor, 0, -1, dimension),
        KeyCode::Down | KeyCode::Char('j') => *cursor = step_cursor(*cursor, 0, 1, dimension),
        KeyCode::Char(' ') | KeyCode::Enter => {
            game.left_activate(cursor.0, cursor.1);
        }
        KeyCode::Char('f') => game.right_activate(cursor.0, cursor.1),
        _ => {}
    }
    Flow::Continue
}

fn on_mouse(me: MouseEvent, game: &mut Game, cursor: &mut (i32, i32)) -> Flow {
    let (x, y) = (me.column as i32, me.row as i32);
    let button = match me.kind {
        MouseEventKind::Down(MouseButton::Left) => Button::Left,
        MouseEventKind::Down(MouseButton::Right) => Button::Right,
        MouseEventKind::Moved => {
            let cell = GEOMETRY.to_cell(x, y);
            if game.board().contains(cell.0, cell.1) {
                *cursor = cell;
            }
            return Flow::Continue;
        }
        _ => return Flow::Continue,
    };
    debug!(x, y, ?button, "mouse press");
    let cell = GEOMETRY.to_cell(x, y);
    if game.board().contains(cell.0, cell.1) {
        *cursor = cell;
    }
    game.handle_event(InputEvent::ButtonPressed { x, y, button }, &GEOMETRY)
}

fn status_text(state: GameState) -> &'static str {
    match state {
        GameState::NotStarted => "Click a cell to start",
        GameState::InProgress => "Sweeping...",
        GameState::Won => "Cleared! You win",
        GameState::Lost => "Boom! Game over",
    }
}

fn draw<B: Backend>(
    f: &mut Frame<B>,
    game: &Game,
    glyphs: &Glyphs,
    palette: &Palette,
    cursor: (i32, i32),
) {
    let size = f.size();
    let d = game.board().dimension() as u16;
    // border on both sides plus one trailing padding column
    let board_w = d * CELL_WIDTH + 3;
    let board_h = d + 2;
    let min_w = board_w.max(MIN_HEADER_WIDTH);
    let min_h = HEADER_HEIGHT + board_h;

    // If terminal too small, render a centered warning and skip the board
    if size.width < min_w || size.height < min_h {
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", min_w, min_h))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let w = 40u16.min(size.width);
        let h = 4u16.min(size.height);
        f.render_widget(warn, center_rect(w, h, size));
        return;
    }

    draw_header(f, Rect::new(0, 0, min_w, HEADER_HEIGHT), game);
    draw_board(f, Rect::new(0, HEADER_HEIGHT, board_w, board_h), game, glyphs, palette, cursor);
}

fn draw_header<B: Backend>(f: &mut Frame<B>, area: Rect, game: &Game) {
    let left_text = format!(
        " Mines: {}   Time: {}s   {}",
        game.mines_left(),
        game.elapsed_secs(),
        status_text(game.state())
    );
    let inner_w = area.width.saturating_sub(2) as usize;
    let used = left_text.as_str().width() + KEY_HELP.width();
    let mid_spaces = inner_w.saturating_sub(used).max(1);

    let status_style = match game.state() {
        GameState::Won => Style::default()
            .fg(Color::Green.term_match())
            .add_modifier(Modifier::BOLD),
        GameState::Lost => Style::default()
            .fg(Color::Red.term_match())
            .add_modifier(Modifier::BOLD),
        _ => Style::default(),
    };
    let spans = vec![
        Span::styled(left_text, status_style),
        Span::raw(" ".repeat(mid_spaces)),
        Span::styled(KEY_HELP, Style::default().fg(Color::Yellow.term_match())),
    ];
    let header = Paragraph::new(Text::from(Spans::from(spans)))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

fn draw_board<B: Backend>(
    f: &mut Frame<B>,
    area: Rect,
    game: &Game,
    glyphs: &Glyphs,
    palette: &Palette,
    cursor: (i32, i32),
) {
    let board = game.board();
    let d = board.dimension() as i32;
    let won = game.state() == GameState::Won;
    let base = Style::default().bg(palette.board_bg);

    let mut lines = Vec::with_capacity(d as usize);
    for y in 0..d {
        let mut spans = Vec::with_capacity(d as usize + 1);
        for x in 0..d {
            let (s, mut style) = match board.view(x, y) {
                // a won board shows its remaining mines as flags
                CellView::Hidden if won && board.is_mine(x, y) => {
                    (glyphs.flag.to_string(), base.fg(palette.flag_fg))
                }
                CellView::Hidden => (glyphs.hidden.to_string(), base.fg(palette.hidden_fg)),
                CellView::Flagged => (glyphs.flag.to_string(), base.fg(palette.flag_fg)),
                CellView::Mine if game.triggered_mine() == Some((x, y)) => {
                    (glyphs.mine.to_string(), base.fg(palette.mine_fg).bg(palette.exploded_bg))
                }
                CellView::Mine => (glyphs.mine.to_string(), base.fg(palette.mine_fg)),
                CellView::Empty => (" ".to_string(), base),
                CellView::Number(n) => (
                    n.to_string(),
                    base.fg(number_color(n)).add_modifier(Modifier::BOLD),
                ),
            };
            if cursor == (x, y) && !game.state().is_finished() {
                style = style.bg(palette.cursor_bg);
            }
            spans.push(Span::styled(format!(" {}", s), style));
        }
        // trailing padding column in the board background
        spans.push(Span::styled(" ", base));
        lines.push(Spans::from(spans));
    }

    let title = format!("{0}x{0}", d);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
