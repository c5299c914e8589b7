// Game controller: session state machine around the board
// Handles deferred mine placement, input dispatch, win/loss and the stopwatch

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::msw_board::Board;
use crate::msw_error::ConfigError;
use crate::msw_timer::Stopwatch;

/// Session state. `Won` and `Lost` only end through `Game::new_session`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameState {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameState {
    pub fn is_finished(self) -> bool {
        matches!(self, GameState::Won | GameState::Lost)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
}

/// Input as delivered by the front end, in screen coordinates
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Closed,
    NewGame,
    ButtonPressed { x: i32, y: i32, button: Button },
}

/// Whether the event loop should keep going
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Screen layout of the grid: where cell (0, 0) starts and how large cells are.
/// `origin_y` covers the header band above the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub origin_x: i32,
    pub origin_y: i32,
    pub cell_width: i32,
    pub cell_height: i32,
    pub spacing: i32,
}

impl Geometry {
    pub const fn new(
        origin_x: i32,
        origin_y: i32,
        cell_width: i32,
        cell_height: i32,
        spacing: i32,
    ) -> Self {
        Geometry {
            origin_x,
            origin_y,
            cell_width,
            cell_height,
            spacing,
        }
    }

    /// Map a screen position to grid coordinates by floor division.
    /// The result may be off the grid; callers decide what to do with it.
    pub fn to_cell(&self, px: i32, py: i32) -> (i32, i32) {
        let step_x = (self.cell_width + self.spacing).max(1);
        let step_y = (self.cell_height + self.spacing).max(1);
        (
            (px - self.origin_x).div_euclid(step_x),
            (py - self.origin_y).div_euclid(step_y),
        )
    }
}

/// One play session: the board, its state machine and the elapsed-time clock
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    state: GameState,
    timer: Stopwatch,
    rng: StdRng,
    triggered: Option<(i32, i32)>, // Mine that ended the game
}

impl Game {
    pub fn new(dimension: usize, mines: usize) -> Result<Self, ConfigError> {
        Self::with_rng(dimension, mines, StdRng::from_entropy())
    }

    /// Like `new`, with a caller-supplied random source for mine placement
    pub fn with_rng(dimension: usize, mines: usize, rng: StdRng) -> Result<Self, ConfigError> {
        let board = Board::new(dimension, mines)?;
        info!(dimension, mines, "new session");
        Ok(Self::from_board(board, rng))
    }

    /// Start from a fixed mine layout; the first click does not re-place mines
    pub fn with_layout(dimension: usize, mines: &[(i32, i32)]) -> Result<Self, ConfigError> {
        let board = Board::with_mines(dimension, mines)?;
        Ok(Self::from_board(board, StdRng::from_entropy()))
    }

    fn from_board(board: Board, rng: StdRng) -> Self {
        Game {
            board,
            state: GameState::NotStarted,
            timer: Stopwatch::new(),
            rng,
            triggered: None,
        }
    }

    /// Throw away the current session and start a fresh one of the same size
    pub fn new_session(&mut self) {
        self.board.clear();
        self.state = GameState::NotStarted;
        self.timer.stop();
        self.timer.reset();
        self.triggered = None;
        info!(
            dimension = self.board.dimension(),
            mines = self.board.mine_count(),
            "new session"
        );
    }

    /// Reveal request at grid coordinates (x, y)
    /// - First reveal places mines around a guaranteed-empty cell and starts the clock
    /// - A mine ends the game and discloses every mine, flagged or not
    /// - A flagged safe cell stays covered
    /// - Revealing the last safe cell wins
    pub fn left_activate(&mut self, x: i32, y: i32) -> GameState {
        if self.state.is_finished() || !self.board.contains(x, y) || self.board.is_revealed(x, y)
        {
            return self.state;
        }

        if self.state == GameState::NotStarted {
            if !self.board.has_layout() {
                self.board.ensure_safe_first_reveal(&mut self.rng, (x, y));
            }
            self.timer.start();
            self.state = GameState::InProgress;
            debug!(x, y, "first reveal");
        }

        if self.board.is_mine(x, y) {
            self.triggered = Some((x, y));
            self.board.reveal_all();
            self.timer.stop();
            self.state = GameState::Lost;
            info!(x, y, secs = self.timer.elapsed_secs(), "mine hit, game lost");
            return self.state;
        }

        self.board.reveal(x, y);
        debug!(
            x,
            y,
            revealed = self.board.revealed_non_mine_count(),
            "cell revealed"
        );
        if self.board.revealed_non_mine_count() == self.board.safe_cell_count() {
            self.timer.stop();
            self.state = GameState::Won;
            info!(secs = self.timer.elapsed_secs(), "board cleared, game won");
        }
        self.state
    }

    /// Flag request at grid coordinates (x, y); never changes the game state
    pub fn right_activate(&mut self, x: i32, y: i32) {
        if self.state.is_finished() || !self.board.contains(x, y) {
            return;
        }
        self.board.toggle_flag(x, y);
        debug!(x, y, flagged = self.board.is_flagged(x, y), "flag toggled");
    }

    /// Apply one front-end event. Button positions are mapped through `geometry`
    /// and dropped when they fall outside the grid.
    pub fn handle_event(&mut self, event: InputEvent, geometry: &Geometry) -> Flow {
        match event {
            InputEvent::Closed => return Flow::Quit,
            InputEvent::NewGame => self.new_session(),
            InputEvent::ButtonPressed { x, y, button } => {
                let (cx, cy) = geometry.to_cell(x, y);
                if self.board.contains(cx, cy) {
                    match button {
                        Button::Left => {
                            self.left_activate(cx, cy);
                        }
                        Button::Right => self.right_activate(cx, cy),
                    }
                }
            }
        }
        Flow::Continue
    }

    /// Per-frame update of the clock
    pub fn tick(&mut self) {
        self.timer.update();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    /// Mines minus placed flags; negative when the player over-flags
    pub fn mines_left(&self) -> isize {
        self.board.mine_count() as isize - self.board.flag_count() as isize
    }

    pub fn triggered_mine(&self) -> Option<(i32, i32)> {
        self.triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const CORNERS_AND_CENTER: [(i32, i32); 5] = [(0, 0), (4, 0), (0, 4), (4, 4), (2, 2)];
    const PIXELS: Geometry = Geometry::new(0, 55, 40, 40, 1);

    fn revealed_cells(board: &Board) -> BTreeSet<(i32, i32)> {
        let d = board.dimension() as i32;
        (0..d)
            .flat_map(|y| (0..d).map(move |x| (x, y)))
            .filter(|&(x, y)| board.is_revealed(x, y))
            .collect()
    }

    fn seeded(dimension: usize, mines: usize, seed: u64) -> Game {
        Game::with_rng(dimension, mines, StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn first_click_is_safe_and_opens_an_area() {
        for seed in 0..20 {
            let mut game = seeded(9, 10, seed);
            let state = game.left_activate(4, 4);

            assert_ne!(state, GameState::Lost);
            assert_ne!(state, GameState::NotStarted);
            let board = game.board();
            assert!(!board.is_mine(4, 4));
            assert_eq!(board.adjacent_mine_count(4, 4), 0);
            assert!(board.revealed_non_mine_count() >= 9);
        }
    }

    #[test]
    fn new_rejects_bad_configuration() {
        assert_eq!(
            Game::new(4, 16).err(),
            Some(ConfigError::TooManyMines { mines: 16, cells: 16 })
        );
        assert_eq!(Game::new(0, 0).err(), Some(ConfigError::ZeroDimension));
    }

    #[test]
    fn known_layout_flood_fill_then_loss() {
        let mut game = Game::with_layout(5, &CORNERS_AND_CENTER).unwrap();
        assert_eq!(game.left_activate(2, 0), GameState::InProgress);
        let expected: BTreeSet<_> = [(1, 0), (2, 0), (3, 0), (1, 1), (2, 1), (3, 1)]
            .into_iter()
            .collect();
        assert_eq!(revealed_cells(game.board()), expected);

        let mut game = Game::with_layout(5, &CORNERS_AND_CENTER).unwrap();
        assert_eq!(game.left_activate(2, 2), GameState::Lost);
        assert_eq!(game.triggered_mine(), Some((2, 2)));
        for (x, y) in CORNERS_AND_CENTER {
            assert!(game.board().is_revealed(x, y));
        }
        assert_eq!(
            revealed_cells(game.board()),
            CORNERS_AND_CENTER.into_iter().collect()
        );
    }

    #[test]
    fn revealing_every_safe_cell_wins() {
        let mut game = Game::with_layout(3, &[(0, 0), (2, 2)]).unwrap();
        assert_eq!(game.left_activate(2, 0), GameState::InProgress);
        assert_eq!(game.left_activate(0, 2), GameState::Won);
        assert_eq!(game.board().revealed_non_mine_count(), 7);
        assert!(!game.board().is_revealed(0, 0));
    }

    #[test]
    fn single_click_can_win() {
        let mut game = Game::with_layout(3, &[(2, 2)]).unwrap();
        assert_eq!(game.left_activate(0, 0), GameState::Won);
        assert_eq!(game.triggered_mine(), None);
    }

    #[test]
    fn finished_games_ignore_input() {
        let mut game = Game::with_layout(3, &[(2, 2)]).unwrap();
        game.left_activate(0, 0);
        let before = game.board().clone();

        game.right_activate(2, 2);
        assert_eq!(game.left_activate(2, 2), GameState::Won);
        assert_eq!(game.board(), &before);

        let mut game = Game::with_layout(5, &CORNERS_AND_CENTER).unwrap();
        game.left_activate(0, 0);
        let before = game.board().clone();
        assert_eq!(game.left_activate(2, 0), GameState::Lost);
        game.right_activate(1, 1);
        assert_eq!(game.board(), &before);
    }

    #[test]
    fn first_click_on_flagged_cell_starts_game_but_keeps_it_covered() {
        let mut game = seeded(5, 5, 3);
        game.right_activate(0, 0);
        assert_eq!(game.state(), GameState::NotStarted);
        assert!(game.board().is_flagged(0, 0));
        assert_eq!(game.mines_left(), 4);

        assert_eq!(game.left_activate(0, 0), GameState::InProgress);
        assert!(game.board().has_layout());
        assert!(!game.board().is_mine(0, 0));
        assert!(!game.board().is_revealed(0, 0));
        assert!(game.board().is_flagged(0, 0));
        assert_eq!(game.board().revealed_non_mine_count(), 0);
    }

    #[test]
    fn flagged_mine_still_detonates() {
        let mut game = Game::with_layout(5, &CORNERS_AND_CENTER).unwrap();
        game.left_activate(2, 0);
        game.right_activate(2, 2);
        assert_eq!(game.left_activate(2, 2), GameState::Lost);
        assert_eq!(game.triggered_mine(), Some((2, 2)));
        assert!(game.board().is_revealed(2, 2));
        assert!(!game.board().is_flagged(2, 2));
    }

    #[test]
    fn flagged_safe_cell_stays_covered_in_progress() {
        let mut game = Game::with_layout(5, &CORNERS_AND_CENTER).unwrap();
        game.left_activate(2, 0);
        let before = game.board().revealed_non_mine_count();
        game.right_activate(1, 4);
        assert_eq!(game.left_activate(1, 4), GameState::InProgress);
        assert!(!game.board().is_revealed(1, 4));
        assert_eq!(game.board().revealed_non_mine_count(), before);
    }

    #[test]
    fn mines_left_goes_negative_when_over_flagged() {
        let mut game = Game::with_layout(3, &[(0, 0)]).unwrap();
        game.right_activate(0, 0);
        game.right_activate(1, 0);
        assert_eq!(game.mines_left(), -1);
        game.right_activate(1, 0);
        assert_eq!(game.mines_left(), 0);
    }

    #[test]
    fn out_of_range_activations_are_ignored() {
        let mut game = seeded(5, 5, 9);
        assert_eq!(game.left_activate(-1, 0), GameState::NotStarted);
        assert_eq!(game.left_activate(5, 5), GameState::NotStarted);
        game.right_activate(0, -1);
        assert_eq!(game.board().flag_count(), 0);
        assert!(!game.board().has_layout());
    }

    #[test]
    fn new_session_leaves_terminal_state() {
        let mut game = Game::with_layout(5, &CORNERS_AND_CENTER).unwrap();
        game.right_activate(1, 1);
        game.left_activate(0, 0);
        assert_eq!(game.state(), GameState::Lost);

        game.new_session();
        assert_eq!(game.state(), GameState::NotStarted);
        assert_eq!(game.triggered_mine(), None);
        assert_eq!(game.elapsed_secs(), 0);
        assert_eq!(game.mines_left(), 5);
        assert!(!game.board().has_layout());
        assert!(revealed_cells(game.board()).is_empty());

        let state = game.left_activate(2, 2);
        assert!(matches!(state, GameState::InProgress | GameState::Won));
        assert!(game.board().has_layout());
        assert_eq!(game.board().adjacent_mine_count(2, 2), 0);
    }

    #[test]
    fn geometry_maps_pixels_with_header_band() {
        assert_eq!(PIXELS.to_cell(0, 55), (0, 0));
        assert_eq!(PIXELS.to_cell(40, 95), (0, 0));
        assert_eq!(PIXELS.to_cell(41, 96), (1, 1));
        assert_eq!(PIXELS.to_cell(10, 20), (0, -1));

        let terminal = Geometry::new(1, 4, 2, 1, 0);
        assert_eq!(terminal.to_cell(1, 4), (0, 0));
        assert_eq!(terminal.to_cell(2, 4), (0, 0));
        assert_eq!(terminal.to_cell(3, 5), (1, 1));
        assert_eq!(terminal.to_cell(0, 4), (-1, 0));
    }

    #[test]
    fn handle_event_dispatches_and_filters() {
        let mut game = Game::with_layout(5, &CORNERS_AND_CENTER).unwrap();

        // click inside the header band
        let header_click = InputEvent::ButtonPressed {
            x: 90,
            y: 10,
            button: Button::Left,
        };
        assert_eq!(game.handle_event(header_click, &PIXELS), Flow::Continue);
        assert_eq!(game.state(), GameState::NotStarted);

        // right of the grid
        let outside = InputEvent::ButtonPressed {
            x: 5 * 41 + 3,
            y: 60,
            button: Button::Left,
        };
        game.handle_event(outside, &PIXELS);
        assert_eq!(game.state(), GameState::NotStarted);

        let flag = InputEvent::ButtonPressed {
            x: 41 * 4 + 5,
            y: 55 + 41 * 4 + 5,
            button: Button::Right,
        };
        game.handle_event(flag, &PIXELS);
        assert!(game.board().is_flagged(4, 4));

        let reveal = InputEvent::ButtonPressed {
            x: 41 * 2 + 20,
            y: 55 + 20,
            button: Button::Left,
        };
        game.handle_event(reveal, &PIXELS);
        assert_eq!(game.state(), GameState::InProgress);
        assert!(game.board().is_revealed(2, 0));

        assert_eq!(game.handle_event(InputEvent::NewGame, &PIXELS), Flow::Continue);
        assert_eq!(game.state(), GameState::NotStarted);
        assert_eq!(game.handle_event(InputEvent::Closed, &PIXELS), Flow::Quit);
    }
}
