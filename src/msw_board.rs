// Board model: grid ownership, mine placement, adjacency counts,
// reveal/flag transitions. Knows nothing about rendering, input or game over.

use rand::Rng;
use rand::seq::index::sample;
use tracing::{debug, warn};

use crate::msw_error::ConfigError;

/// Largest accepted board dimension; keeps every coordinate representable as `i32`.
pub const MAX_DIMENSION: usize = 1024;

/// Offsets of the up-to-8 neighbors of a cell
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A single square of the grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cell {
    mine: bool,     // Contains a mine
    revealed: bool, // Disclosed to the player
    flagged: bool,  // Marked by the player
    adj: u8,        // Adjacent mine count (0-8)
}

/// What a renderer should draw for one cell, derived only from the query contract
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Flagged,
    Mine,
    Empty,
    Number(u8),
}

/// Square minefield of `dimension` x `dimension` cells.
///
/// All coordinates are `(x, y)` with `x` the column and `y` the row. Queries and
/// mutations accept any `i32` pair; coordinates outside the grid read as
/// false/zero and mutate nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    dimension: usize,
    mines: usize,
    cells: Vec<Cell>,
    placed: bool,         // Mine set established for this session
    revealed_safe: usize, // Revealed cells without a mine
}

fn validate(dimension: usize, mines: usize) -> Result<(), ConfigError> {
    if dimension == 0 {
        return Err(ConfigError::ZeroDimension);
    }
    if dimension > MAX_DIMENSION {
        return Err(ConfigError::DimensionTooLarge {
            dimension,
            max: MAX_DIMENSION,
        });
    }
    let cells = dimension * dimension;
    if mines >= cells {
        return Err(ConfigError::TooManyMines { mines, cells });
    }
    Ok(())
}

impl Board {
    /// Create an empty board; mines are placed later, on the first reveal
    pub fn new(dimension: usize, mines: usize) -> Result<Self, ConfigError> {
        validate(dimension, mines)?;
        Ok(Board {
            dimension,
            mines,
            cells: vec![Cell::default(); dimension * dimension],
            placed: false,
            revealed_safe: 0,
        })
    }

    /// Create a board with a fixed mine layout. Duplicate coordinates count once.
    pub fn with_mines(dimension: usize, mines: &[(i32, i32)]) -> Result<Self, ConfigError> {
        let mut board = Board::new(dimension, 0)?;
        for &(x, y) in mines {
            let idx = board
                .index(x, y)
                .ok_or(ConfigError::MineOutOfBounds { x, y })?;
            board.cells[idx].mine = true;
        }
        let count = board.cells.iter().filter(|c| c.mine).count();
        validate(dimension, count)?;
        board.mines = count;
        board.compute_adjacency();
        board.placed = true;
        Ok(board)
    }

    /// Forget the mine layout and all player progress, keeping dimension and mine count
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        self.placed = false;
        self.revealed_safe = 0;
    }

    /// True if (x, y) lies on the grid
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Convert (x, y) coordinates to a flat index, or None when off the grid
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.dimension || y >= self.dimension {
            return None;
        }
        Some(y * self.dimension + x)
    }

    fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    fn neighbors(&self, x: i32, y: i32) -> impl Iterator<Item = usize> + '_ {
        NEIGHBORS
            .iter()
            .filter_map(move |&(dx, dy)| self.index(x + dx, y + dy))
    }

    /// Randomly place the configured number of mines anywhere except `excluding`,
    /// then recompute every adjacency count. Any previous layout is discarded.
    pub fn place_mines<R: Rng + ?Sized>(&mut self, rng: &mut R, excluding: (i32, i32)) {
        for cell in &mut self.cells {
            cell.mine = false;
            cell.adj = 0;
        }
        let excluded = self.index(excluding.0, excluding.1);
        let candidates: Vec<usize> = (0..self.cells.len())
            .filter(|&i| Some(i) != excluded)
            .collect();
        for pick in sample(rng, candidates.len(), self.mines) {
            self.cells[candidates[pick]].mine = true;
        }
        self.compute_adjacency();
        self.revealed_safe = self
            .cells
            .iter()
            .filter(|c| c.revealed && !c.mine)
            .count();
        self.placed = true;
    }

    fn compute_adjacency(&mut self) {
        let d = self.dimension as i32;
        for y in 0..d {
            for x in 0..d {
                let adj = self.neighbors(x, y).filter(|&i| self.cells[i].mine).count() as u8;
                let idx = y as usize * self.dimension + x as usize;
                self.cells[idx].adj = adj;
            }
        }
    }

    /// Re-place mines until the cell at `c` is safe and has no mine neighbors.
    /// Returns the number of placement attempts.
    ///
    /// With more than `D*D - 9` mines an interior cell can never have a zero
    /// count and this does not return.
    pub fn ensure_safe_first_reveal<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        c: (i32, i32),
    ) -> usize {
        if self.mines + 9 > self.cells.len() {
            warn!(
                mines = self.mines,
                cells = self.cells.len(),
                "mine density too high, a zero first cell may be unreachable"
            );
        }
        let mut attempts = 0;
        loop {
            self.place_mines(rng, c);
            attempts += 1;
            if !self.is_mine(c.0, c.1) && self.adjacent_mine_count(c.0, c.1) == 0 {
                break;
            }
        }
        debug!(attempts, x = c.0, y = c.1, "mines placed around safe first cell");
        attempts
    }

    /// Reveal a cell. Zero-count cells disclose their neighbors, transitively.
    /// Out-of-range, revealed and flagged cells are left alone; flags therefore
    /// stop the flood fill. Revealing a mine only marks it revealed.
    pub fn reveal(&mut self, x: i32, y: i32) {
        let mut pending = vec![(x, y)];
        while let Some((x, y)) = pending.pop() {
            let Some(idx) = self.index(x, y) else {
                continue;
            };
            let cell = &mut self.cells[idx];
            if cell.revealed || cell.flagged {
                continue;
            }
            cell.revealed = true;
            let (mine, adj) = (cell.mine, cell.adj);
            if mine {
                continue;
            }
            self.revealed_safe += 1;
            if adj == 0 {
                pending.extend(NEIGHBORS.iter().map(|&(dx, dy)| (x + dx, y + dy)));
            }
        }
    }

    /// Flip the flag on an unrevealed cell
    pub fn toggle_flag(&mut self, x: i32, y: i32) {
        if let Some(idx) = self.index(x, y) {
            let cell = &mut self.cells[idx];
            if !cell.revealed {
                cell.flagged = !cell.flagged;
            }
        }
    }

    /// Reveal every mine, e.g. after a loss. Safe cells are not touched.
    pub fn reveal_all(&mut self) {
        for cell in self.cells.iter_mut().filter(|c| c.mine) {
            cell.flagged = false;
            cell.revealed = true;
        }
    }

    pub fn is_mine(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(|c| c.mine)
    }

    pub fn is_revealed(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(|c| c.revealed)
    }

    pub fn is_flagged(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(|c| c.flagged)
    }

    pub fn adjacent_mine_count(&self, x: i32, y: i32) -> u8 {
        self.cell(x, y).map_or(0, |c| c.adj)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    pub fn revealed_non_mine_count(&self) -> usize {
        self.revealed_safe
    }

    /// Number of safe cells; revealing all of them wins
    pub fn safe_cell_count(&self) -> usize {
        self.cells.len() - self.mines
    }

    pub fn flag_count(&self) -> usize {
        self.cells.iter().filter(|c| c.flagged).count()
    }

    /// True once a mine layout exists for this session
    pub fn has_layout(&self) -> bool {
        self.placed
    }

    pub fn view(&self, x: i32, y: i32) -> CellView {
        match self.cell(x, y) {
            None => CellView::Hidden,
            Some(c) if c.revealed && c.mine => CellView::Mine,
            Some(c) if c.revealed && c.adj == 0 => CellView::Empty,
            Some(c) if c.revealed => CellView::Number(c.adj),
            Some(c) if c.flagged => CellView::Flagged,
            Some(_) => CellView::Hidden,
        }
    }
}
