use core::fmt;

use rand::{Rng, RngCore};
use thiserror::Error;
use tracing::debug;

use crate::board::{Grid, GridExplorer, Pos, PROBE_ORDER};

pub mod board;
mod solve;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Cell {
  Mine,
  Count(u8),
}

impl Cell {
  pub fn is_mine(self) -> bool {
    matches!(self, Cell::Mine)
  }

  pub fn is_blank(self) -> bool {
    matches!(self, Cell::Count(0))
  }
}

impl fmt::Display for Cell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Cell::Mine => write!(f, "*"),
      Cell::Count(0) => write!(f, " "),
      Cell::Count(mines) => write!(f, "{}", mines),
    }
  }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
  #[error("board size must be positive")]
  ZeroSize,
  #[error("cannot place {mines} mines on a board with {cells} cells")]
  TooManyMines { mines: u32, cells: u32 },
  #[error("position {0:?} is outside the board")]
  OutOfBounds(Pos),
}

/// Outcome of a reveal operation. Hitting a mine is a normal game result,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dig {
  Clear,
  Mine,
}

impl Dig {
  pub fn is_mine(self) -> bool {
    matches!(self, Dig::Mine)
  }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BoardSetup {
  grid: Grid<Cell>,
  mines: u32,
}

impl BoardSetup {
  /// Builds the cell grid from an explicit mine grid: every non-mine cell
  /// gets the number of mines in its clipped 8-neighbourhood.
  pub fn new(mines: &Grid<bool>) -> Self {
    let mut grid = Grid::new(mines.rows, mines.cols, Cell::Count(0));
    let mut count = 0;
    for (pos, &is_mine) in mines.enumerate() {
      if is_mine {
        count += 1;
        grid[pos] = Cell::Mine;
      } else {
        let around = pos.neighbours().filter(|&n| mines.get(n) == Some(&true)).count();
        grid[pos] = Cell::Count(around as u8);
      }
    }

    BoardSetup { grid, mines: count }
  }

  /// Plants `mines` mines on a `size`x`size` grid by drawing uniform linear
  /// indices and retrying duplicates until all are placed.
  pub fn random(size: u32, mines: u32, rng: &mut dyn RngCore) -> Result<Self, BoardError> {
    if size == 0 {
      return Err(BoardError::ZeroSize);
    }
    let cells = size * size;
    if mines >= cells {
      return Err(BoardError::TooManyMines { mines, cells });
    }

    let mut grid = Grid::new(size, size, false);
    let mut planted = 0;
    while planted < mines {
      let index = rng.gen_range(0..cells as usize);
      let pos = Pos::new((index / size as usize) as i32, (index % size as usize) as i32);
      if grid[pos] {
        continue;
      }
      grid[pos] = true;
      planted += 1;
    }
    debug!(size, mines, "planted mines");

    Ok(Self::new(&grid))
  }

  pub fn grid(&self) -> &Grid<Cell> {
    &self.grid
  }

  pub fn mines(&self) -> u32 {
    self.mines
  }
}

impl fmt::Debug for BoardSetup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for row in 0..self.grid.rows {
      for col in 0..self.grid.cols {
        write!(f, "{}", self.grid[Pos::new(row as i32, col as i32)])?;
      }
      writeln!(f)?;
    }

    Ok(())
  }
}

pub struct Board {
  setup: BoardSetup,
  revealed: Grid<bool>,
  revealed_count: u32,
  detonated: Option<Pos>,
  rng: Box<dyn RngCore>,
}

impl Board {
  pub fn new(size: u32, mines: u32) -> Result<Board, BoardError> {
    Self::with_rng(size, mines, Box::new(rand::thread_rng()))
  }

  pub fn with_rng(size: u32, mines: u32, mut rng: Box<dyn RngCore>) -> Result<Board, BoardError> {
    let setup = BoardSetup::random(size, mines, rng.as_mut())?;
    Ok(Self::from_setup(setup, rng))
  }

  pub fn from_setup(setup: BoardSetup, rng: Box<dyn RngCore>) -> Board {
    Board {
      revealed: Grid::new(setup.grid.rows, setup.grid.cols, false),
      revealed_count: 0,
      detonated: None,
      rng,
      setup,
    }
  }

  pub fn setup(&self) -> &BoardSetup {
    &self.setup
  }

  pub fn grid(&self) -> &Grid<Cell> {
    &self.setup.grid
  }

  pub fn size(&self) -> u32 {
    self.grid().rows
  }

  pub fn mines(&self) -> u32 {
    self.setup.mines
  }

  pub fn cell_count(&self) -> u32 {
    self.grid().rows * self.grid().cols
  }

  pub fn revealed_count(&self) -> u32 {
    self.revealed_count
  }

  pub fn is_revealed(&self, pos: Pos) -> bool {
    self.revealed.get(pos) == Some(&true)
  }

  /// The cell at `pos` if it has been revealed, `None` while it is hidden.
  pub fn view(&self, pos: Pos) -> Option<Cell> {
    if self.is_revealed(pos) {
      self.grid().get(pos).copied()
    } else {
      None
    }
  }

  pub fn detonated(&self) -> Option<Pos> {
    self.detonated
  }

  pub fn is_loss(&self) -> bool {
    self.detonated.is_some()
  }

  pub fn is_win(&self) -> bool {
    self.detonated.is_none() && self.revealed_count == self.cell_count() - self.mines()
  }

  pub(crate) fn mark_revealed(&mut self, pos: Pos) {
    if let Some(seen) = self.revealed.get_mut(pos) {
      if !*seen {
        *seen = true;
        self.revealed_count += 1;
        if self.setup.grid[pos].is_mine() {
          self.detonated = Some(pos);
        }
      }
    }
  }

  pub(crate) fn unmarked_neighbours(&self, pos: Pos) -> Vec<Pos> {
    pos
      .neighbours()
      .filter(|&n| self.grid().get(n).is_some() && !self.is_revealed(n))
      .collect()
  }

  /// All eight neighbour slots are on the board and have no adjacent mines.
  pub(crate) fn neighbours_all_blank(&self, pos: Pos) -> bool {
    pos.neighbours().all(|n| self.grid().get(n).map_or(false, |c| c.is_blank()))
  }

  /// All eight neighbour slots are on the board and none of them is a mine.
  pub(crate) fn neighbours_mine_free(&self, pos: Pos) -> bool {
    pos.neighbours().all(|n| self.grid().get(n).map_or(false, |c| !c.is_mine()))
  }

  /// Flood-fill reveal. Reveals `pos`; a mine ends the game with the mine
  /// left in the revealed set, a numbered cell stops the spread, and a blank
  /// cell opens its whole zero-connected component plus the numbered border.
  pub fn dig(&mut self, pos: Pos) -> Result<Dig, BoardError> {
    let cell = *self.grid().get(pos).ok_or(BoardError::OutOfBounds(pos))?;
    if self.is_loss() {
      return Ok(Dig::Mine);
    }

    self.mark_revealed(pos);
    if cell.is_mine() {
      debug!(?pos, "dug up a mine");
      return Ok(Dig::Mine);
    }
    if !cell.is_blank() {
      return Ok(Dig::Clear);
    }

    let mut explorer = GridExplorer::from(self.grid());
    explorer.enqueue(pos);
    while let Some(next) = explorer.pop() {
      self.mark_revealed(next);
      if self.grid()[next].is_blank() {
        explorer.enqueue_all(next.neighbours());
      }
    }

    Ok(Dig::Clear)
  }

  /// Single-path reveal. Instead of flooding, each step moves to exactly one
  /// follow-up cell: the clamped upper-left neighbour after a blank cell, or
  /// the first unrevealed in-bounds neighbour in probe order after a numbered
  /// one. Large parts of a zero-region may stay hidden. The weak coverage is
  /// deliberate and kept for compatibility.
  pub fn dfs_dig(&mut self, pos: Pos) -> Result<Dig, BoardError> {
    if self.grid().get(pos).is_none() {
      return Err(BoardError::OutOfBounds(pos));
    }
    if self.is_loss() {
      return Ok(Dig::Mine);
    }

    let mut pos = pos;
    loop {
      let cell = self.grid()[pos];
      self.mark_revealed(pos);
      if self.revealed_count == self.cell_count() {
        return Ok(Dig::Clear);
      }
      if cell.is_mine() {
        debug!(?pos, "dug up a mine");
        return Ok(Dig::Mine);
      }

      let next = if cell.is_blank() {
        let clamped = Pos::new((pos.row - 1).max(0), (pos.col - 1).max(0));
        if self.is_revealed(clamped) {
          None
        } else {
          Some(clamped)
        }
      } else {
        PROBE_ORDER
          .iter()
          .map(|&step| pos + step)
          .find(|&n| self.grid().get(n).is_some() && !self.is_revealed(n))
      };

      match next {
        Some(n) => pos = n,
        None => return Ok(Dig::Clear),
      }
    }
  }
}

impl From<BoardSetup> for Board {
  fn from(setup: BoardSetup) -> Self {
    Self::from_setup(setup, Box::new(rand::thread_rng()))
  }
}

impl fmt::Debug for Board {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for row in 0..self.grid().rows {
      for col in 0..self.grid().cols {
        let pos = Pos::new(row as i32, col as i32);
        if self.is_revealed(pos) {
          write!(f, "{}", self.grid()[pos])?;
        } else {
          write!(f, "░")?;
        }
      }
      writeln!(f)?;
    }

    Ok(())
  }
}
