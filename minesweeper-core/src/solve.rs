use std::collections::HashSet;

use rand::Rng;
use tracing::trace;

use crate::board::Pos;
use crate::{Board, BoardError, Dig};

fn pop_arbitrary(set: &mut HashSet<Pos>) -> Option<Pos> {
  let pos = set.iter().next().copied()?;
  set.remove(&pos);
  Some(pos)
}

impl Board {
  /// Single-point deduction. Drains a frontier of cells to examine; a cell
  /// whose eight neighbours are all blank expands them into the frontier, a
  /// cell whose eight neighbours are all mine-free reveals them directly,
  /// anything else is skipped. The outer guard (the starting cell is not a
  /// mine and revealed cells plus mines have not reached the grid) is
  /// checked once per pass, not per cell. Best-effort: the frontier can run
  /// dry long before the board is cleared.
  pub fn single_point(&mut self, pos: Pos) -> Result<Dig, BoardError> {
    if self.grid().get(pos).is_none() {
      return Err(BoardError::OutOfBounds(pos));
    }
    if self.is_loss() {
      return Ok(Dig::Mine);
    }

    let start = pos;
    let mut frontier: HashSet<Pos> = HashSet::from([pos]);
    while !self.grid()[start].is_mine() && self.revealed_count() + self.mines() < self.cell_count() {
      if frontier.is_empty() {
        break;
      }
      let pass: Vec<Pos> = frontier.drain().collect();
      trace!(cells = pass.len(), "single-point pass");
      for pos in pass {
        self.mark_revealed(pos);
        if self.grid()[pos].is_mine() {
          return Ok(Dig::Mine);
        }
        let unmarked = self.unmarked_neighbours(pos);
        if self.neighbours_all_blank(pos) {
          frontier.extend(unmarked);
        } else if self.neighbours_mine_free(pos) {
          for neighbour in unmarked {
            self.mark_revealed(neighbour);
          }
        }
      }
    }

    Ok(Dig::Clear)
  }

  /// Double-set single-point deduction. Keeps an active frontier and a set
  /// of deferred cells. An empty frontier is reseeded with a random probe
  /// that may land outside the grid; the drain discards such positions.
  /// After each drain, deferred cells with an all-mine-free neighbourhood
  /// reveal their neighbours, then deferred cells with an all-blank
  /// neighbourhood feed the frontier again. Both passes remove the handled
  /// cell from the deferred set by its coordinate.
  pub fn double_set_single_point(&mut self, pos: Pos) -> Result<Dig, BoardError> {
    if self.grid().get(pos).is_none() {
      return Err(BoardError::OutOfBounds(pos));
    }
    if self.is_loss() {
      return Ok(Dig::Mine);
    }

    let start = pos;
    let mut next_set: HashSet<Pos> = HashSet::from([pos]);
    let mut q_set: HashSet<Pos> = HashSet::new();
    while !self.grid()[start].is_mine() && self.revealed_count() + self.mines() < self.cell_count() {
      if next_set.is_empty() {
        next_set.insert(self.random_probe());
      }
      trace!(frontier = next_set.len(), deferred = q_set.len(), "double-set pass");

      while let Some(pos) = pop_arbitrary(&mut next_set) {
        if self.grid().get(pos).is_none() {
          continue;
        }
        self.mark_revealed(pos);
        if self.grid()[pos].is_mine() {
          return Ok(Dig::Mine);
        }
        if self.neighbours_all_blank(pos) {
          next_set.extend(self.unmarked_neighbours(pos));
        } else {
          q_set.insert(pos);
        }
      }

      let deferred: Vec<Pos> = q_set.iter().copied().collect();
      for pos in deferred {
        if self.neighbours_mine_free(pos) {
          for neighbour in self.unmarked_neighbours(pos) {
            self.mark_revealed(neighbour);
          }
          q_set.remove(&pos);
        }
      }

      let deferred: Vec<Pos> = q_set.iter().copied().collect();
      for pos in deferred {
        if self.neighbours_all_blank(pos) {
          next_set.extend(self.unmarked_neighbours(pos));
          q_set.remove(&pos);
        }
      }
    }

    Ok(Dig::Clear)
  }

  /// Uniform draw over `[0, rows] x [0, cols]`, both ends inclusive, so the
  /// result can land one step outside the grid and must be bounds-checked.
  fn random_probe(&mut self) -> Pos {
    let rows = self.grid().rows as i32;
    let cols = self.grid().cols as i32;
    Pos::new(self.rng.gen_range(0..=rows), self.rng.gen_range(0..=cols))
  }
}

#[cfg(test)]
mod tests {
  use crate::board::Pos;
  use crate::tests::{board_with_mines, mines_at, seeded};
  use crate::{Board, BoardError, BoardSetup, Dig};

  #[test]
  fn single_point_clears_a_mine_free_board() {
    let mut board = board_with_mines(5, &[]);
    assert_eq!(board.single_point(Pos::new(2, 2)), Ok(Dig::Clear));
    assert_eq!(board.revealed_count(), 25);
    assert!(board.is_win());
  }

  #[test]
  fn single_point_reveals_a_safe_neighbourhood_directly() {
    let mut board = board_with_mines(4, &[(0, 0)]);
    assert_eq!(board.single_point(Pos::new(2, 2)), Ok(Dig::Clear));
    assert_eq!(board.revealed_count(), 9);
    assert!(board.is_revealed(Pos::new(2, 2)));
    for neighbour in Pos::new(2, 2).neighbours() {
      assert!(board.is_revealed(neighbour));
    }
    assert!(!board.is_revealed(Pos::new(0, 0)));
    assert!(!board.is_win());
    assert!(!board.is_loss());
  }

  #[test]
  fn single_point_skips_an_edge_cell_with_no_information() {
    let mut board = board_with_mines(4, &[(0, 0)]);
    assert_eq!(board.single_point(Pos::new(0, 3)), Ok(Dig::Clear));
    assert_eq!(board.revealed_count(), 1);
    assert!(board.is_revealed(Pos::new(0, 3)));
  }

  // The outer guard checks the starting cell before the first pass, so a
  // mine seed falls straight through without being revealed. Chosen and
  // documented behaviour, not an accident.
  #[test]
  fn single_point_on_a_mine_seed_reveals_nothing() {
    let mut board = board_with_mines(3, &[(1, 1)]);
    assert_eq!(board.single_point(Pos::new(1, 1)), Ok(Dig::Clear));
    assert_eq!(board.revealed_count(), 0);
    assert!(!board.is_loss());
  }

  #[test]
  fn single_point_rejects_out_of_range_seeds() {
    let mut board = board_with_mines(3, &[]);
    let outside = Pos::new(0, 3);
    assert_eq!(board.single_point(outside), Err(BoardError::OutOfBounds(outside)));
    assert_eq!(board.double_set_single_point(outside), Err(BoardError::OutOfBounds(outside)));
  }

  #[test]
  fn single_point_short_circuits_after_a_loss() {
    let mut board = board_with_mines(3, &[(0, 0)]);
    board.dig(Pos::new(0, 0)).unwrap();
    assert_eq!(board.single_point(Pos::new(2, 2)), Ok(Dig::Mine));
    assert_eq!(board.double_set_single_point(Pos::new(2, 2)), Ok(Dig::Mine));
    assert_eq!(board.revealed_count(), 1);
  }

  #[test]
  fn double_set_clears_a_mine_free_board_in_one_drain() {
    let mut board = board_with_mines(5, &[]);
    assert_eq!(board.double_set_single_point(Pos::new(2, 2)), Ok(Dig::Clear));
    assert_eq!(board.revealed_count(), 25);
    assert!(board.is_win());
  }

  #[test]
  fn double_set_reveals_deferred_neighbourhoods_by_coordinate() {
    // Seven mines wall off the bottom row and right column; the seed's
    // 3x3 block is the only safe region, so the run ends after the first
    // deferred pass without touching the random reseed.
    let mines = [(0, 3), (1, 3), (2, 3), (3, 0), (3, 1), (3, 2), (3, 3)];
    let mut board = board_with_mines(4, &mines);
    assert_eq!(board.double_set_single_point(Pos::new(1, 1)), Ok(Dig::Clear));
    assert_eq!(board.revealed_count(), 9);
    assert!(board.is_revealed(Pos::new(1, 1)));
    for neighbour in Pos::new(1, 1).neighbours() {
      assert!(board.is_revealed(neighbour));
    }
    assert!(board.is_win());
  }

  // The guard quirk applies to the double-set variant as well.
  #[test]
  fn double_set_on_a_mine_seed_reveals_nothing() {
    let mut board = board_with_mines(3, &[(1, 1)]);
    assert_eq!(board.double_set_single_point(Pos::new(1, 1)), Ok(Dig::Clear));
    assert_eq!(board.revealed_count(), 0);
    assert!(!board.is_loss());
  }

  #[test]
  fn double_set_random_reseed_ends_the_game_either_way() {
    for seed in 0..4 {
      let setup = BoardSetup::new(&mines_at(5, &[(0, 0)]));
      let mut board = Board::from_setup(setup, seeded(seed));
      match board.double_set_single_point(Pos::new(2, 2)).unwrap() {
        Dig::Clear => {
          assert!(board.is_win());
          assert_eq!(board.revealed_count(), 24);
        }
        Dig::Mine => {
          assert!(board.is_loss());
          assert!(board.is_revealed(Pos::new(0, 0)));
        }
      }
      assert!(board.revealed_count() >= 9);
    }
  }
}
