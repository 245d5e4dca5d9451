use std::io::{self, Write};

use minesweeper_core::board::Pos;
use minesweeper_core::{Board, BoardError, Cell, Dig};
use tracing::info;

static LEVELS: [(&str, u32, u32); 3] = [
  ("Beginner", 9, 10),
  ("Intermediate", 16, 40),
  ("Expert", 22, 99),
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Strategy {
  Flood,
  SinglePath,
  SinglePoint,
  DoubleSetSinglePoint,
}

impl Strategy {
  fn apply(self, board: &mut Board, pos: Pos) -> Result<Dig, BoardError> {
    match self {
      Strategy::Flood => board.dig(pos),
      Strategy::SinglePath => board.dfs_dig(pos),
      Strategy::SinglePoint => board.single_point(pos),
      Strategy::DoubleSetSinglePoint => board.double_set_single_point(pos),
    }
  }
}

fn main() {
  tracing_subscriber::fmt::init();

  println!("Minesweeper");
  let mut board = loop {
    let (size, mines) = choose_level();
    match Board::new(size, mines) {
      Ok(board) => break board,
      Err(err) => println!("Cannot start game: {err}"),
    }
  };
  let strategy = choose_strategy();
  info!(size = board.size(), mines = board.mines(), ?strategy, "new game");

  play(&mut board, strategy);
}

fn play(board: &mut Board, strategy: Strategy) {
  while !board.is_win() {
    println!("{}", render(board, false));
    let input = read_line("Enter row, col: ");
    let pos = match parse_cell(&input, board.size()) {
      Some(pos) => pos,
      None => {
        println!("Invalid cell. Try again.");
        continue;
      }
    };

    match strategy.apply(board, pos) {
      Ok(Dig::Clear) => (),
      Ok(Dig::Mine) => {
        info!(?pos, "mine hit");
        println!("Game Over!!");
        println!("{}", render(board, true));
        return;
      }
      // unreachable, parse_cell already bounds-checks
      Err(err) => println!("{err}"),
    }
  }

  println!("You Won!!");
  println!("{}", render(board, false));
}

fn choose_level() -> (u32, u32) {
  loop {
    println!("Select level:");
    for (index, (name, size, mines)) in LEVELS.iter().enumerate() {
      println!("  {}. {} ({}x{}, {} mines)", index + 1, name, size, size, mines);
    }
    println!("  {}. Custom", LEVELS.len() + 1);

    let choice = read_line("Level: ");
    if let Ok(index) = choice.trim().parse::<usize>() {
      if (1..=LEVELS.len()).contains(&index) {
        let (_, size, mines) = LEVELS[index - 1];
        return (size, mines);
      }
      if index == LEVELS.len() + 1 {
        if let Some(custom) = prompt_custom() {
          return custom;
        }
      }
    }
    println!("Invalid choice. Try again.");
  }
}

fn prompt_custom() -> Option<(u32, u32)> {
  let size = read_line("Enter board size: ").trim().parse::<u32>().ok()?;
  let mines = read_line("Enter number of mines: ").trim().parse::<u32>().ok()?;
  Some((size, mines))
}

fn choose_strategy() -> Strategy {
  loop {
    println!("Select reveal strategy:");
    println!("  1. Flood dig");
    println!("  2. Single-path dig");
    println!("  3. Single-point solver");
    println!("  4. Double-set single-point solver");

    match read_line("Strategy: ").trim() {
      "1" => return Strategy::Flood,
      "2" => return Strategy::SinglePath,
      "3" => return Strategy::SinglePoint,
      "4" => return Strategy::DoubleSetSinglePoint,
      _ => println!("Invalid choice. Try again."),
    }
  }
}

fn read_line(prompt: &str) -> String {
  print!("{prompt}");
  io::stdout().flush().expect("failed to flush stdout");
  let mut line = String::new();
  io::stdin()
    .read_line(&mut line)
    .expect("failed to read from stdin");
  line
}

fn parse_cell(input: &str, size: u32) -> Option<Pos> {
  let mut parts = input.splitn(2, ',');
  let row = parts.next()?.trim().parse::<i32>().ok()?;
  let col = parts.next()?.trim().parse::<i32>().ok()?;
  let size = size as i32;
  if (0..size).contains(&row) && (0..size).contains(&col) {
    Some(Pos::new(row, col))
  } else {
    None
  }
}

fn render(board: &Board, reveal_all: bool) -> String {
  let size = board.size() as i32;
  let width = (size - 1).to_string().len();
  let mut out = String::new();

  out.push_str(&" ".repeat(width + 2));
  for col in 0..size {
    out.push_str(&format!("{col:<width$}  "));
  }
  out.push('\n');

  let rule = "-".repeat(width + 2 + size as usize * (width + 2));
  out.push_str(&rule);
  out.push('\n');
  for row in 0..size {
    out.push_str(&format!("{row:<width$} |"));
    for col in 0..size {
      let pos = Pos::new(row, col);
      let cell = if reveal_all {
        Some(board.grid()[pos])
      } else {
        board.view(pos)
      };
      out.push_str(&format!("{:<width$} |", cell_text(cell)));
    }
    out.push('\n');
  }
  out.push_str(&rule);

  out
}

fn cell_text(cell: Option<Cell>) -> String {
  match cell {
    None => " ".to_string(),
    Some(Cell::Mine) => "*".to_string(),
    Some(Cell::Count(mines)) => mines.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use minesweeper_core::board::Grid;
  use minesweeper_core::BoardSetup;

  use super::*;

  fn board_with_mines(size: u32, mines: &[(i32, i32)]) -> Board {
    let mut grid = Grid::new(size, size, false);
    for &(row, col) in mines {
      grid[Pos::new(row, col)] = true;
    }
    Board::from(BoardSetup::new(&grid))
  }

  #[test]
  fn parse_cell_accepts_row_col_with_spaces() {
    assert_eq!(parse_cell("1,1", 3), Some(Pos::new(1, 1)));
    assert_eq!(parse_cell(" 2 , 0 \n", 3), Some(Pos::new(2, 0)));
  }

  #[test]
  fn parse_cell_rejects_bad_input() {
    assert_eq!(parse_cell("3,0", 3), None);
    assert_eq!(parse_cell("-1,0", 3), None);
    assert_eq!(parse_cell("1", 3), None);
    assert_eq!(parse_cell("x,1", 3), None);
    assert_eq!(parse_cell("", 3), None);
  }

  #[test]
  fn level_table_is_playable() {
    for &(_, size, mines) in LEVELS.iter() {
      assert!(mines < size * size);
      assert!(Board::new(size, mines).is_ok());
    }
  }

  #[test]
  fn every_strategy_reaches_the_core() {
    for strategy in [
      Strategy::Flood,
      Strategy::SinglePath,
      Strategy::SinglePoint,
      Strategy::DoubleSetSinglePoint,
    ] {
      let mut board = board_with_mines(3, &[]);
      assert_eq!(strategy.apply(&mut board, Pos::new(1, 1)), Ok(Dig::Clear));
      assert!(board.revealed_count() > 0);
    }
  }

  #[test]
  fn render_aligns_columns_and_hides_unrevealed_cells() {
    let mut board = board_with_mines(3, &[(0, 0)]);
    board.dig(Pos::new(2, 2)).unwrap();
    let expected = "   0  1  2  \n\
                    ------------\n\
                    0 |  |1 |0 |\n\
                    1 |1 |1 |0 |\n\
                    2 |0 |0 |0 |\n\
                    ------------";
    assert_eq!(render(&board, false), expected);
  }

  #[test]
  fn render_reveal_all_shows_the_mines() {
    let board = board_with_mines(3, &[(0, 0)]);
    let full = render(&board, true);
    assert!(full.contains("0 |* |1 |0 |"));
    assert!(render(&board, false).contains("0 |  |  |  |"));
  }
}
