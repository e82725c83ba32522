//! Win detection.

use tictac_protocol::{Board, Mark};

/// Every line that wins: three rows, three columns, two diagonals,
/// checked in that order.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Returns the mark that owns a complete line, if any.
///
/// When more than one line is complete the first in row, column,
/// diagonal order wins. Play through [`Game`](crate::Game) can never
/// produce two winners, but the detector doesn't rely on that.
pub fn winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|line| {
        let [a, b, c] = line.map(|(row, col)| board[row][col]);
        match a.mark() {
            Some(mark) if a == b && b == c => Some(mark),
            _ => None,
        }
    })
}

/// Number of cells holding a mark.
pub fn filled_cells(board: &Board) -> usize {
    board
        .iter()
        .flatten()
        .filter(|cell| !cell.is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictac_protocol::Cell;

    fn with_line(line: &[(usize, usize); 3], cell: Cell) -> Board {
        let mut board = Board::default();
        for &(row, col) in line {
            board[row][col] = cell;
        }
        board
    }

    fn transpose(board: &Board) -> Board {
        let mut out = Board::default();
        for (row, cells) in board.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                out[col][row] = *cell;
            }
        }
        out
    }

    #[test]
    fn test_every_line_wins_for_both_marks() {
        for line in &LINES {
            assert_eq!(winner(&with_line(line, Cell::X)), Some(Mark::X));
            assert_eq!(winner(&with_line(line, Cell::O)), Some(Mark::O));
        }
    }

    #[test]
    fn test_empty_board_has_no_winner() {
        assert_eq!(winner(&Board::default()), None);
    }

    #[test]
    fn test_full_board_without_line_has_no_winner() {
        //  X | O | X
        //  X | O | O
        //  O | X | X
        let board = [
            [Cell::X, Cell::O, Cell::X],
            [Cell::X, Cell::O, Cell::O],
            [Cell::O, Cell::X, Cell::X],
        ];
        assert_eq!(winner(&board), None);
        assert_eq!(filled_cells(&board), 9);
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let mut board = with_line(&LINES[0], Cell::X);
        board[0][2] = Cell::O;
        assert_eq!(winner(&board), None);
    }

    #[test]
    fn test_transpose_swaps_rows_and_columns() {
        for row in 0..3 {
            let board = with_line(&LINES[row], Cell::O);
            let flipped = transpose(&board);
            assert_eq!(winner(&flipped), Some(Mark::O));
            assert_eq!(flipped, with_line(&LINES[3 + row], Cell::O));
        }
    }

    #[test]
    fn test_first_complete_line_is_reported() {
        // Row 0 is X, row 2 is O; rows are scanned top to bottom.
        let mut board = with_line(&LINES[0], Cell::X);
        for col in 0..3 {
            board[2][col] = Cell::O;
        }
        assert_eq!(winner(&board), Some(Mark::X));
    }

    #[test]
    fn test_filled_cells_counts_marks() {
        let mut board = Board::default();
        assert_eq!(filled_cells(&board), 0);
        board[0][0] = Cell::X;
        board[2][1] = Cell::O;
        assert_eq!(filled_cells(&board), 2);
    }
}
