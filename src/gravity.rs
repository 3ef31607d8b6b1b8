//! Pair-aware gravity.
//!
//! One tick runs two passes. The paired pass (bottom to top) drops each
//! intact pair one row, both halves or neither. The orphan pass (top to
//! bottom) drops every unpaired gun icon as far as it can go. Enemies and
//! bombs never move.

use crate::board::Board;
use crate::config::{GRID_HEIGHT, GRID_WIDTH};
use crate::matcher::Orientation;
use crate::piece::Pos;

/// Upper bound on gravity ticks for one settle.
pub const MAX_GRAVITY_TICKS: usize = GRID_HEIGHT * 2;

/// Set of columns gravity is allowed to touch. Empty means every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Columns([bool; GRID_WIDTH]);

impl Columns {
    pub const fn all() -> Self {
        Self([true; GRID_WIDTH])
    }

    pub fn insert(&mut self, col: i32) {
        if (0..GRID_WIDTH as i32).contains(&col) {
            self.0[col as usize] = true;
        }
    }

    /// Add `col` and its immediate neighbours.
    pub fn insert_with_neighbors(&mut self, col: i32) {
        for c in col - 1..=col + 1 {
            self.insert(c);
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&c| c)
    }

    pub fn contains(&self, col: i32) -> bool {
        self.is_empty() || ((0..GRID_WIDTH as i32).contains(&col) && self.0[col as usize])
    }
}

impl FromIterator<i32> for Columns {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        let mut cols = Self::default();
        for c in iter {
            cols.insert(c);
        }
        cols
    }
}

/// Result of a single gravity tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GravityStep {
    pub board: Board,
    pub moved: bool,
}

/// The adjacent cell sharing `pos`'s pair id, checked left, right, up, down.
pub fn find_partner(board: &Board, pos: Pos) -> Option<(Pos, Orientation)> {
    let pair = board.get(pos)?.pair_id()?;
    let candidates = [
        (pos.offset(0, -1), Orientation::Horizontal),
        (pos.offset(0, 1), Orientation::Horizontal),
        (pos.offset(-1, 0), Orientation::Vertical),
        (pos.offset(1, 0), Orientation::Vertical),
    ];
    candidates.into_iter().find(|&(p, _)| {
        board
            .get(p)
            .is_some_and(|c| c.is_gun() && c.pair_id() == Some(pair))
    })
}

struct Processed([[bool; GRID_WIDTH]; GRID_HEIGHT]);

impl Processed {
    fn mark(&mut self, pos: Pos) {
        self.0[pos.row as usize][pos.col as usize] = true;
    }

    fn contains(&self, pos: Pos) -> bool {
        self.0[pos.row as usize][pos.col as usize]
    }
}

fn shift(board: &mut Board, from: Pos, to: Pos) {
    let cell = board.take(from);
    board.set(to, cell);
}

fn paired_pass(board: &mut Board, cols: &Columns, processed: &mut Processed) -> bool {
    let mut moved = false;
    for row in (0..GRID_HEIGHT as i32 - 1).rev() {
        for col in 0..GRID_WIDTH as i32 {
            let pos = Pos::new(row, col);
            if !cols.contains(col) || processed.contains(pos) {
                continue;
            }
            if !board.get(pos).is_some_and(|c| c.is_gun()) {
                continue;
            }
            let Some((partner, orientation)) = find_partner(board, pos) else {
                continue;
            };
            match orientation {
                Orientation::Horizontal => {
                    let below_a = pos.offset(1, 0);
                    let below_b = partner.offset(1, 0);
                    if board.is_empty(below_a) && board.is_empty(below_b) {
                        shift(board, pos, below_a);
                        shift(board, partner, below_b);
                        processed.mark(below_a);
                        processed.mark(below_b);
                        moved = true;
                    }
                }
                Orientation::Vertical => {
                    let (upper, lower) = if partner.row < pos.row {
                        (partner, pos)
                    } else {
                        (pos, partner)
                    };
                    let target = lower.offset(1, 0);
                    if !board.is_empty(target) {
                        continue;
                    }
                    let lower_cell = board.take(lower);
                    // The upper half slides into the slot the lower one vacated.
                    let slot_ok = board.get(lower).is_none_or(|c| c.is_gun());
                    if slot_ok {
                        board.set(target, lower_cell);
                        shift(board, upper, lower);
                        processed.mark(target);
                        processed.mark(lower);
                        moved = true;
                    } else {
                        board.set(lower, lower_cell);
                    }
                }
            }
        }
    }
    moved
}

fn orphan_pass(board: &mut Board, cols: &Columns, processed: &mut Processed) -> bool {
    let mut moved = false;
    for row in 0..GRID_HEIGHT as i32 {
        for col in 0..GRID_WIDTH as i32 {
            let pos = Pos::new(row, col);
            if !cols.contains(col) || processed.contains(pos) {
                continue;
            }
            if !board.get(pos).is_some_and(|c| c.is_gun()) {
                continue;
            }
            if find_partner(board, pos).is_some() {
                continue;
            }
            let mut landing = pos;
            while board.is_empty(landing.offset(1, 0)) {
                landing = landing.offset(1, 0);
            }
            if landing != pos {
                shift(board, pos, landing);
                processed.mark(landing);
                moved = true;
            }
        }
    }
    moved
}

/// One gravity tick restricted to `cols`. Never mutates `board`.
pub fn apply_gravity(board: &Board, cols: &Columns) -> GravityStep {
    let mut next = board.clone();
    let mut processed = Processed([[false; GRID_WIDTH]; GRID_HEIGHT]);
    let paired = paired_pass(&mut next, cols, &mut processed);
    let orphans = orphan_pass(&mut next, cols, &mut processed);
    GravityStep {
        board: next,
        moved: paired || orphans,
    }
}

/// Outcome of running gravity to a fixpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub board: Board,
    /// Ticks that moved something.
    pub ticks: usize,
}

/// Tick gravity until nothing moves or [`MAX_GRAVITY_TICKS`] is reached.
pub fn settle(board: &Board, cols: &Columns) -> Settled {
    let mut current = board.clone();
    let mut ticks = 0;
    while ticks < MAX_GRAVITY_TICKS {
        let step = apply_gravity(&current, cols);
        if !step.moved {
            break;
        }
        current = step.board;
        ticks += 1;
    }
    Settled {
        board: current,
        ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, Color, PairId};

    fn pair(color: Color, id: u32) -> Option<Cell> {
        Some(Cell::gun(color, Some(PairId(id))))
    }

    #[test]
    fn blocked_horizontal_pair_does_not_move() {
        let mut board = Board::new();
        board.set(Pos::new(10, 3), pair(Color::Red, 1));
        board.set(Pos::new(10, 4), pair(Color::Blue, 1));
        board.set(Pos::new(11, 4), Some(Cell::enemy(Color::Green)));
        let step = apply_gravity(&board, &Columns::all());
        assert!(!step.moved);
        assert_eq!(step.board, board);
    }

    #[test]
    fn free_horizontal_pair_falls_one_row_per_tick() {
        let mut board = Board::new();
        board.set(Pos::new(10, 3), pair(Color::Red, 1));
        board.set(Pos::new(10, 4), pair(Color::Blue, 1));
        let step = apply_gravity(&board, &Columns::all());
        assert!(step.moved);
        assert_eq!(step.board.get(Pos::new(11, 3)), pair(Color::Red, 1));
        assert_eq!(step.board.get(Pos::new(11, 4)), pair(Color::Blue, 1));
        assert_eq!(step.board.get(Pos::new(10, 3)), None);

        let settled = settle(&board, &Columns::all());
        assert_eq!(settled.ticks, 5);
        assert_eq!(settled.board.get(Pos::new(15, 3)), pair(Color::Red, 1));
    }

    #[test]
    fn vertical_pair_keeps_order() {
        let mut board = Board::new();
        board.set(Pos::new(5, 0), pair(Color::Red, 2));
        board.set(Pos::new(6, 0), pair(Color::Blue, 2));
        let settled = settle(&board, &Columns::all());
        assert_eq!(settled.board.get(Pos::new(14, 0)), pair(Color::Red, 2));
        assert_eq!(settled.board.get(Pos::new(15, 0)), pair(Color::Blue, 2));
    }

    #[test]
    fn orphan_drops_all_the_way_in_one_tick() {
        let mut board = Board::parse(&["g......."]);
        board.set(Pos::new(3, 0), Some(Cell::gun(Color::Red, None)));
        let step = apply_gravity(&board, &Columns::all());
        assert!(step.moved);
        assert_eq!(step.board.get(Pos::new(14, 0)), Some(Cell::gun(Color::Red, None)));
    }

    #[test]
    fn pair_id_mismatch_means_orphans() {
        let mut board = Board::new();
        board.set(Pos::new(10, 3), pair(Color::Red, 1));
        board.set(Pos::new(10, 4), pair(Color::Blue, 9));
        board.set(Pos::new(11, 4), Some(Cell::enemy(Color::Green)));
        let step = apply_gravity(&board, &Columns::all());
        assert!(step.moved);
        assert_eq!(step.board.get(Pos::new(15, 3)), pair(Color::Red, 1));
        assert_eq!(step.board.get(Pos::new(10, 4)), pair(Color::Blue, 9));
    }

    #[test]
    fn enemies_and_bombs_float() {
        let board = Board::parse(&["r*......", "........", "........"]);
        let step = apply_gravity(&board, &Columns::all());
        assert!(!step.moved);
    }

    #[test]
    fn column_filter_limits_movement() {
        let mut board = Board::new();
        board.set(Pos::new(0, 1), Some(Cell::gun(Color::Red, None)));
        board.set(Pos::new(0, 6), Some(Cell::gun(Color::Red, None)));
        let cols: Columns = [1].into_iter().collect();
        let step = apply_gravity(&board, &cols);
        assert_eq!(step.board.get(Pos::new(15, 1)), Some(Cell::gun(Color::Red, None)));
        assert_eq!(step.board.get(Pos::new(0, 6)), Some(Cell::gun(Color::Red, None)));
    }

    #[test]
    fn settled_board_is_stable() {
        let mut board = Board::parse(&["..b.....", "........", "........", "....g..."]);
        board.set(Pos::new(2, 2), pair(Color::Red, 1));
        board.set(Pos::new(2, 3), pair(Color::Yellow, 1));
        board.set(Pos::new(0, 5), Some(Cell::gun(Color::Blue, None)));
        let settled = settle(&board, &Columns::all());
        assert!(settled.ticks <= MAX_GRAVITY_TICKS);
        assert!(!apply_gravity(&settled.board, &Columns::all()).moved);
    }

    #[test]
    fn neighbour_columns() {
        let mut cols = Columns::default();
        assert!(cols.is_empty());
        assert!(cols.contains(5));
        cols.insert_with_neighbors(0);
        assert!(cols.contains(0) && cols.contains(1) && !cols.contains(2));
    }
}
