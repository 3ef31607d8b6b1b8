//! Board: fixed grid of cells, placement and collision rules.

use crate::cell::{BombId, Cell, Color, PairId};
use crate::config::{GRID_HEIGHT, GRID_WIDTH};
use crate::piece::{FallingPiece, PieceCell, Pos};

/// True if (row, col) lies inside the grid.
#[inline]
pub const fn is_valid_position(row: i32, col: i32) -> bool {
    row >= 0 && row < GRID_HEIGHT as i32 && col >= 0 && col < GRID_WIDTH as i32
}

/// Playfield. `rows[0]` is the top row.
///
/// Also carries the counters that hand out fresh pair and bomb ids, so every
/// transformation stays a pure `Board -> Board` function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [[Option<Cell>; GRID_WIDTH]; GRID_HEIGHT],
    next_pair: u32,
    next_bomb: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub const fn new() -> Self {
        Self {
            rows: [[None; GRID_WIDTH]; GRID_HEIGHT],
            next_pair: 0,
            next_bomb: 0,
        }
    }

    /// Build a board from text rows, aligned to the bottom of the grid.
    ///
    /// `.` empty, lowercase `r y g b` enemies, uppercase `R Y G B` loose gun
    /// icons, `E` gear gun icon, `X` bomb-colored gun icon, `*` armed bomb.
    /// Unknown characters are treated as empty.
    pub fn parse(lines: &[&str]) -> Self {
        let mut board = Self::new();
        let skip = GRID_HEIGHT.saturating_sub(lines.len());
        for (i, line) in lines.iter().take(GRID_HEIGHT).enumerate() {
            let row = skip + i;
            for (col, ch) in line.chars().take(GRID_WIDTH).enumerate() {
                let cell = match ch {
                    'r' => Some(Cell::enemy(Color::Red)),
                    'y' => Some(Cell::enemy(Color::Yellow)),
                    'g' => Some(Cell::enemy(Color::Green)),
                    'b' => Some(Cell::enemy(Color::Blue)),
                    'R' => Some(Cell::gun(Color::Red, None)),
                    'Y' => Some(Cell::gun(Color::Yellow, None)),
                    'G' => Some(Cell::gun(Color::Green, None)),
                    'B' => Some(Cell::gun(Color::Blue, None)),
                    'E' => Some(Cell::gun(Color::Gear, None)),
                    'X' => Some(Cell::gun(Color::Bomb, None)),
                    '*' => Some(Cell::Bomb {
                        id: board.alloc_bomb_id(),
                    }),
                    _ => None,
                };
                board.rows[row][col] = cell;
            }
        }
        board
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Cell> {
        if !is_valid_position(pos.row, pos.col) {
            return None;
        }
        self.rows[pos.row as usize][pos.col as usize]
    }

    /// Write a cell. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, pos: Pos, cell: Option<Cell>) {
        if is_valid_position(pos.row, pos.col) {
            self.rows[pos.row as usize][pos.col as usize] = cell;
        }
    }

    #[inline]
    pub(crate) fn take(&mut self, pos: Pos) -> Option<Cell> {
        if !is_valid_position(pos.row, pos.col) {
            return None;
        }
        self.rows[pos.row as usize][pos.col as usize].take()
    }

    /// False if out of bounds or occupied.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        is_valid_position(pos.row, pos.col) && self.get(pos).is_none()
    }

    /// Cells the piece would occupy with its anchor at `anchor`.
    pub fn pair_positions(piece: &FallingPiece, anchor: Pos) -> [PieceCell; 2] {
        piece.cells(anchor)
    }

    /// True if both piece cells are in bounds and empty.
    pub fn can_place(&self, piece: &FallingPiece, anchor: Pos) -> bool {
        Self::pair_positions(piece, anchor)
            .iter()
            .all(|c| self.is_empty(c.pos))
    }

    /// New board with the piece written as two gun icons sharing a fresh pair id.
    /// Cells that would land off the grid are dropped; callers check `can_place` first.
    pub fn place(&self, piece: &FallingPiece, anchor: Pos) -> Self {
        let mut next = self.clone();
        let pair = next.alloc_pair_id();
        for cell in Self::pair_positions(piece, anchor) {
            next.set(cell.pos, Some(Cell::gun(piece.color_of(&cell), Some(pair))));
        }
        next
    }

    pub(crate) fn alloc_pair_id(&mut self) -> PairId {
        let id = PairId(self.next_pair);
        self.next_pair = self.next_pair.wrapping_add(1);
        id
    }

    pub(crate) fn alloc_bomb_id(&mut self) -> BombId {
        let id = BombId(self.next_bomb);
        self.next_bomb = self.next_bomb.wrapping_add(1);
        id
    }

    /// Every occupied cell, row-major from the top.
    pub fn cells(&self) -> impl Iterator<Item = (Pos, Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| (*cell).map(|cell| (Pos::new(r as i32, c as i32), cell)))
        })
    }

    pub fn enemy_count(&self) -> usize {
        self.cells().filter(|(_, c)| c.is_enemy()).count()
    }

    /// Win condition: no mech enemies left.
    pub fn is_level_complete(&self) -> bool {
        self.enemy_count() == 0
    }

    /// Loss condition: anything settled in row 0.
    pub fn is_topped_out(&self) -> bool {
        self.rows[0].iter().any(Option::is_some)
    }

    /// Position of bomb `id`, if it is still on the board.
    pub fn find_bomb(&self, id: BombId) -> Option<Pos> {
        self.cells()
            .find(|(_, c)| c.bomb_id() == Some(id))
            .map(|(pos, _)| pos)
    }

    /// New board with the top `count` rows emptied.
    pub fn without_top_rows(&self, count: usize) -> Self {
        let mut next = self.clone();
        for row in next.rows.iter_mut().take(count) {
            *row = [None; GRID_WIDTH];
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Rotation;

    fn piece(rotation: Rotation) -> FallingPiece {
        FallingPiece {
            rotation,
            ..FallingPiece::new(Color::Red, Color::Blue)
        }
    }

    #[test]
    fn bounds() {
        assert!(is_valid_position(0, 0));
        assert!(is_valid_position(15, 7));
        assert!(!is_valid_position(-1, 0));
        assert!(!is_valid_position(16, 0));
        assert!(!is_valid_position(0, 8));
    }

    #[test]
    fn cannot_place_past_right_wall() {
        let board = Board::new();
        assert!(board.can_place(&piece(Rotation::R0), Pos::new(0, 6)));
        assert!(!board.can_place(&piece(Rotation::R0), Pos::new(0, 7)));
        assert!(board.can_place(&piece(Rotation::R1), Pos::new(0, 7)));
        assert!(!board.can_place(&piece(Rotation::R1), Pos::new(15, 0)));
    }

    #[test]
    fn cannot_place_over_occupied_cell() {
        let board = Board::parse(&["...r...."]);
        assert!(!board.can_place(&piece(Rotation::R0), Pos::new(15, 2)));
        assert!(board.can_place(&piece(Rotation::R0), Pos::new(15, 4)));
    }

    #[test]
    fn place_writes_fresh_pair_without_mutating_input() {
        let board = Board::new();
        let placed = board.place(&piece(Rotation::R2), Pos::new(15, 0));
        assert_eq!(board.cells().count(), 0);

        let top = placed.get(Pos::new(15, 1)).unwrap();
        let bottom = placed.get(Pos::new(15, 0)).unwrap();
        assert_eq!(top.color(), Color::Red);
        assert_eq!(bottom.color(), Color::Blue);
        assert!(top.pair_id().is_some());
        assert_eq!(top.pair_id(), bottom.pair_id());

        let again = placed.place(&piece(Rotation::R0), Pos::new(14, 0));
        assert_ne!(again.get(Pos::new(14, 0)).unwrap().pair_id(), top.pair_id());
    }

    #[test]
    fn terminal_predicates() {
        let mut board = Board::parse(&["g......."]);
        assert!(!board.is_level_complete());
        assert!(!board.is_topped_out());
        board.set(Pos::new(15, 0), None);
        board.set(Pos::new(0, 3), Some(Cell::gun(Color::Red, None)));
        assert!(board.is_level_complete());
        assert!(board.is_topped_out());
        assert!(!board.without_top_rows(2).is_topped_out());
    }
}
