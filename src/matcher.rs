//! Run detection: 4+ same-colored cells in a row or column.

use std::collections::BTreeSet;

use crate::board::Board;
use crate::cell::Color;
use crate::config::{GRID_HEIGHT, GRID_WIDTH};
use crate::piece::Pos;

/// Shortest run that clears.
pub const MIN_MATCH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A contiguous run of at least [`MIN_MATCH`] cells of one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub orientation: Orientation,
    pub color: Color,
    /// Ordered left to right, or top to bottom.
    pub cells: Vec<Pos>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// A bomb-colored run long enough to arm a bomb.
    pub fn is_bomb_eligible(&self) -> bool {
        self.color == Color::Bomb && self.len() >= MIN_MATCH
    }

    /// Where the bomb goes: bottom cell of a column run, middle cell of a row run.
    pub fn bomb_target(&self) -> Option<Pos> {
        match self.orientation {
            Orientation::Vertical => self.cells.iter().max_by_key(|p| p.row).copied(),
            Orientation::Horizontal => {
                let mut sorted = self.cells.clone();
                sorted.sort_by_key(|p| p.col);
                sorted.get(sorted.len() / 2).copied()
            }
        }
    }
}

/// Scans one line of cells and emits every qualifying run.
fn scan_line(
    orientation: Orientation,
    line: impl Iterator<Item = (Pos, Option<Color>)>,
    out: &mut Vec<MatchGroup>,
) {
    let mut run: Vec<Pos> = Vec::new();
    let mut current: Option<Color> = None;

    let mut flush = |run: &mut Vec<Pos>, color: Option<Color>| {
        if let Some(color) = color {
            if run.len() >= MIN_MATCH {
                out.push(MatchGroup {
                    orientation,
                    color,
                    cells: std::mem::take(run),
                });
            }
        }
        run.clear();
    };

    for (pos, color) in line {
        if color.is_some() && color == current {
            run.push(pos);
            continue;
        }
        flush(&mut run, current);
        current = color;
        if color.is_some() {
            run.push(pos);
        }
    }
    flush(&mut run, current);
}

/// Every horizontal run (rows scanned left to right), then every vertical run
/// (columns scanned top to bottom). A cell may appear in one group of each
/// orientation.
pub fn find_match_groups(board: &Board) -> Vec<MatchGroup> {
    let color_at = |pos: Pos| board.get(pos).and_then(|c| c.match_color());
    let mut groups = Vec::new();

    for row in 0..GRID_HEIGHT as i32 {
        let line = (0..GRID_WIDTH as i32).map(|col| {
            let pos = Pos::new(row, col);
            (pos, color_at(pos))
        });
        scan_line(Orientation::Horizontal, line, &mut groups);
    }
    for col in 0..GRID_WIDTH as i32 {
        let line = (0..GRID_HEIGHT as i32).map(|row| {
            let pos = Pos::new(row, col);
            (pos, color_at(pos))
        });
        scan_line(Orientation::Vertical, line, &mut groups);
    }
    groups
}

/// Deduplicated coordinates of every matched cell, ordered by (row, col).
pub fn find_matches(board: &Board) -> Vec<Pos> {
    matched_cells(&find_match_groups(board))
}

pub(crate) fn matched_cells(groups: &[MatchGroup]) -> Vec<Pos> {
    groups
        .iter()
        .flat_map(|g| g.cells.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
