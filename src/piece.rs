//! Falling piece: two colors, a rotation, and the occupancy derived from them.

use crate::cell::Color;
use crate::error::GameError;

/// Grid coordinate. Signed so kicks and probes can step off the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub const fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }
}

/// Rotation state. Cycles LR -> TB -> RL -> BT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// Horizontal, top color on the left.
    #[default]
    R0,
    /// Vertical, top color above.
    R1,
    /// Horizontal, top color on the right.
    R2,
    /// Vertical, top color below.
    R3,
}

impl Rotation {
    pub const fn next(self) -> Self {
        match self {
            Self::R0 => Self::R1,
            Self::R1 => Self::R2,
            Self::R2 => Self::R3,
            Self::R3 => Self::R0,
        }
    }

    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::R1 | Self::R3)
    }

    pub const fn index(self) -> u8 {
        match self {
            Self::R0 => 0,
            Self::R1 => 1,
            Self::R2 => 2,
            Self::R3 => 3,
        }
    }
}

impl TryFrom<u8> for Rotation {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::R0),
            1 => Ok(Self::R1),
            2 => Ok(Self::R2),
            3 => Ok(Self::R3),
            other => Err(GameError::InvalidRotation(other)),
        }
    }
}

/// One occupied cell of a piece at some anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceCell {
    pub pos: Pos,
    pub is_top: bool,
}

/// The two-cell unit under player control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallingPiece {
    pub top: Color,
    pub bottom: Color,
    pub rotation: Rotation,
}

impl FallingPiece {
    pub const fn new(top: Color, bottom: Color) -> Self {
        Self {
            top,
            bottom,
            rotation: Rotation::R0,
        }
    }

    pub const fn rotated(self) -> Self {
        Self {
            rotation: self.rotation.next(),
            ..self
        }
    }

    /// Cells occupied with the anchor at `anchor`. The top-colored cell comes first.
    pub const fn cells(&self, anchor: Pos) -> [PieceCell; 2] {
        let (top, bottom) = match self.rotation {
            Rotation::R0 => (anchor, anchor.offset(0, 1)),
            Rotation::R1 => (anchor, anchor.offset(1, 0)),
            Rotation::R2 => (anchor.offset(0, 1), anchor),
            Rotation::R3 => (anchor.offset(1, 0), anchor),
        };
        [
            PieceCell {
                pos: top,
                is_top: true,
            },
            PieceCell {
                pos: bottom,
                is_top: false,
            },
        ]
    }

    pub const fn color_of(&self, cell: &PieceCell) -> Color {
        if cell.is_top { self.top } else { self.bottom }
    }
}
