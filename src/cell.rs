//! Cell contents: colors and the three tile kinds.

/// Tile color. The first four are the gameplay palette; `Gear` and `Bomb` are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
    /// Clearing it refills the energy meter.
    Gear,
    /// A run of 4+ creates a bomb cell.
    Bomb,
}

impl Color {
    pub const PRIMARY: [Self; 4] = [Self::Red, Self::Yellow, Self::Green, Self::Blue];

    pub fn is_primary(self) -> bool {
        !matches!(self, Self::Gear | Self::Bomb)
    }
}

/// Token shared by exactly two gun-icon cells that landed as one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(pub u32);

/// Identity of a placed bomb, used to match timers to cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BombId(pub u32);

/// Single occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Mech enemy. Never moves.
    Enemy { color: Color },
    /// Half of a placed piece; `pair` is `None` once orphaned or for loose tiles.
    GunIcon { color: Color, pair: Option<PairId> },
    /// Armed bomb. Never moves, never matches.
    Bomb { id: BombId },
}

impl Cell {
    pub fn enemy(color: Color) -> Self {
        Self::Enemy { color }
    }

    pub fn gun(color: Color, pair: Option<PairId>) -> Self {
        Self::GunIcon { color, pair }
    }

    pub fn color(&self) -> Color {
        match *self {
            Self::Enemy { color } | Self::GunIcon { color, .. } => color,
            Self::Bomb { .. } => Color::Bomb,
        }
    }

    /// Color for matching purposes. Bomb cells break runs.
    pub fn match_color(&self) -> Option<Color> {
        match *self {
            Self::Enemy { color } | Self::GunIcon { color, .. } => Some(color),
            Self::Bomb { .. } => None,
        }
    }

    pub fn pair_id(&self) -> Option<PairId> {
        match *self {
            Self::GunIcon { pair, .. } => pair,
            _ => None,
        }
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self, Self::Enemy { .. })
    }

    pub fn is_gun(&self) -> bool {
        matches!(self, Self::GunIcon { .. })
    }

    pub fn bomb_id(&self) -> Option<BombId> {
        match *self {
            Self::Bomb { id } => Some(id),
            _ => None,
        }
    }
}
