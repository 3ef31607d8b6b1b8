//! Piece and enemy generation over an injectable random source.

use rand::Rng;
use rand::rngs::StdRng;

use crate::cell::Color;
use crate::config::{ColorWeights, GRID_HEIGHT, GRID_WIDTH};
use crate::error::GameError;
use crate::piece::{FallingPiece, Pos};

/// First row enemies may spawn in; keeps them away from the top.
pub const ENEMY_MIN_ROW: usize = 2;
/// Last row enemies may spawn in; keeps the bottom two rows free.
pub const ENEMY_MAX_ROW: usize = GRID_HEIGHT - 3;

/// Number of distinct safe enemy positions.
pub const fn enemy_capacity() -> usize {
    (ENEMY_MAX_ROW - ENEMY_MIN_ROW + 1) * GRID_WIDTH
}

/// Uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        let i = (self.next_f64() * len as f64).floor() as usize;
        i.min(len.saturating_sub(1))
    }
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Replays a fixed list of draws, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }
}

impl RandomSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Draw a color from the weighted table: four primaries, then gear, then bomb.
/// Falls back to a uniform primary if every weight is zero.
pub fn random_color(rng: &mut dyn RandomSource, weights: ColorWeights) -> Color {
    let table = [
        (Color::Red, weights.primary),
        (Color::Yellow, weights.primary),
        (Color::Green, weights.primary),
        (Color::Blue, weights.primary),
        (Color::Gear, weights.gear),
        (Color::Bomb, weights.bomb),
    ];
    let total: u64 = table.iter().map(|&(_, w)| u64::from(w)).sum();
    if total == 0 {
        return random_primary(rng);
    }
    let mut roll = (rng.next_f64() * total as f64).floor() as u64;
    for &(color, weight) in &table {
        let weight = u64::from(weight);
        if roll < weight {
            return color;
        }
        roll -= weight;
    }
    // Only reachable through float rounding at the very top of the range.
    table
        .iter()
        .rev()
        .find(|&&(_, w)| w > 0)
        .map_or(Color::Red, |&(c, _)| c)
}

/// Uniform pick from the four gameplay colors.
pub fn random_primary(rng: &mut dyn RandomSource) -> Color {
    Color::PRIMARY[rng.pick_index(Color::PRIMARY.len())]
}

/// New piece at rotation 0. Half the time both halves share a color.
pub fn generate_piece(rng: &mut dyn RandomSource, weights: ColorWeights) -> FallingPiece {
    let top = random_color(rng, weights);
    let bottom = if rng.next_f64() < 0.5 {
        top
    } else {
        random_color(rng, weights)
    };
    FallingPiece::new(top, bottom)
}

/// Enemy to seed onto a fresh board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemySpawn {
    pub pos: Pos,
    pub color: Color,
}

/// `count` enemies at distinct positions inside the safe band.
pub fn generate_enemies(
    rng: &mut dyn RandomSource,
    count: usize,
) -> Result<Vec<EnemySpawn>, GameError> {
    let available = enemy_capacity();
    if count > available {
        return Err(GameError::EnemyCapacity {
            requested: count,
            available,
        });
    }
    let mut free: Vec<Pos> = (ENEMY_MIN_ROW..=ENEMY_MAX_ROW)
        .flat_map(|row| (0..GRID_WIDTH).map(move |col| Pos::new(row as i32, col as i32)))
        .collect();
    let mut enemies = Vec::with_capacity(count);
    while enemies.len() < count {
        let pos = free.swap_remove(rng.pick_index(free.len()));
        enemies.push(EnemySpawn {
            pos,
            color: random_primary(rng),
        });
    }
    Ok(enemies)
}
