//! Tunables: scoring, progression, timing, color weights, pilots.

use std::time::Duration;

/// Playfield width in cells.
pub const GRID_WIDTH: usize = 8;
/// Playfield height in cells. Row 0 is top.
pub const GRID_HEIGHT: usize = 16;

/// Weight a pilot perk adds to its special color.
pub const PILOT_SPECIAL_WEIGHT: u32 = 2;

/// Rows wiped from the top when Hop's second chance fires.
pub const SECOND_CHANCE_ROWS: usize = 2;

/// Playable pilot. Each one bends a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pilot {
    #[default]
    None,
    /// Increased chance of bomb tiles.
    Gerdy,
    /// Second chance on grid overflow (once per level).
    Hop,
    /// Increased chance of energy (gear) tiles.
    Reggie,
}

impl Pilot {
    pub fn has_second_chance(self) -> bool {
        self == Self::Hop
    }
}

/// Relative draw weights for piece colors.
/// Each of the four primary colors uses `primary`; gear and bomb have their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorWeights {
    pub primary: u32,
    pub gear: u32,
    pub bomb: u32,
}

impl Default for ColorWeights {
    fn default() -> Self {
        Self {
            primary: 4,
            gear: 0,
            bomb: 0,
        }
    }
}

impl ColorWeights {
    /// Weights after applying a pilot's perk.
    pub fn with_pilot(self, pilot: Pilot) -> Self {
        match pilot {
            Pilot::Gerdy => Self {
                bomb: self.bomb.saturating_add(PILOT_SPECIAL_WEIGHT),
                ..self
            },
            Pilot::Reggie => Self {
                gear: self.gear.saturating_add(PILOT_SPECIAL_WEIGHT),
                ..self
            },
            Pilot::None | Pilot::Hop => self,
        }
    }
}

/// Options that affect game behaviour (scoring, timing, progression).
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub base_score_per_mech: u64,
    pub multiplier_per_additional_mech: f64,
    /// Flat award for a clearing pass that destroyed no mechs.
    pub match_without_mech_score: u64,
    pub starting_enemy_count: usize,
    pub enemies_per_level: usize,
    pub fall_interval: Duration,
    pub bomb_delay: Duration,
    pub initial_level: u32,
    pub pilot: Pilot,
    pub color_weights: ColorWeights,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_score_per_mech: 100,
            multiplier_per_additional_mech: 1.5,
            match_without_mech_score: 25,
            starting_enemy_count: 2,
            enemies_per_level: 1,
            fall_interval: Duration::from_millis(1000),
            bomb_delay: Duration::from_millis(2500),
            initial_level: 1,
            pilot: Pilot::None,
            color_weights: ColorWeights::default(),
        }
    }
}

impl GameConfig {
    /// Enemy count for `level` (1-based), before capacity clamping.
    pub fn enemy_count_for_level(&self, level: u32) -> usize {
        let extra = level.saturating_sub(1) as usize;
        self.starting_enemy_count + extra * self.enemies_per_level
    }

    /// Color weights in effect, pilot perk included.
    pub fn effective_weights(&self) -> ColorWeights {
        self.color_weights.with_pilot(self.pilot)
    }

    /// Points for destroying `mechs` mechs in a single pass.
    /// Zero mechs scores nothing here; see `match_without_mech_score`.
    pub fn mech_score(&self, mechs: u32) -> u64 {
        match mechs {
            0 => 0,
            1 => self.base_score_per_mech,
            n => {
                let raw = self.base_score_per_mech as f64
                    * n as f64
                    * self.multiplier_per_additional_mech.powi(n as i32 - 1);
                raw.floor() as u64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_mechs_score_675() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.mech_score(3), 675);
    }

    #[test]
    fn single_mech_is_base() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.mech_score(0), 0);
        assert_eq!(cfg.mech_score(1), 100);
        assert_eq!(cfg.mech_score(2), 300);
    }

    #[test]
    fn enemy_count_scales_with_level() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.enemy_count_for_level(1), 2);
        assert_eq!(cfg.enemy_count_for_level(4), 5);
    }

    #[test]
    fn pilot_perks_touch_only_their_color() {
        let base = ColorWeights::default();
        let gerdy = base.with_pilot(Pilot::Gerdy);
        assert_eq!(gerdy.bomb, PILOT_SPECIAL_WEIGHT);
        assert_eq!(gerdy.gear, 0);
        let reggie = base.with_pilot(Pilot::Reggie);
        assert_eq!(reggie.gear, PILOT_SPECIAL_WEIGHT);
        assert_eq!(base.with_pilot(Pilot::Hop), base);
    }

    #[test]
    fn pilot_perk_saturates_huge_weights() {
        let huge = ColorWeights {
            primary: 4,
            gear: u32::MAX,
            bomb: u32::MAX,
        };
        assert_eq!(huge.with_pilot(Pilot::Gerdy).bomb, u32::MAX);
        assert_eq!(huge.with_pilot(Pilot::Reggie).gear, u32::MAX);
    }
}
