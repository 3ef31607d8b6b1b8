//! Things the presentation layer reacts to.
//!
//! Two channels: an acknowledge-to-clear outbox (animation trigger, particles,
//! explosion effects, the energy reset counter) and a FIFO event log drained
//! by the consumer.

use std::collections::VecDeque;

use crate::cascade::ClearedCell;
use crate::cell::{BombId, Color};
use crate::game::GameOverReason;
use crate::piece::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTrigger {
    /// Mechs destroyed.
    Match,
    Win,
    Lose,
}

/// Transient effect for a cleared cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Particle {
    pub id: u64,
    pub pos: Pos,
    pub color: Color,
}

/// Transient effect for a detonation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explosion {
    pub id: u64,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    LevelStarted { level: u32, enemies: usize },
    PiecePlaced { cells: [Pos; 2] },
    Cascade { passes: usize, cleared: usize, mechs: u32 },
    ScoreChanged { delta: u64, total: u64 },
    BombArmed { id: BombId, pos: Pos },
    BombDetonated { id: BombId, pos: Pos, chained: usize },
    EnergyReset { counter: u64 },
    SecondChanceUsed,
    LevelComplete { level: u32, score: u64 },
    GameOver { reason: GameOverReason },
}

#[derive(Debug, Clone, Default)]
pub struct Outbox {
    animation: Option<AnimationTrigger>,
    energy_reset_counter: u64,
    particles: Vec<Particle>,
    explosions: Vec<Explosion>,
    events: VecDeque<GameEvent>,
    next_effect_id: u64,
}

impl Outbox {
    pub fn animation_trigger(&self) -> Option<AnimationTrigger> {
        self.animation
    }

    pub fn trigger(&mut self, animation: AnimationTrigger) {
        self.animation = Some(animation);
    }

    pub fn clear_animation_trigger(&mut self) {
        self.animation = None;
    }

    pub fn energy_reset_counter(&self) -> u64 {
        self.energy_reset_counter
    }

    pub fn bump_energy_reset(&mut self, times: u32) {
        for _ in 0..times {
            self.energy_reset_counter += 1;
            self.emit(GameEvent::EnergyReset {
                counter: self.energy_reset_counter,
            });
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn spawn_particles<'a>(&mut self, cleared: impl IntoIterator<Item = &'a ClearedCell>) {
        for cell in cleared {
            let id = self.next_id();
            self.particles.push(Particle {
                id,
                pos: cell.pos,
                color: cell.color,
            });
        }
    }

    /// Returns false if no particle had that id.
    pub fn remove_particle(&mut self, id: u64) -> bool {
        let before = self.particles.len();
        self.particles.retain(|p| p.id != id);
        self.particles.len() != before
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn spawn_explosion(&mut self, pos: Pos) {
        let id = self.next_id();
        self.explosions.push(Explosion { id, pos });
    }

    /// Returns false if no effect had that id.
    pub fn remove_effect(&mut self, id: u64) -> bool {
        let before = self.explosions.len();
        self.explosions.retain(|e| e.id != id);
        self.explosions.len() != before
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_effect_id;
        self.next_effect_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particles_are_acknowledged_by_id() {
        let mut out = Outbox::default();
        let cleared = [
            ClearedCell {
                pos: Pos::new(1, 1),
                color: Color::Red,
            },
            ClearedCell {
                pos: Pos::new(1, 2),
                color: Color::Gear,
            },
        ];
        out.spawn_particles(&cleared);
        let ids: Vec<u64> = out.particles().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(out.remove_particle(ids[0]));
        assert!(!out.remove_particle(ids[0]));
        assert_eq!(out.particles().len(), 1);
    }

    #[test]
    fn energy_counter_is_monotonic_and_logged() {
        let mut out = Outbox::default();
        out.bump_energy_reset(2);
        assert_eq!(out.energy_reset_counter(), 2);
        assert_eq!(
            out.drain_events(),
            vec![
                GameEvent::EnergyReset { counter: 1 },
                GameEvent::EnergyReset { counter: 2 },
            ]
        );
        assert!(out.drain_events().is_empty());
    }
}
