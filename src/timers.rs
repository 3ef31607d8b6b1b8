//! Virtual-clock scheduler for the fall timer and bomb countdowns.
//!
//! Time only moves when the owner calls [`Scheduler::pop_due`] or
//! [`Scheduler::advance_to`], so a paused or finished game simply stops
//! feeding it.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::cell::BombId;
use crate::piece::Pos;

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Fall,
    Bomb { id: BombId, pos: Pos },
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    now: Duration,
    fall_period: Duration,
    fall_deadline: Option<Duration>,
    bombs: BTreeMap<BombId, (Duration, Pos)>,
}

impl Scheduler {
    pub fn new(fall_period: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            fall_period,
            fall_deadline: None,
            bombs: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// (Re)start the periodic fall timer one full period from now.
    pub fn arm_fall(&mut self) {
        self.fall_deadline = Some(self.now + self.fall_period);
    }

    pub fn cancel_fall(&mut self) {
        self.fall_deadline = None;
    }

    pub fn fall_armed(&self) -> bool {
        self.fall_deadline.is_some()
    }

    pub fn arm_bomb(&mut self, id: BombId, pos: Pos, delay: Duration) {
        self.bombs.insert(id, (self.now + delay, pos));
    }

    /// Returns true if the bomb had a pending countdown.
    pub fn cancel_bomb(&mut self, id: BombId) -> bool {
        self.bombs.remove(&id).is_some()
    }

    /// Drop every countdown whose bomb fails `keep`; returns the dropped ids.
    pub fn retain_bombs(&mut self, mut keep: impl FnMut(BombId, Pos) -> bool) -> Vec<BombId> {
        let stale: Vec<BombId> = self
            .bombs
            .iter()
            .filter(|&(&id, &(_, pos))| !keep(id, pos))
            .map(|(&id, _)| id)
            .collect();
        for id in &stale {
            self.bombs.remove(id);
        }
        stale
    }

    pub fn bomb_remaining(&self, id: BombId) -> Option<Duration> {
        self.bombs
            .get(&id)
            .map(|(deadline, _)| deadline.saturating_sub(self.now))
    }

    pub fn pending_bombs(&self) -> usize {
        self.bombs.len()
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.fall_deadline = None;
        self.bombs.clear();
    }

    /// Earliest timer due at or before `until`. Moves the clock to its
    /// deadline. Bombs win ties with the fall timer; the fall timer re-arms
    /// itself one period after the deadline it fired at.
    pub fn pop_due(&mut self, until: Duration) -> Option<Timer> {
        let bomb = self
            .bombs
            .iter()
            .map(|(&id, &(deadline, pos))| (deadline, id, pos))
            .min()
            .filter(|&(deadline, _, _)| deadline <= until);
        let fall = self.fall_deadline.filter(|&deadline| deadline <= until);

        match (bomb, fall) {
            (Some((deadline, id, pos)), fall) if fall.is_none_or(|f| deadline <= f) => {
                self.bombs.remove(&id);
                self.now = self.now.max(deadline);
                Some(Timer::Bomb { id, pos })
            }
            (_, Some(deadline)) => {
                self.now = self.now.max(deadline);
                self.fall_deadline = Some(deadline + self.fall_period);
                Some(Timer::Fall)
            }
            _ => None,
        }
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
