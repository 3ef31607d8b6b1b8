//! Engine error type.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// More enemies requested than the safe spawn band can hold.
    #[error("cannot place {requested} enemies: only {available} safe positions")]
    EnemyCapacity { requested: usize, available: usize },
    #[error("invalid rotation: {0} (expected 0..=3)")]
    InvalidRotation(u8),
}
