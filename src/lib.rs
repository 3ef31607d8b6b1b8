//! Mechgrid: a falling-pair puzzle engine with mech enemies, gear and bomb
//! tiles, cascading gravity and timed bomb chain reactions.
//!
//! The pure board functions ([`board`], [`matcher`], [`gravity`],
//! [`cascade`]) never mutate their input. [`game::Game`] owns the mutable
//! session and drives them from commands and a virtual clock.

pub mod board;
pub mod cascade;
pub mod cell;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod generator;
pub mod gravity;
pub mod input;
pub mod matcher;
pub mod piece;
pub mod timers;

pub use board::Board;
pub use cell::{BombId, Cell, Color, PairId};
pub use config::{ColorWeights, GameConfig, Pilot};
pub use error::GameError;
pub use events::{AnimationTrigger, GameEvent};
pub use game::{Game, GameOverReason, GameState, Snapshot};
pub use input::Command;
pub use piece::{FallingPiece, Pos, Rotation};
