//! Commands the input layer feeds to the game controller.

/// A discrete command from the input/UI layer. Applied one at a time by the
/// game controller; every variant is a no-op outside the state it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Rotate,
    Drop,
    Pause,
    Resume,
    NextLevel,
    RestartLevel,
    /// The energy meter ran dry.
    MeterDepleted,
}
