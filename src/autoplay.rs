//! Greedy autoplayer and the simulated energy meter.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use mechgrid::cascade::resolve;
use mechgrid::config::{GRID_HEIGHT, GRID_WIDTH};
use mechgrid::{
    Board, Command, FallingPiece, Game, GameConfig, GameEvent, GameOverReason, GameState, Pos,
};

use crate::Args;

/// Drains with virtual time and refills whenever the engine's energy reset
/// counter moves.
#[derive(Debug, Clone)]
pub struct EnergyMeter {
    capacity: Duration,
    remaining: Duration,
    seen_resets: u64,
}

impl EnergyMeter {
    pub fn new(capacity: Duration, reset_counter: u64) -> Self {
        Self {
            capacity,
            remaining: capacity,
            seen_resets: reset_counter,
        }
    }

    pub fn refill(&mut self) {
        self.remaining = self.capacity;
    }

    /// Returns true once the meter is empty.
    pub fn drain(&mut self, elapsed: Duration, reset_counter: u64) -> bool {
        if reset_counter != self.seen_resets {
            self.seen_resets = reset_counter;
            self.refill();
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.remaining.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    rotations: usize,
    col: i32,
    value: i64,
}

/// Where `piece` comes to rest if dropped straight down from `(row, col)`.
fn landing(board: &Board, piece: &FallingPiece, row: i32, col: i32) -> Option<Pos> {
    let mut anchor = Pos::new(row, col);
    if !board.can_place(piece, anchor) {
        return None;
    }
    while board.can_place(piece, anchor.offset(1, 0)) {
        anchor = anchor.offset(1, 0);
    }
    Some(anchor)
}

fn evaluate(board: &Board, piece: &FallingPiece, anchor: Pos, config: &GameConfig) -> i64 {
    let placed = board.place(piece, anchor);
    let resolution = resolve(&placed, config);
    let mut value = resolution.score() as i64 * 10;

    let cells = Board::pair_positions(piece, anchor);
    for cell in &cells {
        let color = piece.color_of(cell);
        for (d_row, d_col) in [(0, -1), (0, 1), (1, 0), (-1, 0)] {
            let pos = cell.pos.offset(d_row, d_col);
            if cells.iter().any(|c| c.pos == pos) {
                continue;
            }
            match board.get(pos) {
                Some(n) if n.is_enemy() && n.match_color() == Some(color) => value += 6,
                Some(n) if n.match_color() == Some(color) => value += 3,
                _ => {}
            }
        }
    }

    let top = cells.iter().map(|c| c.pos.row).min().unwrap_or(0);
    value -= i64::from(GRID_HEIGHT as i32 - top);
    if resolution.board.is_topped_out() && !resolution.board.is_level_complete() {
        value -= 10_000;
    }
    value
}

/// Best rotation and column for the active piece.
fn choose(game: &Game) -> Option<Plan> {
    let piece = game.active_piece()?;
    let row = game.piece_position().row;
    let mut best: Option<Plan> = None;
    let mut candidate = piece;
    for rotations in 0..4 {
        for col in -1..GRID_WIDTH as i32 {
            let Some(anchor) = landing(game.board(), &candidate, row, col) else {
                continue;
            };
            let value = evaluate(game.board(), &candidate, anchor, game.config());
            if best.is_none_or(|b| value > b.value) {
                best = Some(Plan {
                    rotations,
                    col,
                    value,
                });
            }
        }
        candidate = candidate.rotated();
    }
    best
}

fn execute(game: &mut Game, plan: Plan) {
    for _ in 0..plan.rotations {
        game.submit(Command::Rotate);
    }
    game.pump();
    let delta = plan.col - game.piece_position().col;
    let step = if delta < 0 {
        Command::MoveLeft
    } else {
        Command::MoveRight
    };
    for _ in 0..delta.unsigned_abs() {
        game.submit(step);
    }
    game.submit(Command::Drop);
    game.pump();
}

/// Acknowledge every pending effect; nothing renders them.
fn acknowledge(game: &mut Game) {
    let particles: Vec<u64> = game.particles().iter().map(|p| p.id).collect();
    for id in particles {
        game.remove_particle(id);
    }
    let explosions: Vec<u64> = game.explosions().iter().map(|e| e.id).collect();
    for id in explosions {
        game.remove_effect(id);
    }
    game.clear_animation_trigger();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    pub level: u32,
    pub score: u64,
    pub pieces: u32,
}

impl fmt::Display for LevelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "level {} cleared: {} points in {} pieces",
            self.level, self.score, self.pieces
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub cleared: Vec<LevelSummary>,
    pub level: u32,
    pub score: u64,
    pub pieces: u32,
    pub bombs: u32,
    pub energy_resets: u64,
    pub game_over: Option<GameOverReason>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.game_over {
            Some(GameOverReason::Stack) => "stack overflow",
            Some(GameOverReason::Energy) => "out of energy",
            None => "stopped",
        };
        write!(
            f,
            "final: level {}, score {}, pieces {}, levels cleared {}, bombs {}, energy resets {} ({outcome})",
            self.level,
            self.score,
            self.pieces,
            self.cleared.len(),
            self.bombs,
            self.energy_resets,
        )
    }
}

/// Play until the level target, the piece limit or a game over.
pub fn run(args: &Args, config: GameConfig) -> Report {
    let mut game = match args.seed {
        Some(seed) => Game::with_seed(config, seed),
        None => Game::new(config),
    };
    let think = args.think_time();
    let mut meter = (args.energy_ms > 0).then(|| {
        EnergyMeter::new(
            Duration::from_millis(args.energy_ms),
            game.energy_reset_counter(),
        )
    });
    let mut report = Report::default();
    let mut level_start_score = 0;
    let mut level_pieces = 0;

    loop {
        match game.state() {
            GameState::LevelComplete => {
                let summary = LevelSummary {
                    level: game.level(),
                    score: game.score() - level_start_score,
                    pieces: level_pieces,
                };
                println!("{summary}");
                report.cleared.push(summary);
                if report.cleared.len() >= args.levels as usize {
                    break;
                }
                game.next_level();
                if let Some(meter) = meter.as_mut() {
                    meter.refill();
                }
                level_start_score = game.score();
                level_pieces = 0;
                continue;
            }
            GameState::GameOver => break,
            GameState::Paused => game.resume(),
            GameState::Playing => {}
        }
        if report.pieces >= args.max_pieces {
            info!(pieces = report.pieces, "piece limit reached");
            break;
        }

        match choose(&game) {
            Some(plan) => {
                debug!(rotations = plan.rotations, col = plan.col, value = plan.value, "bot move");
                execute(&mut game, plan);
                report.pieces += 1;
                level_pieces += 1;
            }
            None => debug!("no landing spot, waiting for the fall timer"),
        }

        game.tick(think);
        if let Some(meter) = meter.as_mut() {
            if meter.drain(think, game.energy_reset_counter()) && game.state() == GameState::Playing {
                game.trigger_meter_game_over();
            }
        }

        for event in game.drain_events() {
            if matches!(event, GameEvent::BombDetonated { .. }) {
                report.bombs += 1;
            }
            debug!(?event);
        }
        acknowledge(&mut game);
    }

    report.level = game.level();
    report.score = game.score();
    report.energy_resets = game.energy_reset_counter();
    report.game_over = game.game_over_reason();
    report
}
