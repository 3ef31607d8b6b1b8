//! Game controller: active piece, fall timer, bomb countdowns, turn resolution.
//!
//! Everything runs on the owner's thread. Commands are queued with
//! [`Game::submit`] and applied by [`Game::pump`]; timers fire from
//! [`Game::tick`] in deadline order. Each command or timer is applied
//! atomically, including whatever cascade it sets off.

use std::collections::VecDeque;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::cascade::{self, Resolution, Verdict};
use crate::cell::{BombId, Cell};
use crate::config::{GRID_WIDTH, GameConfig, SECOND_CHANCE_ROWS};
use crate::events::{AnimationTrigger, Explosion, GameEvent, Outbox, Particle};
use crate::generator::{self, RandomSource, enemy_capacity};
use crate::gravity::{self, Columns};
use crate::input::Command;
use crate::piece::{FallingPiece, Pos};
use crate::timers::{Scheduler, Timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    Paused,
    GameOver,
    LevelComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// Something settled in the top row.
    Stack,
    /// The energy meter ran out.
    Energy,
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub board: Board,
    pub active_piece: Option<FallingPiece>,
    pub position: Pos,
    pub score: u64,
    pub level: u32,
    pub state: GameState,
    pub game_over_reason: Option<GameOverReason>,
}

/// Where every new piece appears.
pub const fn spawn_position() -> Pos {
    Pos::new(0, GRID_WIDTH as i32 / 2 - 1)
}

pub struct Game {
    config: GameConfig,
    rng: Box<dyn RandomSource>,
    board: Board,
    piece: Option<FallingPiece>,
    position: Pos,
    score: u64,
    level: u32,
    state: GameState,
    game_over_reason: Option<GameOverReason>,
    second_chance_available: bool,
    timers: Scheduler,
    queue: VecDeque<Command>,
    outbox: Outbox,
}

impl Game {
    /// New game seeded from the OS.
    pub fn new(config: GameConfig) -> Self {
        Self::with_source(config, StdRng::from_os_rng())
    }

    /// Reproducible game.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_source(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_source(config: GameConfig, rng: impl RandomSource + 'static) -> Self {
        let level = config.initial_level.max(1);
        let mut game = Self {
            timers: Scheduler::new(config.fall_interval),
            config,
            rng: Box::new(rng),
            board: Board::new(),
            piece: None,
            position: spawn_position(),
            score: 0,
            level,
            state: GameState::Playing,
            game_over_reason: None,
            second_chance_available: false,
            queue: VecDeque::new(),
            outbox: Outbox::default(),
        };
        game.initialize_level(level);
        game
    }

    // --- accessors ---

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_piece(&self) -> Option<FallingPiece> {
        self.piece
    }

    pub fn piece_position(&self) -> Pos {
        self.position
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    /// Virtual time since the game was created. Stands still while paused.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn pending_bombs(&self) -> usize {
        self.timers.pending_bombs()
    }

    pub fn bomb_remaining(&self, id: BombId) -> Option<Duration> {
        self.timers.bomb_remaining(id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            active_piece: self.piece,
            position: self.position,
            score: self.score,
            level: self.level,
            state: self.state,
            game_over_reason: self.game_over_reason,
        }
    }

    // --- outbox ---

    pub fn animation_trigger(&self) -> Option<AnimationTrigger> {
        self.outbox.animation_trigger()
    }

    pub fn clear_animation_trigger(&mut self) {
        self.outbox.clear_animation_trigger();
    }

    pub fn energy_reset_counter(&self) -> u64 {
        self.outbox.energy_reset_counter()
    }

    pub fn particles(&self) -> &[Particle] {
        self.outbox.particles()
    }

    pub fn remove_particle(&mut self, id: u64) -> bool {
        self.outbox.remove_particle(id)
    }

    pub fn explosions(&self) -> &[Explosion] {
        self.outbox.explosions()
    }

    pub fn remove_effect(&mut self, id: u64) -> bool {
        self.outbox.remove_effect(id)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.outbox.drain_events()
    }

    // --- setup ---

    /// Swap in a prepared board, e.g. a puzzle layout. Every bomb on it gets a
    /// fresh countdown and the active piece returns to the spawn point.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.timers.retain_bombs(|_, _| false);
        let bombs: Vec<(Pos, BombId)> = self
            .board
            .cells()
            .filter_map(|(pos, cell)| cell.bomb_id().map(|id| (pos, id)))
            .collect();
        for (pos, id) in bombs {
            self.timers.arm_bomb(id, pos, self.config.bomb_delay);
        }
        self.position = spawn_position();
    }

    /// Replace the active piece, keeping its position if it still fits.
    pub fn set_active_piece(&mut self, piece: FallingPiece) {
        self.piece = Some(piece);
        if !self.board.can_place(&piece, self.position) {
            self.position = spawn_position();
        }
    }

    // --- commands ---

    pub fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Apply every queued command in order.
    pub fn pump(&mut self) {
        while let Some(command) = self.queue.pop_front() {
            self.apply(command);
        }
    }

    fn run(&mut self, command: Command) {
        self.submit(command);
        self.pump();
    }

    pub fn move_left(&mut self) {
        self.run(Command::MoveLeft);
    }

    pub fn move_right(&mut self) {
        self.run(Command::MoveRight);
    }

    pub fn rotate(&mut self) {
        self.run(Command::Rotate);
    }

    pub fn hard_drop(&mut self) {
        self.run(Command::Drop);
    }

    pub fn pause(&mut self) {
        self.run(Command::Pause);
    }

    pub fn resume(&mut self) {
        self.run(Command::Resume);
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => self.pause(),
            GameState::Paused => self.resume(),
            GameState::GameOver | GameState::LevelComplete => {}
        }
    }

    pub fn next_level(&mut self) {
        self.run(Command::NextLevel);
    }

    pub fn restart_level(&mut self) {
        self.run(Command::RestartLevel);
    }

    /// Called by the energy meter when it runs dry.
    pub fn trigger_meter_game_over(&mut self) {
        self.run(Command::MeterDepleted);
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::MoveLeft => self.shift(-1),
            Command::MoveRight => self.shift(1),
            Command::Rotate => self.apply_rotate(),
            Command::Drop => self.apply_drop(),
            Command::Pause => {
                if self.state == GameState::Playing {
                    self.state = GameState::Paused;
                    self.timers.cancel_fall();
                    info!("paused");
                }
            }
            Command::Resume => {
                if self.state == GameState::Paused {
                    self.state = GameState::Playing;
                    self.timers.arm_fall();
                    info!("resumed");
                }
            }
            Command::NextLevel => self.initialize_level(self.level.saturating_add(1)),
            Command::RestartLevel => self.initialize_level(self.level),
            Command::MeterDepleted => {
                if self.state == GameState::Playing {
                    self.end_game(GameOverReason::Energy);
                }
            }
        }
    }

    fn shift(&mut self, d_col: i32) {
        if self.state != GameState::Playing {
            return;
        }
        let Some(piece) = self.piece else {
            return;
        };
        let target = self.position.offset(0, d_col);
        if self.board.can_place(&piece, target) {
            self.position = target;
            debug!(row = target.row, col = target.col, "piece moved");
        }
    }

    /// Rotate in place, else try the kicks: vertical results step left then
    /// right, horizontal results step up.
    fn apply_rotate(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        let Some(piece) = self.piece else {
            return;
        };
        let rotated = piece.rotated();
        let p = self.position;
        let kicks = if rotated.rotation.is_vertical() {
            vec![p, p.offset(0, -1), p.offset(0, 1)]
        } else {
            vec![p, p.offset(-1, 0)]
        };
        match kicks.iter().find(|&&anchor| self.board.can_place(&rotated, anchor)) {
            Some(&anchor) => {
                self.piece = Some(rotated);
                self.position = anchor;
                debug!(
                    rotation = rotated.rotation.index(),
                    row = anchor.row,
                    col = anchor.col,
                    "piece rotated"
                );
            }
            None => debug!("rotation blocked"),
        }
    }

    fn apply_drop(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        let Some(piece) = self.piece else {
            return;
        };
        let mut landing = self.position;
        while self.board.can_place(&piece, landing.offset(1, 0)) {
            landing = landing.offset(1, 0);
        }
        self.position = landing;
        self.lock_piece();
    }

    // --- timers ---

    /// Advance the virtual clock by `elapsed`, firing due timers in order.
    /// Pending commands are applied first. Nothing moves unless playing.
    pub fn tick(&mut self, elapsed: Duration) {
        self.pump();
        if self.state != GameState::Playing {
            return;
        }
        let until = self.timers.now() + elapsed;
        while self.state == GameState::Playing {
            let Some(timer) = self.timers.pop_due(until) else {
                break;
            };
            match timer {
                Timer::Fall => self.fall_step(),
                Timer::Bomb { id, pos } => self.fire_bomb(id, pos),
            }
        }
        if self.state == GameState::Playing {
            self.timers.advance_to(until);
        }
    }

    fn fall_step(&mut self) {
        let Some(piece) = self.piece else {
            return;
        };
        let below = self.position.offset(1, 0);
        if self.board.can_place(&piece, below) {
            self.position = below;
        } else {
            self.lock_piece();
        }
    }

    fn fire_bomb(&mut self, id: BombId, pos: Pos) {
        if self.board.get(pos) != Some(Cell::Bomb { id }) {
            debug!(id = id.0, "stale bomb timer");
            return;
        }
        let chain = cascade::chain_reaction(&self.board, pos, &self.config);
        for blast in &chain.detonations {
            self.outbox.spawn_explosion(blast.origin);
            self.outbox.spawn_particles(&blast.cleared);
        }
        for bomb in chain.chained() {
            self.timers.cancel_bomb(bomb.id);
        }
        self.outbox.emit(GameEvent::BombDetonated {
            id,
            pos,
            chained: chain.chained().count(),
        });
        info!(
            id = id.0,
            row = pos.row,
            col = pos.col,
            chained = chain.chained().count(),
            "bomb detonated"
        );

        self.board = chain.board().clone();
        self.award(chain.blast_score());
        self.outbox.bump_energy_reset(chain.blast_energy_resets());
        if chain.blast_mechs() > 0 {
            self.outbox.trigger(AnimationTrigger::Match);
        }
        self.apply_resolution(&chain.cascade);
        self.finish_turn();
    }

    // --- resolution ---

    fn lock_piece(&mut self) {
        let Some(piece) = self.piece.take() else {
            return;
        };
        let anchor = self.position;
        let cells = Board::pair_positions(&piece, anchor).map(|c| c.pos);
        self.board = self.board.place(&piece, anchor);
        self.outbox.emit(GameEvent::PiecePlaced { cells });
        debug!(row = anchor.row, col = anchor.col, "piece placed");

        let resolution = cascade::resolve(&self.board, &self.config);
        self.board = resolution.board.clone();
        self.apply_resolution(&resolution);
        self.finish_turn();
    }

    /// Fold a cascade into session state. The board must already be updated.
    fn apply_resolution(&mut self, resolution: &Resolution) {
        if !resolution.matched() {
            return;
        }
        self.outbox.spawn_particles(resolution.cleared());
        for bomb in resolution.armed() {
            self.timers.arm_bomb(bomb.id, bomb.pos, self.config.bomb_delay);
            self.outbox.emit(GameEvent::BombArmed {
                id: bomb.id,
                pos: bomb.pos,
            });
            debug!(
                id = bomb.id.0,
                row = bomb.pos.row,
                col = bomb.pos.col,
                "bomb armed"
            );
        }
        self.outbox.emit(GameEvent::Cascade {
            passes: resolution.passes.len(),
            cleared: resolution.cleared().count(),
            mechs: resolution.mechs(),
        });
        self.award(resolution.score());
        self.outbox.bump_energy_reset(resolution.energy_resets());
        if resolution.mechs() > 0 {
            self.outbox.trigger(AnimationTrigger::Match);
        }
    }

    fn award(&mut self, delta: u64) {
        if delta == 0 {
            return;
        }
        self.score = self.score.saturating_add(delta);
        self.outbox.emit(GameEvent::ScoreChanged {
            delta,
            total: self.score,
        });
    }

    /// Drop stale countdowns, check the verdict and get the next piece ready.
    fn finish_turn(&mut self) {
        loop {
            self.prune_bombs();
            match cascade::verdict(&self.board) {
                Verdict::Continue => break,
                Verdict::LevelComplete => {
                    self.complete_level();
                    return;
                }
                Verdict::StackOverflow if self.second_chance_available => self.use_second_chance(),
                Verdict::StackOverflow => {
                    self.end_game(GameOverReason::Stack);
                    return;
                }
            }
        }

        match self.piece {
            None => {
                self.piece = Some(generator::generate_piece(
                    self.rng.as_mut(),
                    self.config.effective_weights(),
                ));
                self.position = spawn_position();
            }
            Some(piece) if !self.board.can_place(&piece, self.position) => {
                // Row 0 is empty here, so the unrotated piece always fits at spawn.
                debug!("active piece displaced by settling cells");
                self.piece = Some(FallingPiece::new(piece.top, piece.bottom));
                self.position = spawn_position();
            }
            Some(_) => {}
        }
    }

    fn prune_bombs(&mut self) {
        let board = &self.board;
        let stale = self
            .timers
            .retain_bombs(|id, pos| board.get(pos) == Some(Cell::Bomb { id }));
        if !stale.is_empty() {
            debug!(count = stale.len(), "cancelled stale bomb timers");
        }
    }

    fn use_second_chance(&mut self) {
        self.second_chance_available = false;
        let cleared = self.board.without_top_rows(SECOND_CHANCE_ROWS);
        let settled = gravity::settle(&cleared, &Columns::all());
        let resolution = cascade::resolve(&settled.board, &self.config);
        self.board = resolution.board.clone();
        self.apply_resolution(&resolution);
        self.outbox.emit(GameEvent::SecondChanceUsed);
        info!(level = self.level, "second chance used");
    }

    fn complete_level(&mut self) {
        self.state = GameState::LevelComplete;
        self.piece = None;
        self.timers.cancel_fall();
        self.outbox.trigger(AnimationTrigger::Win);
        self.outbox.emit(GameEvent::LevelComplete {
            level: self.level,
            score: self.score,
        });
        info!(level = self.level, score = self.score, "level complete");
    }

    fn end_game(&mut self, reason: GameOverReason) {
        self.state = GameState::GameOver;
        self.game_over_reason = Some(reason);
        self.timers.cancel_fall();
        if reason == GameOverReason::Stack {
            self.piece = None;
        }
        self.outbox.trigger(AnimationTrigger::Lose);
        self.outbox.emit(GameEvent::GameOver { reason });
        info!(?reason, level = self.level, score = self.score, "game over");
    }

    /// Fresh board for `level`: enemies, first piece, timers.
    fn initialize_level(&mut self, level: u32) {
        let requested = self.config.enemy_count_for_level(level);
        let count = requested.min(enemy_capacity());
        if count < requested {
            warn!(requested, available = count, "enemy count clamped to board capacity");
        }
        let enemies = match generator::generate_enemies(self.rng.as_mut(), count) {
            Ok(enemies) => enemies,
            Err(err) => {
                warn!(%err, "enemy generation failed");
                Vec::new()
            }
        };

        let mut board = Board::new();
        for spawn in &enemies {
            board.set(spawn.pos, Some(Cell::enemy(spawn.color)));
        }
        self.board = board;
        self.level = level;
        self.piece = Some(generator::generate_piece(
            self.rng.as_mut(),
            self.config.effective_weights(),
        ));
        self.position = spawn_position();
        self.state = GameState::Playing;
        self.game_over_reason = None;
        self.second_chance_available = self.config.pilot.has_second_chance();
        self.timers.clear();
        self.timers.arm_fall();
        self.outbox.clear_animation_trigger();
        self.outbox.emit(GameEvent::LevelStarted {
            level,
            enemies: enemies.len(),
        });
        info!(level, enemies = enemies.len(), "level started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Color;
    use crate::config::{GRID_HEIGHT, Pilot};
    use crate::generator::SequenceSource;
    use crate::piece::Rotation;

    const SECOND: Duration = Duration::from_secs(1);

    /// Every piece is red over red.
    fn red_game(config: GameConfig) -> Game {
        Game::with_source(config, SequenceSource::new([0.0]))
    }

    /// Columns 3 and 4 filled from row 1 down with non-matching icons,
    /// plus one enemy so the level is not already won.
    fn tall_stack() -> Board {
        let lines: Vec<String> = (0..GRID_HEIGHT - 1)
            .map(|i| {
                let (a, b) = if i % 2 == 0 { ('Y', 'G') } else { ('G', 'Y') };
                let first = if i == GRID_HEIGHT - 2 { 'b' } else { '.' };
                format!("{first}..{a}{b}...")
            })
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        Board::parse(&refs)
    }

    #[test]
    fn new_level_is_playing_with_piece_at_spawn() {
        let mut game = red_game(GameConfig::default());
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.level(), 1);
        assert_eq!(game.board().enemy_count(), 2);
        assert_eq!(game.piece_position(), Pos::new(0, 3));
        assert_eq!(
            game.active_piece(),
            Some(FallingPiece::new(Color::Red, Color::Red))
        );
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::LevelStarted {
                level: 1,
                enemies: 2
            }]
        );
    }

    #[test]
    fn moves_stop_at_walls() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&["b......."]));
        for _ in 0..10 {
            game.move_right();
        }
        assert_eq!(game.piece_position(), Pos::new(0, 6));
        for _ in 0..10 {
            game.move_left();
        }
        assert_eq!(game.piece_position(), Pos::new(0, 0));
    }

    #[test]
    fn four_rotations_return_home() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&["b......."]));
        for _ in 0..4 {
            game.rotate();
        }
        assert_eq!(game.active_piece().map(|p| p.rotation), Some(Rotation::R0));
        assert_eq!(game.piece_position(), Pos::new(0, 3));
    }

    #[test]
    fn rotation_to_vertical_kicks_left() {
        let mut game = red_game(GameConfig::default());
        let mut board = Board::new();
        board.set(Pos::new(5, 3), Some(Cell::enemy(Color::Blue)));
        game.set_board(board);
        game.tick(SECOND * 4);
        assert_eq!(game.piece_position(), Pos::new(4, 3));
        game.rotate();
        assert_eq!(game.active_piece().map(|p| p.rotation), Some(Rotation::R1));
        assert_eq!(game.piece_position(), Pos::new(4, 2));
    }

    #[test]
    fn rotation_to_horizontal_kicks_up() {
        let mut game = red_game(GameConfig::default());
        let mut board = Board::new();
        board.set(Pos::new(5, 4), Some(Cell::enemy(Color::Blue)));
        game.set_board(board);
        game.rotate();
        game.tick(SECOND * 5);
        assert_eq!(game.piece_position(), Pos::new(5, 3));
        game.rotate();
        assert_eq!(game.active_piece().map(|p| p.rotation), Some(Rotation::R2));
        assert_eq!(game.piece_position(), Pos::new(4, 3));
    }

    #[test]
    fn fall_timer_locks_piece_on_landing() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&["b......."]));
        game.drain_events();
        game.tick(SECOND * (GRID_HEIGHT as u32 - 1));
        assert_eq!(game.piece_position(), Pos::new(15, 3));
        game.tick(SECOND);
        assert_eq!(
            game.board().get(Pos::new(15, 3)).map(|c| c.color()),
            Some(Color::Red)
        );
        assert_eq!(game.piece_position(), spawn_position());
        assert!(game.active_piece().is_some());
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::PiecePlaced {
                cells: [Pos::new(15, 3), Pos::new(15, 4)]
            }]
        );
    }

    #[test]
    fn pause_freezes_everything() {
        let mut game = red_game(GameConfig::default());
        game.pause();
        assert_eq!(game.state(), GameState::Paused);
        game.tick(SECOND * 10);
        game.move_left();
        game.hard_drop();
        assert_eq!(game.piece_position(), spawn_position());
        assert_eq!(game.now(), Duration::ZERO);

        game.toggle_pause();
        assert_eq!(game.state(), GameState::Playing);
        game.tick(Duration::from_millis(999));
        assert_eq!(game.piece_position(), spawn_position());
        game.tick(Duration::from_millis(1));
        assert_eq!(game.piece_position(), Pos::new(1, 3));
    }

    #[test]
    fn queued_commands_apply_in_order() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&["b......."]));
        for command in [Command::MoveLeft, Command::MoveLeft, Command::MoveRight] {
            game.submit(command);
        }
        assert_eq!(game.piece_position(), Pos::new(0, 3));
        game.pump();
        assert_eq!(game.piece_position(), Pos::new(0, 2));
    }

    #[test]
    fn meter_depletion_ends_the_game() {
        let mut game = red_game(GameConfig::default());
        game.trigger_meter_game_over();
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.game_over_reason(), Some(GameOverReason::Energy));
        assert_eq!(game.animation_trigger(), Some(AnimationTrigger::Lose));

        let before = game.snapshot();
        game.move_left();
        game.hard_drop();
        game.tick(SECOND * 5);
        assert_eq!(game.snapshot(), before);

        game.restart_level();
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.game_over_reason(), None);
        assert_eq!(game.level(), 1);
        assert_eq!(game.animation_trigger(), None);
    }

    #[test]
    fn clearing_last_enemy_completes_level() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&["rRR....."]));
        game.hard_drop();
        assert_eq!(game.state(), GameState::LevelComplete);
        assert_eq!(game.score(), 100);
        assert_eq!(game.active_piece(), None);
        assert_eq!(game.animation_trigger(), Some(AnimationTrigger::Win));
        assert!(game.drain_events().contains(&GameEvent::LevelComplete {
            level: 1,
            score: 100
        }));
        assert_eq!(game.particles().len(), 5);

        game.next_level();
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.level(), 2);
        assert_eq!(game.board().enemy_count(), 3);
        assert_eq!(game.score(), 100);
    }

    #[test]
    fn topping_out_ends_the_game() {
        let mut game = red_game(GameConfig::default());
        game.set_board(tall_stack());
        game.hard_drop();
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.game_over_reason(), Some(GameOverReason::Stack));
        assert_eq!(game.active_piece(), None);
        assert!(game.drain_events().contains(&GameEvent::GameOver {
            reason: GameOverReason::Stack
        }));
    }

    #[test]
    fn hop_survives_one_overflow() {
        let config = GameConfig {
            pilot: Pilot::Hop,
            ..GameConfig::default()
        };
        let mut game = red_game(config);
        game.set_board(tall_stack());
        game.hard_drop();
        assert_eq!(game.state(), GameState::Playing);
        assert!(game.drain_events().contains(&GameEvent::SecondChanceUsed));
        assert!(game.board().get(Pos::new(0, 3)).is_none());
        assert!(game.board().get(Pos::new(1, 3)).is_none());

        game.hard_drop();
        assert_eq!(game.state(), GameState::Playing);
        game.hard_drop();
        assert_eq!(game.state(), GameState::GameOver);
    }

    #[test]
    fn bomb_run_detonates_after_delay() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&[
            ".......b", "..X.....", "..X.....", ".rX.....",
        ]));
        game.set_active_piece(FallingPiece::new(Color::Bomb, Color::Bomb).rotated());
        game.move_left();
        game.hard_drop();

        let bomb = Pos::new(15, 2);
        assert!(matches!(game.board().get(bomb), Some(Cell::Bomb { .. })));
        assert_eq!(game.score(), 25);
        assert_eq!(game.pending_bombs(), 1);

        game.tick(Duration::from_millis(2400));
        assert!(matches!(game.board().get(bomb), Some(Cell::Bomb { .. })));
        game.tick(Duration::from_millis(100));
        assert_eq!(game.board().get(bomb), None);
        assert_eq!(game.board().get(Pos::new(15, 1)), None);
        assert_eq!(game.score(), 125);
        assert_eq!(game.pending_bombs(), 0);
        assert_eq!(game.explosions().len(), 1);
        assert_eq!(game.animation_trigger(), Some(AnimationTrigger::Match));
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn chained_bombs_lose_their_timers() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&["b.......", "........", "..**...."]));
        assert_eq!(game.pending_bombs(), 2);
        game.tick(Duration::from_millis(2500));
        assert_eq!(game.board().cells().count(), 1);
        assert_eq!(game.pending_bombs(), 0);
        assert_eq!(game.explosions().len(), 2);
        let detonated = game
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BombDetonated { .. }))
            .count();
        assert_eq!(detonated, 1);
    }

    #[test]
    fn effects_are_acknowledged() {
        let mut game = red_game(GameConfig::default());
        game.set_board(Board::parse(&["b.......", "........", "..*....."]));
        game.tick(Duration::from_millis(2500));
        let id = game.explosions()[0].id;
        assert!(game.remove_effect(id));
        assert!(!game.remove_effect(id));
        assert!(game.explosions().is_empty());
        let particle = game.particles()[0].id;
        assert!(game.remove_particle(particle));
    }
}
