//! Cascade resolution: match, clear, arm bombs, settle, rematch.
//!
//! Everything here is a pure function of a board and the config; the
//! controller owns timers and applies the results.

use std::collections::VecDeque;

use tracing::debug;

use crate::board::Board;
use crate::cell::{BombId, Cell, Color};
use crate::config::{GRID_HEIGHT, GameConfig};
use crate::gravity::{Columns, MAX_GRAVITY_TICKS, apply_gravity, settle};
use crate::matcher::{MatchGroup, find_match_groups, matched_cells};
use crate::piece::Pos;

/// Upper bound on clearing passes in one resolution.
pub const MAX_CASCADE_PASSES: usize = GRID_HEIGHT * 2;

/// A cell removed from the board, for particle effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearedCell {
    pub pos: Pos,
    pub color: Color,
}

/// A bomb written to the board during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedBomb {
    pub id: BombId,
    pub pos: Pos,
}

/// One clear step of a cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pass {
    pub cleared: Vec<ClearedCell>,
    pub mechs: u32,
    /// A gear-colored cell was cleared.
    pub gear: bool,
    pub bombs: Vec<ArmedBomb>,
    pub score: u64,
}

/// Full outcome of resolving a board to a fixpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub board: Board,
    pub passes: Vec<Pass>,
}

impl Resolution {
    pub fn score(&self) -> u64 {
        self.passes.iter().map(|p| p.score).sum()
    }

    pub fn mechs(&self) -> u32 {
        self.passes.iter().map(|p| p.mechs).sum()
    }

    /// Number of passes that cleared a gear.
    pub fn energy_resets(&self) -> u32 {
        self.passes.iter().filter(|p| p.gear).count() as u32
    }

    pub fn cleared(&self) -> impl Iterator<Item = &ClearedCell> {
        self.passes.iter().flat_map(|p| p.cleared.iter())
    }

    pub fn armed(&self) -> impl Iterator<Item = &ArmedBomb> {
        self.passes.iter().flat_map(|p| p.bombs.iter())
    }

    pub fn matched(&self) -> bool {
        !self.passes.is_empty()
    }
}

/// Score for a clearing pass.
pub fn pass_score(config: &GameConfig, mechs: u32, cleared_any: bool) -> u64 {
    if mechs > 0 {
        config.mech_score(mechs)
    } else if cleared_any {
        config.match_without_mech_score
    } else {
        0
    }
}

fn clear_pass(board: &mut Board, groups: &[MatchGroup], config: &GameConfig) -> Pass {
    let targets: Vec<Pos> = groups
        .iter()
        .filter(|g| g.is_bomb_eligible())
        .filter_map(MatchGroup::bomb_target)
        .collect();

    let mut pass = Pass::default();
    for pos in matched_cells(groups) {
        let Some(cell) = board.take(pos) else {
            continue;
        };
        if cell.is_enemy() {
            pass.mechs += 1;
        }
        if cell.color() == Color::Gear {
            pass.gear = true;
        }
        pass.cleared.push(ClearedCell {
            pos,
            color: cell.color(),
        });
    }

    for pos in targets {
        if board.is_empty(pos) {
            let id = board.alloc_bomb_id();
            board.set(pos, Some(Cell::Bomb { id }));
            pass.bombs.push(ArmedBomb { id, pos });
        }
    }

    pass.score = pass_score(config, pass.mechs, !pass.cleared.is_empty());
    pass
}

/// Run match/clear/gravity cycles until the board is stable.
///
/// Gravity only touches columns next to something that was cleared, and the
/// board is rematched after every gravity tick.
pub fn resolve(board: &Board, config: &GameConfig) -> Resolution {
    let mut board = board.clone();
    let mut affected = Columns::default();
    let mut passes = Vec::new();
    let mut groups = find_match_groups(&board);

    while !groups.is_empty() && passes.len() < MAX_CASCADE_PASSES {
        let pass = clear_pass(&mut board, &groups, config);
        for cell in &pass.cleared {
            affected.insert_with_neighbors(cell.pos.col);
        }
        debug!(
            pass = passes.len(),
            cleared = pass.cleared.len(),
            mechs = pass.mechs,
            bombs = pass.bombs.len(),
            "cascade pass"
        );
        passes.push(pass);

        groups = Vec::new();
        for _ in 0..MAX_GRAVITY_TICKS {
            let step = apply_gravity(&board, &affected);
            board = step.board;
            let found = find_match_groups(&board);
            if !found.is_empty() {
                groups = found;
                break;
            }
            if !step.moved {
                break;
            }
        }
    }

    Resolution { board, passes }
}

/// One bomb going off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detonation {
    pub origin: Pos,
    pub cleared: Vec<ClearedCell>,
    pub mechs: u32,
    pub gear: bool,
    /// Other bombs caught in the blast.
    pub chained: Vec<ArmedBomb>,
    pub score: u64,
}

/// Clear the 3x3 block around `origin`, then settle the three columns under it.
pub fn detonate(board: &Board, origin: Pos, config: &GameConfig) -> (Board, Detonation) {
    let mut next = board.clone();
    let mut blast = Detonation {
        origin,
        cleared: Vec::new(),
        mechs: 0,
        gear: false,
        chained: Vec::new(),
        score: 0,
    };

    for d_row in -1..=1 {
        for d_col in -1..=1 {
            let pos = origin.offset(d_row, d_col);
            let Some(cell) = next.take(pos) else {
                continue;
            };
            match cell {
                Cell::Bomb { id } if pos != origin => blast.chained.push(ArmedBomb { id, pos }),
                Cell::Bomb { .. } => {}
                Cell::Enemy { .. } => blast.mechs += 1,
                Cell::GunIcon { color, .. } => blast.gear |= color == Color::Gear,
            }
            blast.cleared.push(ClearedCell {
                pos,
                color: cell.color(),
            });
        }
    }

    let cols: Columns = (origin.col - 1..=origin.col + 1).collect();
    let settled = settle(&next, &cols);
    blast.score = config.mech_score(blast.mechs);
    (settled.board, blast)
}

/// A detonation, everything it chained into, and the cascade that followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReaction {
    pub detonations: Vec<Detonation>,
    pub cascade: Resolution,
}

impl ChainReaction {
    pub fn board(&self) -> &Board {
        &self.cascade.board
    }

    /// Points from the blasts alone; the follow-up cascade scores per pass.
    pub fn blast_score(&self) -> u64 {
        self.detonations.iter().map(|d| d.score).sum()
    }

    pub fn blast_mechs(&self) -> u32 {
        self.detonations.iter().map(|d| d.mechs).sum()
    }

    /// Blasts that caught a gear tile.
    pub fn blast_energy_resets(&self) -> u32 {
        self.detonations.iter().filter(|d| d.gear).count() as u32
    }

    /// Bombs consumed by the chain, origin excluded.
    pub fn chained(&self) -> impl Iterator<Item = &ArmedBomb> {
        self.detonations.iter().flat_map(|d| d.chained.iter())
    }
}

/// Detonate the bomb at `origin`, then every bomb caught in a blast
/// (breadth-first), then resolve the resulting board.
pub fn chain_reaction(board: &Board, origin: Pos, config: &GameConfig) -> ChainReaction {
    let mut current = board.clone();
    let mut detonations = Vec::new();
    let mut queue = VecDeque::from([origin]);

    while let Some(pos) = queue.pop_front() {
        let (next, blast) = detonate(&current, pos, config);
        queue.extend(blast.chained.iter().map(|b| b.pos));
        debug!(
            row = pos.row,
            col = pos.col,
            mechs = blast.mechs,
            chained = blast.chained.len(),
            "bomb detonated"
        );
        detonations.push(blast);
        current = next;
    }

    ChainReaction {
        detonations,
        cascade: resolve(&current, config),
    }
}

/// Terminal state of a settled board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    /// No enemies left. Takes precedence over a topped-out stack.
    LevelComplete,
    /// Something settled in row 0.
    StackOverflow,
}

pub fn verdict(board: &Board) -> Verdict {
    if board.is_level_complete() {
        Verdict::LevelComplete
    } else if board.is_topped_out() {
        Verdict::StackOverflow
    } else {
        Verdict::Continue
    }
}
