use common::model::game::Move;
use rand::Rng;

use super::{DecisionContext, Strategy};
use crate::error::{ConfigError, PolicyError};

// Trivial strategies
pub struct Constant(pub Move);
impl Strategy for Constant {
    fn name(&self) -> &str {
        "constant"
    }

    fn select_move(&mut self, _: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        Ok(self.0)
    }
}

// Random
pub struct Uniform;
impl Strategy for Uniform {
    fn name(&self) -> &str {
        "uniform"
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        Ok(Move::from_index(context.rng.gen_range(0..3)))
    }
}

/// How to answer the opponent's last move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Play what beats it.
    Beat,
    /// Play what it beats.
    Yield,
    /// Play it again.
    Copy,
}

/// Answers the opponent's previous move. Has nothing to answer before the
/// first completed round.
pub struct Reactive(pub Response);
impl Strategy for Reactive {
    fn name(&self) -> &str {
        match self.0 {
            Response::Beat => "beat-last",
            Response::Yield => "yield-to-last",
            Response::Copy => "copy-last",
        }
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        let last = context
            .history
            .last()
            .ok_or(PolicyError::InsufficientHistory { needed: 1, have: 0 })?
            .opponent_move;
        Ok(match self.0 {
            Response::Beat => last.counter(),
            Response::Yield => last.prey(),
            Response::Copy => last,
        })
    }
}

/// Plays a fixed, non-empty sequence on repeat, indexed by round.
pub struct Scripted {
    sequence: Vec<Move>,
}

impl Scripted {
    pub fn new(sequence: Vec<Move>) -> Result<Self, ConfigError> {
        if sequence.is_empty() {
            return Err(ConfigError::new("scripted sequence cannot be empty"));
        }
        Ok(Scripted { sequence })
    }
}

impl Strategy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        let cursor = (context.round_index % self.sequence.len() as u64) as usize;
        Ok(self.sequence[cursor])
    }
}
