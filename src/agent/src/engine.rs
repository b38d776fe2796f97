use common::model::game::Move;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, warn};

use crate::{
    opponent_model::OpponentModel,
    round::{History, Round},
    strategy::{DecisionContext, Feedback, Strategy},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingFirstPrompt,
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Played when the strategy cannot decide
    pub default_move: Move,
    /// Chance of replacing the strategy's move with a random one
    pub deviation: f64,
    pub max_order: usize,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_move: Move::Rock,
            deviation: 0.0,
            max_order: OpponentModel::DEFAULT_MAX_ORDER,
            seed: None,
        }
    }
}

/// Owns all per-session state: the round history, the opponent model and the
/// strategy. Exactly one `record` + `select_move` cycle runs at a time.
pub struct DecisionEngine {
    strategy: Box<dyn Strategy>,
    history: History,
    model: OpponentModel,
    rng: ChaCha20Rng,
    phase: Phase,
    round_index: u64,
    last_move: Option<Move>,
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new(strategy: Box<dyn Strategy>, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        DecisionEngine {
            strategy,
            history: History::new(),
            model: OpponentModel::new(config.max_order, config.default_move),
            rng,
            phase: Phase::AwaitingFirstPrompt,
            round_index: 0,
            last_move: None,
            config,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn model(&self) -> &OpponentModel {
        &self.model
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the round the next `select_move` decides.
    pub fn round_index(&self) -> u64 {
        self.round_index
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Index the next recorded round will get.
    pub fn next_round_index(&self) -> usize {
        self.history.len()
    }

    pub fn record(&mut self, round: Round) -> &Round {
        self.append(round, true)
    }

    /// Records [`Round::fallback`] in place of a result that could not be
    /// read. The substitute's own move is not compared with what was sent.
    pub fn record_substitute(&mut self) -> &Round {
        let round = Round::fallback(self.history.len());
        self.append(round, false)
    }

    fn append(&mut self, round: Round, reported: bool) -> &Round {
        let mut round = round;
        if round.index != self.history.len() {
            warn!(
                "Round arrived with index {}, expected {}; re-indexing",
                round.index,
                self.history.len()
            );
            round.index = self.history.len();
        }

        let emitted = self.last_move.take();
        if let Some(emitted) = emitted.filter(|_| reported) {
            if emitted != round.own_move {
                warn!(
                    "Server recorded {} for round {} but we sent {}",
                    round.own_move, round.index, emitted
                );
            }
        }

        self.history.push(round);
        self.model.update(&round);
        self.strategy.learn(&Feedback {
            round: &round,
            emitted,
        });
        &self.history[round.index]
    }

    pub fn select_move(&mut self) -> Move {
        let mut context = DecisionContext {
            round_index: self.round_index,
            history: &self.history,
            model: &self.model,
            rng: &mut self.rng,
        };
        let mut chosen = match self.strategy.select_move(&mut context) {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    "{} failed in round {}: {}, playing {}",
                    self.strategy.name(),
                    self.round_index,
                    e,
                    self.config.default_move
                );
                self.config.default_move
            }
        };

        if self.config.deviation > 0.0 && self.rng.gen::<f64>() < self.config.deviation {
            chosen = Move::from_index(self.rng.gen_range(0..3));
            debug!("Deviating to {}", chosen);
        }

        self.phase = Phase::InProgress;
        self.round_index += 1;
        self.last_move = Some(chosen);
        chosen
    }
}
