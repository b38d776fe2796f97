use common::model::game::{Move, Outcome};
use rand_chacha::ChaCha20Rng;

use crate::{error::PolicyError, opponent_model::OpponentModel, round::History, round::Round};

pub mod arithmetic;
pub mod counter;
pub mod ensemble;
pub mod first_of;
pub mod preset;
pub mod q_learning;
pub mod rotating;
pub mod trivial;

pub use arithmetic::Arithmetic;
pub use counter::{CounterPlay, Signal};
pub use ensemble::{Ensemble, EnsembleConfig, Predictor};
pub use first_of::FirstOf;
pub use preset::{Preset, StrategyConfig};
pub use q_learning::{QLearning, QLearningConfig, QTable};
pub use rotating::{Rotating, Schedule};
pub use trivial::{Constant, Reactive, Response, Scripted, Uniform};

/// Everything a strategy may look at when choosing the move for round
/// `round_index`.
pub struct DecisionContext<'a> {
    pub round_index: u64,
    pub history: &'a History,
    pub model: &'a OpponentModel,
    pub rng: &'a mut ChaCha20Rng,
}

/// A completed round, handed to every strategy after the opponent model has
/// been updated with it.
pub struct Feedback<'a> {
    pub round: &'a Round,
    /// The move the engine actually sent for this round, if it sent one.
    pub emitted: Option<Move>,
}

impl Feedback<'_> {
    /// The action to credit: what we sent, or what the server says we played
    /// when we have no record of sending anything.
    pub fn action(&self) -> Move {
        self.emitted.unwrap_or(self.round.own_move)
    }

    /// Outcome of [`Feedback::action`] against the opponent's move. Differs
    /// from `round.outcome` when the server recorded something else for us.
    pub fn outcome(&self) -> Outcome {
        self.action().outcome_against(self.round.opponent_move)
    }
}

pub trait Strategy: Send {
    fn name(&self) -> &str;

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError>;

    fn learn(&mut self, _feedback: &Feedback<'_>) {}
}
