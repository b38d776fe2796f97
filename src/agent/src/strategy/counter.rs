use std::iter;

use common::model::game::Move;
use tracing::trace;

use super::{DecisionContext, Strategy};
use crate::{error::PolicyError, opponent_model::OpponentModel};

/// A way of guessing the opponent's next move from the opponent model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The opponent repeated the same move `streak_length` times.
    Streak,
    /// First-order transition table.
    Markov,
    /// A move holding a strict majority.
    Frequency,
    /// The most frequent move so far, lowest enum value on ties.
    Plurality,
}

impl Signal {
    /// Order in which signals are consulted when the preferred one is silent.
    /// [`Signal::Plurality`] is only used as a primary signal.
    pub const CHAIN: [Signal; 3] = [Signal::Streak, Signal::Markov, Signal::Frequency];
}

/// Predicts the opponent's next move and plays what beats it. The preferred
/// signal is asked first, then the rest of [`Signal::CHAIN`]; if every signal
/// is silent the model's default move is played as is.
pub struct CounterPlay {
    primary: Signal,
    streak_length: usize,
    bias_window: Option<usize>,
    exclusive: bool,
}

impl CounterPlay {
    pub const DEFAULT_STREAK_LENGTH: usize = 3;

    pub fn new(primary: Signal) -> Self {
        CounterPlay {
            primary,
            streak_length: Self::DEFAULT_STREAK_LENGTH,
            bias_window: None,
            exclusive: false,
        }
    }

    /// Only consult the primary signal and fail with
    /// [`PolicyError::NoPrediction`] when it is silent, so a combinator can
    /// pick another strategy.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn with_streak_length(mut self, streak_length: usize) -> Self {
        self.streak_length = streak_length;
        self
    }

    /// Restrict the majority check to the most recent `window` rounds.
    pub fn with_bias_window(mut self, window: Option<usize>) -> Self {
        self.bias_window = window;
        self
    }

    fn predict(&self, signal: Signal, model: &OpponentModel) -> Option<Move> {
        match signal {
            Signal::Streak => model.streak_move(self.streak_length),
            Signal::Markov => model.markov_prediction(),
            Signal::Frequency => model.dominant_move(self.bias_window),
            Signal::Plurality => model.move_counts().leader(),
        }
    }
}

impl Strategy for CounterPlay {
    fn name(&self) -> &str {
        match self.primary {
            Signal::Streak => "streak-breaker",
            Signal::Markov => "markov",
            Signal::Frequency => "frequency",
            Signal::Plurality => "plurality",
        }
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        let model = context.model;
        if self.exclusive {
            let predicted = self
                .predict(self.primary, model)
                .ok_or_else(|| PolicyError::NoPrediction {
                    signal: self.name().to_owned(),
                })?;
            return Ok(predicted.counter());
        }
        let prediction = iter::once(self.primary)
            .chain(Signal::CHAIN.into_iter().filter(|&s| s != self.primary))
            .find_map(|signal| self.predict(signal, model).map(|m| (signal, m)));

        Ok(match prediction {
            Some((signal, predicted)) => {
                trace!("{:?} predicts {}, countering", signal, predicted);
                predicted.counter()
            }
            None => model.default_move(),
        })
    }
}
