//! Tabular Q-learning over "opponent's last move" states.
//!
//! Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
//!
//! With the default γ = 0 every round is treated as a one-shot reward, so the
//! table converges to the expected payoff of each reply to each opponent move.

use common::model::game::{Move, Outcome};
use rand::Rng;
use tracing::debug;

use super::{DecisionContext, Feedback, Strategy};
use crate::error::PolicyError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearningConfig {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Exploration rate ε
    pub epsilon: f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        QLearningConfig {
            alpha: 0.1,
            gamma: 0.0,
            epsilon: 0.1,
        }
    }
}

pub fn reward(outcome: Outcome) -> f64 {
    match outcome {
        Outcome::Win => 1.0,
        Outcome::Loss => -1.0,
        Outcome::Draw => 0.0,
    }
}

/// Q-values for 4 states (no history yet, or one of the opponent's moves)
/// by 3 actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: [[f64; 3]; 4],
}

impl QTable {
    fn row(state: Option<Move>) -> usize {
        state.map_or(0, |m| m.index() + 1)
    }

    pub fn get(&self, state: Option<Move>, action: Move) -> f64 {
        self.values[Self::row(state)][action.index()]
    }

    pub fn set(&mut self, state: Option<Move>, action: Move, value: f64) {
        self.values[Self::row(state)][action.index()] = value;
    }

    pub fn max_q(&self, state: Option<Move>) -> f64 {
        self.values[Self::row(state)]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Highest-valued action; ties go to the lowest enum value.
    pub fn greedy_action(&self, state: Option<Move>) -> Result<Move, PolicyError> {
        let mut best = Move::Rock;
        for action in Move::ALL {
            let value = self.get(state, action);
            if !value.is_finite() {
                return Err(PolicyError::NonFinite {
                    state: state.map_or("none".to_owned(), |m| m.to_string()),
                    value,
                });
            }
            if value > self.get(state, best) {
                best = action;
            }
        }
        Ok(best)
    }

    pub fn q_learning_update(
        &mut self,
        state: Option<Move>,
        action: Move,
        reward: f64,
        next_state: Option<Move>,
        alpha: f64,
        gamma: f64,
    ) {
        let current_q = self.get(state, action);
        let td_target = reward + gamma * self.max_q(next_state);
        let new_q = current_q + alpha * (td_target - current_q);
        self.set(state, action, new_q);
    }
}

pub struct QLearning {
    table: QTable,
    state: Option<Move>,
    config: QLearningConfig,
}

impl QLearning {
    pub fn new(config: QLearningConfig) -> Self {
        QLearning {
            table: QTable::default(),
            state: None,
            config,
        }
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn state(&self) -> Option<Move> {
        self.state
    }
}

impl Strategy for QLearning {
    fn name(&self) -> &str {
        "q-learning"
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        if self.config.epsilon > 0.0 && context.rng.gen::<f64>() < self.config.epsilon {
            let explored = Move::from_index(context.rng.gen_range(0..3));
            debug!("Exploring with {}", explored);
            return Ok(explored);
        }
        self.table.greedy_action(self.state)
    }

    fn learn(&mut self, feedback: &Feedback<'_>) {
        let next_state = Some(feedback.round.opponent_move);
        self.table.q_learning_update(
            self.state,
            feedback.action(),
            reward(feedback.outcome()),
            next_state,
            self.config.alpha,
            self.config.gamma,
        );
        self.state = next_state;
    }
}
