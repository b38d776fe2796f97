use common::model::game::Move;
use tracing::trace;

use super::{DecisionContext, Feedback, Strategy};
use crate::error::{ConfigError, PolicyError};

/// Asks its members in order and plays the first answer. Every member learns
/// from every round, whether it answered or not.
pub struct FirstOf {
    members: Vec<Box<dyn Strategy>>,
}

impl FirstOf {
    pub fn new(members: Vec<Box<dyn Strategy>>) -> Result<Self, ConfigError> {
        if members.is_empty() {
            return Err(ConfigError::new("first-of needs at least one member"));
        }
        Ok(FirstOf { members })
    }
}

impl Strategy for FirstOf {
    fn name(&self) -> &str {
        "first-of"
    }

    /// Fails with the last member's error when no member answers.
    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        let mut last_error = None;
        for member in self.members.iter_mut() {
            match member.select_move(context) {
                Ok(m) => return Ok(m),
                Err(e) => {
                    trace!("{} passed: {}", member.name(), e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(PolicyError::InsufficientHistory { needed: 1, have: 0 }))
    }

    fn learn(&mut self, feedback: &Feedback<'_>) {
        for member in self.members.iter_mut() {
            member.learn(feedback);
        }
    }
}
