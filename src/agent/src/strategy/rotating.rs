use common::model::game::Move;
use tracing::warn;

use super::{DecisionContext, Feedback, Strategy};
use crate::error::{ConfigError, PolicyError};

/// Which member of a [`Rotating`] strategy is active for a given round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Member `(round / period) % members`.
    Rotate { period: u64 },
    /// Member 0 on every round that is a multiple of `period`, member 1 on
    /// all others.
    Periodic { period: u64 },
    /// Member `i` is active while `round < boundaries[i]`; the last member
    /// takes every round after the last boundary. Boundaries are increasing.
    Phased { boundaries: Vec<u64> },
}

impl Schedule {
    /// Always in `0..members.max(1)`, even for a schedule that failed
    /// validation.
    pub(crate) fn active(&self, round_index: u64, members: usize) -> usize {
        let last = members.saturating_sub(1);
        match self {
            Schedule::Rotate { period } => round_index
                .checked_div(*period)
                .map_or(0, |slot| (slot % members.max(1) as u64) as usize),
            Schedule::Periodic { period } => {
                if round_index.checked_rem(*period) == Some(0) {
                    0
                } else {
                    last.min(1)
                }
            }
            Schedule::Phased { boundaries } => boundaries
                .iter()
                .position(|&until| round_index < until)
                .unwrap_or(boundaries.len())
                .min(last),
        }
    }

    fn validate(&self, members: usize) -> Result<(), ConfigError> {
        match self {
            Schedule::Rotate { period: 0 } => {
                Err(ConfigError::new("rotation period must be greater than 0"))
            }
            Schedule::Rotate { .. } => Ok(()),
            Schedule::Periodic { period: 0 } => {
                Err(ConfigError::new("override period must be greater than 0"))
            }
            Schedule::Periodic { .. } if members != 2 => Err(ConfigError::new(format!(
                "a periodic override needs 2 members, got {}",
                members
            ))),
            Schedule::Periodic { .. } => Ok(()),
            Schedule::Phased { boundaries } => {
                if boundaries.len() + 1 != members {
                    return Err(ConfigError::new(format!(
                        "{} phase boundaries need {} members, got {}",
                        boundaries.len(),
                        boundaries.len() + 1,
                        members
                    )));
                }
                if boundaries.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(ConfigError::new("phase boundaries must be increasing"));
                }
                Ok(())
            }
        }
    }
}

/// Delegates each round to one member chosen by the schedule. A member that
/// fails hands that single round to the fallback; the schedule itself only
/// depends on the round index.
pub struct Rotating {
    members: Vec<Box<dyn Strategy>>,
    schedule: Schedule,
    fallback: Box<dyn Strategy>,
}

impl Rotating {
    pub fn new(
        members: Vec<Box<dyn Strategy>>,
        schedule: Schedule,
        fallback: Box<dyn Strategy>,
    ) -> Result<Self, ConfigError> {
        if members.is_empty() {
            return Err(ConfigError::new("rotation needs at least one member"));
        }
        schedule.validate(members.len())?;
        Ok(Rotating {
            members,
            schedule,
            fallback,
        })
    }

    pub fn active(&self, round_index: u64) -> usize {
        self.schedule.active(round_index, self.members.len())
    }
}

impl Strategy for Rotating {
    fn name(&self) -> &str {
        "rotating"
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        let active = self.active(context.round_index);
        let member = &mut self.members[active];
        match member.select_move(context) {
            Ok(m) => Ok(m),
            Err(e) => {
                warn!(
                    "Member {} ({}) failed in round {}: {}, using {}",
                    active,
                    member.name(),
                    context.round_index,
                    e,
                    self.fallback.name()
                );
                self.fallback.select_move(context)
            }
        }
    }

    fn learn(&mut self, feedback: &Feedback<'_>) {
        for member in self.members.iter_mut() {
            member.learn(feedback);
        }
        self.fallback.learn(feedback);
    }
}
