use common::model::game::Move;

use super::{DecisionContext, Strategy};
use crate::error::PolicyError;

/// Deterministic pseudo-random play: a checksum of the last round, the
/// opponent's move counts and the round index picks the move.
pub struct Arithmetic;

impl Arithmetic {
    fn opponent_weight(m: Move) -> u64 {
        match m {
            Move::Rock => 2,
            Move::Paper => 5,
            Move::Scissors => 35,
        }
    }

    fn own_weight(m: Move) -> u64 {
        match m {
            Move::Rock => 0,
            Move::Paper => 1,
            Move::Scissors => 7,
        }
    }
}

impl Strategy for Arithmetic {
    fn name(&self) -> &str {
        "arithmetic"
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        let (last_theirs, last_ours) = match context.history.last() {
            Some(round) => (
                Self::opponent_weight(round.opponent_move),
                Self::own_weight(round.own_move),
            ),
            None => (1, 1),
        };
        let counts = context.model.move_counts();
        let tally = u64::from(counts.get(Move::Rock)) + 2 * u64::from(counts.get(Move::Scissors));
        // reduced mod 3 first, r * (r + 1) overflows otherwise
        let r = context.round_index % 3;
        let index = (last_theirs + last_ours + tally % 3 + r * (r + 1)) % 3;
        Ok(Move::from_index(index as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::Harness;
    use Move::*;

    #[test]
    fn opens_with_scissors() {
        // (1 + 1 + 0 + 0) % 3 == 2
        let mut harness = Harness::new();
        assert_eq!(harness.decide(&mut Arithmetic), Ok(Scissors));
    }

    #[test]
    fn follows_the_checksum() {
        let mut harness = Harness::new();
        assert_eq!(harness.decide(&mut Arithmetic), Ok(Scissors));
        harness.record(&mut Arithmetic, Scissors, Rock);
        // round 1: 2 (opponent ROCK) + 7 (our SCISSORS) + 1 (one ROCK) + 2 == 12
        assert_eq!(harness.decide(&mut Arithmetic), Ok(Rock));

        harness.record(&mut Arithmetic, Rock, Scissors);
        // round 2: 35 + 0 + 3 + 6 == 44
        assert_eq!(harness.decide(&mut Arithmetic), Ok(Scissors));
    }

    #[test]
    fn long_sessions_stay_in_range() {
        let mut harness = Harness::new();
        harness.round_index = u64::MAX - 3;
        for _ in 0..3 {
            assert!(harness.decide(&mut Arithmetic).is_ok());
        }
    }
}
