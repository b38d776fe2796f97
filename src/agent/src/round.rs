use std::ops::Index;

use common::model::game::{Move, Outcome};
use serde_json::Value;
use tracing::warn;

use crate::error::RoundError;

/// One completed exchange of moves, as seen from this bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub index: usize,
    pub own_move: Move,
    pub opponent_move: Move,
    pub outcome: Outcome,
}

impl Round {
    pub fn new(index: usize, own_move: Move, opponent_move: Move) -> Self {
        Round {
            index,
            own_move,
            opponent_move,
            outcome: own_move.outcome_against(opponent_move),
        }
    }

    /// Stand-in for a result the server sent but we could not read.
    pub fn fallback(index: usize) -> Self {
        Round::new(index, Move::Rock, Move::Rock)
    }

    /// Validates a `{you, opponent, result}` payload. Both moves must be
    /// present and known; the outcome is recomputed and, if the server's
    /// disagrees, ours wins.
    pub fn from_payload(index: usize, payload: &Value) -> Result<Self, RoundError> {
        let malformed = |reason: String| RoundError::Malformed {
            reason,
            payload: payload.to_string(),
        };
        let Value::Object(fields) = payload else {
            return Err(malformed("expected an object".to_owned()));
        };
        let field = |name: &str| -> Result<&str, RoundError> {
            fields
                .get(name)
                .ok_or_else(|| malformed(format!("missing field '{}'", name)))?
                .as_str()
                .ok_or_else(|| malformed(format!("field '{}' is not a string", name)))
        };

        let own_move: Move = field("you")?
            .parse()
            .map_err(|e| malformed(format!("field 'you': {}", e)))?;
        let opponent_move: Move = field("opponent")?
            .parse()
            .map_err(|e| malformed(format!("field 'opponent': {}", e)))?;
        let reported: Outcome = field("result")?
            .parse()
            .map_err(|e| malformed(format!("field 'result': {}", e)))?;

        let round = Round::new(index, own_move, opponent_move);
        if round.outcome != reported {
            warn!(
                "Server reported {} for {} vs {}, using {}",
                reported, own_move, opponent_move, round.outcome
            );
        }
        Ok(round)
    }
}

/// Append-only log of completed rounds; `history[i].index == i`.
#[derive(Debug, Default, Clone)]
pub struct History {
    rounds: Vec<Round>,
}

impl History {
    pub fn new() -> Self {
        History { rounds: Vec::new() }
    }

    pub fn push(&mut self, round: Round) {
        debug_assert_eq!(round.index, self.rounds.len());
        self.rounds.push(round);
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn last(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Round> {
        self.rounds.iter()
    }
}

impl Index<usize> for History {
    type Output = Round;

    fn index(&self, index: usize) -> &Round {
        &self.rounds[index]
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Round;
    type IntoIter = std::slice::Iter<'a, Round>;

    fn into_iter(self) -> Self::IntoIter {
        self.rounds.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_well_formed_payload() {
        let round = Round::from_payload(
            3,
            &json!({"you": "PAPER", "opponent": "ROCK", "result": "win"}),
        )
        .unwrap();
        assert_eq!(round, Round::new(3, Move::Paper, Move::Rock));
        assert_eq!(round.outcome, Outcome::Win);
    }

    #[test]
    fn inconsistent_outcome_is_recomputed() {
        let round = Round::from_payload(
            0,
            &json!({"you": "ROCK", "opponent": "PAPER", "result": "win"}),
        )
        .unwrap();
        assert_eq!(round.outcome, Outcome::Loss);
    }

    #[test]
    fn rejects_unknown_move() {
        let err = Round::from_payload(0, &json!({"you": "ROCK", "opponent": "INVALID"}));
        assert!(matches!(err, Err(RoundError::Malformed { .. })));
    }

    #[test]
    fn rejects_missing_fields_and_wrong_shapes() {
        for payload in [
            json!({"you": "ROCK", "result": "draw"}),
            json!({"you": 1, "opponent": "ROCK", "result": "draw"}),
            json!(["ROCK", "PAPER"]),
            json!("ROCK"),
        ] {
            assert!(Round::from_payload(0, &payload).is_err(), "{}", payload);
        }
    }

    #[test]
    fn fallback_is_a_rock_draw() {
        let round = Round::fallback(7);
        assert_eq!(round.index, 7);
        assert_eq!(round.own_move, Move::Rock);
        assert_eq!(round.opponent_move, Move::Rock);
        assert_eq!(round.outcome, Outcome::Draw);
    }

    #[test]
    fn history_is_indexed_by_round() {
        let mut history = History::new();
        for i in 0..4 {
            history.push(Round::new(i, Move::Rock, Move::from_index(i)));
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].opponent_move, Move::Paper);
        assert_eq!(history.last().map(|r| r.index), Some(3));
        assert!(history.iter().enumerate().all(|(i, r)| r.index == i));
    }
}
