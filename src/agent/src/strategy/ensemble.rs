use common::model::game::Move;
use tracing::{debug, trace};

use super::{DecisionContext, Feedback, Strategy};
use crate::{error::PolicyError, opponent_model::OpponentModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    FirstOrder,
    /// Most frequent recent move.
    Frequency,
    SecondOrder,
    /// Longest matching context in the pattern tables.
    Suffix,
}

impl Predictor {
    /// Tie order, alphabetical by name.
    pub const ALL: [Predictor; 4] = [
        Predictor::FirstOrder,
        Predictor::Frequency,
        Predictor::SecondOrder,
        Predictor::Suffix,
    ];

    fn index(self) -> usize {
        match self {
            Predictor::FirstOrder => 0,
            Predictor::Frequency => 1,
            Predictor::SecondOrder => 2,
            Predictor::Suffix => 3,
        }
    }

    fn predict(self, model: &OpponentModel, window: usize) -> Option<Move> {
        match self {
            Predictor::FirstOrder => model.markov_prediction(),
            Predictor::Frequency => model.plurality(window),
            Predictor::SecondOrder => model.pattern_prediction(2),
            Predictor::Suffix => model.suffix_prediction(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleConfig {
    /// Score gained on a correct guess and lost on a wrong one
    pub learning_rate: f64,
    /// Floor for predictor scores
    pub min_score: f64,
    /// Rounds considered by the frequency predictor
    pub frequency_window: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            learning_rate: 0.2,
            min_score: 0.1,
            frequency_window: 5,
        }
    }
}

/// Deterministic weighted majority over several predictors: the best-scoring
/// predictor that has an opinion is countered, and its score moves up or down
/// once the opponent's actual move is known. With no opinion at all the
/// default move is taken as the prediction and countered, and no score moves.
pub struct Ensemble {
    scores: [f64; 4],
    pending: Option<(Predictor, Move)>,
    config: EnsembleConfig,
}

impl Ensemble {
    pub fn new(config: EnsembleConfig) -> Self {
        Ensemble {
            scores: [1.0; 4],
            pending: None,
            config,
        }
    }

    pub fn score(&self, predictor: Predictor) -> f64 {
        self.scores[predictor.index()]
    }

    /// Predictors by score, best first; ties keep [`Predictor::ALL`] order.
    pub fn ranking(&self) -> Vec<Predictor> {
        let mut ranking = Predictor::ALL.to_vec();
        ranking.sort_by(|a, b| self.score(*b).total_cmp(&self.score(*a)));
        ranking
    }
}

impl Strategy for Ensemble {
    fn name(&self) -> &str {
        "ensemble"
    }

    fn select_move(&mut self, context: &mut DecisionContext<'_>) -> Result<Move, PolicyError> {
        let window = self.config.frequency_window;
        self.pending = self
            .ranking()
            .into_iter()
            .find_map(|p| p.predict(context.model, window).map(|m| (p, m)));

        Ok(match self.pending {
            Some((predictor, predicted)) => {
                trace!("{:?} predicts {}", predictor, predicted);
                predicted.counter()
            }
            None => context.model.default_move().counter(),
        })
    }

    fn learn(&mut self, feedback: &Feedback<'_>) {
        let Some((predictor, predicted)) = self.pending.take() else {
            return;
        };
        let score = &mut self.scores[predictor.index()];
        if predicted == feedback.round.opponent_move {
            *score += self.config.learning_rate;
        } else {
            *score = (*score - self.config.learning_rate).max(self.config.min_score);
        }
        debug!("{:?} score now {:.2}", predictor, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::Harness;
    use Move::*;

    #[test]
    fn first_round_counters_the_default() {
        let mut strategy = Ensemble::new(EnsembleConfig::default());
        let mut harness = Harness::new();
        assert_eq!(harness.decide(&mut strategy), Ok(Paper));
        harness.record(&mut strategy, Paper, Rock);
        assert!(Predictor::ALL.iter().all(|&p| strategy.score(p) == 1.0));
    }

    #[test]
    fn ties_rank_by_name() {
        let strategy = Ensemble::new(EnsembleConfig::default());
        assert_eq!(
            strategy.ranking(),
            vec![
                Predictor::FirstOrder,
                Predictor::Frequency,
                Predictor::SecondOrder,
                Predictor::Suffix
            ]
        );
    }

    #[test]
    fn locks_onto_a_cycle() {
        let mut strategy = Ensemble::new(EnsembleConfig::default());
        let mut harness = Harness::new();
        let opponent: Vec<Move> = (0..30).map(Move::from_index).collect();
        let moves = harness.play(&mut strategy, &opponent);
        for (ours, theirs) in moves.iter().zip(opponent.iter()).skip(20) {
            assert_eq!(ours.beats(theirs), Some(true));
        }
        assert!(strategy.score(Predictor::FirstOrder) > 1.0);
        assert!(strategy.score(Predictor::Frequency) < 1.0);
        assert_eq!(strategy.ranking()[0], Predictor::FirstOrder);
    }

    #[test]
    fn scores_are_floored() {
        let mut strategy = Ensemble::new(EnsembleConfig {
            learning_rate: 0.5,
            ..EnsembleConfig::default()
        });
        let mut harness = Harness::new();
        // frequency keeps guessing the last move, which never repeats
        let opponent: Vec<Move> = (0..4).map(Move::from_index).collect();
        harness.play(&mut strategy, &opponent);
        assert_eq!(strategy.score(Predictor::Frequency), 0.1);
    }
}
