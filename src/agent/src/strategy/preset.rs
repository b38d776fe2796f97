//! Named strategy line-ups. Each preset reproduces one family of bot that
//! used to live in its own script.

use clap::ValueEnum;
use common::model::game::Move;

use super::{
    Arithmetic, Constant, CounterPlay, Ensemble, EnsembleConfig, FirstOf, QLearning,
    QLearningConfig, Reactive, Response, Rotating, Schedule, Scripted, Signal, Strategy, Uniform,
};
use crate::error::ConfigError;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Rock,
    Random,
    QLearner,
    Markov,
    StreakBreaker,
    Frequency,
    Scripted,
    /// Beat the last move for 51 rounds, then rotate beat/yield/copy every 13.
    Rotator,
    /// Two scripted openings of 30 rounds each, then Markov counter-play.
    Opening,
    Ensemble,
    /// Counter a streak of 3, otherwise play what the last move beats.
    StreakYield,
    /// SCISSORS every 19th round, otherwise counter the most played move.
    Plurality,
    /// Counter a streak of 5, otherwise a checksum of the game so far.
    Arithmetic,
}

/// Knobs shared by the presets.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub q_learning: QLearningConfig,
    pub ensemble: EnsembleConfig,
    pub streak_length: usize,
    pub bias_window: Option<usize>,
    pub script: Vec<Move>,
    pub default_move: Move,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            q_learning: QLearningConfig::default(),
            ensemble: EnsembleConfig::default(),
            streak_length: CounterPlay::DEFAULT_STREAK_LENGTH,
            bias_window: None,
            script: default_script(),
            default_move: Move::Rock,
        }
    }
}

pub fn default_script() -> Vec<Move> {
    use Move::*;
    vec![
        Scissors, Paper, Rock, Scissors, Paper, Paper, Rock, Scissors, Scissors, Paper, Rock,
        Scissors,
    ]
}

impl Preset {
    pub fn build(self, config: &StrategyConfig) -> Result<Box<dyn Strategy>, ConfigError> {
        use Move::*;
        let counter = |signal| {
            CounterPlay::new(signal)
                .with_streak_length(config.streak_length)
                .with_bias_window(config.bias_window)
        };
        let fallback = || Box::new(Constant(config.default_move)) as Box<dyn Strategy>;

        let strategy: Box<dyn Strategy> = match self {
            Preset::Rock => Box::new(Constant(Rock)),
            Preset::Random => Box::new(Uniform),
            Preset::QLearner => Box::new(QLearning::new(config.q_learning)),
            Preset::Markov => Box::new(counter(Signal::Markov)),
            Preset::StreakBreaker => Box::new(counter(Signal::Streak)),
            Preset::Frequency => Box::new(counter(Signal::Frequency)),
            Preset::Scripted => Box::new(Scripted::new(config.script.clone())?),
            Preset::Rotator => {
                let reactions: Vec<Box<dyn Strategy>> = vec![
                    Box::new(Reactive(Response::Beat)),
                    Box::new(Reactive(Response::Yield)),
                    Box::new(Reactive(Response::Copy)),
                ];
                let rotation = Rotating::new(reactions, Schedule::Rotate { period: 13 }, fallback())?;
                let phases: Vec<Box<dyn Strategy>> =
                    vec![Box::new(Reactive(Response::Beat)), Box::new(rotation)];
                Box::new(Rotating::new(
                    phases,
                    Schedule::Phased {
                        boundaries: vec![51],
                    },
                    fallback(),
                )?)
            }
            Preset::Opening => {
                let phases: Vec<Box<dyn Strategy>> = vec![
                    Box::new(Scripted::new(vec![Rock, Scissors, Paper, Scissors, Paper])?),
                    Box::new(Scripted::new(vec![Paper, Scissors, Paper, Scissors, Rock])?),
                    Box::new(counter(Signal::Markov)),
                ];
                Box::new(Rotating::new(
                    phases,
                    Schedule::Phased {
                        boundaries: vec![30, 60],
                    },
                    fallback(),
                )?)
            }
            Preset::Ensemble => Box::new(Ensemble::new(config.ensemble)),
            Preset::StreakYield => {
                let members: Vec<Box<dyn Strategy>> = vec![
                    Box::new(CounterPlay::new(Signal::Streak).exclusive()),
                    Box::new(Reactive(Response::Yield)),
                    fallback(),
                ];
                Box::new(FirstOf::new(members)?)
            }
            Preset::Plurality => {
                let members: Vec<Box<dyn Strategy>> = vec![
                    Box::new(Constant(Scissors)),
                    Box::new(CounterPlay::new(Signal::Plurality)),
                ];
                Box::new(Rotating::new(
                    members,
                    Schedule::Periodic { period: 19 },
                    fallback(),
                )?)
            }
            Preset::Arithmetic => {
                let members: Vec<Box<dyn Strategy>> = vec![
                    Box::new(CounterPlay::new(Signal::Streak).with_streak_length(5).exclusive()),
                    Box::new(Arithmetic),
                ];
                Box::new(FirstOf::new(members)?)
            }
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::Harness;
    use Move::*;

    #[test]
    fn every_preset_builds_and_plays() {
        let config = StrategyConfig::default();
        for preset in Preset::value_variants() {
            let mut strategy = preset.build(&config).unwrap();
            let mut harness = Harness::new();
            let opponent: Vec<Move> = (0..80).map(|i| Move::from_index(i * i)).collect();
            let moves = harness.play(strategy.as_mut(), &opponent);
            assert_eq!(moves.len(), 80, "{:?}", preset);
        }
    }

    #[test]
    fn rotator_falls_back_on_the_first_round() {
        let mut strategy = Preset::Rotator.build(&StrategyConfig::default()).unwrap();
        let mut harness = Harness::new();
        assert_eq!(harness.decide(strategy.as_mut()), Ok(Rock));
    }

    #[test]
    fn rotator_switches_after_the_opening() {
        let mut strategy = Preset::Rotator.build(&StrategyConfig::default()).unwrap();
        let mut harness = Harness::new();
        let moves = harness.play(strategy.as_mut(), &[Rock; 60]);
        // rounds 1..=50 beat the last move
        assert!(moves[1..51].iter().all(|&m| m == Paper));
        // round 51: (51 / 13) % 3 == 0, still beat
        assert_eq!(moves[51], Paper);
        // round 52..: (52 / 13) % 3 == 1, yield
        assert_eq!(moves[52], Scissors);
    }

    #[test]
    fn empty_script_is_a_config_error() {
        let config = StrategyConfig {
            script: vec![],
            ..StrategyConfig::default()
        };
        assert!(Preset::Scripted.build(&config).is_err());
    }

    #[test]
    fn streak_yield_yields_until_a_streak_shows() {
        let mut strategy = Preset::StreakYield.build(&StrategyConfig::default()).unwrap();
        let mut harness = Harness::new();
        assert_eq!(harness.decide(strategy.as_mut()), Ok(Rock));
        harness.record(strategy.as_mut(), Rock, Paper);
        // PAPER beats ROCK, so yield with ROCK
        assert_eq!(harness.decide(strategy.as_mut()), Ok(Rock));
        harness.record(strategy.as_mut(), Rock, Paper);
        harness.record(strategy.as_mut(), Rock, Paper);
        // three PAPERs in a row
        assert_eq!(harness.decide(strategy.as_mut()), Ok(Scissors));
    }

    #[test]
    fn plurality_overrides_every_nineteenth_round() {
        let mut strategy = Preset::Plurality.build(&StrategyConfig::default()).unwrap();
        let mut harness = Harness::new();
        let opponent: Vec<Move> = (0..20)
            .map(|i| if i % 4 == 0 { Paper } else { Rock })
            .collect();
        let moves = harness.play(strategy.as_mut(), &opponent);
        assert_eq!(moves[0], Scissors);
        assert_eq!(moves[19], Scissors);
        // ROCK leads from round 2 on
        assert!(moves[2..19].iter().all(|&m| m == Paper));
        assert_eq!(harness.decide(strategy.as_mut()), Ok(Paper));
    }

    #[test]
    fn arithmetic_counters_a_long_streak() {
        let mut strategy = Preset::Arithmetic.build(&StrategyConfig::default()).unwrap();
        let mut harness = Harness::new();
        assert_eq!(harness.decide(strategy.as_mut()), Ok(Scissors));
        harness.play(strategy.as_mut(), &[Scissors; 5]);
        assert_eq!(harness.decide(strategy.as_mut()), Ok(Rock));
    }
}
