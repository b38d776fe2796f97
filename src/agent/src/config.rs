//! Command line and environment configuration for the agent.
//!
//! Every flag can also be set through the environment variable named next to
//! it; flags win over the environment.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use common::model::game::Move;
use tracing::Level;

use crate::{
    engine::{DecisionEngine, EngineConfig},
    error::ConfigError,
    strategy::{preset::default_script, EnsembleConfig, Preset, QLearningConfig, StrategyConfig},
};

/// What to keep when the server connection drops and is re-established.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnect {
    /// Keep the history, opponent model and learned values
    Resume,
    /// Start over with an empty engine
    Fresh,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "agent")]
#[command(about = "Rock-paper-scissors bot that learns its opponent round by round")]
pub struct Config {
    /// Game server websocket URL
    #[arg(long, env = "SERVER_URL", default_value = "ws://127.0.0.1:3000")]
    pub server_url: String,

    /// Name announced to the server
    #[arg(long, env = "BOT_NAME", default_value = "rps-agent")]
    pub name: String,

    #[arg(long, env = "BOT_POLICY", value_enum, default_value_t = Preset::QLearner)]
    pub policy: Preset,

    /// Q-learning rate
    #[arg(long, env = "BOT_ALPHA", default_value_t = 0.1)]
    pub alpha: f64,

    /// Q-learning discount
    #[arg(long, env = "BOT_GAMMA", default_value_t = 0.0)]
    pub gamma: f64,

    /// Q-learning exploration rate
    #[arg(long, env = "BOT_EPSILON", default_value_t = 0.1)]
    pub epsilon: f64,

    /// Probability of replacing any decision with a random move
    #[arg(long, env = "BOT_DEVIATION", default_value_t = 0.0)]
    pub deviation: f64,

    /// Identical opponent moves needed before a streak is countered
    #[arg(long, env = "BOT_STREAK_LENGTH", default_value_t = 3)]
    pub streak_length: usize,

    /// Only look at the last N opponent moves when detecting a bias
    #[arg(long, env = "BOT_BIAS_WINDOW")]
    pub bias_window: Option<usize>,

    /// Longest opponent context tracked by the pattern tables
    #[arg(long, env = "BOT_MAX_ORDER", default_value_t = 3)]
    pub max_order: usize,

    /// Ensemble score step
    #[arg(long, env = "BOT_LEARNING_RATE", default_value_t = 0.2)]
    pub learning_rate: f64,

    /// Ensemble score floor
    #[arg(long, env = "BOT_MIN_SCORE", default_value_t = 0.1)]
    pub min_score: f64,

    /// Ensemble frequency predictor window
    #[arg(long, env = "BOT_FREQUENCY_WINDOW", default_value_t = 5)]
    pub frequency_window: usize,

    /// Move sequence for the scripted policy, e.g. ROCK,PAPER,PAPER
    #[arg(long, env = "BOT_SCRIPT", value_delimiter = ',')]
    pub script: Vec<Move>,

    /// Played whenever a policy has nothing better
    #[arg(long, env = "BOT_DEFAULT_MOVE", default_value = "ROCK")]
    pub default_move: Move,

    /// Seed for every random choice; omitted means seeded from the OS
    #[arg(long, env = "BOT_SEED")]
    pub seed: Option<u64>,

    #[arg(long, env = "BOT_RECONNECT", value_enum, default_value_t = Reconnect::Resume)]
    pub reconnect: Reconnect,

    /// Delay between connection attempts in milliseconds
    #[arg(long, env = "BOT_RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::new(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )))
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::new("name cannot be empty"));
        }
        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            return Err(ConfigError::new(format!(
                "server_url must be a ws:// or wss:// URL, got '{}'",
                self.server_url
            )));
        }

        check_probability("alpha", self.alpha)?;
        check_probability("gamma", self.gamma)?;
        check_probability("epsilon", self.epsilon)?;
        check_probability("deviation", self.deviation)?;

        if self.streak_length == 0 {
            return Err(ConfigError::new("streak_length must be greater than 0"));
        }
        if self.bias_window == Some(0) {
            return Err(ConfigError::new("bias_window must be greater than 0"));
        }
        if self.max_order == 0 {
            return Err(ConfigError::new("max_order must be greater than 0"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::new("learning_rate must be greater than 0"));
        }
        if !(self.min_score.is_finite() && self.min_score >= 0.0) {
            return Err(ConfigError::new("min_score cannot be negative"));
        }
        if self.frequency_window == 0 {
            return Err(ConfigError::new("frequency_window must be greater than 0"));
        }
        if self.retry_delay_ms == 0 {
            return Err(ConfigError::new("retry_delay_ms must be greater than 0"));
        }
        self.level()?;

        // Surfaces preset-level problems (bad schedules, empty scripts) at startup
        self.policy.build(&self.strategy_config())?;
        Ok(())
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level.parse().map_err(|_| {
            ConfigError::new(format!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ))
        })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            q_learning: QLearningConfig {
                alpha: self.alpha,
                gamma: self.gamma,
                epsilon: self.epsilon,
            },
            ensemble: EnsembleConfig {
                learning_rate: self.learning_rate,
                min_score: self.min_score,
                frequency_window: self.frequency_window,
            },
            streak_length: self.streak_length,
            bias_window: self.bias_window,
            script: if self.script.is_empty() {
                default_script()
            } else {
                self.script.clone()
            },
            default_move: self.default_move,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_move: self.default_move,
            deviation: self.deviation,
            max_order: self.max_order,
            seed: self.seed,
        }
    }

    pub fn build_engine(&self) -> Result<DecisionEngine, ConfigError> {
        let strategy = self.policy.build(&self.strategy_config())?;
        Ok(DecisionEngine::new(strategy, self.engine_config()))
    }
}
