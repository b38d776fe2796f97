pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod opponent_model;
pub mod round;
pub mod strategy;
pub mod transport;
