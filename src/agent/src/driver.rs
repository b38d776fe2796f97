use common::model::{game::Move, messages::Id};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{
    engine::DecisionEngine,
    error::TransportError,
    round::Round,
    transport::Transport,
};

/// How a session ended once the server stopped prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub session: Id,
    pub rounds_played: u64,
}

/// Speaks the round protocol for one bot: announce, then for every prompt
/// record the previous result, pick a move and send it. One prompt is handled
/// to completion before the next is read.
pub struct RoundDriver {
    name: String,
    engine: DecisionEngine,
    session: Id,
    rounds_played: u64,
}

impl RoundDriver {
    pub fn new(name: impl Into<String>, engine: DecisionEngine) -> Self {
        RoundDriver {
            name: name.into(),
            engine,
            session: Id::new(),
            rounds_played: 0,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Swaps in a fresh engine, dropping everything learned so far.
    pub fn replace_engine(&mut self, engine: DecisionEngine) {
        self.engine = engine;
    }

    pub fn session(&self) -> Id {
        self.session
    }

    pub fn rounds_played(&self) -> u64 {
        self.rounds_played
    }

    pub async fn on_connect<T>(&mut self, transport: &mut T) -> Result<(), TransportError>
    where
        T: Transport + ?Sized,
    {
        self.session = Id::new();
        self.rounds_played = 0;
        info!(
            "[{}] Announcing as '{}' with {}",
            self.session,
            self.name,
            self.engine.strategy_name()
        );
        transport.announce(&self.name).await
    }

    /// Records the previous round's raw payload. Unreadable payloads are
    /// replaced by [`Round::fallback`] so the round count stays aligned.
    pub fn record_previous(&mut self, payload: &Value) -> Round {
        let index = self.engine.next_round_index();
        let round = match Round::from_payload(index, payload) {
            Ok(round) => *self.engine.record(round),
            Err(e) => {
                error!("[{}] {}, recording a ROCK/ROCK draw", self.session, e);
                *self.engine.record_substitute()
            }
        };
        debug!(
            "[{}] Round {}: {} vs {}, {}",
            self.session, round.index, round.own_move, round.opponent_move, round.outcome
        );
        round
    }

    pub async fn on_round_prompt<T>(
        &mut self,
        transport: &mut T,
        previous: Option<Value>,
    ) -> Result<Move, TransportError>
    where
        T: Transport + ?Sized,
    {
        if let Some(payload) = previous {
            self.record_previous(&payload);
        }

        let chosen = self.engine.select_move();
        transport.emit_move(chosen).await?;
        self.rounds_played += 1;
        debug!(
            "[{}] Played {} for prompt {}",
            self.session, chosen, self.rounds_played
        );
        Ok(chosen)
    }

    pub async fn run<T>(&mut self, transport: &mut T) -> Result<SessionSummary, TransportError>
    where
        T: Transport + ?Sized,
    {
        self.on_connect(transport).await?;
        while let Some(prompt) = transport.next_prompt().await? {
            self.on_round_prompt(transport, prompt.previous).await?;
        }
        info!(
            "[{}] Server disconnected after {} prompts",
            self.session, self.rounds_played
        );
        Ok(SessionSummary {
            session: self.session,
            rounds_played: self.rounds_played,
        })
    }
}

#[cfg(test)]
mod tests {
    use common::model::{game::Outcome, messages::ClientEvent};
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        engine::{EngineConfig, Phase},
        strategy::{CounterPlay, Preset, Signal, StrategyConfig},
        transport::{ChannelTransport, Prompt},
    };

    fn driver() -> RoundDriver {
        let engine = DecisionEngine::new(
            Box::new(CounterPlay::new(Signal::Markov)),
            EngineConfig {
                seed: Some(3),
                ..EngineConfig::default()
            },
        );
        RoundDriver::new("tester", engine)
    }

    fn prompt(previous: Value) -> Prompt {
        Prompt {
            previous: Some(previous),
        }
    }

    async fn play(driver: &mut RoundDriver, prompts: Vec<Prompt>) -> Vec<ClientEvent> {
        let (prompt_sender, prompt_receiver) = mpsc::channel(prompts.len().max(1));
        let (sent_sender, mut sent_receiver) = mpsc::unbounded_channel();
        for p in prompts {
            prompt_sender.send(p).await.unwrap();
        }
        drop(prompt_sender);
        let mut transport = ChannelTransport::new(prompt_receiver, sent_sender);
        driver.run(&mut transport).await.unwrap();
        drop(transport);

        let mut sent = Vec::new();
        while let Some(event) = sent_receiver.recv().await {
            sent.push(event);
        }
        sent
    }

    #[tokio::test]
    async fn announces_before_any_move() {
        let mut driver = driver();
        let sent = play(&mut driver, vec![]).await;
        assert_eq!(
            sent,
            vec![ClientEvent::Bot {
                name: "tester".to_owned()
            }]
        );
        assert_eq!(driver.engine().phase(), Phase::AwaitingFirstPrompt);
    }

    #[tokio::test]
    async fn one_move_per_prompt() {
        let mut driver = driver();
        let prompts = vec![
            Prompt { previous: None },
            prompt(json!({"you": "ROCK", "opponent": "PAPER", "result": "loss"})),
            prompt(json!({"you": "SCISSORS", "opponent": "PAPER", "result": "win"})),
        ];
        let sent = play(&mut driver, prompts).await;
        assert_eq!(sent.len(), 4);
        assert!(sent[1..]
            .iter()
            .all(|e| matches!(e, ClientEvent::Move { .. })));
        assert_eq!(driver.rounds_played(), 3);
        assert_eq!(driver.engine().history().len(), 2);
    }

    #[tokio::test]
    async fn first_prompt_records_nothing() {
        let mut driver = driver();
        let sent = play(&mut driver, vec![Prompt { previous: None }]).await;
        assert_eq!(sent[1], ClientEvent::Move { value: Move::Rock });
        assert!(driver.engine().history().is_empty());
        assert_eq!(driver.engine().phase(), Phase::InProgress);
    }

    #[tokio::test]
    async fn malformed_payload_records_a_rock_draw() {
        let mut driver = driver();
        let sent = play(
            &mut driver,
            vec![
                Prompt { previous: None },
                prompt(json!({"you": "ROCK", "opponent": "INVALID"})),
            ],
        )
        .await;
        assert_eq!(sent.len(), 3);
        let history = driver.engine().history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].opponent_move, Move::Rock);
        assert_eq!(history[0].outcome, Outcome::Draw);
        assert_eq!(driver.engine().model().move_counts().get(Move::Rock), 1);
    }

    #[tokio::test]
    async fn history_matches_the_prompts_in_order() {
        let opponent = [Move::Scissors, Move::Scissors, Move::Paper, Move::Rock];
        let mut driver = driver();
        let mut prompts = vec![Prompt { previous: None }];
        prompts.extend(opponent.iter().map(|m| {
            prompt(json!({"you": "ROCK", "opponent": m.to_string(), "result": "draw"}))
        }));
        play(&mut driver, prompts).await;

        let history = driver.engine().history();
        assert_eq!(history.len(), opponent.len());
        for (i, round) in history.iter().enumerate() {
            assert_eq!(round.index, i);
            assert_eq!(round.opponent_move, opponent[i]);
        }
    }

    #[tokio::test]
    async fn counters_a_constant_opponent() {
        let engine = DecisionEngine::new(
            Preset::StreakBreaker
                .build(&StrategyConfig::default())
                .unwrap(),
            EngineConfig::default(),
        );
        let mut driver = RoundDriver::new("tester", engine);
        let mut prompts = vec![Prompt { previous: None }];
        prompts.extend((0..5).map(|_| {
            prompt(json!({"you": "ROCK", "opponent": "SCISSORS", "result": "win"}))
        }));
        let sent = play(&mut driver, prompts).await;
        assert_eq!(
            sent.last(),
            Some(&ClientEvent::Move { value: Move::Rock })
        );
    }

    #[tokio::test]
    async fn reconnect_starts_a_new_session_but_keeps_the_engine() {
        let mut driver = driver();
        play(
            &mut driver,
            vec![
                Prompt { previous: None },
                prompt(json!({"you": "ROCK", "opponent": "PAPER", "result": "loss"})),
            ],
        )
        .await;
        let first = driver.session();
        play(&mut driver, vec![Prompt { previous: None }]).await;
        assert_ne!(driver.session(), first);
        assert_eq!(driver.rounds_played(), 1);
        assert_eq!(driver.engine().history().len(), 1);
    }
}
