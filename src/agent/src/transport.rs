use std::time::Duration;

use async_trait::async_trait;
use common::model::{
    game::Move,
    messages::{ClientEvent, ServerEvent},
};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{net::TcpStream, sync::mpsc, time};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::error::TransportError;

/// A request for this round's move, carrying the previous round's raw result
/// (`None` on the first prompt of a match).
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub previous: Option<Value>,
}

#[async_trait]
pub trait Transport: Send {
    async fn announce(&mut self, name: &str) -> Result<(), TransportError>;

    /// Waits for the next prompt. `Ok(None)` means the server hung up.
    async fn next_prompt(&mut self) -> Result<Option<Prompt>, TransportError>;

    async fn emit_move(&mut self, value: Move) -> Result<(), TransportError>;
}

pub struct WebSocketTransport {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketTransport {
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (socket, response) = connect_async(url).await?;
        debug!("Handshake with {} returned {}", url, response.status());
        Ok(WebSocketTransport { socket })
    }

    /// Retries `connect` every `delay` until it succeeds or `attempts` run out
    /// (`None` retries forever).
    pub async fn connect_with_retry(
        url: &str,
        delay: Duration,
        attempts: Option<u32>,
    ) -> Result<Self, TransportError> {
        let mut attempt = 1;
        loop {
            match Self::connect(url).await {
                Ok(transport) => {
                    info!("Connected to {} on attempt {}", url, attempt);
                    return Ok(transport);
                }
                Err(e) if attempts.map_or(true, |max| attempt < max) => {
                    warn!(
                        "Failed to connect to {}: {}, retrying in {:?}",
                        url, e, delay
                    );
                    time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&mut self, event: &ClientEvent) -> Result<(), TransportError> {
        let body = serde_json::to_string(event)?;
        self.socket.send(Message::text(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn announce(&mut self, name: &str) -> Result<(), TransportError> {
        self.send(&ClientEvent::Bot {
            name: name.to_owned(),
        })
        .await
    }

    async fn next_prompt(&mut self) -> Result<Option<Prompt>, TransportError> {
        loop {
            let Some(message) = self.socket.next().await else {
                return Ok(None);
            };
            let message = match message {
                Ok(message) => message,
                Err(
                    tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::AlreadyClosed,
                ) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let body = match message {
                Message::Text(body) => body,
                Message::Close(frame) => {
                    debug!("Server closed the socket: {:?}", frame);
                    return Ok(None);
                }
                other => {
                    debug!("Ignoring non-text frame {:?}", other);
                    continue;
                }
            };
            match serde_json::from_str::<ServerEvent>(&body) {
                Ok(ServerEvent::Round { previous }) => return Ok(Some(Prompt { previous })),
                Ok(ServerEvent::Unknown) => warn!("Ignoring unknown event: {}", body),
                Err(e) => warn!("Ignoring unreadable frame '{}': {}", body, e),
            }
        }
    }

    async fn emit_move(&mut self, value: Move) -> Result<(), TransportError> {
        self.send(&ClientEvent::Move { value }).await
    }
}

/// In-memory transport: prompts come from a channel and everything the bot
/// sends is forwarded to another. Dropping the prompt sender disconnects.
pub struct ChannelTransport {
    prompts: mpsc::Receiver<Prompt>,
    sent: mpsc::UnboundedSender<ClientEvent>,
}

impl ChannelTransport {
    pub fn new(
        prompts: mpsc::Receiver<Prompt>,
        sent: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        ChannelTransport { prompts, sent }
    }

    fn forward(&self, event: ClientEvent) -> Result<(), TransportError> {
        self.sent
            .send(event)
            .map_err(|_| TransportError::Disconnected)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn announce(&mut self, name: &str) -> Result<(), TransportError> {
        self.forward(ClientEvent::Bot {
            name: name.to_owned(),
        })
    }

    async fn next_prompt(&mut self) -> Result<Option<Prompt>, TransportError> {
        Ok(self.prompts.recv().await)
    }

    async fn emit_move(&mut self, value: Move) -> Result<(), TransportError> {
        self.forward(ClientEvent::Move { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_transport_round_trip() {
        let (prompt_sender, prompt_receiver) = mpsc::channel(4);
        let (sent_sender, mut sent_receiver) = mpsc::unbounded_channel();
        let mut transport = ChannelTransport::new(prompt_receiver, sent_sender);

        transport.announce("bot").await.unwrap();
        prompt_sender.send(Prompt { previous: None }).await.unwrap();
        assert_eq!(
            transport.next_prompt().await.unwrap(),
            Some(Prompt { previous: None })
        );
        transport.emit_move(Move::Paper).await.unwrap();
        drop(prompt_sender);
        assert_eq!(transport.next_prompt().await.unwrap(), None);

        assert_eq!(
            sent_receiver.recv().await,
            Some(ClientEvent::Bot {
                name: "bot".to_owned()
            })
        );
        assert_eq!(
            sent_receiver.recv().await,
            Some(ClientEvent::Move { value: Move::Paper })
        );
    }

    #[tokio::test]
    async fn retry_gives_up_after_the_last_attempt() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let result = WebSocketTransport::connect_with_retry(
            &format!("ws://{}", address),
            Duration::from_millis(10),
            Some(2),
        )
        .await;
        assert!(result.is_err());
    }
}
