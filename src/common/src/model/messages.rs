use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::game::Move;

/// Identifies one connection to the game server.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub struct Id(pub Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let uuid = Uuid::parse_str(&s).map_err(serde::de::Error::custom)?;
        Ok(Id(uuid))
    }
}
impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Bot -> server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientEvent {
    Bot { name: String },
    Move { value: Move },
}

// Server -> bot. The previous round is kept as raw JSON so a malformed result
// still reaches the bot as a prompt instead of being dropped by the codec.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    Round {
        #[serde(default)]
        previous: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_events_are_type_tagged() {
        let body = serde_json::to_value(ClientEvent::Move { value: Move::Paper }).unwrap();
        assert_eq!(body, json!({"type": "Move", "value": "PAPER"}));
        let body = serde_json::to_value(ClientEvent::Bot { name: "slaybot".into() }).unwrap();
        assert_eq!(body, json!({"type": "Bot", "name": "slaybot"}));
    }

    #[test]
    fn round_event_keeps_raw_previous() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"type":"Round","previous":{"you":"ROCK","opponent":"INVALID"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ServerEvent::Round {
                previous: Some(json!({"you": "ROCK", "opponent": "INVALID"}))
            }
        );

        let first: ServerEvent = serde_json::from_str(r#"{"type":"Round"}"#).unwrap();
        assert_eq!(first, ServerEvent::Round { previous: None });
    }

    #[test]
    fn unknown_events_do_not_fail() {
        let event: ServerEvent = serde_json::from_str(r#"{"type":"Leaderboard"}"#).unwrap();
        assert_eq!(event, ServerEvent::Unknown);
    }
}
