use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::game::{Card, CardEffect};

/// Identifies one participant of a match for the lifetime of its client.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new() -> Self {
        ClientId(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ClientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let uuid = Uuid::parse_str(&s).map_err(serde::de::Error::custom)?;
        Ok(ClientId(uuid))
    }
}

impl Serialize for ClientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Query strings of the game server's GET endpoints

/// `/join` and `/render`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IdQuery {
    pub id: ClientId,
}

/// `/side`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SideQuery {
    pub id: ClientId,
    #[serde(with = "capitalized_bool")]
    pub side: bool,
}

/// `/card`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardQuery {
    pub id: ClientId,
    pub card: Card,
    pub card_effect: CardEffect,
}

/// Body of a 200 response rejecting a command.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

// The server expects `True`/`False` in query strings.
mod capitalized_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(serde::de::Error::custom(format!("not a boolean: {}", s))),
        }
    }
}
