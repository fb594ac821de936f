use std::collections::BTreeMap;

use common::model::game::{Card, CardEffect, ServerState};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::card::{resolve_effect, ResolveError, Target};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("{0}")]
    Malformed(String),
    #[error("{0}")]
    ProtocolViolation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Me,
    Enemy,
}

/// The table as seen by this client while cards are being played.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSnapshot {
    /// Coin face for this round, `true` is heads.
    pub coin: bool,
    pub cards: BTreeMap<Card, u32>,
    pub my_side_known_to_enemy: bool,
    pub enemy_side_known_to_enemy: bool,
    /// `None` when not chosen yet or hidden from us.
    pub my_side: Option<bool>,
    pub enemy_side: Option<bool>,
    pub last_enemy_effect: Option<CardEffect>,
    pub turn: Option<Turn>,
}

impl TurnSnapshot {
    /// Cards held at least once. Passing without a Pass card goes through
    /// `Session::pass` instead.
    pub fn playable(&self) -> Vec<Card> {
        self.cards
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(card, _)| *card)
            .collect()
    }

    pub fn count(&self, card: Card) -> u32 {
        self.cards.get(&card).copied().unwrap_or(0)
    }

    pub fn resolve(&self, card: Card, target: Option<Target>) -> Result<CardEffect, ResolveError> {
        resolve_effect(card, target, self.last_enemy_effect)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    #[serde(rename = "meScore")]
    pub my_score: i32,
    #[serde(rename = "enemyScore")]
    pub enemy_score: i32,
    #[serde(rename = "meWon")]
    pub i_won: bool,
    #[serde(rename = "enemyWon")]
    pub enemy_won: bool,
    /// Only present once the whole match is decided.
    #[serde(rename = "iAmTheWinner", default)]
    pub match_winner: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    AwaitingPlayers,
    AwaitingSides,
    AwaitingCards(TurnSnapshot),
    RoundEnded(RoundResult),
}

impl Snapshot {
    pub fn state(&self) -> ServerState {
        match self {
            Snapshot::AwaitingPlayers => ServerState::AwaitingPlayers,
            Snapshot::AwaitingSides => ServerState::AwaitingSides,
            Snapshot::AwaitingCards(_) => ServerState::AwaitingCards,
            Snapshot::RoundEnded(_) => ServerState::RoundEnded,
        }
    }
}

// Fields of an AwaitingCards snapshot as they arrive
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TurnFields {
    coin: bool,
    me_cards: BTreeMap<String, i64>,
    me_side_known_to_enemy: bool,
    enemy_side_known_to_enemy: bool,
    #[serde(default)]
    me_side: Option<bool>,
    #[serde(default)]
    enemy_side: Option<bool>,
    last_enemy_played_card: String,
    #[serde(default)]
    turn: Option<String>,
}

/// Turns a `/render` body into a [`Snapshot`]. Only the fields of the reported
/// state are read; anything missing or mistyped among them is an error.
pub fn decode(raw: &Value) -> Result<Snapshot, DecodeError> {
    let state = raw
        .get("state")
        .ok_or_else(|| DecodeError::Malformed("snapshot has no state".to_owned()))?;
    let state = ServerState::deserialize(state)
        .map_err(|e| DecodeError::Malformed(format!("bad state {}: {}", state, e)))?;

    match state {
        ServerState::AwaitingPlayers => Ok(Snapshot::AwaitingPlayers),
        ServerState::AwaitingSides => Ok(Snapshot::AwaitingSides),
        ServerState::AwaitingCards => {
            let fields = TurnFields::deserialize(raw)
                .map_err(|e| DecodeError::Malformed(format!("AwaitingCards: {}", e)))?;
            turn_snapshot(fields).map(Snapshot::AwaitingCards)
        }
        ServerState::RoundEnded => RoundResult::deserialize(raw)
            .map(Snapshot::RoundEnded)
            .map_err(|e| DecodeError::Malformed(format!("RoundEnded: {}", e))),
    }
}

fn turn_snapshot(fields: TurnFields) -> Result<TurnSnapshot, DecodeError> {
    let mut cards = BTreeMap::new();
    for (name, count) in fields.me_cards {
        let card: Card = name
            .parse()
            .map_err(|_| DecodeError::Malformed(format!("meCards: unknown card {:?}", name)))?;
        let count = u32::try_from(count)
            .map_err(|_| DecodeError::Malformed(format!("meCards: {} has count {}", card, count)))?;
        cards.insert(card, count);
    }

    let last_enemy_effect = match fields.last_enemy_played_card.as_str() {
        "" => None,
        name => Some(
            name.parse::<CardEffect>()
                .map_err(|_| {
                    DecodeError::Malformed(format!("lastEnemyPlayedCard: unknown effect {:?}", name))
                })?,
        ),
    };

    let turn = match fields.turn.as_deref() {
        None => None,
        Some("me") => Some(Turn::Me),
        Some("enemy") => Some(Turn::Enemy),
        Some(other) => {
            return Err(DecodeError::ProtocolViolation(format!(
                "turn must be \"me\" or \"enemy\", got {:?}",
                other
            )))
        }
    };

    Ok(TurnSnapshot {
        coin: fields.coin,
        cards,
        my_side_known_to_enemy: fields.me_side_known_to_enemy,
        enemy_side_known_to_enemy: fields.enemy_side_known_to_enemy,
        my_side: fields.me_side,
        enemy_side: fields.enemy_side,
        last_enemy_effect,
        turn,
    })
}
