use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Phase of a match as reported by the server's `state` field.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    #[serde(alias = "WaitingForPlayers")]
    AwaitingPlayers,
    #[serde(alias = "WaitingForSides")]
    AwaitingSides,
    #[serde(alias = "WaitingForCards")]
    AwaitingCards,
    RoundEnded,
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Card {
    Pass,
    Random,
    RandomMe,
    RandomEnemy,
    Flip,
    FlipMe,
    FlipEnemy,
    Scan,
    ScanMe,
    ScanEnemy,
    Swap,
    Yield,
    Mirror,
}

/// The concrete action a played card performs once its target is known.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
)]
pub enum CardEffect {
    Pass,
    RandomMe,
    RandomEnemy,
    FlipMe,
    FlipEnemy,
    ScanMe,
    ScanEnemy,
    Swap,
    Yield,
}

/// Display name of a coin side; `true` is heads.
pub fn face(side: bool) -> &'static str {
    if side {
        "Heads"
    } else {
        "Tails"
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn names_parse_back() {
        for card in Card::iter() {
            assert_eq!(card.to_string().parse::<Card>(), Ok(card));
            assert_eq!(serde_json::to_value(card).unwrap(), card.to_string());
        }
        for effect in CardEffect::iter() {
            assert_eq!(effect.to_string().parse::<CardEffect>(), Ok(effect));
            assert_eq!(serde_json::to_value(effect).unwrap(), effect.to_string());
        }
        assert_eq!(Card::iter().count(), 13);
        assert_eq!(CardEffect::iter().count(), 9);
        assert!("Teleport".parse::<Card>().is_err());
        assert!("Mirror".parse::<CardEffect>().is_err());
    }

    #[test]
    fn server_state_accepts_legacy_names() {
        let state: ServerState = serde_json::from_str("\"WaitingForCards\"").unwrap();
        assert_eq!(state, ServerState::AwaitingCards);
        let state: ServerState = serde_json::from_str("\"RoundEnded\"").unwrap();
        assert_eq!(state, ServerState::RoundEnded);
        assert!(serde_json::from_str::<ServerState>("\"Lobby\"").is_err());
    }
}
