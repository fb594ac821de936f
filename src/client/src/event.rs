use std::fmt;

use common::model::game::face;

use crate::snapshot::{RoundResult, TurnSnapshot};

/// What the session tells its consumer, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Pick a coin side for the coming round.
    ShouldMakeChoice,
    /// It is our turn to play a card.
    BeforeMyTurn(TurnSnapshot),
    /// The table right after our card was accepted.
    AfterMyTurn(TurnSnapshot),
    RoundEnded(RoundResult),
}

impl SessionEvent {
    pub fn snapshot(&self) -> Option<&TurnSnapshot> {
        match self {
            SessionEvent::BeforeMyTurn(snapshot) | SessionEvent::AfterMyTurn(snapshot) => {
                Some(snapshot)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionEvent::ShouldMakeChoice => write!(f, "Choose a side"),
            SessionEvent::BeforeMyTurn(snapshot) => match snapshot.last_enemy_effect {
                Some(effect) => write!(
                    f,
                    "Your turn (coin {}, enemy used {})",
                    face(snapshot.coin),
                    effect
                ),
                None => write!(f, "Your turn (coin {})", face(snapshot.coin)),
            },
            SessionEvent::AfterMyTurn(snapshot) => {
                write!(f, "Card played (coin {})", face(snapshot.coin))
            }
            SessionEvent::RoundEnded(result) => match result.match_winner {
                Some(true) => write!(f, "Match won ({}-{})", result.my_score, result.enemy_score),
                Some(false) => write!(f, "Match lost ({}-{})", result.my_score, result.enemy_score),
                None => write!(
                    f,
                    "Round over. Me: {} ({}), Enemy: {} ({})",
                    if result.i_won { "win" } else { "lose" },
                    result.my_score,
                    if result.enemy_won { "win" } else { "lose" },
                    result.enemy_score
                ),
            },
        }
    }
}
