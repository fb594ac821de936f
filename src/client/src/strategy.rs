use clap::ValueEnum;
use common::model::game::{Card, CardEffect};

use crate::{
    card::Target,
    snapshot::{RoundResult, TurnSnapshot},
};

pub trait Strategy: Send {
    /// Side for the coming round, given every round finished so far.
    fn choose_side(&mut self, history: &[RoundResult]) -> bool;
    fn choose_card(&mut self, snapshot: &TurnSnapshot) -> (Card, CardEffect);
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    OnlyPass,
    Greedy,
    Copycat,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::OnlyPass => Box::new(OnlyPass { side: true }),
            StrategyKind::Greedy => Box::new(Greedy {}),
            StrategyKind::Copycat => Box::new(Copycat { side: true }),
        }
    }
}

// Trivial strategies
pub struct OnlyPass {
    pub side: bool,
}
impl Strategy for OnlyPass {
    fn choose_side(&mut self, _: &[RoundResult]) -> bool {
        self.side
    }

    fn choose_card(&mut self, _: &TurnSnapshot) -> (Card, CardEffect) {
        (Card::Pass, CardEffect::Pass)
    }
}

/// Spends its hand as fast as it can.
pub struct Greedy {}
impl Strategy for Greedy {
    fn choose_side(&mut self, history: &[RoundResult]) -> bool {
        history.len() % 2 == 0
    }

    fn choose_card(&mut self, snapshot: &TurnSnapshot) -> (Card, CardEffect) {
        for card in snapshot.playable() {
            if card == Card::Pass {
                continue;
            }
            let target = if card == Card::Scan {
                Target::Me
            } else {
                Target::Enemy
            };
            if let Ok(effect) = snapshot.resolve(card, Some(target)) {
                return (card, effect);
            }
        }
        (Card::Pass, CardEffect::Pass)
    }
}

/// Answers the enemy with its own last effect whenever it holds a Mirror.
pub struct Copycat {
    pub side: bool,
}
impl Strategy for Copycat {
    fn choose_side(&mut self, history: &[RoundResult]) -> bool {
        // Keep a winning side, switch after a loss
        if let Some(last) = history.last() {
            if !last.i_won {
                self.side = !self.side;
            }
        }
        self.side
    }

    fn choose_card(&mut self, snapshot: &TurnSnapshot) -> (Card, CardEffect) {
        if snapshot.count(Card::Mirror) > 0 {
            if let Ok(effect) = snapshot.resolve(Card::Mirror, None) {
                return (Card::Mirror, effect);
            }
        }
        (Card::Pass, CardEffect::Pass)
    }
}
