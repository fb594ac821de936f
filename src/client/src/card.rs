use common::model::game::{Card, CardEffect};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Me,
    Enemy,
}

/// How a card kind becomes the effect sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectRule {
    Direct(CardEffect),
    /// The player picks who the card acts on.
    Targeted { me: CardEffect, enemy: CardEffect },
    /// Repeats whatever the enemy played last, `Pass` if nothing yet.
    MirrorLastEnemy,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} needs a target")]
    TargetRequired(Card),
}

pub trait CardRules {
    fn rule(&self) -> EffectRule;
}

impl CardRules for Card {
    fn rule(&self) -> EffectRule {
        match self {
            Card::Pass => EffectRule::Direct(CardEffect::Pass),
            Card::Random => EffectRule::Targeted {
                me: CardEffect::RandomMe,
                enemy: CardEffect::RandomEnemy,
            },
            Card::RandomMe => EffectRule::Direct(CardEffect::RandomMe),
            Card::RandomEnemy => EffectRule::Direct(CardEffect::RandomEnemy),
            Card::Flip => EffectRule::Targeted {
                me: CardEffect::FlipMe,
                enemy: CardEffect::FlipEnemy,
            },
            Card::FlipMe => EffectRule::Direct(CardEffect::FlipMe),
            Card::FlipEnemy => EffectRule::Direct(CardEffect::FlipEnemy),
            Card::Scan => EffectRule::Targeted {
                me: CardEffect::ScanMe,
                enemy: CardEffect::ScanEnemy,
            },
            Card::ScanMe => EffectRule::Direct(CardEffect::ScanMe),
            Card::ScanEnemy => EffectRule::Direct(CardEffect::ScanEnemy),
            Card::Swap => EffectRule::Direct(CardEffect::Swap),
            Card::Yield => EffectRule::Direct(CardEffect::Yield),
            Card::Mirror => EffectRule::MirrorLastEnemy,
        }
    }
}

/// Picks the effect to submit with `card`. The target is only consulted for
/// targeted cards.
pub fn resolve_effect(
    card: Card,
    target: Option<Target>,
    last_enemy: Option<CardEffect>,
) -> Result<CardEffect, ResolveError> {
    match card.rule() {
        EffectRule::Direct(effect) => Ok(effect),
        EffectRule::Targeted { me, enemy } => match target {
            Some(Target::Me) => Ok(me),
            Some(Target::Enemy) => Ok(enemy),
            None => Err(ResolveError::TargetRequired(card)),
        },
        EffectRule::MirrorLastEnemy => Ok(last_enemy.unwrap_or(CardEffect::Pass)),
    }
}
