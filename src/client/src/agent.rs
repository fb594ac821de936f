use common::model::game::{face, Card};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    error::SessionError,
    event::SessionEvent,
    session::Session,
    snapshot::{RoundResult, TurnSnapshot},
    strategy::Strategy,
    transport::Transport,
};

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("no event to answer but the match is not over")]
    Stalled,
}

/// Plays matches on a [`Session`] by answering its events with a [`Strategy`].
pub struct Agent {
    strategy: Box<dyn Strategy>,
    history: Vec<RoundResult>,
    last_table: Option<TurnSnapshot>,
}

impl Agent {
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        Agent {
            strategy,
            history: Vec::new(),
            last_table: None,
        }
    }

    /// Rounds of the current (or last) match.
    pub fn history(&self) -> &[RoundResult] {
        &self.history
    }

    /// The table as of our latest turn, before or after playing.
    pub fn last_table(&self) -> Option<&TurnSnapshot> {
        self.last_table.as_ref()
    }

    /// Starts a match and plays it out. Returns whether we won it.
    pub async fn play_match<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    ) -> Result<bool, AgentError> {
        self.history.clear();
        self.last_table = None;
        session.start().await?;
        loop {
            // Every command returns with the next decision already queued
            let event = events.try_recv().map_err(|_| AgentError::Stalled)?;
            debug!("{}: {}", session.id(), event);
            if let Some(snapshot) = event.snapshot() {
                self.last_table = Some(snapshot.clone());
            }
            match event {
                SessionEvent::ShouldMakeChoice => {
                    let side = self.strategy.choose_side(&self.history);
                    info!("{} picks {}", session.id(), face(side));
                    session.submit_choice(side).await?;
                }
                SessionEvent::BeforeMyTurn(snapshot) => self.take_turn(session, &snapshot).await?,
                SessionEvent::AfterMyTurn(_) => {}
                SessionEvent::RoundEnded(result) => {
                    let winner = result.match_winner;
                    self.history.push(result);
                    if let Some(winner) = winner {
                        return Ok(winner);
                    }
                }
            }
        }
    }

    async fn take_turn<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        snapshot: &TurnSnapshot,
    ) -> Result<(), AgentError> {
        let (card, effect) = self.strategy.choose_card(snapshot);
        match session.play_card(card, effect).await {
            Err(SessionError::Rejected(message)) if card != Card::Pass => {
                warn!("{} refused ({}), passing instead", card, message);
                session.pass().await?;
            }
            result => result?,
        }
        Ok(())
    }
}
