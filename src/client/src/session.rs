use common::model::{
    game::{face, Card, CardEffect},
    messages::ClientId,
};
use tokio::{
    sync::{broadcast, mpsc},
    time,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::SessionConfig,
    error::SessionError,
    event::SessionEvent,
    snapshot::{decode, RoundResult, Snapshot, Turn, TurnSnapshot},
    transport::Transport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    WaitingForOpponent,
    AwaitingLocalSideChoice,
    WaitingAfterLocalSideChoice,
    AwaitingLocalCardPlay,
    WaitingAfterLocalCardPlay,
    RoundConcluded,
    MatchConcluded,
    /// A fatal error ended the session.
    Halted,
}

enum TurnWait {
    MyTurn(TurnSnapshot),
    RoundEnded,
}

/// Client side of one match: mirrors the server by polling and turns what it
/// sees into [`SessionEvent`]s.
///
/// Commands take `&mut self`, so at most one of them (and its polling) runs at a
/// time. Each returns once the session needs the next decision from its
/// consumer, the match is over, or something failed.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    phase: Phase,
    coin: Option<bool>,
    events: mpsc::UnboundedSender<SessionEvent>,
    shutdown_sender: broadcast::Sender<()>,
    shutdown_receiver: broadcast::Receiver<()>,
}

impl<T: Transport> Session<T> {
    /// The session subscribes to `shutdown`; a signal on it stops any
    /// in-flight polling and halts the session. Give each session its own
    /// channel to tear them down individually.
    pub fn new(
        transport: T,
        config: SessionConfig,
        shutdown: &broadcast::Sender<()>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, event_receiver) = mpsc::unbounded_channel();
        let session = Session {
            transport,
            config,
            phase: Phase::Idle,
            coin: None,
            events,
            shutdown_sender: shutdown.clone(),
            shutdown_receiver: shutdown.subscribe(),
        };
        (session, event_receiver)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn id(&self) -> ClientId {
        self.transport.id()
    }

    /// Coin face seen so far this round.
    pub fn coin(&self) -> Option<bool> {
        self.coin
    }

    /// Sending on this stops any in-flight polling and halts the session.
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_sender.clone()
    }

    /// Joins the server and waits for an opponent. Also starts a new match once
    /// the previous one concluded.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.expect_phase("start", &[Phase::Idle, Phase::MatchConcluded])?;
        let result = self.connect().await;
        self.halt_on_fatal(result)
    }

    /// Commits our coin side for the round, then waits for our first turn.
    pub async fn submit_choice(&mut self, side: bool) -> Result<(), SessionError> {
        self.expect_phase("submit_choice", &[Phase::AwaitingLocalSideChoice])?;
        let result = self.choose_side(side).await;
        self.halt_on_fatal(result)
    }

    /// Plays `card` as `effect`, then waits for our next turn or the end of
    /// the round.
    pub async fn play_card(&mut self, card: Card, effect: CardEffect) -> Result<(), SessionError> {
        self.expect_phase("play_card", &[Phase::AwaitingLocalCardPlay])?;
        let result = self.use_card(card, effect).await;
        self.halt_on_fatal(result)
    }

    pub async fn pass(&mut self) -> Result<(), SessionError> {
        self.play_card(Card::Pass, CardEffect::Pass).await
    }

    async fn connect(&mut self) -> Result<(), SessionError> {
        self.phase = Phase::Connecting;
        info!("Connecting to {} as {}", self.config.server_url, self.id());
        let joined = tokio::select! {
            biased;
            _ = self.shutdown_receiver.recv() => return Err(SessionError::Cancelled),
            joined = self.transport.join() => joined?,
        };
        if !joined {
            return Err(SessionError::JoinRefused);
        }

        self.phase = Phase::WaitingForOpponent;
        info!("Connected to server. Waiting for the other player to join...");
        loop {
            match self.fetch().await? {
                Snapshot::AwaitingPlayers => {}
                Snapshot::AwaitingSides => break,
                other => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "{:?} while waiting for an opponent",
                        other.state()
                    )))
                }
            }
            self.pause().await?;
        }
        info!("Players ready");

        self.phase = Phase::AwaitingLocalSideChoice;
        self.emit(SessionEvent::ShouldMakeChoice);
        Ok(())
    }

    async fn choose_side(&mut self, side: bool) -> Result<(), SessionError> {
        debug!("Choosing {}", face(side));
        let rejection = tokio::select! {
            biased;
            _ = self.shutdown_receiver.recv() => return Err(SessionError::Cancelled),
            rejection = self.transport.submit_side(side) => rejection?,
        };
        if let Some(message) = rejection {
            warn!("Side choice rejected: {}", message);
            return Err(SessionError::Rejected(message));
        }

        self.phase = Phase::WaitingAfterLocalSideChoice;
        self.await_turn().await
    }

    async fn use_card(&mut self, card: Card, effect: CardEffect) -> Result<(), SessionError> {
        debug!("Playing {} as {}", card, effect);
        let rejection = tokio::select! {
            biased;
            _ = self.shutdown_receiver.recv() => return Err(SessionError::Cancelled),
            rejection = self.transport.submit_card(card, effect) => rejection?,
        };
        if let Some(message) = rejection {
            warn!("{} rejected: {}", card, message);
            return Err(SessionError::Rejected(message));
        }

        self.phase = Phase::WaitingAfterLocalCardPlay;
        // The play itself may have ended the round, so look right away
        match self.fetch().await? {
            Snapshot::RoundEnded(_) => self.conclude_round().await,
            Snapshot::AwaitingCards(snapshot) => {
                self.emit(SessionEvent::AfterMyTurn(snapshot));
                self.await_turn().await
            }
            other => Err(SessionError::ProtocolViolation(format!(
                "{:?} right after playing a card",
                other.state()
            ))),
        }
    }

    async fn await_turn(&mut self) -> Result<(), SessionError> {
        match self.wait_for_turn().await? {
            TurnWait::MyTurn(snapshot) => {
                self.phase = Phase::AwaitingLocalCardPlay;
                self.emit(SessionEvent::BeforeMyTurn(snapshot));
                Ok(())
            }
            TurnWait::RoundEnded => self.conclude_round().await,
        }
    }

    // Polls until it is our turn or the round is over.
    async fn wait_for_turn(&mut self) -> Result<TurnWait, SessionError> {
        let mut announced_sides = false;
        let mut announced_cards = false;
        loop {
            match self.fetch().await? {
                Snapshot::RoundEnded(_) => return Ok(TurnWait::RoundEnded),
                Snapshot::AwaitingSides => {
                    if !announced_sides {
                        info!("Waiting for the other player to make a choice...");
                        announced_sides = true;
                    }
                }
                Snapshot::AwaitingCards(snapshot) => {
                    if self.coin.is_none() {
                        info!("The coin is: {}", face(snapshot.coin));
                        self.coin = Some(snapshot.coin);
                    }
                    match snapshot.turn {
                        Some(Turn::Me) => return Ok(TurnWait::MyTurn(snapshot)),
                        Some(Turn::Enemy) => {
                            if !announced_cards {
                                info!("Waiting for the other player to use a card...");
                                announced_cards = true;
                            }
                        }
                        None => {
                            return Err(SessionError::ProtocolViolation(
                                "AwaitingCards snapshot without a turn".to_owned(),
                            ))
                        }
                    }
                }
                Snapshot::AwaitingPlayers => {
                    return Err(SessionError::ProtocolViolation(
                        "AwaitingPlayers in the middle of a round".to_owned(),
                    ))
                }
            }
            self.pause().await?;
        }
    }

    async fn conclude_round(&mut self) -> Result<(), SessionError> {
        self.phase = Phase::RoundConcluded;
        let result = self.fetch_round_result().await?;
        self.coin = None;
        let match_winner = result.match_winner;
        self.emit(SessionEvent::RoundEnded(result));

        match match_winner {
            None => {
                info!("Round over");
                self.phase = Phase::AwaitingLocalSideChoice;
                self.emit(SessionEvent::ShouldMakeChoice);
            }
            Some(i_won) => {
                info!("Match over, {}", if i_won { "I win!" } else { "I lose" });
                self.phase = Phase::MatchConcluded;
            }
        }
        Ok(())
    }

    async fn fetch_round_result(&mut self) -> Result<RoundResult, SessionError> {
        match self.fetch().await? {
            Snapshot::RoundEnded(result) => Ok(result),
            other => Err(SessionError::ProtocolViolation(format!(
                "expected RoundEnded, server moved on to {:?}",
                other.state()
            ))),
        }
    }

    async fn fetch(&mut self) -> Result<Snapshot, SessionError> {
        let raw = tokio::select! {
            biased;
            _ = self.shutdown_receiver.recv() => return Err(SessionError::Cancelled),
            raw = self.transport.fetch_snapshot() => raw?,
        };
        let snapshot = decode(&raw)?;
        debug!("Snapshot {:?}", snapshot.state());
        Ok(snapshot)
    }

    async fn pause(&mut self) -> Result<(), SessionError> {
        tokio::select! {
            biased;
            _ = self.shutdown_receiver.recv() => Err(SessionError::Cancelled),
            _ = time::sleep(self.config.poll_interval) => Ok(()),
        }
    }

    fn emit(&self, event: SessionEvent) {
        debug!("Event: {}", event);
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn expect_phase(&self, command: &'static str, allowed: &[Phase]) -> Result<(), SessionError> {
        if self.phase == Phase::Halted {
            return Err(SessionError::Halted);
        }
        if !allowed.contains(&self.phase) {
            return Err(SessionError::InvalidPhase {
                command,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn halt_on_fatal(&mut self, result: Result<(), SessionError>) -> Result<(), SessionError> {
        if let Err(e) = &result {
            if e.is_fatal() {
                error!("Session {} halted: {}", self.id(), e);
                self.phase = Phase::Halted;
            }
        }
        result
    }
}
