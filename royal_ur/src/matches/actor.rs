//! Match actor implementation with async message handling.

use super::{
    config::MatchConfig,
    errors::{MatchError, MatchResult},
    messages::{MatchMessage, MatchResponse, MatchUpdate},
};
use crate::game::{
    Game,
    entities::{GameId, GameState, Lane, PlayerId},
};
use rand::{SeedableRng, rngs::StdRng};
use std::{collections::HashMap, time::Duration};
use tokio::{
    sync::mpsc,
    time::{Instant, interval, timeout},
};

/// How long a subscriber gets to make room for the final snapshot
const FINAL_UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Match actor handle for sending messages
#[derive(Clone, Debug)]
pub struct MatchHandle {
    sender: mpsc::Sender<MatchMessage>,
    game_id: GameId,
}

impl MatchHandle {
    /// Create a new match handle
    pub fn new(sender: mpsc::Sender<MatchMessage>, game_id: GameId) -> Self {
        Self { sender, game_id }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Send a message to the match
    pub async fn send(&self, message: MatchMessage) -> MatchResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| MatchError::Closed)
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Actor owning a single game
///
/// Every action on the game goes through the inbox, so they're applied one
/// at a time and the game itself needs no lock.
pub struct MatchActor {
    id: GameId,

    config: MatchConfig,

    game: Game,

    /// Dice for this match
    rng: StdRng,

    inbox: mpsc::Receiver<MatchMessage>,

    /// Participants (or anyone else) receiving snapshots
    subscribers: HashMap<PlayerId, mpsc::Sender<MatchUpdate>>,

    /// When the current player's turn began, for the turn timer
    turn_started: Instant,

    is_closed: bool,
}

impl MatchActor {
    /// Create a new match actor
    ///
    /// The game gets `id` and, if it hasn't started yet, its pre-game rolls
    /// are thrown with the match's dice.
    ///
    /// # Errors
    ///
    /// Fails if `config` doesn't validate.
    pub fn new(id: GameId, mut game: Game, config: MatchConfig) -> MatchResult<(Self, MatchHandle)> {
        config.validate().map_err(MatchError::InvalidConfig)?;

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        game.set_id(id);
        if game.state() == GameState::None {
            game.begin(&mut rng)?;
        }

        let (sender, inbox) = mpsc::channel(config.inbox_capacity);

        let actor = Self {
            id,
            config,
            game,
            rng,
            inbox,
            subscribers: HashMap::new(),
            turn_started: Instant::now(),
            is_closed: false,
        };

        Ok((actor, MatchHandle::new(sender, id)))
    }

    /// Run the match actor event loop
    pub async fn run(mut self) {
        log::info!("Match {} starting", self.id);

        let mut tick_interval = interval(self.config.tick_interval());

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message).await,
                        None => break,
                    }
                }

                _ = tick_interval.tick() => {
                    self.tick().await;
                }
            }

            if self.is_closed {
                break;
            }
        }

        log::info!("Match {} closed", self.id);
    }

    async fn handle_message(&mut self, message: MatchMessage) {
        match message {
            MatchMessage::Roll {
                player_id,
                response,
            } => {
                let result = self.handle_roll(&player_id).await;
                let _ = response.send(result);
            }

            MatchMessage::Move {
                player_id,
                track,
                lane,
                response,
            } => {
                let result = self.handle_move(&player_id, track, lane).await;
                let _ = response.send(result);
            }

            MatchMessage::GetView { response } => {
                let _ = response.send(self.game.view());
            }

            MatchMessage::Subscribe { player_id, sender } => {
                if sender.try_send(self.snapshot()).is_ok() {
                    self.subscribers.insert(player_id, sender);
                    log::debug!("{} subscribed to match {}", player_id, self.id);
                }
            }

            MatchMessage::Unsubscribe { player_id } => {
                self.subscribers.remove(&player_id);
                log::debug!("{} unsubscribed from match {}", player_id, self.id);
            }

            MatchMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(MatchResponse::Success);
            }
        }
    }

    async fn handle_roll(&mut self, player_id: &PlayerId) -> MatchResponse {
        let result = self.game.roll(player_id, &mut self.rng);
        match &result {
            Ok(outcome) => {
                log::debug!("Match {}: {} rolled {:?}", self.id, player_id, outcome);
                self.after_change().await;
            }
            Err(e) => log::debug!("Match {}: roll by {} rejected: {}", self.id, player_id, e),
        }
        result.into()
    }

    async fn handle_move(
        &mut self,
        player_id: &PlayerId,
        track: usize,
        lane: Lane,
    ) -> MatchResponse {
        let result = self.game.move_token(player_id, track, lane);
        match &result {
            Ok(outcome) => {
                log::debug!("Match {}: {} moved {:?}", self.id, player_id, outcome);
                self.after_change().await;
            }
            Err(e) => log::debug!("Match {}: move by {} rejected: {}", self.id, player_id, e),
        }
        result.into()
    }

    /// Restarts the turn timer, then broadcasts. Whoever is to act next,
    /// including a player on an extra turn, gets the full timeout.
    async fn after_change(&mut self) {
        self.turn_started = Instant::now();
        self.broadcast().await;
    }

    async fn tick(&mut self) {
        let Some(turn_timeout) = self.config.turn_timeout() else {
            return;
        };
        if self.game.state() != GameState::InProgress || self.turn_started.elapsed() < turn_timeout
        {
            return;
        }
        if let Some(pid) = self.game.time_out() {
            log::info!("Match {}: {} timed out", self.id, pid);
            self.turn_started = Instant::now();
            self.broadcast().await;
        }
    }

    fn snapshot(&self) -> MatchUpdate {
        let view = self.game.view();
        if self.game.state() == GameState::Finished {
            MatchUpdate::Finished(view)
        } else {
            MatchUpdate::Updated(view)
        }
    }

    /// Pushes the current snapshot to every subscriber. A finished game
    /// stops the actor afterwards.
    ///
    /// Running updates are skipped for subscribers that are full, since the
    /// next one supersedes them. The final snapshot waits for room, up to
    /// [`FINAL_UPDATE_TIMEOUT`] per subscriber.
    async fn broadcast(&mut self) {
        let update = self.snapshot();
        if update.is_finished() {
            self.deliver_final(update).await;
            self.is_closed = true;
            return;
        }

        let id = self.id;
        self.subscribers.retain(|player_id, sender| {
            match sender.try_send(update.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Match {id}: subscriber {player_id} channel full, dropping update");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Match {id}: subscriber {player_id} disconnected, removing");
                    false
                }
            }
        });
    }

    async fn deliver_final(&mut self, update: MatchUpdate) {
        for (player_id, sender) in self.subscribers.drain() {
            match timeout(FINAL_UPDATE_TIMEOUT, sender.send(update.clone())).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    log::debug!("Match {}: subscriber {} disconnected", self.id, player_id);
                }
                Err(_) => {
                    log::warn!(
                        "Match {}: subscriber {} never made room for the final snapshot",
                        self.id,
                        player_id
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameView, RollOutcome, UserError, entities::PlayerNumber};
    use tokio::sync::oneshot;

    fn seeded() -> MatchConfig {
        MatchConfig {
            rng_seed: Some(7),
            ..MatchConfig::default()
        }
    }

    fn spawn_match(config: MatchConfig) -> (MatchHandle, PlayerId, PlayerId) {
        let (p1, p2) = (PlayerId::generate(), PlayerId::generate());
        let (actor, handle) = MatchActor::new(GameId::generate(), Game::new(p1, p2), config)
            .expect("valid config");
        tokio::spawn(actor.run());
        (handle, p1, p2)
    }

    /// Player 1 to act with a pending roll of `roll`, after `edit` has
    /// rearranged the board.
    fn spawn_arranged(
        config: MatchConfig,
        roll: u8,
        edit: impl FnOnce(&mut GameView),
    ) -> (MatchHandle, PlayerId, PlayerId) {
        let (p1, p2) = (PlayerId::generate(), PlayerId::generate());
        let mut game = Game::new(p1, p2);
        game.begin_with_rolls(3, 1).unwrap();
        let mut view = game.view();
        edit(&mut view);
        let mut game = Game::from(view);
        game.apply_roll(&p1, roll).unwrap();

        let (actor, handle) = MatchActor::new(GameId::generate(), game, config).unwrap();
        tokio::spawn(actor.run());
        (handle, p1, p2)
    }

    async fn view(handle: &MatchHandle) -> crate::game::GameView {
        let (tx, rx) = oneshot::channel();
        handle
            .send(MatchMessage::GetView { response: tx })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    async fn move_token(handle: &MatchHandle, player_id: PlayerId, track: usize) -> MatchResponse {
        let (tx, rx) = oneshot::channel();
        handle
            .send(MatchMessage::Move {
                player_id,
                track,
                lane: Lane::Player,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    async fn roll(handle: &MatchHandle, player_id: PlayerId) -> MatchResponse {
        let (tx, rx) = oneshot::channel();
        handle
            .send(MatchMessage::Roll {
                player_id,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_new_match_is_started() {
        let (handle, p1, p2) = spawn_match(seeded());
        let view = view(&handle).await;

        assert_eq!(view.state, GameState::InProgress);
        assert_eq!(view.id, Some(handle.game_id()));
        assert_eq!(view.turn, 1);
        assert!(view.current_player == Some(p1) || view.current_player == Some(p2));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = MatchConfig {
            inbox_capacity: 0,
            ..MatchConfig::default()
        };
        let game = Game::new(PlayerId::generate(), PlayerId::generate());
        assert!(matches!(
            MatchActor::new(GameId::generate(), game, config),
            Err(MatchError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_turn_roll_rejected() {
        let (handle, p1, p2) = spawn_match(seeded());
        let current = view(&handle).await.current_player.unwrap();
        let other = if current == p1 { p2 } else { p1 };

        let before = view(&handle).await;
        assert_eq!(
            roll(&handle, other).await,
            MatchResponse::Rejected(UserError::OutOfTurnAction)
        );
        assert_eq!(view(&handle).await, before);

        assert_eq!(
            roll(&handle, PlayerId::generate()).await,
            MatchResponse::Rejected(UserError::UserDoesNotExist)
        );
    }

    #[tokio::test]
    async fn test_roll_is_broadcast() {
        let (handle, p1, _) = spawn_match(seeded());
        let (tx, mut rx) = mpsc::channel(16);
        handle
            .send(MatchMessage::Subscribe {
                player_id: p1,
                sender: tx,
            })
            .await
            .unwrap();

        // Current snapshot on subscription.
        let initial = rx.recv().await.unwrap();
        assert!(!initial.is_finished());
        let current = initial.view().current_player.unwrap();

        let response = roll(&handle, current).await;
        assert!(response.is_success());

        let update = rx.recv().await.unwrap();
        assert!(update.view().messages.len() > initial.view().messages.len());
        match response {
            MatchResponse::Rolled(RollOutcome::AwaitingMove(value)) => {
                assert_eq!(update.view().current_roll, Some(value));
            }
            MatchResponse::Rolled(_) => {
                assert_eq!(update.view().current_roll, None);
                assert_ne!(update.view().current_player, Some(current));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_stops_actor() {
        let (handle, _, _) = spawn_match(seeded());
        let (tx, rx) = oneshot::channel();
        handle
            .send(MatchMessage::Close { response: tx })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), MatchResponse::Success);

        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        assert!(handle.is_closed());
        let (tx, _rx) = oneshot::channel();
        assert_eq!(
            handle.send(MatchMessage::GetView { response: tx }).await,
            Err(MatchError::Closed)
        );
    }

    #[tokio::test]
    async fn test_turn_timeout_passes_turn() {
        let (handle, _, _) = spawn_match(MatchConfig {
            turn_timeout_ms: 100,
            tick_interval_ms: 10,
            ..seeded()
        });
        let stalled = view(&handle).await.current_player;

        tokio::time::sleep(tokio::time::Duration::from_millis(150)).await;

        let view = view(&handle).await;
        assert_ne!(view.current_player, stalled);
        assert!(
            view.messages
                .iter()
                .any(|entry| entry.message.contains("ran out of time"))
        );
    }

    #[tokio::test]
    async fn test_no_timeout_by_default() {
        let (handle, _, _) = spawn_match(MatchConfig {
            tick_interval_ms: 10,
            ..seeded()
        });
        let before = view(&handle).await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert_eq!(view(&handle).await, before);
    }

    #[tokio::test]
    async fn test_final_snapshot_waits_for_full_subscriber() {
        let (handle, p1, _) = spawn_arranged(seeded(), 2, |view| {
            view.player1.tokens_waiting = 0;
            view.player1.tokens_done = 6;
            view.track[13].insert(PlayerNumber::One);
        });

        // Room for the initial snapshot only, and nobody reading yet.
        let (tx, mut rx) = mpsc::channel(1);
        handle
            .send(MatchMessage::Subscribe {
                player_id: p1,
                sender: tx,
            })
            .await
            .unwrap();

        let (response_tx, response_rx) = oneshot::channel();
        handle
            .send(MatchMessage::Move {
                player_id: p1,
                track: 13,
                lane: Lane::Player,
                response: response_tx,
            })
            .await
            .unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let initial = rx.recv().await.unwrap();
        assert!(!initial.is_finished());

        let last = rx.recv().await.unwrap();
        assert!(last.is_finished());
        assert_eq!(last.view().state, GameState::Finished);
        assert_eq!(last.view().player1.tokens_done, 7);

        match response_rx.await.unwrap() {
            MatchResponse::Moved(outcome) => assert!(outcome.finished),
            other => panic!("unexpected response {other:?}"),
        }

        // The actor stops after the final snapshot.
        assert!(rx.recv().await.is_none());
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_extra_turn_restarts_turn_timer() {
        let (handle, p1, _) = spawn_arranged(
            MatchConfig {
                turn_timeout_ms: 200,
                tick_interval_ms: 5,
                ..seeded()
            },
            1,
            |view| {
                view.player1.tokens_waiting -= 1;
                view.track[13].insert(PlayerNumber::One);
            },
        );

        tokio::time::sleep(tokio::time::Duration::from_millis(120)).await;
        match move_token(&handle, p1, 13).await {
            MatchResponse::Moved(outcome) => assert!(outcome.extra_turn),
            other => panic!("unexpected response {other:?}"),
        }

        // Past the timeout counted from the start of the turn, well short of
        // it counted from the move.
        tokio::time::sleep(tokio::time::Duration::from_millis(120)).await;

        let view = view(&handle).await;
        assert_eq!(view.current_player, Some(p1));
        assert!(
            !view
                .messages
                .iter()
                .any(|entry| entry.message.contains("ran out of time"))
        );
    }
}
