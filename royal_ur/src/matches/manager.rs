//! Match manager for spawning and tracking match actors.

use super::{
    actor::{MatchActor, MatchHandle},
    config::MatchConfig,
    errors::{MatchError, MatchResult},
    messages::{MatchMessage, MatchResponse, MatchUpdate},
};
use crate::game::{
    Game, GameView,
    entities::{GameId, GameState, Lane, PlayerId},
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc, oneshot};

/// Match metadata for discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchMetadata {
    pub id: GameId,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub turn: u32,
    pub state: GameState,
}

impl MatchMetadata {
    pub fn new(id: GameId, view: &GameView) -> Self {
        Self {
            id,
            player1: view.player1.pid,
            player2: view.player2.pid,
            turn: view.turn,
            state: view.state,
        }
    }
}

/// Registry of live matches keyed by game id
///
/// A match is registered when it's created and removed as soon as its actor
/// stops, whether the game finished or it was closed.
#[derive(Clone)]
pub struct MatchManager {
    config: MatchConfig,

    /// Active match handles
    matches: Arc<RwLock<HashMap<GameId, MatchHandle>>>,
}

impl MatchManager {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            matches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create and spawn a new match between two players
    ///
    /// The pre-game rolls are thrown before this returns, so the match is
    /// already in progress.
    pub async fn create_match(
        &self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> MatchResult<MatchHandle> {
        let game_id = GameId::generate();
        let (actor, handle) =
            MatchActor::new(game_id, Game::new(player1, player2), self.config.clone())?;

        let mut matches = self.matches.write().await;
        matches.insert(game_id, handle.clone());
        drop(matches);

        let registry = Arc::clone(&self.matches);
        tokio::spawn(async move {
            actor.run().await;
            registry.write().await.remove(&game_id);
            log::debug!("Match {} removed from registry", game_id);
        });

        log::info!(
            "Created match {} between {} and {}",
            game_id,
            player1,
            player2
        );

        Ok(handle)
    }

    /// Get a match handle
    pub async fn get_match(&self, game_id: GameId) -> Option<MatchHandle> {
        let matches = self.matches.read().await;
        matches.get(&game_id).cloned()
    }

    async fn handle(&self, game_id: GameId) -> MatchResult<MatchHandle> {
        self.get_match(game_id)
            .await
            .ok_or(MatchError::NotFound(game_id))
    }

    /// Roll the dice for `player_id`
    pub async fn roll(&self, game_id: GameId, player_id: PlayerId) -> MatchResult<MatchResponse> {
        let handle = self.handle(game_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(MatchMessage::Roll {
                player_id,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| MatchError::Closed)
    }

    /// Move one of `player_id`'s tokens by the pending roll
    pub async fn move_token(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        track: usize,
        lane: Lane,
    ) -> MatchResult<MatchResponse> {
        let handle = self.handle(game_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(MatchMessage::Move {
                player_id,
                track,
                lane,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| MatchError::Closed)
    }

    /// Get a snapshot of a match
    pub async fn get_view(&self, game_id: GameId) -> MatchResult<GameView> {
        let handle = self.handle(game_id).await?;
        let (tx, rx) = oneshot::channel();
        handle.send(MatchMessage::GetView { response: tx }).await?;
        rx.await.map_err(|_| MatchError::Closed)
    }

    /// Start pushing snapshots of a match to `sender`
    pub async fn subscribe(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        sender: mpsc::Sender<MatchUpdate>,
    ) -> MatchResult<()> {
        let handle = self.handle(game_id).await?;
        handle
            .send(MatchMessage::Subscribe { player_id, sender })
            .await
    }

    pub async fn unsubscribe(&self, game_id: GameId, player_id: PlayerId) -> MatchResult<()> {
        let handle = self.handle(game_id).await?;
        handle.send(MatchMessage::Unsubscribe { player_id }).await
    }

    /// Close a match
    ///
    /// Closing a match that already stopped is not an error.
    pub async fn close_match(&self, game_id: GameId) -> MatchResult<()> {
        if let Some(handle) = self.get_match(game_id).await {
            let (tx, rx) = oneshot::channel();
            if handle.send(MatchMessage::Close { response: tx }).await.is_ok() {
                let _ = rx.await;
            }
        }

        let mut matches = self.matches.write().await;
        matches.remove(&game_id);
        drop(matches);

        log::info!("Closed match {}", game_id);

        Ok(())
    }

    /// List all active matches
    pub async fn list_matches(&self) -> Vec<MatchMetadata> {
        let ids: Vec<GameId> = self.matches.read().await.keys().copied().collect();

        let mut metadata_list = Vec::with_capacity(ids.len());
        for id in ids {
            // Matches that stop mid-listing are skipped.
            if let Ok(view) = self.get_view(id).await {
                metadata_list.push(MatchMetadata::new(id, &view));
            }
        }
        metadata_list
    }

    /// Get active match count
    pub async fn active_match_count(&self) -> usize {
        let matches = self.matches.read().await;
        matches.len()
    }
}

impl Default for MatchManager {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> MatchManager {
        MatchManager::new(MatchConfig {
            rng_seed: Some(11),
            ..MatchConfig::default()
        })
    }

    #[tokio::test]
    async fn test_create_and_get_match() {
        let manager = manager();
        let (p1, p2) = (PlayerId::generate(), PlayerId::generate());
        let handle = manager.create_match(p1, p2).await.unwrap();

        assert_eq!(manager.active_match_count().await, 1);
        assert!(manager.get_match(handle.game_id()).await.is_some());

        let view = manager.get_view(handle.game_id()).await.unwrap();
        assert_eq!(view.player1.pid, p1);
        assert_eq!(view.player2.pid, p2);
        assert_eq!(view.state, GameState::InProgress);
    }

    #[tokio::test]
    async fn test_unknown_match() {
        let manager = manager();
        let missing = GameId::generate();

        assert!(manager.get_match(missing).await.is_none());
        assert_eq!(
            manager.get_view(missing).await,
            Err(MatchError::NotFound(missing))
        );
        assert_eq!(
            manager.roll(missing, PlayerId::generate()).await,
            Err(MatchError::NotFound(missing))
        );
    }

    #[tokio::test]
    async fn test_list_matches() {
        let manager = manager();
        let first = manager
            .create_match(PlayerId::generate(), PlayerId::generate())
            .await
            .unwrap();
        let second = manager
            .create_match(PlayerId::generate(), PlayerId::generate())
            .await
            .unwrap();

        let listed = manager.list_matches().await;
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|m| m.id == first.game_id()));
        assert!(listed.iter().any(|m| m.id == second.game_id()));
        assert!(listed.iter().all(|m| m.turn == 1));
    }

    #[tokio::test]
    async fn test_close_match_removes_it() {
        let manager = manager();
        let handle = manager
            .create_match(PlayerId::generate(), PlayerId::generate())
            .await
            .unwrap();
        let id = handle.game_id();

        manager.close_match(id).await.unwrap();
        assert_eq!(manager.active_match_count().await, 0);
        assert!(manager.get_match(id).await.is_none());

        // Closing twice is fine.
        manager.close_match(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_action_is_reported() {
        let manager = manager();
        let (p1, p2) = (PlayerId::generate(), PlayerId::generate());
        let id = manager.create_match(p1, p2).await.unwrap().game_id();
        let current = manager.get_view(id).await.unwrap().current_player.unwrap();

        let response = manager
            .move_token(id, current, 0, Lane::Player)
            .await
            .unwrap();
        assert_eq!(
            response,
            MatchResponse::Rejected(crate::game::UserError::NoRoll)
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_updates() {
        let manager = manager();
        let (p1, p2) = (PlayerId::generate(), PlayerId::generate());
        let id = manager.create_match(p1, p2).await.unwrap().game_id();

        let (tx, mut rx) = mpsc::channel(8);
        manager.subscribe(id, p1, tx).await.unwrap();
        assert!(!rx.recv().await.unwrap().is_finished());

        manager.unsubscribe(id, p1).await.unwrap();
        // The actor dropped its sender, so the channel is closed.
        assert!(rx.recv().await.is_none());

        let current = manager.get_view(id).await.unwrap().current_player.unwrap();
        assert!(manager.roll(id, current).await.unwrap().is_success());

        let missing = GameId::generate();
        assert_eq!(
            manager.unsubscribe(missing, p1).await,
            Err(MatchError::NotFound(missing))
        );
    }
}
